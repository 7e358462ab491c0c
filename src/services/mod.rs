//! Pay calculations

pub mod annual_bonus_service;
pub mod money;
pub mod salary_service;

pub use annual_bonus_service::{AnnualBonusCalculation, AnnualBonusError, AnnualBonusInput};
pub use salary_service::{SalaryCalculation, SalaryError, SalaryInput};
