//! Monthly pay for rotation-shift (vakhta) work
//!
//! The calculation reproduces the payroll spreadsheet used on the field:
//! timesheet hours, holiday/idle/travel surcharges, the per-day shift-method
//! allowance, night surcharge, the monthly bonus, regional and northern
//! allowances, and income tax levied on everything except the shift-method
//! and travel payments.

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use super::money;

/// Monthly bonus, percent
pub const MONTHLY_BONUS_RATE: Decimal = Decimal::from_parts(33, 0, 0, false, 0);
/// Night-shift surcharge, percent
pub const NIGHT_SHIFT_RATE: Decimal = Decimal::from_parts(40, 0, 0, false, 0);
/// 40-hour week by the timesheet; reference only
pub const STANDARD_HOURS_PER_MONTH: Decimal = Decimal::from_parts(1645, 0, 0, false, 1);
/// Income tax, percent
pub const TAX_RATE: Decimal = Decimal::from_parts(13, 0, 0, false, 0);
pub const HOURS_PER_DAY: Decimal = Decimal::from_parts(11, 0, 0, false, 0);
pub const TRAVEL_HOURS_PER_DAY: Decimal = Decimal::from_parts(8, 0, 0, false, 0);
/// Roubles per day on the rotation (worked and travel days)
pub const SHIFT_METHOD_RATE: Decimal = Decimal::from_parts(740, 0, 0, false, 0);
pub const MAX_DAYS_WORKED: Decimal = Decimal::from_parts(365, 0, 0, false, 0);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SalaryError {
    #[error("Часовая ставка должна быть больше нуля")]
    NonPositiveHourlyRate,
    #[error("Количество отработанных дней не может быть отрицательным")]
    NegativeDaysWorked,
    #[error("Количество отработанных дней превышает разумный максимум (365 дней)")]
    TooManyDaysWorked,
    #[error("Количество ночных часов не может быть отрицательным")]
    NegativeNightHours,
    #[error("Количество дней простоя не может быть отрицательным")]
    NegativeIdleDays,
    #[error("Количество дней в пути не может быть отрицательным")]
    NegativeTravelDays,
    #[error("Количество праздничных дней не может быть отрицательным")]
    NegativeHolidayDays,
    #[error("Доплаты не могут быть отрицательными")]
    NegativeAdditionalPayments,
    #[error("Региональная надбавка должна быть от 0 до 100%")]
    RegionalAllowanceOutOfRange,
    #[error("Северная надбавка должна быть от 0 до 100%")]
    NorthernAllowanceOutOfRange,
}

/// Inputs for one month. Optional fields count as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalaryInput {
    pub hourly_rate: Decimal,
    pub days_worked: Decimal,
    pub night_hours: Option<Decimal>,
    pub idle_days: Option<Decimal>,
    pub travel_days: Option<Decimal>,
    pub holiday_days: Option<Decimal>,
    pub additional_payments: Option<Decimal>,
    pub regional_allowance_rate: Option<Decimal>,
    pub northern_allowance_rate: Option<Decimal>,
}

impl SalaryInput {
    pub fn new(hourly_rate: Decimal, days_worked: Decimal) -> Self {
        Self {
            hourly_rate,
            days_worked,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalaryCalculation {
    pub hourly_rate: Decimal,
    pub days_worked: Decimal,
    pub night_hours: Decimal,
    pub idle_days: Decimal,
    pub travel_days: Decimal,
    pub holiday_days: Decimal,
    pub hours_by_timesheet: Decimal,
    pub salary_by_position: Decimal,
    pub holiday_payment: Decimal,
    pub idle_payment: Decimal,
    pub travel_payment: Decimal,
    pub shift_method_payment: Decimal,
    pub night_shift_payment: Decimal,
    pub monthly_bonus: Decimal,
    pub regional_allowance_rate: Decimal,
    pub regional_allowance: Decimal,
    pub northern_allowance_rate: Decimal,
    pub northern_allowance: Decimal,
    pub additional_payments: Decimal,
    pub total_accrued: Decimal,
    pub taxable_base: Decimal,
    pub tax: Decimal,
    pub net: Decimal,
}

pub fn validate(input: &SalaryInput) -> Result<(), SalaryError> {
    if input.hourly_rate <= Decimal::ZERO {
        return Err(SalaryError::NonPositiveHourlyRate);
    }
    if input.days_worked < Decimal::ZERO {
        return Err(SalaryError::NegativeDaysWorked);
    }
    if input.days_worked > MAX_DAYS_WORKED {
        return Err(SalaryError::TooManyDaysWorked);
    }

    let non_negative = [
        (input.night_hours, SalaryError::NegativeNightHours),
        (input.idle_days, SalaryError::NegativeIdleDays),
        (input.travel_days, SalaryError::NegativeTravelDays),
        (input.holiday_days, SalaryError::NegativeHolidayDays),
        (input.additional_payments, SalaryError::NegativeAdditionalPayments),
    ];
    for (value, error) in non_negative {
        if value.is_some_and(|v| v < Decimal::ZERO) {
            return Err(error);
        }
    }

    if !money::is_percent(input.regional_allowance_rate) {
        return Err(SalaryError::RegionalAllowanceOutOfRange);
    }
    if !money::is_percent(input.northern_allowance_rate) {
        return Err(SalaryError::NorthernAllowanceOutOfRange);
    }
    Ok(())
}

pub fn calculate(input: &SalaryInput) -> Result<SalaryCalculation, SalaryError> {
    validate(input)?;

    let rate = input.hourly_rate;
    let days = input.days_worked;
    let night_hours = input.night_hours.unwrap_or_default();
    let idle_days = input.idle_days.unwrap_or_default();
    let travel_days = input.travel_days.unwrap_or_default();
    let holiday_days = input.holiday_days.unwrap_or_default();
    let additional = input.additional_payments.unwrap_or_default();
    let regional_rate = input.regional_allowance_rate.unwrap_or_default();
    let northern_rate = input.northern_allowance_rate.unwrap_or_default();

    let hours = days * HOURS_PER_DAY;
    let salary = hours * rate;
    let holiday = holiday_days * rate * HOURS_PER_DAY;
    let idle = idle_days * HOURS_PER_DAY * rate * money::idle_rate();
    let travel = travel_days * rate * TRAVEL_HOURS_PER_DAY;
    let shift_method = (days + travel_days) * SHIFT_METHOD_RATE;
    let night = night_hours * rate * money::percent(NIGHT_SHIFT_RATE);
    let monthly_bonus = (salary + idle + night) * money::percent(MONTHLY_BONUS_RATE);

    let allowance_base = salary + holiday + night + monthly_bonus + idle;
    let regional = allowance_base * money::percent(regional_rate);
    let northern = allowance_base * money::percent(northern_rate);

    let total = salary
        + holiday
        + idle
        + travel
        + shift_method
        + night
        + monthly_bonus
        + regional
        + northern
        + additional;

    // shift-method and travel payments are compensation, not income
    let taxable = total - shift_method - travel;
    let tax = taxable * money::percent(TAX_RATE);
    let net = total - tax;

    let r = |d: Decimal| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    Ok(SalaryCalculation {
        hourly_rate: rate,
        days_worked: days,
        night_hours,
        idle_days,
        travel_days,
        holiday_days,
        hours_by_timesheet: hours,
        salary_by_position: r(salary),
        holiday_payment: r(holiday),
        idle_payment: r(idle),
        travel_payment: r(travel),
        shift_method_payment: r(shift_method),
        night_shift_payment: r(night),
        monthly_bonus: r(monthly_bonus),
        regional_allowance_rate: regional_rate,
        regional_allowance: r(regional),
        northern_allowance_rate: northern_rate,
        northern_allowance: r(northern),
        additional_payments: r(additional),
        total_accrued: r(total),
        taxable_base: r(taxable),
        tax: r(tax),
        net: r(net),
    })
}

pub fn format_report(calc: &SalaryCalculation) -> String {
    let f2 = money::fmt2;
    let f1 = money::fmt1;
    let f0 = money::fmt0;

    let mut report = String::from("💰 Расчёт зарплаты (вахтовый метод):\n\n");
    report.push_str(&format!("📊 Часовая ставка: {} ₽/час\n", f2(calc.hourly_rate)));
    report.push_str(&format!("📅 Отработано дней: {}\n", f0(calc.days_worked)));
    if calc.idle_days > Decimal::ZERO {
        report.push_str(&format!("⏸️ Количество простоя: {} дн.\n", f0(calc.idle_days)));
    }
    report.push_str(&format!("⏰ Часов по табелю: {}\n\n", f1(calc.hours_by_timesheet)));

    report.push_str("📈 Начисления:\n");
    report.push_str(&format!("💵 Оплата по окладу: {} ₽\n", f2(calc.salary_by_position)));
    if calc.holiday_days > Decimal::ZERO {
        report.push_str(&format!(
            "🎉 Доплата за праздники ({} дн.): {} ₽\n",
            f0(calc.holiday_days),
            f2(calc.holiday_payment)
        ));
    }
    if calc.idle_days > Decimal::ZERO {
        report.push_str(&format!(
            "⏸️ Оплата простоя ({} дн.): {} ₽\n",
            f0(calc.idle_days),
            f2(calc.idle_payment)
        ));
    }
    if calc.travel_days > Decimal::ZERO {
        report.push_str(&format!(
            "🚗 Доплата за дни в пути ({} дн.): {} ₽\n",
            f0(calc.travel_days),
            f2(calc.travel_payment)
        ));
    }
    report.push_str(&format!(
        "🏕️ Доплата за вахтовый метод: {} ₽\n",
        f2(calc.shift_method_payment)
    ));
    if calc.night_hours > Decimal::ZERO {
        report.push_str(&format!(
            "🌙 Доплата за ночные ({} ч): {} ₽\n",
            f1(calc.night_hours),
            f2(calc.night_shift_payment)
        ));
    }
    if calc.monthly_bonus > Decimal::ZERO {
        report.push_str(&format!(
            "🎁 Премия месячная ({}%): {} ₽\n",
            f0(MONTHLY_BONUS_RATE),
            f2(calc.monthly_bonus)
        ));
    }
    if calc.regional_allowance_rate > Decimal::ZERO {
        report.push_str(&format!(
            "📍 Региональная надбавка ({}%): {} ₽\n",
            f1(calc.regional_allowance_rate),
            f2(calc.regional_allowance)
        ));
    }
    if calc.northern_allowance_rate > Decimal::ZERO {
        report.push_str(&format!(
            "❄️ Северная надбавка ({}%): {} ₽\n",
            f1(calc.northern_allowance_rate),
            f2(calc.northern_allowance)
        ));
    }
    if calc.additional_payments > Decimal::ZERO {
        report.push_str(&format!("➕ Прочие доплаты: {} ₽\n", f2(calc.additional_payments)));
    }

    report.push('\n');
    report.push_str(&format!("📊 Всего начислено: {} ₽\n", f2(calc.total_accrued)));
    report.push_str(&format!("📉 Налог ({}%): {} ₽\n", f0(TAX_RATE), f2(calc.tax)));
    report.push_str(&format!("✅ ЗП к выплате: {} ₽", f2(calc.net)));
    report
}
