//! Annual reward ("13th salary")
//!
//! Cell names from the payroll workbook are kept in the field docs (E201,
//! E210, ...) because that is how the accountants refer to the figures.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use super::money;

pub const HOURS_PER_DAY: Decimal = Decimal::from_parts(11, 0, 0, false, 0);
pub const DEFAULT_MONTHLY_BONUS_RATE: Decimal = Decimal::from_parts(33, 0, 0, false, 0);
pub const DEFAULT_KPI_COEFFICIENT: Decimal = Decimal::ONE;
pub const DEFAULT_CORRECTION_COEFFICIENT: Decimal = Decimal::ONE;
pub const TAX_RATE: Decimal = Decimal::from_parts(13, 0, 0, false, 0);
pub const MONTHS_IN_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

pub const MONTH_NAMES: [&str; 12] = [
    "Январь", "Февраль", "Март", "Апрель", "Май", "Июнь", "Июль", "Август", "Сентябрь",
    "Октябрь", "Ноябрь", "Декабрь",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnualBonusError {
    #[error("Часовая ставка должна быть больше нуля")]
    NonPositiveHourlyRate,
    #[error("Количество месяцев в компании должно быть от 1 до 12")]
    MonthsInCompanyOutOfRange,
    #[error("Должно быть указано количество дней для всех 12 месяцев")]
    IncompleteMonths,
    #[error("Номер месяца должен быть от 1 до 12, получен: {0}")]
    InvalidMonth(u32),
    #[error("Количество дней в месяце {0} не может быть отрицательным")]
    NegativeDays(u32),
    #[error("Количество дней в месяце {0} не может быть больше 31")]
    TooManyDays(u32),
    #[error("Процент ежемесячной премии должен быть от 0 до 100%")]
    MonthlyBonusRateOutOfRange,
    #[error("Целевой % годового вознаграждения должен быть от 0 до 100%")]
    TargetRateOutOfRange,
    #[error("Коэффициент выполнения (KPI) не может быть отрицательным")]
    NegativeKpi,
    #[error("Корректирующий коэффициент не может быть отрицательным")]
    NegativeCorrection,
    #[error("Региональная надбавка должна быть от 0 до 100%")]
    RegionalAllowanceOutOfRange,
    #[error("Северная надбавка должна быть от 0 до 100%")]
    NorthernAllowanceOutOfRange,
    #[error("Целевой % годового вознаграждения по должности (E104) обязателен для расчёта")]
    MissingTargetRate,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnualBonusInput {
    /// E101
    pub hourly_rate: Decimal,
    /// E102, 1..=12
    pub months_in_company: Decimal,
    /// Days on rotation keyed by month number 1..=12
    pub monthly_days: BTreeMap<u32, Decimal>,
    /// E103, defaults to 33
    pub monthly_bonus_rate: Option<Decimal>,
    /// E104, required
    pub target_annual_bonus_rate: Option<Decimal>,
    /// E105, defaults to 1.0
    pub kpi_coefficient: Option<Decimal>,
    /// E106, defaults to 1.0
    pub correction_coefficient: Option<Decimal>,
    pub regional_allowance_rate: Option<Decimal>,
    pub northern_allowance_rate: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthBase {
    pub month: u32,
    pub name: &'static str,
    pub days: Decimal,
    pub hours: Decimal,
    pub salary: Decimal,
    pub bonus: Decimal,
    pub base: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnualBonusCalculation {
    pub hourly_rate: Decimal,
    pub months_in_company: Decimal,
    pub monthly_bonus_rate: Decimal,
    pub target_annual_bonus_rate: Decimal,
    pub kpi_coefficient: Decimal,
    pub correction_coefficient: Decimal,
    pub months: Vec<MonthBase>,
    /// E201
    pub average_monthly_base: Decimal,
    /// E202
    pub annual_base: Decimal,
    /// E210
    pub annual_reward_without_allowances: Decimal,
    pub regional_allowance_rate: Decimal,
    /// E211
    pub regional_allowance: Decimal,
    pub northern_allowance_rate: Decimal,
    /// E212
    pub northern_allowance: Decimal,
    /// E213
    pub total_accrued: Decimal,
    /// E214
    pub tax: Decimal,
    /// E215
    pub net: Decimal,
}

pub fn validate(input: &AnnualBonusInput) -> Result<(), AnnualBonusError> {
    if input.hourly_rate <= Decimal::ZERO {
        return Err(AnnualBonusError::NonPositiveHourlyRate);
    }
    if input.months_in_company < Decimal::ONE || input.months_in_company > MONTHS_IN_YEAR {
        return Err(AnnualBonusError::MonthsInCompanyOutOfRange);
    }
    if input.monthly_days.len() != 12 {
        return Err(AnnualBonusError::IncompleteMonths);
    }
    for (&month, &days) in &input.monthly_days {
        if !(1..=12).contains(&month) {
            return Err(AnnualBonusError::InvalidMonth(month));
        }
        if days < Decimal::ZERO {
            return Err(AnnualBonusError::NegativeDays(month));
        }
        if days > Decimal::from(31) {
            return Err(AnnualBonusError::TooManyDays(month));
        }
    }
    if !money::is_percent(input.monthly_bonus_rate) {
        return Err(AnnualBonusError::MonthlyBonusRateOutOfRange);
    }
    if !money::is_percent(input.target_annual_bonus_rate) {
        return Err(AnnualBonusError::TargetRateOutOfRange);
    }
    if input.kpi_coefficient.is_some_and(|k| k < Decimal::ZERO) {
        return Err(AnnualBonusError::NegativeKpi);
    }
    if input.correction_coefficient.is_some_and(|c| c < Decimal::ZERO) {
        return Err(AnnualBonusError::NegativeCorrection);
    }
    if !money::is_percent(input.regional_allowance_rate) {
        return Err(AnnualBonusError::RegionalAllowanceOutOfRange);
    }
    if !money::is_percent(input.northern_allowance_rate) {
        return Err(AnnualBonusError::NorthernAllowanceOutOfRange);
    }
    Ok(())
}

pub fn calculate(input: &AnnualBonusInput) -> Result<AnnualBonusCalculation, AnnualBonusError> {
    validate(input)?;
    let target_rate = input
        .target_annual_bonus_rate
        .ok_or(AnnualBonusError::MissingTargetRate)?;

    let rate = input.hourly_rate;
    let months_in_company = input.months_in_company;
    let bonus_rate = input.monthly_bonus_rate.unwrap_or(DEFAULT_MONTHLY_BONUS_RATE);
    let kpi = input.kpi_coefficient.unwrap_or(DEFAULT_KPI_COEFFICIENT);
    let correction = input
        .correction_coefficient
        .unwrap_or(DEFAULT_CORRECTION_COEFFICIENT);
    let regional_rate = input.regional_allowance_rate.unwrap_or_default();
    let northern_rate = input.northern_allowance_rate.unwrap_or_default();

    let months: Vec<MonthBase> = (1..=12u32)
        .map(|month| {
            let days = input.monthly_days.get(&month).copied().unwrap_or_default();
            let hours = days * HOURS_PER_DAY;
            let salary = hours * rate;
            let bonus = salary * money::percent(bonus_rate);
            MonthBase {
                month,
                name: MONTH_NAMES[(month - 1) as usize],
                days,
                hours,
                salary,
                bonus,
                base: salary + bonus,
            }
        })
        .collect();
    let total_base: Decimal = months.iter().map(|m| m.base).sum();

    let average_monthly_base = total_base / months_in_company;
    let annual_base = average_monthly_base * MONTHS_IN_YEAR;
    let reward = annual_base
        * money::percent(target_rate)
        * kpi
        * correction
        * (months_in_company / MONTHS_IN_YEAR);
    let regional = reward * money::percent(regional_rate);
    let northern = reward * money::percent(northern_rate);
    let total = reward + regional + northern;
    let tax = total * money::percent(TAX_RATE);
    let net = total - tax;

    let r = |d: Decimal| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    Ok(AnnualBonusCalculation {
        hourly_rate: rate,
        months_in_company,
        monthly_bonus_rate: bonus_rate,
        target_annual_bonus_rate: target_rate,
        kpi_coefficient: kpi,
        correction_coefficient: correction,
        months: months
            .into_iter()
            .map(|m| MonthBase {
                salary: r(m.salary),
                bonus: r(m.bonus),
                base: r(m.base),
                ..m
            })
            .collect(),
        average_monthly_base: r(average_monthly_base),
        annual_base: r(annual_base),
        annual_reward_without_allowances: r(reward),
        regional_allowance_rate: regional_rate,
        regional_allowance: r(regional),
        northern_allowance_rate: northern_rate,
        northern_allowance: r(northern),
        total_accrued: r(total),
        tax: r(tax),
        net: r(net),
    })
}

pub fn format_report(calc: &AnnualBonusCalculation) -> String {
    let (f0, f1, f2) = (money::fmt0, money::fmt1, money::fmt2);

    let mut report = String::from("🎁 Расчёт 13-й зарплаты (годовое вознаграждение):\n\n");
    report.push_str(&format!("📊 Часовая ставка: {} ₽/час\n", f2(calc.hourly_rate)));
    report.push_str(&format!("📅 Месяцев в компании за год: {}\n", f0(calc.months_in_company)));
    report.push_str(&format!("📈 Средний % ежемесячной премии: {}%\n", f1(calc.monthly_bonus_rate)));
    report.push_str(&format!(
        "🎯 Целевой % годового вознаграждения: {}%\n",
        f2(calc.target_annual_bonus_rate)
    ));
    report.push_str(&format!("📊 Коэффициент выполнения (KPI): {}\n", f2(calc.kpi_coefficient)));
    report.push_str(&format!(
        "⚖️ Корректирующий коэффициент: {}\n\n",
        f2(calc.correction_coefficient)
    ));

    report.push_str("📅 Данные по месяцам:\n");
    for month in calc.months.iter().filter(|m| m.days > Decimal::ZERO) {
        report.push_str(&format!(
            "{}: {} дн. → {} ч → {} ₽\n",
            month.name,
            f0(month.days),
            f1(month.hours),
            f2(month.base)
        ));
    }
    report.push('\n');

    report.push_str(&format!(
        "💰 Среднемесячная база для 13-й (E201): {} ₽\n",
        f2(calc.average_monthly_base)
    ));
    report.push_str(&format!("💰 Годовая база для 13-й (E202): {} ₽\n\n", f2(calc.annual_base)));

    report.push_str("📊 Годовое вознаграждение:\n");
    report.push_str(&format!(
        "💼 Годовое вознаграждение (без РК и СН) (E210): {} ₽\n",
        f2(calc.annual_reward_without_allowances)
    ));
    if calc.regional_allowance_rate > Decimal::ZERO {
        report.push_str(&format!(
            "📍 Региональная надбавка ({}%) (E211): {} ₽\n",
            f1(calc.regional_allowance_rate),
            f2(calc.regional_allowance)
        ));
    }
    if calc.northern_allowance_rate > Decimal::ZERO {
        report.push_str(&format!(
            "❄️ Северная надбавка ({}%) (E212): {} ₽\n",
            f1(calc.northern_allowance_rate),
            f2(calc.northern_allowance)
        ));
    }

    report.push('\n');
    report.push_str(&format!("📊 Всего начислено (13-я) (E213): {} ₽\n", f2(calc.total_accrued)));
    report.push_str(&format!("📉 Налог ({}%) (E214): {} ₽\n", f0(TAX_RATE), f2(calc.tax)));
    report.push_str(&format!("✅ 13-я зарплата на руки (E215): {} ₽", f2(calc.net)));
    report
}
