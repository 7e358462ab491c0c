//! Decimal helpers shared by the pay calculators

use rust_decimal::{Decimal, RoundingStrategy};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Share of the hourly pay kept for idle days (2/3)
pub fn idle_rate() -> Decimal {
    Decimal::TWO / Decimal::from(3)
}

/// `rate` percent as a fraction
pub fn percent(rate: Decimal) -> Decimal {
    rate / HUNDRED
}

/// Absent or within [0, 100]
pub fn is_percent(rate: Option<Decimal>) -> bool {
    rate.map_or(true, |r| r >= Decimal::ZERO && r <= HUNDRED)
}

fn fmt_dp(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", dp as usize, rounded)
}

pub fn fmt0(value: Decimal) -> String {
    fmt_dp(value, 0)
}

pub fn fmt1(value: Decimal) -> String {
    fmt_dp(value, 1)
}

pub fn fmt2(value: Decimal) -> String {
    fmt_dp(value, 2)
}

/// Parse a number typed by a user: `1 500,5`, `1500.5`, `-3`.
pub fn parse_user_number(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<Decimal>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatting_pads_and_rounds() {
        let d = |s: &str| s.parse::<Decimal>().unwrap();
        assert_eq!(fmt2(d("165000")), "165000.00");
        assert_eq!(fmt2(d("14666.665")), "14666.67");
        assert_eq!(fmt1(d("165")), "165.0");
        assert_eq!(fmt0(d("15")), "15");
        assert_eq!(fmt0(d("2.5")), "3");
    }

    #[test]
    fn user_numbers() {
        assert_eq!(parse_user_number("1 500,5"), Some("1500.5".parse().unwrap()));
        assert_eq!(parse_user_number(" 42 "), Some(Decimal::from(42)));
        assert_eq!(parse_user_number("-3"), Some(Decimal::from(-3)));
        assert_eq!(parse_user_number("abc"), None);
        assert_eq!(parse_user_number("   "), None);
    }

    #[test]
    fn percent_bounds() {
        assert!(is_percent(None));
        assert!(is_percent(Some(Decimal::ZERO)));
        assert!(is_percent(Some(Decimal::ONE_HUNDRED)));
        assert!(!is_percent(Some(Decimal::from(101))));
        assert!(!is_percent(Some(Decimal::from(-1))));
    }
}
