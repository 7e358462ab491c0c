//! Small presentation helpers shared by the weather reports

const COMPASS: [&str; 16] = [
    "С", "ССВ", "СВ", "ВСВ", "В", "ВЮВ", "ЮВ", "ЮЮВ", "Ю", "ЮЮЗ", "ЮЗ", "ЗЮЗ", "З", "ЗСЗ", "СЗ",
    "ССЗ",
];

pub const UNKNOWN_DIRECTION: &str = "неизвестно";

/// 16-point compass name for a bearing in degrees
pub fn wind_direction(degrees: Option<f64>) -> &'static str {
    match degrees {
        Some(deg) if deg.is_finite() => {
            let index = (((deg + 11.25) / 22.5) as i64).rem_euclid(16) as usize;
            COMPASS[index]
        }
        _ => UNKNOWN_DIRECTION,
    }
}

pub fn temp_emoji(temp: f64) -> &'static str {
    if temp < -20.0 {
        "🥶"
    } else if temp < 0.0 {
        "❄️"
    } else if temp < 10.0 {
        "🧊"
    } else if temp < 20.0 {
        "🌤️"
    } else {
        "☀️"
    }
}

/// Nearest integer, ties to even
pub fn round_whole(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// One decimal place, ties to even
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Upper-case the first letter, lower-case the rest
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn max_of(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    values.into_iter().fold(None, |acc, v| match acc {
        Some(m) if m >= v => Some(m),
        _ => Some(v),
    })
}

pub fn min_of(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    values.into_iter().fold(None, |acc, v| match acc {
        Some(m) if m <= v => Some(m),
        _ => Some(v),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compass_points() {
        assert_eq!(wind_direction(Some(0.0)), "С");
        assert_eq!(wind_direction(Some(11.24)), "С");
        assert_eq!(wind_direction(Some(11.25)), "ССВ");
        assert_eq!(wind_direction(Some(90.0)), "В");
        assert_eq!(wind_direction(Some(200.0)), "ЮЮЗ");
        assert_eq!(wind_direction(Some(350.0)), "С");
        assert_eq!(wind_direction(None), "неизвестно");
    }

    #[test]
    fn temperature_bands() {
        assert_eq!(temp_emoji(-25.0), "🥶");
        assert_eq!(temp_emoji(-20.0), "❄️");
        assert_eq!(temp_emoji(0.0), "🧊");
        assert_eq!(temp_emoji(15.0), "🌤️");
        assert_eq!(temp_emoji(20.0), "☀️");
    }

    #[test]
    fn rounding_matches_bankers() {
        assert_eq!(round_whole(2.5), 2);
        assert_eq!(round_whole(3.5), 4);
        assert_eq!(round_whole(-31.6), -32);
        assert_eq!(round_tenth(7.26), 7.3);
    }

    #[test]
    fn capitalizes_cyrillic() {
        assert_eq!(capitalize("облачно с ПРОЯСНЕНИЯМИ"), "Облачно с прояснениями");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn extremes() {
        assert_eq!(max_of([1.0, 3.0, 2.0]), Some(3.0));
        assert_eq!(min_of([1.0, -3.0, 2.0]), Some(-3.0));
        assert_eq!(max_of(Vec::<f64>::new()), None);
        assert_eq!(mean(&[1.0, 2.0]), Some(1.5));
    }
}
