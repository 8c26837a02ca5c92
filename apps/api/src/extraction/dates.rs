use chrono::{Datelike, Month, NaiveDate};

/// A calendar month. Day-of-month is deliberately not tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

/// Years outside this window are treated as unparseable.
pub const PLAUSIBLE_YEARS: std::ops::RangeInclusive<i32> = 1900..=2200;

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !PLAUSIBLE_YEARS.contains(&year) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, 1).map(Self::from_date)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

const ONGOING_MARKERS: &[&str] = &["present", "current", "now", "ongoing", "today"];

/// True for end-date placeholders such as "Present" that mean "still ongoing".
pub fn is_ongoing_marker(raw: &str) -> bool {
    let lower = raw.trim().to_lowercase();
    ONGOING_MARKERS.contains(&lower.as_str())
}

/// Parses the date shapes resumes actually use into a year and month.
///
/// Accepts `YYYY-MM`, `YYYY-MM-DD`, `YYYY/MM`, `MM/YYYY`, `YYYY` (January is
/// assumed) and `Mon YYYY` / `Month YYYY`.
pub fn parse_year_month(raw: &str) -> Option<YearMonth> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return YearMonth::new(date.year(), date.month());
    }

    if let Some((a, b)) = s.split_once(['-', '/']) {
        let b = b.split(['-', '/']).next().unwrap_or(b);
        return match (a.len(), b.len()) {
            (4, 1..=2) => YearMonth::new(a.parse().ok()?, b.parse().ok()?),
            (1..=2, 4) => YearMonth::new(b.parse().ok()?, a.parse().ok()?),
            _ => None,
        };
    }

    if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
        return YearMonth::new(s.parse().ok()?, 1);
    }

    let mut parts = s.split_whitespace();
    let month_name = parts.next()?.trim_end_matches(['.', ',']);
    let year = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let month = month_name.parse::<Month>().ok()?;
    YearMonth::new(year.parse().ok()?, month.number_from_month())
}

/// Whole months between two calendar months:
/// `(end.year - start.year) * 12 + (end.month - start.month)`, floored at zero.
pub fn months_between(start: YearMonth, end: YearMonth) -> u32 {
    let years = i64::from(end.year) - i64::from(start.year);
    let months = i64::from(end.month) - i64::from(start.month);
    let total = years.saturating_mul(12).saturating_add(months).max(0);
    u32::try_from(total).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    #[test]
    fn test_parse_iso_year_month() {
        assert_eq!(parse_year_month("2019-01"), Some(ym(2019, 1)));
        assert_eq!(parse_year_month(" 2022-11 "), Some(ym(2022, 11)));
    }

    #[test]
    fn test_parse_full_date_drops_day() {
        assert_eq!(parse_year_month("2019-03-28"), Some(ym(2019, 3)));
    }

    #[test]
    fn test_parse_slash_forms() {
        assert_eq!(parse_year_month("2020/07"), Some(ym(2020, 7)));
        assert_eq!(parse_year_month("07/2020"), Some(ym(2020, 7)));
    }

    #[test]
    fn test_parse_year_only_assumes_january() {
        assert_eq!(parse_year_month("2015"), Some(ym(2015, 1)));
    }

    #[test]
    fn test_parse_month_names() {
        assert_eq!(parse_year_month("Jan 2019"), Some(ym(2019, 1)));
        assert_eq!(parse_year_month("September 2021"), Some(ym(2021, 9)));
        assert_eq!(parse_year_month("Sep. 2021"), Some(ym(2021, 9)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_year_month(""), None);
        assert_eq!(parse_year_month("Present"), None);
        assert_eq!(parse_year_month("2019-13"), None);
        assert_eq!(parse_year_month("sometime in 2019"), None);
    }

    #[test]
    fn test_parse_rejects_implausible_years() {
        assert_eq!(parse_year_month("Jan 300000000"), None);
        assert_eq!(parse_year_month("Jan -2147483648"), None);
        assert_eq!(parse_year_month("12/99999"), None);
        assert_eq!(parse_year_month("0001-03"), None);
        assert_eq!(parse_year_month("+12345-01-01"), None);
    }

    #[test]
    fn test_ongoing_markers() {
        assert!(is_ongoing_marker("Present"));
        assert!(is_ongoing_marker(" current "));
        assert!(!is_ongoing_marker("2020-01"));
    }

    #[test]
    fn test_months_between_ignores_day_of_month() {
        assert_eq!(months_between(ym(2019, 1), ym(2022, 1)), 36);
        assert_eq!(months_between(ym(2019, 11), ym(2020, 2)), 3);
        assert_eq!(months_between(ym(2020, 5), ym(2020, 5)), 0);
    }

    #[test]
    fn test_months_between_floors_reversed_ranges() {
        assert_eq!(months_between(ym(2022, 1), ym(2019, 1)), 0);
    }

    #[test]
    fn test_months_between_saturates_at_extremes() {
        let start = YearMonth { year: i32::MIN, month: 1 };
        let end = YearMonth { year: i32::MAX, month: 12 };
        assert_eq!(months_between(start, end), u32::MAX);
        assert_eq!(months_between(end, start), 0);
    }

    #[test]
    fn test_months_between_is_monotonic_in_end() {
        let start = ym(2018, 6);
        let mut previous = 0;
        for year in 2018..2024 {
            for month in 1..=12 {
                let current = months_between(start, ym(year, month));
                assert!(current >= previous);
                previous = current;
            }
        }
    }
}
