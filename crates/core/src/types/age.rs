//! Legal drinking age checks.

use chrono::{Datelike, NaiveDate};

/// Full years elapsed between `date_of_birth` and `today`.
///
/// Returns `None` when `date_of_birth` is in the future.
#[must_use]
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    if date_of_birth > today {
        return None;
    }
    let mut years = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

/// Whether someone born on `date_of_birth` is at least `min_age` on `today`.
///
/// People born on Feb 29 come of age on Mar 1 in non-leap years.
#[must_use]
pub fn is_of_legal_age(date_of_birth: NaiveDate, today: NaiveDate, min_age: u32) -> bool {
    age_on(date_of_birth, today).is_some_and(|age| age >= min_age)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_birthday_boundary() {
        assert!(!is_of_legal_age(date(2004, 10, 20), date(2025, 10, 19), 21));
        assert!(is_of_legal_age(date(2004, 10, 19), date(2025, 10, 19), 21));
    }

    #[test]
    fn test_leap_day_birthday() {
        assert!(!is_of_legal_age(date(2004, 2, 29), date(2025, 2, 28), 21));
        assert!(is_of_legal_age(date(2004, 2, 29), date(2025, 3, 1), 21));
    }

    #[test]
    fn test_future_birth_date() {
        assert_eq!(age_on(date(2030, 1, 1), date(2025, 1, 1)), None);
        assert!(!is_of_legal_age(date(2030, 1, 1), date(2025, 1, 1), 0));
    }
}
