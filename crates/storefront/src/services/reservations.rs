//! Taproom reservation rules.
//!
//! The backend has the final say on capacity; these checks catch the
//! obvious mistakes before a round trip.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use thiserror::Error;

use crate::backend::types::NewReservation;

/// Smallest party the taproom books.
pub const MIN_PARTY_SIZE: u32 = 1;

/// Largest party bookable online.
pub const MAX_PARTY_SIZE: u32 = 12;

/// How far ahead a table can be booked.
pub const BOOKING_HORIZON_DAYS: i64 = 60;

/// Spacing between bookable times.
pub const SLOT_MINUTES: u32 = 30;

const MAX_NOTES_LENGTH: usize = 500;

/// Why a reservation request was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReservationError {
    #[error("Please choose a date and time in the future.")]
    InPast,

    #[error("Reservations open {days} days in advance.")]
    BeyondHorizon { days: i64 },

    #[error("The taproom is open {opens} to {closes}.")]
    OutsideHours { opens: String, closes: String },

    #[error("Party size must be between {min} and {max}. Call us for larger groups.")]
    PartySize { min: u32, max: u32 },

    #[error("Notes must be at most {max} characters.")]
    NotesTooLong { max: usize },
}

/// Opening hours. `closes` before `opens` means the taproom closes after midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpeningHours {
    pub opens: NaiveTime,
    pub closes: NaiveTime,
}

impl OpeningHours {
    /// Whether a booking may start at `time`.
    #[must_use]
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.opens <= self.closes {
            time >= self.opens && time < self.closes
        } else {
            time >= self.opens || time < self.closes
        }
    }

    /// Bookable start times, every [`SLOT_MINUTES`] from opening.
    #[must_use]
    pub fn slots(&self) -> Vec<NaiveTime> {
        let step = Duration::minutes(i64::from(SLOT_MINUTES));
        let mut slots = Vec::new();
        let mut time = self.opens;
        // At most one day's worth of slots.
        for _ in 0..(24 * 60 / SLOT_MINUTES) {
            if !self.contains(time) {
                break;
            }
            slots.push(time);
            time += step;
            if time == self.opens {
                break;
            }
        }
        slots
    }

    fn describe(&self) -> (String, String) {
        (format_time(self.opens), format_time(self.closes))
    }
}

/// Format a time as "5:30 PM".
#[must_use]
pub fn format_time(time: NaiveTime) -> String {
    let (pm, hour) = time.hour12();
    format!(
        "{hour}:{:02} {}",
        time.minute(),
        if pm { "PM" } else { "AM" }
    )
}

/// A reservation as entered in the form.
#[derive(Debug, Clone)]
pub struct ReservationRequest {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: u32,
    pub notes: Option<String>,
}

impl ReservationRequest {
    /// Check the request against the clock and opening hours.
    ///
    /// # Errors
    ///
    /// Returns the first rule the request breaks.
    pub fn validate(
        self,
        now: NaiveDateTime,
        hours: OpeningHours,
    ) -> Result<NewReservation, ReservationError> {
        if !(MIN_PARTY_SIZE..=MAX_PARTY_SIZE).contains(&self.party_size) {
            return Err(ReservationError::PartySize {
                min: MIN_PARTY_SIZE,
                max: MAX_PARTY_SIZE,
            });
        }

        if self.date.and_time(self.time) <= now {
            return Err(ReservationError::InPast);
        }

        if self.date > now.date() + Duration::days(BOOKING_HORIZON_DAYS) {
            return Err(ReservationError::BeyondHorizon {
                days: BOOKING_HORIZON_DAYS,
            });
        }

        if !hours.contains(self.time) {
            let (opens, closes) = hours.describe();
            return Err(ReservationError::OutsideHours { opens, closes });
        }

        let notes = self
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if notes
            .as_ref()
            .is_some_and(|n| n.chars().count() > MAX_NOTES_LENGTH)
        {
            return Err(ReservationError::NotesTooLong {
                max: MAX_NOTES_LENGTH,
            });
        }

        Ok(NewReservation {
            date: self.date,
            time: self.time,
            party_size: self.party_size,
            notes,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn hours() -> OpeningHours {
        OpeningHours {
            opens: t(12, 0),
            closes: t(22, 0),
        }
    }

    fn now() -> NaiveDateTime {
        d(2026, 10, 19).and_time(t(15, 0))
    }

    fn request(date: NaiveDate, time: NaiveTime, party_size: u32) -> ReservationRequest {
        ReservationRequest {
            date,
            time,
            party_size,
            notes: Some("  window seat  ".to_string()),
        }
    }

    #[test]
    fn test_accepts_valid_request() {
        let reservation = request(d(2026, 10, 20), t(18, 30), 4)
            .validate(now(), hours())
            .unwrap();
        assert_eq!(reservation.party_size, 4);
        assert_eq!(reservation.notes.as_deref(), Some("window seat"));
    }

    #[test]
    fn test_rejects_past() {
        let err = request(d(2026, 10, 18), t(18, 0), 2)
            .validate(now(), hours())
            .unwrap_err();
        assert_eq!(err, ReservationError::InPast);

        // Earlier today
        let err = request(d(2026, 10, 19), t(13, 0), 2)
            .validate(now(), hours())
            .unwrap_err();
        assert_eq!(err, ReservationError::InPast);
    }

    #[test]
    fn test_rejects_beyond_horizon() {
        let last_day = now().date() + Duration::days(BOOKING_HORIZON_DAYS);
        assert!(request(last_day, t(18, 0), 2).validate(now(), hours()).is_ok());

        let err = request(last_day + Duration::days(1), t(18, 0), 2)
            .validate(now(), hours())
            .unwrap_err();
        assert!(matches!(err, ReservationError::BeyondHorizon { .. }));
    }

    #[test]
    fn test_rejects_outside_hours() {
        for time in [t(11, 30), t(22, 0), t(23, 0)] {
            let err = request(d(2026, 10, 20), time, 2)
                .validate(now(), hours())
                .unwrap_err();
            assert_eq!(
                err,
                ReservationError::OutsideHours {
                    opens: "12:00 PM".to_string(),
                    closes: "10:00 PM".to_string(),
                }
            );
        }
    }

    #[test]
    fn test_rejects_party_size() {
        for size in [0, 13] {
            let err = request(d(2026, 10, 20), t(18, 0), size)
                .validate(now(), hours())
                .unwrap_err();
            assert!(matches!(err, ReservationError::PartySize { min: 1, max: 12 }));
        }
        assert!(request(d(2026, 10, 20), t(18, 0), 12).validate(now(), hours()).is_ok());
    }

    #[test]
    fn test_slots() {
        let slots = hours().slots();
        assert_eq!(slots.first(), Some(&t(12, 0)));
        assert_eq!(slots.last(), Some(&t(21, 30)));
        assert_eq!(slots.len(), 20);
    }

    #[test]
    fn test_overnight_hours() {
        let late = OpeningHours {
            opens: t(18, 0),
            closes: t(1, 0),
        };
        assert!(late.contains(t(23, 30)));
        assert!(late.contains(t(0, 30)));
        assert!(!late.contains(t(1, 0)));
        assert_eq!(late.slots().len(), 14);
    }
}
