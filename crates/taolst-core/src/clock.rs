//! Wall clock and J2000 timestamps.
//!
//! Set-time payloads count seconds and nanoseconds from the J2000 epoch
//! (2000-01-01T11:58:55.816 UTC). Only microsecond precision is carried;
//! the nanosecond field is always a multiple of 1000.

use time::{Duration, OffsetDateTime, macros::datetime};

pub const J2000: OffsetDateTime = datetime!(2000-01-01 11:58:55.816 UTC);

/// Source of "now" for reply generation.
pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// Seconds and nanoseconds since J2000, as carried by a set-time frame.
///
/// # Examples
/// ```
/// use taolst_core::{J2000, J2000Time};
/// use time::Duration;
///
/// let t = J2000Time::from_datetime(J2000 + Duration::milliseconds(1_500));
/// assert_eq!(t, J2000Time { seconds: 1, nanoseconds: 500_000_000 });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct J2000Time {
    pub seconds: u32,
    pub nanoseconds: u32,
}

impl J2000Time {
    /// Instants before J2000 saturate to zero and instants past the `u32`
    /// second range saturate to `u32::MAX` seconds.
    pub fn from_datetime(instant: OffsetDateTime) -> Self {
        let elapsed = instant - J2000;
        if elapsed.is_negative() {
            return Self {
                seconds: 0,
                nanoseconds: 0,
            };
        }
        let seconds = u32::try_from(elapsed.whole_seconds()).unwrap_or(u32::MAX);
        let nanoseconds = elapsed.subsec_microseconds().unsigned_abs() * 1_000;
        Self {
            seconds,
            nanoseconds,
        }
    }

    pub fn to_datetime(self) -> OffsetDateTime {
        J2000
            + Duration::seconds(i64::from(self.seconds))
            + Duration::nanoseconds(i64::from(self.nanoseconds))
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, FixedClock, J2000, J2000Time, SystemClock};
    use time::{Duration, macros::datetime};

    #[test]
    fn epoch_is_zero() {
        assert_eq!(
            J2000Time::from_datetime(J2000),
            J2000Time {
                seconds: 0,
                nanoseconds: 0
            }
        );
    }

    #[test]
    fn sub_microsecond_precision_is_dropped() {
        let instant = J2000 + Duration::seconds(10) + Duration::nanoseconds(123_456_789);
        let t = J2000Time::from_datetime(instant);
        assert_eq!(t.seconds, 10);
        assert_eq!(t.nanoseconds, 123_456_000);
    }

    #[test]
    fn before_epoch_saturates() {
        let t = J2000Time::from_datetime(datetime!(1999-12-31 00:00 UTC));
        assert_eq!(t.seconds, 0);
        assert_eq!(t.nanoseconds, 0);
    }

    #[test]
    fn known_instant() {
        // 2000-01-02T11:58:55.816Z is exactly one day after the epoch.
        let t = J2000Time::from_datetime(datetime!(2000-01-02 11:58:55.816 UTC));
        assert_eq!(t.seconds, 86_400);
        assert_eq!(t.nanoseconds, 0);
    }

    #[test]
    fn round_trips_through_datetime() {
        let t = J2000Time {
            seconds: 800_000_000,
            nanoseconds: 250_000,
        };
        assert_eq!(J2000Time::from_datetime(t.to_datetime()), t);
    }

    #[test]
    fn fixed_clock_is_fixed() {
        let clock = FixedClock(J2000);
        assert_eq!(clock.now(), J2000);
        assert!(SystemClock.now() > J2000);
    }
}
