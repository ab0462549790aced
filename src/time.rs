use std::{
    ops::{Add, AddAssign, Sub, SubAssign},
    sync::Arc,
};

/// A point in time expressed as seconds since service-day midnight.
///
/// Unlike `chrono::NaiveTime` this deliberately does not wrap at 24h: a trip
/// that departs after midnight on an overnight service is represented with a
/// value past `86_400`, exactly as GTFS `stop_times.txt` does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(u32);

impl From<u32> for Time {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Sub<Time> for Time {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        Duration(self.0 - rhs.0)
    }
}

impl Add<Duration> for Time {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign<Duration> for Time {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.0
    }
}

impl Time {
    pub const MIN: Time = Time(0);
    pub const MAX: Time = Time(u32::MAX);

    pub const fn from_seconds(secs: u32) -> Self {
        Self(secs)
    }

    pub const fn as_seconds(&self) -> u32 {
        self.0
    }

    pub fn to_hms_string(&self) -> String {
        let h = self.0 / 3600;
        let m = (self.0 % 3600) / 60;
        let s = self.0 % 60;
        format!("{h:02}:{m:02}:{s:02}")
    }

    /// Parses a GTFS-style `"HH:MM:SS"` timestamp, accepting hour values
    /// beyond 23 for overnight service.
    pub fn from_hms(time: &str) -> Option<Self> {
        const HOUR_TO_SEC: u32 = 60 * 60;
        const MINUTE_TO_SEC: u32 = 60;
        let mut split = time.split(':');
        let hours: u32 = split.next()?.parse().ok()?;
        let minutes: u32 = split.next()?.parse().ok()?;
        let seconds: u32 = split.next()?.parse().ok()?;
        if split.next().is_some() || minutes >= 60 || seconds >= 60 {
            return None;
        }
        Some(Self(hours * HOUR_TO_SEC + minutes * MINUTE_TO_SEC + seconds))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration(u32);

impl From<u32> for Duration {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Duration {
    pub const ZERO: Duration = Duration(0);

    pub const fn from_seconds(secs: u32) -> Self {
        Self(secs)
    }

    pub const fn as_seconds(&self) -> u32 {
        self.0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl Add for Duration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Duration {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0
    }
}

impl Sub for Duration {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Duration {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0
    }
}

/// Arc-interned identifier, so that cloning a `Stop`/`Trip` handle never
/// re-allocates the underlying id string.
pub type Id = Arc<str>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_unparse_midnight() {
        let time = "00:00:00";
        let stime = Time::from_hms(time).unwrap();
        assert_eq!(time, stime.to_hms_string());
    }

    #[test]
    fn parse_unparse_with_seconds() {
        let time = "12:30:30";
        let stime = Time::from_hms(time).unwrap();
        assert_eq!(time, stime.to_hms_string());
    }

    #[test]
    fn parses_overnight_hours_past_24() {
        let time = Time::from_hms("25:11:00").unwrap();
        assert_eq!(time.as_seconds(), 25 * 3600 + 11 * 60);
    }

    #[test]
    fn valid_time_seconds() {
        assert_eq!(Time::from_hms("00:01:30").unwrap().as_seconds(), 90);
        assert_eq!(Time::from_hms("01:01:30").unwrap().as_seconds(), 3690);
    }

    #[test]
    fn rejects_malformed_time() {
        assert!(Time::from_hms("00:00:0a").is_none());
        assert!(Time::from_hms("00:00").is_none());
        assert!(Time::from_hms("00:60:00").is_none());
        assert!(Time::from_hms("00:00:60").is_none());
    }

    #[test]
    fn duration_is_positive() {
        assert!(Duration::from_seconds(1).is_positive());
        assert!(!Duration::ZERO.is_positive());
    }
}
