use std::fmt;

use chrono::{DateTime, Datelike, Timelike, Utc};

/// Point in time a photo or video was captured, normalized to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CaptureTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl CaptureTime {
    /// Convert unix seconds to a UTC capture time.
    ///
    /// # Errors
    /// Returns an error if the timestamp is outside the range chrono can represent.
    pub fn from_unix(seconds: i64) -> anyhow::Result<Self> {
        let datetime = DateTime::<Utc>::from_timestamp(seconds, 0)
            .ok_or_else(|| anyhow::anyhow!("Timestamp out of range: {seconds}"))?;
        Ok(Self::from(datetime))
    }

    /// Year and month key, for example `2021_01`.
    #[must_use]
    pub fn month_key(&self) -> String {
        format!("{}_{:02}", self.year, self.month)
    }

    /// Full date and time key, for example `2021_01_01_123055`.
    #[must_use]
    pub fn stamp(&self) -> String {
        format!(
            "{}_{:02}_{:02}_{:02}{:02}{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl From<DateTime<Utc>> for CaptureTime {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self {
            year: datetime.year(),
            month: datetime.month(),
            day: datetime.day(),
            hour: datetime.hour(),
            minute: datetime.minute(),
            second: datetime.second(),
        }
    }
}

impl fmt::Display for CaptureTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_year_2021() {
        let time = CaptureTime::from_unix(1_609_459_200).unwrap();
        assert_eq!(time.year, 2021);
        assert_eq!(time.month, 1);
        assert_eq!(time.day, 1);
        assert_eq!(time.month_key(), "2021_01");
        assert_eq!(time.stamp(), "2021_01_01_000000");
    }

    #[test]
    fn test_time_of_day_is_padded() {
        // 2019-07-04T09:05:03Z
        let time = CaptureTime::from_unix(1_562_231_103).unwrap();
        assert_eq!(time.stamp(), "2019_07_04_090503");
        assert_eq!(time.to_string(), "2019-07-04 09:05:03 UTC");
    }

    #[test]
    fn test_negative_timestamp_before_epoch() {
        let time = CaptureTime::from_unix(-86_400).unwrap();
        assert_eq!(time.month_key(), "1969_12");
        assert_eq!(time.day, 31);
    }

    #[test]
    fn test_out_of_range_timestamp() {
        assert!(CaptureTime::from_unix(i64::MAX).is_err());
    }
}
