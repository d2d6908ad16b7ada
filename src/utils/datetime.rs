use time::macros::format_description;
use time::{Duration, OffsetDateTime};

/// Source of wall clock time. Time is kept in UTC; NTP/RTC sync is done
/// outside the engine.
pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock that only moves when told to.
#[derive(Copy, Clone, Debug)]
pub struct ManualClock {
    now: OffsetDateTime,
}

impl ManualClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self { now }
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        self.now
    }
}

/// `2023-04-01 13:05:09`
pub fn timestamp(datetime: OffsetDateTime) -> Result<String, time::error::Format> {
    datetime.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
}

/// `2023-04-01`
pub fn date(datetime: OffsetDateTime) -> Result<String, time::error::Format> {
    datetime.format(format_description!("[year]-[month]-[day]"))
}

/// `2023-04-01_13-05-09`, usable in file names.
pub fn file_stamp(datetime: OffsetDateTime) -> Result<String, time::error::Format> {
    datetime.format(format_description!(
        "[year]-[month]-[day]_[hour]-[minute]-[second]"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn formats_are_zero_padded() {
        let t = datetime!(2023-04-01 03:05:09 UTC);

        assert_eq!(timestamp(t).unwrap(), "2023-04-01 03:05:09");
        assert_eq!(date(t).unwrap(), "2023-04-01");
        assert_eq!(file_stamp(t).unwrap(), "2023-04-01_03-05-09");
    }

    #[test]
    fn manual_clock_advances() {
        let mut clock = ManualClock::new(datetime!(2023-04-01 23:59:59 UTC));
        clock.advance(Duration::seconds(1));

        assert_eq!(timestamp(clock.now()).unwrap(), "2023-04-02 00:00:00");
    }
}
