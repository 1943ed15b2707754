use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone, Utc};

/// Midnight of `now`'s calendar day in its own timezone, expressed in UTC.
///
/// When DST skips midnight the first representable instant after it is used.
pub fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let tz = now.timezone();
    let midnight = now.date_naive().and_time(NaiveTime::MIN);

    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map(|start| start.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc))
}

pub fn start_of_local_day() -> DateTime<Utc> {
    start_of_day(&Local::now())
}

/// Daily quota for non-premium requesters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub daily_limit: u64,
}

impl QuotaPolicy {
    pub fn new(daily_limit: u64) -> Self {
        Self { daily_limit }
    }

    pub fn is_exceeded(&self, readings_today: u64) -> bool {
        readings_today >= self.daily_limit
    }
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self::new(1)
    }
}
