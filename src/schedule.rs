use std::fmt::Display;
use std::time::{Duration, Instant};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Default time between two polls.
pub const DEFAULT_CYCLE: Duration = Duration::from_secs(1);

/// Polling cadence and cycle limit of a run.
#[derive(Debug)]
pub struct Schedule {
    period: Duration,
    limit: u32,
    count: u32,
    ticks: Option<Interval>,
}

impl Schedule {
    /// `limit == 0` means no limit, a zero `period` polls back to back.
    pub fn new(period: Duration, limit: u32) -> Self {
        Self {
            period,
            limit,
            count: 0,
            ticks: None,
        }
    }

    /// Waits until the next cycle is due.
    ///
    /// The first cycle starts immediately, every further one a period after
    /// the previous one started, or later if that one overran.
    pub async fn next_cycle(&mut self) {
        if self.period.is_zero() {
            tokio::task::yield_now().await;
            return;
        }
        let period = self.period;
        self.ticks
            .get_or_insert_with(|| {
                let mut ticks = interval(period);
                ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticks
            })
            .tick()
            .await;
    }

    /// Counts a finished cycle, returns whether another one is due.
    pub fn finish_cycle(&mut self) -> bool {
        self.count = self.count.saturating_add(1);
        self.limit == 0 || self.count < self.limit
    }
}

/// Prefix printed in front of every reading.
#[derive(Debug, Clone, Default)]
pub struct Stamp {
    seconds: bool,
    time_format: Option<String>,
    start: Option<Instant>,
}

impl Stamp {
    pub fn new(seconds: bool, time: bool, date_format: Option<&str>) -> Self {
        let time_format = time.then(|| match date_format {
            Some(date) => format!("{} %T", date),
            None => String::from("%T"),
        });
        Self {
            seconds,
            time_format,
            start: None,
        }
    }

    /// The first call sets the zero point of the elapsed seconds.
    pub fn prefix<Tz>(&mut self, now: Instant, local: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut out = String::new();
        if self.seconds {
            let start = *self.start.get_or_insert(now);
            out.push_str(&elapsed(now.duration_since(start)));
        }
        if let Some(fmt) = &self.time_format {
            out.push_str(&clock(local, fmt));
        }
        out
    }
}

/// `S.mmm ` with a trailing space.
pub fn elapsed(d: Duration) -> String {
    format!("{}.{:03} ", d.as_secs(), d.subsec_millis())
}

/// Time formatted by `fmt` followed by milliseconds and a space.
pub fn clock<Tz>(t: &DateTime<Tz>, fmt: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("{}.{:03} ", t.format(fmt), t.timestamp_subsec_millis() % 1000)
}

/// Whether chrono understands every specifier of `fmt`.
pub fn is_valid_format(fmt: &str) -> bool {
    !StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error))
}
