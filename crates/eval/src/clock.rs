//! Source of "today" for date helpers.

use std::fmt;

use time::{Date, OffsetDateTime};

pub trait Clock: Send + Sync + fmt::Debug {
    fn today(&self) -> Date;
}

/// The current UTC date.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Date {
        OffsetDateTime::now_utc().date()
    }
}

/// A frozen date, for tests and reproducible renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub Date);

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}
