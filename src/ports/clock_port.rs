//! Clock port trait.

use chrono::{DateTime, Utc};

/// Source of "now" for time-windowed calculations.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

impl<T: Clock + ?Sized> Clock for Box<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
