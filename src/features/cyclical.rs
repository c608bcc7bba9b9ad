//! Sine/cosine encodings of hour-of-day and day-of-week.

use chrono::{DateTime, Datelike, Timelike, Utc};
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CyclicalTime {
    pub hour_sin: f64,
    pub hour_cos: f64,
    pub dow_sin: f64,
    pub dow_cos: f64,
}

impl CyclicalTime {
    /// Hour has period 24, day of week period 7 with Monday = 0.
    pub fn encode(ts: DateTime<Utc>) -> Self {
        let hour = ts.hour() as f64;
        let dow = ts.weekday().num_days_from_monday() as f64;
        let (hour_sin, hour_cos) = (2.0 * PI * hour / 24.0).sin_cos();
        let (dow_sin, dow_cos) = (2.0 * PI * dow / 7.0).sin_cos();
        Self {
            hour_sin,
            hour_cos,
            dow_sin,
            dow_cos,
        }
    }
}
