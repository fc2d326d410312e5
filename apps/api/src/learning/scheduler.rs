//! Review scheduling: maps (previous interval, ease factor, rating) to the next
//! review state. Pure arithmetic, whole-day intervals, dates in UTC.
//!
//! | rating    | new interval                         | new ease          |
//! |-----------|--------------------------------------|-------------------|
//! | 1 Again   | 1                                    | max(1.3, e - 0.2) |
//! | 2 Hard    | max(1, floor(i * 1.2))               | max(1.3, e - 0.15)|
//! | 3 Good    | max(1, floor(i * e))                 | e                 |
//! | 4 Easy    | max(1, floor(i * e * 1.3))           | e + 0.15          |

use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const MIN_INTERVAL: i32 = 1;

const HARD_INTERVAL_MULTIPLIER: f64 = 1.2;
const EASY_BONUS: f64 = 1.3;
const AGAIN_EASE_PENALTY: f64 = 0.2;
const HARD_EASE_PENALTY: f64 = 0.15;
const EASY_EASE_BONUS: f64 = 0.15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Rating must be between 1 and 4, got {0}")]
    InvalidRating(i64),
}

/// User-reported recall quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(i16)]
pub enum Rating {
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl Rating {
    pub fn as_i16(self) -> i16 {
        self as i16
    }
}

impl TryFrom<i64> for Rating {
    type Error = SchedulerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Rating::Again),
            2 => Ok(Rating::Hard),
            3 => Ok(Rating::Good),
            4 => Ok(Rating::Easy),
            other => Err(SchedulerError::InvalidRating(other)),
        }
    }
}

/// Result of scheduling one rating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NextState {
    pub new_interval: i32,
    pub new_ease_factor: f64,
    pub next_review_date: NaiveDate,
}

/// Computes the next review state relative to `today`.
///
/// Out-of-range inputs (negative interval, ease below 1.3) are clamped first.
/// The output always has `new_interval >= 1` and `new_ease_factor >= 1.3`.
pub fn compute_next_state(
    previous_interval: i32,
    previous_ease_factor: f64,
    rating: Rating,
    today: NaiveDate,
) -> NextState {
    let interval = previous_interval.max(0) as f64;
    let ease = previous_ease_factor.max(MIN_EASE_FACTOR);

    let (raw_interval, new_ease_factor) = match rating {
        Rating::Again => (
            MIN_INTERVAL as f64,
            (ease - AGAIN_EASE_PENALTY).max(MIN_EASE_FACTOR),
        ),
        Rating::Hard => (
            interval * HARD_INTERVAL_MULTIPLIER,
            (ease - HARD_EASE_PENALTY).max(MIN_EASE_FACTOR),
        ),
        Rating::Good => (interval * ease, ease),
        Rating::Easy => (interval * ease * EASY_BONUS, ease + EASY_EASE_BONUS),
    };

    let new_interval = clamp_interval(raw_interval);
    NextState {
        new_interval,
        new_ease_factor,
        next_review_date: add_days(today, new_interval),
    }
}

/// `compute_next_state` anchored at the current UTC calendar date.
pub fn schedule_from_today(
    previous_interval: i32,
    previous_ease_factor: f64,
    rating: Rating,
) -> NextState {
    compute_next_state(
        previous_interval,
        previous_ease_factor,
        rating,
        Utc::now().date_naive(),
    )
}

fn clamp_interval(raw: f64) -> i32 {
    let floored = raw.floor();
    if floored >= i32::MAX as f64 {
        i32::MAX
    } else {
        (floored as i32).max(MIN_INTERVAL)
    }
}

fn add_days(date: NaiveDate, days: i32) -> NaiveDate {
    date.checked_add_days(Days::new(days.max(0) as u64))
        .unwrap_or(NaiveDate::MAX)
}
