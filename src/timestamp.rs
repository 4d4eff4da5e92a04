/*
 * This file is part of hid-recorder.
 *
 * Copyright (C) 2025 hid-recorder contributors
 *
 * hid-recorder is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * hid-recorder is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with hid-recorder. If not, see <https://www.gnu.org/licenses/>.
 */

//! Event offsets relative to the first captured event.

use std::fmt;
use std::time::{Duration, SystemTime};

/// Source of arrival instants
pub trait Clock {
    fn now(&self) -> SystemTime;
}

/// Wall clock, the same time base `gettimeofday` reports
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Signed elapsed time at microsecond resolution.
///
/// Negative when the wall clock stepped backwards after the session started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Offset {
    micros: i64,
}

impl Offset {
    pub const ZERO: Offset = Offset { micros: 0 };

    pub fn from_micros(micros: i64) -> Self {
        Self { micros }
    }

    pub fn as_micros(&self) -> i64 {
        self.micros
    }

    pub fn is_negative(&self) -> bool {
        self.micros < 0
    }

    /// `now - first`, keeping the sign
    pub fn between(first: SystemTime, now: SystemTime) -> Self {
        match now.duration_since(first) {
            Ok(elapsed) => Self { micros: micros_of(elapsed) },
            Err(e) => Self { micros: -micros_of(e.duration()) },
        }
    }
}

fn micros_of(d: Duration) -> i64 {
    i64::try_from(d.as_micros()).unwrap_or(i64::MAX)
}

impl fmt::Display for Offset {
    /// `<seconds>.<6-digit microseconds>`, with a leading `-` when negative
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.micros < 0 { "-" } else { "" };
        let abs = self.micros.unsigned_abs();
        write!(f, "{}{}.{:06}", sign, abs / 1_000_000, abs % 1_000_000)
    }
}

/// Holds the session-start instant, set lazily by the first event
#[derive(Debug, Clone, Default)]
pub struct Timestamper {
    start: Option<SystemTime>,
}

impl Timestamper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) -> Option<SystemTime> {
        self.start
    }

    /// Offset of `now` from the first stamped instant.
    ///
    /// The first call records `now` as the start and returns zero.
    pub fn stamp(&mut self, now: SystemTime) -> Offset {
        match self.start {
            Some(first) => Offset::between(first, now),
            None => {
                self.start = Some(now);
                Offset::ZERO
            }
        }
    }
}
