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

//! hid-recorder - record HID reports as a replayable text transcript
//!
//! Reads the report descriptor and identity of a hidraw device, optionally
//! finds the HID debugfs entry mirroring it, and streams every report as an
//! `E:` line with its offset from the first report.

pub mod config;
pub mod constants;
pub mod debugfs;
pub mod descriptor;
pub mod encoder;
pub mod error;
pub mod hidraw;
pub mod select;
pub mod session;
pub mod source;
pub mod timestamp;

#[cfg(test)]
pub mod test_utils;

pub use error::{RecorderError, Result};
