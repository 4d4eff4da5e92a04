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

//! Unified error handling for hid-recorder
//!
//! A single error type shared by every stage of a capture session.
//! Candidate-level failures in the debugfs scan are logged and skipped by the
//! locator; everything else here ends the session.

use std::io;
use std::path::PathBuf;

/// Result type alias using RecorderError
pub type Result<T> = std::result::Result<T, RecorderError>;

#[derive(thiserror::Error, Debug)]
pub enum RecorderError {
    // ============================================================================
    // Primary channel
    // ============================================================================
    #[error("{query} failed: {source}")]
    ChannelQuery {
        query: &'static str,
        source: io::Error,
    },

    #[error("Failed to open {path}: {source}")]
    DeviceOpen {
        path: PathBuf,
        source: io::Error,
    },

    // ============================================================================
    // Debug channel
    // ============================================================================
    #[error("Failed to read debug candidate {path}: {source}")]
    CandidateRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to open debug event stream {path}: {source}")]
    EventStreamOpen {
        path: PathBuf,
        source: io::Error,
    },

    // ============================================================================
    // Capture loop
    // ============================================================================
    #[error("Failed to grow capture buffer to {requested} bytes")]
    Allocation {
        requested: usize,
    },

    #[error("Failed to write transcript: {0}")]
    Output(io::Error),

    // ============================================================================
    // Configuration and device selection
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("No hidraw device found in {0}")]
    NoDevice(PathBuf),

    #[error("Invalid device selection: {0}")]
    InvalidSelection(String),
}

impl RecorderError {
    /// Wrap a failed primary-channel query
    pub fn query(query: &'static str, source: io::Error) -> Self {
        Self::ChannelQuery { query, source }
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Exit status the binary reports for this error.
    ///
    /// Uses the errno of the underlying OS error when there is one.
    pub fn exit_code(&self) -> i32 {
        let source = match self {
            Self::ChannelQuery { source, .. }
            | Self::DeviceOpen { source, .. }
            | Self::CandidateRead { source, .. }
            | Self::EventStreamOpen { source, .. }
            | Self::Output(source)
            | Self::Io(source) => Some(source),
            Self::Allocation { .. } => return libc::ENOMEM,
            _ => None,
        };
        source
            .and_then(|e| e.raw_os_error())
            .filter(|code| *code > 0)
            .unwrap_or(1)
    }
}
