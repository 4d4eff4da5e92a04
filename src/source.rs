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

//! Event sources: raw hidraw reads or HID debugfs report traces.
//!
//! Both variants hand out the payload of one report per call, borrowed from a
//! buffer the source owns and reuses across calls.

use std::io::{self, BufRead};

use tracing::{debug, trace};

use crate::constants::sizes::{INITIAL_LINE_BUFFER, MAX_LINE_BUFFER};
use crate::error::{RecorderError, Result};
use crate::hidraw::PrimaryChannel;
use crate::timestamp::Offset;

/// One captured report with its offset from the first report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRecord<'a> {
    pub offset: Offset,
    pub payload: &'a [u8],
}

impl EventRecord<'_> {
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Result of one blocking read on a source
#[derive(Debug)]
pub enum ReadOutcome<'a> {
    Event(&'a [u8]),
    EndOfStream,
    ReadError(io::Error),
}

/// Which channel a session captures from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Raw,
    Text,
}

fn reserve(buf: &mut Vec<u8>, additional: usize) -> Result<()> {
    buf.try_reserve(additional).map_err(|_| RecorderError::Allocation {
        requested: buf.len().saturating_add(additional),
    })
}

/// `reserve`, refusing to grow `buf` past `limit` bytes
fn reserve_within(buf: &mut Vec<u8>, additional: usize, limit: usize) -> Result<()> {
    let requested = buf.len().saturating_add(additional);
    if requested > limit {
        return Err(RecorderError::Allocation { requested });
    }
    reserve(buf, additional)
}

// ============================================================================
// Raw hidraw frames
// ============================================================================

/// Reads one report per call from the primary channel
#[derive(Debug)]
pub struct RawSource<C> {
    channel: C,
    buf: Vec<u8>,
}

impl<C: PrimaryChannel> RawSource<C> {
    pub fn new(channel: C, capacity: usize) -> Result<Self> {
        let mut buf = Vec::new();
        reserve(&mut buf, capacity)?;
        buf.resize(capacity, 0);
        Ok(Self { channel, buf })
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn next(&mut self) -> ReadOutcome<'_> {
        match self.channel.read_report(&mut self.buf) {
            Ok(0) => ReadOutcome::EndOfStream,
            Ok(n) => ReadOutcome::Event(&self.buf[..n]),
            Err(e) => ReadOutcome::ReadError(e),
        }
    }
}

// ============================================================================
// debugfs report traces
// ============================================================================

/// `report (size N) (TYPE) = HEX`, fields borrowed from the line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportLine<'a> {
    pub size: usize,
    pub kind: &'a str,
    pub hex: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Report(ReportLine<'a>),
    /// Starts like a report line but a field does not parse
    Malformed(&'static str),
    /// Any other trace output
    Other,
}

/// Tokenize one debugfs events line.
pub fn parse_report_line(line: &str) -> LineKind<'_> {
    let line = line.trim_end_matches(['\n', '\r']);
    let Some(rest) = line.strip_prefix("report (size ") else {
        return LineKind::Other;
    };
    let Some((size_text, rest)) = rest.split_once(") (") else {
        return LineKind::Malformed("missing report type");
    };
    let Ok(size) = size_text.parse::<usize>() else {
        return LineKind::Malformed("size is not a decimal number");
    };
    let Some((kind, hex)) = rest.split_once(") =") else {
        return LineKind::Malformed("missing payload separator");
    };
    LineKind::Report(ReportLine { size, kind, hex: hex.trim() })
}

/// Decode space separated or packed hex into `out`, false on bad digits.
pub fn decode_hex_payload(hex: &str, out: &mut Vec<u8>) -> bool {
    for token in hex.split_ascii_whitespace() {
        if token.len() % 2 != 0 {
            return false;
        }
        for pair in token.as_bytes().chunks(2) {
            let mut byte = [0u8; 1];
            if hex::decode_to_slice(pair, &mut byte).is_err() {
                return false;
            }
            out.push(byte[0]);
        }
    }
    true
}

enum LineStatus {
    Complete,
    Eof,
    Failed(io::Error),
}

/// Read up to and including the next newline, growing `line` only as needed.
fn read_line<R: BufRead>(reader: &mut R, line: &mut Vec<u8>, limit: usize) -> Result<LineStatus> {
    line.clear();
    loop {
        let available = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Ok(LineStatus::Failed(e)),
        };
        if available.is_empty() {
            return Ok(if line.is_empty() { LineStatus::Eof } else { LineStatus::Complete });
        }
        let (chunk, done) = match available.iter().position(|&b| b == b'\n') {
            Some(i) => (&available[..=i], true),
            None => (available, false),
        };
        let used = chunk.len();
        reserve_within(line, used, limit)?;
        line.extend_from_slice(chunk);
        reader.consume(used);
        if done {
            return Ok(LineStatus::Complete);
        }
    }
}

/// Reads debugfs trace lines and yields the payload of each report line
#[derive(Debug)]
pub struct TextSource<R> {
    reader: R,
    line: Vec<u8>,
    payload: Vec<u8>,
    line_limit: usize,
}

impl<R: BufRead> TextSource<R> {
    pub fn new(reader: R) -> Result<Self> {
        Self::with_line_limit(reader, MAX_LINE_BUFFER)
    }

    /// Source whose line buffer never grows past `line_limit` bytes.
    ///
    /// A longer line fails with `RecorderError::Allocation`.
    pub fn with_line_limit(reader: R, line_limit: usize) -> Result<Self> {
        let mut line = Vec::new();
        reserve(&mut line, INITIAL_LINE_BUFFER.min(line_limit))?;
        Ok(Self { reader, line, payload: Vec::new(), line_limit })
    }

    pub fn line_capacity(&self) -> usize {
        self.line.capacity()
    }

    /// Block until the next report line, skipping everything else.
    ///
    /// `Err` only for a failed buffer allocation.
    pub fn next(&mut self) -> Result<ReadOutcome<'_>> {
        loop {
            match read_line(&mut self.reader, &mut self.line, self.line_limit)? {
                LineStatus::Complete => {}
                LineStatus::Eof => return Ok(ReadOutcome::EndOfStream),
                LineStatus::Failed(e) => return Ok(ReadOutcome::ReadError(e)),
            }
            let Ok(text) = std::str::from_utf8(&self.line) else {
                trace!("Skipping non UTF-8 trace line");
                continue;
            };
            match parse_report_line(text) {
                LineKind::Report(report) => {
                    self.payload.clear();
                    reserve(&mut self.payload, self.line.len())?;
                    if !decode_hex_payload(report.hex, &mut self.payload) {
                        debug!(line = text.trim_end(), "Skipping report with bad hex payload");
                    } else if self.payload.len() != report.size {
                        debug!(
                            declared = report.size,
                            decoded = self.payload.len(),
                            "Skipping report whose size disagrees with its payload"
                        );
                    } else {
                        return Ok(ReadOutcome::Event(&self.payload));
                    }
                }
                LineKind::Malformed(reason) => {
                    debug!(reason, line = text.trim_end(), "Skipping malformed report line");
                }
                LineKind::Other => {}
            }
        }
    }
}

// ============================================================================
// Session source
// ============================================================================

/// The one capture channel of a session, fixed at construction.
///
/// The text variant keeps the primary channel open for the whole session:
/// closing the hidraw node can power the device down.
#[derive(Debug)]
pub enum EventSource<C, R> {
    Raw(RawSource<C>),
    Text { source: TextSource<R>, primary: C },
}

impl<C: PrimaryChannel, R: BufRead> EventSource<C, R> {
    pub fn raw(channel: C, capacity: usize) -> Result<Self> {
        Ok(Self::Raw(RawSource::new(channel, capacity)?))
    }

    pub fn text(primary: C, reader: R) -> Result<Self> {
        Ok(Self::Text { source: TextSource::new(reader)?, primary })
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Raw(_) => SourceKind::Raw,
            Self::Text { .. } => SourceKind::Text,
        }
    }

    pub fn primary(&self) -> &C {
        match self {
            Self::Raw(raw) => raw.channel(),
            Self::Text { primary, .. } => primary,
        }
    }

    pub fn next(&mut self) -> Result<ReadOutcome<'_>> {
        match self {
            Self::Raw(raw) => Ok(raw.next()),
            Self::Text { source, .. } => source.next(),
        }
    }
}
