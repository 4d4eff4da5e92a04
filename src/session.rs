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

//! Capture session: one descriptor, one identity, one event source.

use std::io::{self, BufRead, Write};

use tracing::{debug, info, trace};

use crate::descriptor::{DeviceIdentity, DeviceSnapshot, ReportDescriptor};
use crate::encoder::Encoder;
use crate::error::Result;
use crate::hidraw::PrimaryChannel;
use crate::source::{EventRecord, EventSource, ReadOutcome, SourceKind};
use crate::timestamp::{Clock, SystemClock, Timestamper};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    WaitingForEvent,
    Done,
}

/// Why a capture loop stopped
#[derive(Debug)]
pub enum SessionEnd {
    EndOfStream,
    ReadError(io::Error),
}

impl SessionEnd {
    /// Non-zero status for the process; the errno of a failed read when known
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::EndOfStream => 1,
            Self::ReadError(e) => e.raw_os_error().filter(|c| *c > 0).unwrap_or(1),
        }
    }
}

#[derive(Debug)]
pub struct CaptureSession<C, R, K = SystemClock> {
    descriptor: ReportDescriptor,
    identity: DeviceIdentity,
    source: EventSource<C, R>,
    timestamper: Timestamper,
    clock: K,
    state: CaptureState,
}

impl<C: PrimaryChannel, R: BufRead> CaptureSession<C, R, SystemClock> {
    pub fn new(snapshot: DeviceSnapshot, source: EventSource<C, R>) -> Self {
        Self::with_clock(snapshot, source, SystemClock)
    }
}

impl<C: PrimaryChannel, R: BufRead, K: Clock> CaptureSession<C, R, K> {
    pub fn with_clock(snapshot: DeviceSnapshot, source: EventSource<C, R>, clock: K) -> Self {
        Self {
            descriptor: snapshot.descriptor,
            identity: snapshot.identity,
            source,
            timestamper: Timestamper::new(),
            clock,
            state: CaptureState::Idle,
        }
    }

    pub fn descriptor(&self) -> &ReportDescriptor {
        &self.descriptor
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source.kind()
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    fn transition(&mut self, next: CaptureState) {
        trace!(from = ?self.state, to = ?next, "Capture state change");
        self.state = next;
    }

    /// R, N, P and I lines for this session
    pub fn write_header<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_header(&self.descriptor, &self.identity)
    }

    /// Emit one `E:` line per captured report until the source ends.
    ///
    /// Consumes the session; its channels close when this returns, whatever
    /// the reason.
    pub fn run<W: Write>(mut self, encoder: &mut Encoder<W>) -> Result<SessionEnd> {
        info!(source = ?self.source.kind(), "Capturing events");
        self.transition(CaptureState::WaitingForEvent);
        let mut count: u64 = 0;

        loop {
            let outcome = match self.source.next() {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.state = CaptureState::Done;
                    return Err(e);
                }
            };
            let end = match outcome {
                ReadOutcome::Event(payload) => {
                    let offset = self.timestamper.stamp(self.clock.now());
                    encoder.write_event(&EventRecord { offset, payload })?;
                    count += 1;
                    continue;
                }
                ReadOutcome::EndOfStream => SessionEnd::EndOfStream,
                ReadOutcome::ReadError(e) => SessionEnd::ReadError(e),
            };
            self.transition(CaptureState::Done);
            debug!(events = count, end = ?end, "Capture loop finished");
            return Ok(end);
        }
    }
}
