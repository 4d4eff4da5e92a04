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

//! Text transcript encoding.
//!
//! ```text
//! R: <size> <byte> ...
//! N: <name>
//! P: <physical path>
//! I: <bus> <vendor> <product>
//! E: <sec>.<usec> <length> <byte> ...
//! ```
//!
//! Bytes are two-digit lowercase hex. Every line is flushed as soon as it is
//! written so a reader tailing the output sees events without delay.

use std::fmt::Write as _;
use std::io::Write;

use crate::descriptor::{DeviceIdentity, ReportDescriptor};
use crate::error::{RecorderError, Result};
use crate::source::EventRecord;

fn append_hex_bytes(out: &mut String, bytes: &[u8]) {
    for b in bytes {
        let _ = write!(out, " {:02x}", b);
    }
}

/// Bytes as space separated two-digit hex, no leading or trailing space
pub fn format_hex_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    if let Some((first, rest)) = bytes.split_first() {
        let _ = write!(out, "{:02x}", first);
        append_hex_bytes(&mut out, rest);
    }
    out
}

pub fn render_descriptor(descriptor: &ReportDescriptor) -> String {
    let mut line = format!("R: {}", descriptor.size());
    append_hex_bytes(&mut line, descriptor.bytes());
    line
}

pub fn render_name(identity: &DeviceIdentity) -> String {
    format!("N: {}", identity.name)
}

pub fn render_phys(identity: &DeviceIdentity) -> String {
    format!("P: {}", identity.physical_path)
}

pub fn render_info(identity: &DeviceIdentity) -> String {
    format!(
        "I: {:x} {:04x} {:04x}",
        identity.bus_type, identity.vendor_id, identity.product_id
    )
}

pub fn render_event(event: &EventRecord<'_>) -> String {
    let mut line = format!("E: {} {}", event.offset, event.len());
    append_hex_bytes(&mut line, event.payload);
    line
}

/// Writes transcript lines to an output stream
#[derive(Debug)]
pub struct Encoder<W: Write> {
    out: W,
}

impl<W: Write> Encoder<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, line: &str) -> Result<()> {
        writeln!(self.out, "{}", line).map_err(RecorderError::Output)?;
        self.out.flush().map_err(RecorderError::Output)
    }

    pub fn write_descriptor(&mut self, descriptor: &ReportDescriptor) -> Result<()> {
        self.emit(&render_descriptor(descriptor))
    }

    pub fn write_name(&mut self, identity: &DeviceIdentity) -> Result<()> {
        self.emit(&render_name(identity))
    }

    pub fn write_phys(&mut self, identity: &DeviceIdentity) -> Result<()> {
        self.emit(&render_phys(identity))
    }

    pub fn write_info(&mut self, identity: &DeviceIdentity) -> Result<()> {
        self.emit(&render_info(identity))
    }

    /// R, N, P and I lines in that order
    pub fn write_header(
        &mut self,
        descriptor: &ReportDescriptor,
        identity: &DeviceIdentity,
    ) -> Result<()> {
        self.write_descriptor(descriptor)?;
        self.write_name(identity)?;
        self.write_phys(identity)?;
        self.write_info(identity)
    }

    pub fn write_event(&mut self, event: &EventRecord<'_>) -> Result<()> {
        self.emit(&render_event(event))
    }
}
