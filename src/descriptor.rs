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

//! Report descriptor and device identity, fetched once per session.

use std::io;

use tracing::debug;

use crate::constants::sizes::HID_MAX_DESCRIPTOR_SIZE;
use crate::error::{RecorderError, Result};
use crate::hidraw::PrimaryChannel;

/// Immutable copy of a device's report descriptor.
///
/// The size is always the length of the byte vector.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportDescriptor {
    bytes: Vec<u8>,
}

impl ReportDescriptor {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceIdentity {
    pub bus_type: u16,
    pub vendor_id: u16,
    pub product_id: u16,
    pub name: String,
    pub physical_path: String,
}

/// Descriptor plus identity of the primary channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub descriptor: ReportDescriptor,
    pub identity: DeviceIdentity,
}

/// Query descriptor length, descriptor bytes, then identity.
///
/// Any failing query aborts the fetch; no partial snapshot is returned.
pub fn fetch<C: PrimaryChannel + ?Sized>(channel: &C) -> Result<DeviceSnapshot> {
    let size = channel
        .descriptor_size()
        .map_err(|e| RecorderError::query("HIDIOCGRDESCSIZE", e))?;
    if size > HID_MAX_DESCRIPTOR_SIZE {
        return Err(RecorderError::query(
            "HIDIOCGRDESCSIZE",
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("descriptor size {} exceeds {}", size, HID_MAX_DESCRIPTOR_SIZE),
            ),
        ));
    }

    let bytes = channel
        .descriptor(size)
        .map_err(|e| RecorderError::query("HIDIOCGRDESC", e))?;
    if bytes.len() != size {
        return Err(RecorderError::query(
            "HIDIOCGRDESC",
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {} descriptor bytes, got {}", size, bytes.len()),
            ),
        ));
    }

    let name = channel
        .name()
        .map_err(|e| RecorderError::query("HIDIOCGRAWNAME", e))?;
    let physical_path = channel
        .phys()
        .map_err(|e| RecorderError::query("HIDIOCGRAWPHYS", e))?;
    let info = channel
        .raw_info()
        .map_err(|e| RecorderError::query("HIDIOCGRAWINFO", e))?;

    let bus_type = u16::try_from(info.bus_type).map_err(|_| {
        RecorderError::query(
            "HIDIOCGRAWINFO",
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("bus type {:#x} does not fit in 16 bits", info.bus_type),
            ),
        )
    })?;

    debug!(size, name = %name, "Fetched report descriptor");

    Ok(DeviceSnapshot {
        descriptor: ReportDescriptor::new(bytes),
        identity: DeviceIdentity {
            bus_type,
            vendor_id: info.vendor,
            product_id: info.product,
            name,
            physical_path,
        },
    })
}
