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

//! Primary device channel: a Linux hidraw node.
//!
//! Queries go through the hidraw ioctls from `linux/hidraw.h`; reports are
//! read with plain blocking `read(2)` calls.

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::mem::size_of;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::constants::sizes::{HID_MAX_DESCRIPTOR_SIZE, IDENTITY_STRING_LEN};
use crate::error::{RecorderError, Result};

// ═══════════════════════════════════════════════════════════════════════
//  hidraw ioctl constants (from linux/hidraw.h)
// ═══════════════════════════════════════════════════════════════════════

/// `_IOC(_IOC_READ, 'H', nr, size)`
///
/// `libc::Ioctl` is `c_int` on musl and `c_ulong` on glibc; the request
/// numbers are built as u32 and cast.
const fn hid_ioc_read(nr: u32, size: usize) -> libc::Ioctl {
    ((2u32 << 30) | ((size as u32) << 16) | (0x48 << 8) | nr) as libc::Ioctl
}

/// struct hidraw_report_descriptor
#[repr(C)]
struct HidrawReportDescriptor {
    size: u32,
    value: [u8; HID_MAX_DESCRIPTOR_SIZE],
}

/// struct hidraw_devinfo
#[repr(C)]
#[derive(Default)]
struct HidrawDevinfo {
    bustype: u32,
    vendor: i16,
    product: i16,
}

/// `_IOR('H', 0x01, int)`
pub const HIDIOCGRDESCSIZE: libc::Ioctl = hid_ioc_read(0x01, size_of::<libc::c_int>());
/// `_IOR('H', 0x02, struct hidraw_report_descriptor)`
pub const HIDIOCGRDESC: libc::Ioctl = hid_ioc_read(0x02, size_of::<HidrawReportDescriptor>());
/// `_IOR('H', 0x03, struct hidraw_devinfo)`
pub const HIDIOCGRAWINFO: libc::Ioctl = hid_ioc_read(0x03, size_of::<HidrawDevinfo>());
/// `HIDIOCGRAWNAME(256)`
pub const HIDIOCGRAWNAME: libc::Ioctl = hid_ioc_read(0x04, IDENTITY_STRING_LEN);
/// `HIDIOCGRAWPHYS(256)`
pub const HIDIOCGRAWPHYS: libc::Ioctl = hid_ioc_read(0x05, IDENTITY_STRING_LEN);

/// Bus and USB-style ids as reported by HIDIOCGRAWINFO
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawInfo {
    pub bus_type: u32,
    pub vendor: u16,
    pub product: u16,
}

/// Everything the recorder needs from the primary channel.
///
/// Queries take `&self`; only the report read mutates the channel.
#[cfg_attr(test, mockall::automock)]
pub trait PrimaryChannel {
    /// Length of the report descriptor in bytes
    fn descriptor_size(&self) -> io::Result<usize>;
    /// First `size` bytes of the report descriptor
    fn descriptor(&self, size: usize) -> io::Result<Vec<u8>>;
    fn name(&self) -> io::Result<String>;
    fn phys(&self) -> io::Result<String>;
    fn raw_info(&self) -> io::Result<RawInfo>;
    /// Blocking read of one report; returns the number of bytes placed in `buf`
    fn read_report(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// An open `/dev/hidrawN` node
#[derive(Debug)]
pub struct HidrawDevice {
    file: File,
}

impl HidrawDevice {
    /// Open a hidraw node read/write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| RecorderError::DeviceOpen { path: path.clone(), source })?;
        debug!(path = %path.display(), "Opened hidraw device");
        Ok(Self { file })
    }

    fn ioctl<T>(&self, request: libc::Ioctl, arg: *mut T) -> io::Result<libc::c_int> {
        // SAFETY: `arg` points at a live value whose size matches the size
        // encoded in `request`, and the fd stays open for the call.
        let res = unsafe { libc::ioctl(self.file.as_raw_fd(), request, arg) };
        if res < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(res)
        }
    }

    fn identity_string(&self, request: libc::Ioctl) -> io::Result<String> {
        let mut buf = [0u8; IDENTITY_STRING_LEN];
        self.ioctl(request, buf.as_mut_ptr())?;
        let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
    }
}

impl PrimaryChannel for HidrawDevice {
    fn descriptor_size(&self) -> io::Result<usize> {
        let mut size: libc::c_int = 0;
        self.ioctl(HIDIOCGRDESCSIZE, &mut size as *mut libc::c_int)?;
        usize::try_from(size).map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "negative descriptor size"))
    }

    fn descriptor(&self, size: usize) -> io::Result<Vec<u8>> {
        if size > HID_MAX_DESCRIPTOR_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("descriptor size {} exceeds {}", size, HID_MAX_DESCRIPTOR_SIZE),
            ));
        }
        let mut desc = Box::new(HidrawReportDescriptor {
            size: size as u32,
            value: [0; HID_MAX_DESCRIPTOR_SIZE],
        });
        self.ioctl(HIDIOCGRDESC, &mut *desc as *mut HidrawReportDescriptor)?;
        Ok(desc.value[..size].to_vec())
    }

    fn name(&self) -> io::Result<String> {
        self.identity_string(HIDIOCGRAWNAME)
    }

    fn phys(&self) -> io::Result<String> {
        self.identity_string(HIDIOCGRAWPHYS)
    }

    fn raw_info(&self) -> io::Result<RawInfo> {
        let mut info = HidrawDevinfo::default();
        self.ioctl(HIDIOCGRAWINFO, &mut info as *mut HidrawDevinfo)?;
        Ok(RawInfo {
            bus_type: info.bustype,
            vendor: info.vendor as u16,
            product: info.product as u16,
        })
    }

    fn read_report(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}
