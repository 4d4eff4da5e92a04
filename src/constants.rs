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

//! Constants for hid-recorder
//!
//! Paths, file names and buffer sizes used across the crate.

/// System paths
pub mod paths {
    /// Directory holding the hidraw device nodes
    pub const HIDRAW_DIR: &str = "/dev";

    /// Name prefix of hidraw device nodes
    pub const HIDRAW_PREFIX: &str = "hidraw";

    /// HID debugfs root, one subdirectory per bound device
    pub const HID_DEBUGFS_DIR: &str = "/sys/kernel/debug/hid";

    /// Per-device file holding the report descriptor as hex text
    pub const RDESC_FILE: &str = "rdesc";

    /// Per-device stream of textual report traces
    pub const EVENTS_FILE: &str = "events";

    /// Config directory name under XDG_CONFIG_HOME
    pub const CONFIG_DIR_NAME: &str = "hid-recorder";

    /// Config file name
    pub const CONFIG_FILE: &str = "config.json";
}

/// Sizes of kernel structures and buffers
pub mod sizes {
    /// HID_MAX_DESCRIPTOR_SIZE from linux/hid.h
    pub const HID_MAX_DESCRIPTOR_SIZE: usize = 4096;

    /// Capacity of one raw hidraw read
    pub const RAW_READ_BUFFER: usize = 4096;

    /// Upper bound accepted for a configured read buffer
    pub const MAX_READ_BUFFER: usize = 65536;

    /// Length passed to HIDIOCGRAWNAME / HIDIOCGRAWPHYS
    pub const IDENTITY_STRING_LEN: usize = 256;

    /// Initial capacity of the debugfs line buffer
    pub const INITIAL_LINE_BUFFER: usize = 1024;

    /// Largest debugfs line the line buffer may grow to
    pub const MAX_LINE_BUFFER: usize = 16 * 1024 * 1024;
}
