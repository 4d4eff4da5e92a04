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

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::paths::{CONFIG_DIR_NAME, CONFIG_FILE, HID_DEBUGFS_DIR, HIDRAW_DIR};
use crate::constants::sizes::{MAX_READ_BUFFER, RAW_READ_BUFFER};
use crate::error::{RecorderError, Result};

fn default_hidraw_dir() -> PathBuf { PathBuf::from(HIDRAW_DIR) }
fn default_debugfs_dir() -> PathBuf { PathBuf::from(HID_DEBUGFS_DIR) }
fn default_read_buffer_size() -> usize { RAW_READ_BUFFER }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecorderConfig {
    /// Where hidraw nodes are listed for interactive selection
    #[serde(default = "default_hidraw_dir")]
    pub hidraw_dir: PathBuf,
    /// HID debugfs root scanned for a matching debug channel
    #[serde(default = "default_debugfs_dir")]
    pub debugfs_dir: PathBuf,
    /// Capture from debugfs when a matching entry exists
    #[serde(default)]
    pub use_debugfs: bool,
    /// Capacity of one raw hidraw read
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            hidraw_dir: default_hidraw_dir(),
            debugfs_dir: default_debugfs_dir(),
            use_debugfs: false,
            read_buffer_size: default_read_buffer_size(),
        }
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join(CONFIG_DIR_NAME).join(CONFIG_FILE);
    }
    if let Ok(home) = env::var("HOME") {
        return Path::new(&home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE);
    }
    PathBuf::from(CONFIG_FILE)
}

pub fn validate_config(cfg: &RecorderConfig) -> Result<()> {
    if cfg.read_buffer_size == 0 || cfg.read_buffer_size > MAX_READ_BUFFER {
        return Err(RecorderError::config(format!(
            "read_buffer_size must be within 1..={}",
            MAX_READ_BUFFER
        )));
    }
    if !cfg.hidraw_dir.is_absolute() {
        return Err(RecorderError::config("hidraw_dir must be an absolute path"));
    }
    if !cfg.debugfs_dir.is_absolute() {
        return Err(RecorderError::config("debugfs_dir must be an absolute path"));
    }
    Ok(())
}

/// Load and validate a config file. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<RecorderConfig> {
    let data = match fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(RecorderConfig::default()),
        Err(e) => return Err(e.into()),
    };
    let cfg: RecorderConfig = serde_json::from_str(&data)?;
    validate_config(&cfg)?;
    Ok(cfg)
}

pub fn load_config() -> Result<RecorderConfig> {
    load_config_from(&config_path())
}
