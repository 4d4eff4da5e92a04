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

//! Interactive hidraw device selection, used when no device path is given.

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::constants::paths::HIDRAW_PREFIX;
use crate::error::{RecorderError, Result};
use crate::hidraw::{HidrawDevice, PrimaryChannel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HidrawNode {
    pub number: u32,
    pub path: PathBuf,
    pub name: Option<String>,
}

/// Extract N from a `hidrawN` file name
pub fn hidraw_number(file_name: &str) -> Option<u32> {
    file_name.strip_prefix(HIDRAW_PREFIX)?.parse().ok()
}

/// All `hidrawN` entries of `dir`, in numeric order, without names
pub fn list_hidraw_nodes(dir: &Path) -> Result<Vec<HidrawNode>> {
    let mut nodes: Vec<HidrawNode> = fs::read_dir(dir)?
        .flatten()
        .filter_map(|entry| {
            let number = hidraw_number(&entry.file_name().to_string_lossy())?;
            Some(HidrawNode { number, path: entry.path(), name: None })
        })
        .collect();
    nodes.sort_by_key(|n| n.number);
    Ok(nodes)
}

/// Fill in device names; nodes we cannot open keep `None`.
pub fn describe_nodes(nodes: &mut [HidrawNode]) {
    for node in nodes.iter_mut() {
        match HidrawDevice::open(&node.path).and_then(|dev| {
            dev.name().map_err(|e| RecorderError::query("HIDIOCGRAWNAME", e))
        }) {
            Ok(name) => node.name = Some(name),
            Err(e) => debug!(path = %node.path.display(), error = %e, "Cannot read device name"),
        }
    }
}

/// List `nodes` on `prompt` and read the chosen device number from `input`.
pub fn choose_device<R: BufRead, W: Write>(
    nodes: &[HidrawNode],
    mut input: R,
    mut prompt: W,
) -> Result<PathBuf> {
    let (first, last) = match (nodes.first(), nodes.last()) {
        (Some(f), Some(l)) => (f.number, l.number),
        _ => return Err(RecorderError::InvalidSelection("no devices to choose from".into())),
    };

    writeln!(prompt, "Available devices:")?;
    for node in nodes {
        let name = node.name.as_deref().unwrap_or("(unknown)");
        writeln!(prompt, "{}:\t{}", node.path.display(), name)?;
    }
    write!(prompt, "Select the device event number [{}-{}]: ", first, last)?;
    prompt.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim();
    let number: u32 = answer
        .parse()
        .map_err(|_| RecorderError::InvalidSelection(format!("'{}' is not a number", answer)))?;

    nodes
        .iter()
        .find(|n| n.number == number)
        .map(|n| n.path.clone())
        .ok_or_else(|| RecorderError::InvalidSelection(format!("no hidraw{}", number)))
}

/// Prompt on stderr for one of the hidraw nodes in `dir`
pub fn select_device(dir: &Path) -> Result<PathBuf> {
    let mut nodes = list_hidraw_nodes(dir)?;
    if nodes.is_empty() {
        return Err(RecorderError::NoDevice(dir.to_path_buf()));
    }
    describe_nodes(&mut nodes);
    let stdin = std::io::stdin();
    choose_device(&nodes, stdin.lock(), std::io::stderr())
}
