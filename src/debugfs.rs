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

//! Locating the HID debugfs entry that mirrors the primary channel.
//!
//! Each bound device has a directory under the debugfs HID root. Its `rdesc`
//! file starts with the report descriptor as hex text (`"05 01 09 06 \n"`),
//! and its `events` file streams textual report traces. A directory is the
//! debug channel for our device when that first line decodes to exactly the
//! descriptor fetched from hidraw.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::constants::paths::{EVENTS_FILE, RDESC_FILE};
use crate::descriptor::ReportDescriptor;
use crate::error::RecorderError;

/// Characters each encoded byte takes on the descriptor line: two hex digits and a separator
const ENCODED_BYTE_WIDTH: usize = 3;

/// Directory listing capability for debug candidates
#[cfg_attr(test, mockall::automock)]
pub trait DebugDirectory {
    /// Candidate entries, in listing order
    fn candidates(&self) -> io::Result<Vec<PathBuf>>;

    /// First line of the candidate's descriptor file, line terminator included
    fn read_descriptor_line(&self, candidate: &Path) -> io::Result<String>;
}

/// The debugfs HID root on disk
#[derive(Debug, Clone)]
pub struct FsDebugDirectory {
    root: PathBuf,
}

impl FsDebugDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DebugDirectory for FsDebugDirectory {
    fn candidates(&self) -> io::Result<Vec<PathBuf>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            match entry {
                Ok(entry) => out.push(entry.path()),
                Err(e) => debug!(error = %e, "Skipping unreadable debugfs entry"),
            }
        }
        Ok(out)
    }

    fn read_descriptor_line(&self, candidate: &Path) -> io::Result<String> {
        let mut reader = BufReader::new(File::open(candidate.join(RDESC_FILE))?);
        let mut line = String::new();
        reader.read_line(&mut line)?;
        Ok(line)
    }
}

/// A debug entry whose descriptor matched the session's descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugCandidate {
    pub source_path: PathBuf,
    pub decoded_descriptor: ReportDescriptor,
}

impl DebugCandidate {
    /// Path of the entry's textual report stream
    pub fn events_path(&self) -> PathBuf {
        self.source_path.join(EVENTS_FILE)
    }
}

/// Number of bytes encoded on a descriptor line.
///
/// The last character is the terminator; every byte before it takes exactly
/// three characters. `None` for an empty line.
pub fn encoded_byte_count(line: &str) -> Option<usize> {
    line.len().checked_sub(1).map(|n| n / ENCODED_BYTE_WIDTH)
}

fn byte_at(line: &[u8], index: usize) -> Option<u8> {
    let start = index * ENCODED_BYTE_WIDTH;
    let pair = line.get(start..start + 2)?;
    let mut out = [0u8; 1];
    hex::decode_to_slice(pair, &mut out).ok()?;
    Some(out[0])
}

/// Decode a descriptor line into bytes, `None` if any byte is not valid hex.
pub fn decode_descriptor_line(line: &str) -> Option<ReportDescriptor> {
    let count = encoded_byte_count(line)?;
    let raw = line.as_bytes();
    (0..count)
        .map(|i| byte_at(raw, i))
        .collect::<Option<Vec<u8>>>()
        .map(ReportDescriptor::new)
}

/// True when `line` encodes exactly `descriptor`.
///
/// A count mismatch rejects before any byte is parsed; otherwise bytes are
/// compared in order and the first difference rejects.
pub fn matches_descriptor(descriptor: &ReportDescriptor, line: &str) -> bool {
    match encoded_byte_count(line) {
        Some(count) if count == descriptor.size() => {}
        _ => return false,
    }
    let raw = line.as_bytes();
    descriptor
        .bytes()
        .iter()
        .enumerate()
        .all(|(i, &expected)| byte_at(raw, i) == Some(expected))
}

/// Scan `dir` for the entry mirroring `descriptor`.
///
/// Unreadable candidates are skipped. Finding nothing is the common case and
/// is not an error.
pub fn locate<D: DebugDirectory + ?Sized>(
    dir: &D,
    descriptor: &ReportDescriptor,
) -> Option<DebugCandidate> {
    let candidates = match dir.candidates() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Cannot list HID debugfs entries; is debugfs mounted?");
            return None;
        }
    };

    for path in candidates {
        let line = match dir.read_descriptor_line(&path) {
            Ok(line) => line,
            Err(source) => {
                let err = RecorderError::CandidateRead { path, source };
                debug!(error = %err, "Skipping debug candidate");
                continue;
            }
        };
        if matches_descriptor(descriptor, &line) {
            info!(path = %path.display(), "Found matching HID debugfs entry");
            return Some(DebugCandidate {
                source_path: path,
                decoded_descriptor: descriptor.clone(),
            });
        }
        debug!(path = %path.display(), "Debug candidate descriptor differs");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::format_hex_bytes;
    use tempfile::TempDir;

    fn mouse_descriptor() -> ReportDescriptor {
        ReportDescriptor::new(vec![0x05, 0x01, 0x09, 0x06])
    }

    #[test]
    fn test_encoded_byte_count() {
        assert_eq!(encoded_byte_count("05 01 09 06 \n"), Some(4));
        assert_eq!(encoded_byte_count("\n"), Some(0));
        assert_eq!(encoded_byte_count(""), None);
    }

    #[test]
    fn test_decode_descriptor_line() {
        let desc = decode_descriptor_line("05 01 09 06 \n").unwrap();
        assert_eq!(desc, mouse_descriptor());
        assert!(decode_descriptor_line("05 zz 09 06 \n").is_none());
    }

    #[test]
    fn test_round_trip_through_descriptor_line() {
        let mut seed: u32 = 0x1234_5678;
        for len in 0..=4096usize {
            let bytes: Vec<u8> = (0..len)
                .map(|_| {
                    seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                    (seed >> 24) as u8
                })
                .collect();
            let line = format!("{} \n", format_hex_bytes(&bytes));
            let decoded = decode_descriptor_line(&line).unwrap();
            assert_eq!(decoded.bytes(), bytes.as_slice(), "length {}", len);
        }
    }

    #[test]
    fn test_matches_exact_descriptor() {
        assert!(matches_descriptor(&mouse_descriptor(), "05 01 09 06 \n"));
    }

    #[test]
    fn test_rejects_first_byte_mismatch() {
        assert!(!matches_descriptor(&mouse_descriptor(), "05 01 09 02 \n"));
        assert!(!matches_descriptor(&mouse_descriptor(), "06 01 09 06 \n"));
    }

    #[test]
    fn test_size_mismatch_rejects_without_parsing() {
        // Neither line is hex; a byte comparison would have to parse it
        assert!(!matches_descriptor(&mouse_descriptor(), "zz zz zz \n"));
        assert!(!matches_descriptor(&mouse_descriptor(), "zz zz zz zz zz \n"));
        assert!(!matches_descriptor(&mouse_descriptor(), ""));
    }

    #[test]
    fn test_empty_descriptor_matches_bare_terminator() {
        assert!(matches_descriptor(&ReportDescriptor::default(), "\n"));
        assert!(!matches_descriptor(&ReportDescriptor::default(), "05 \n"));
    }

    #[test]
    fn test_locate_skips_unreadable_and_mismatched() {
        let mut dir = MockDebugDirectory::new();
        dir.expect_candidates().returning(|| {
            Ok(vec![
                PathBuf::from("/dbg/0003:1111:2222.0001"),
                PathBuf::from("/dbg/0003:046D:C52B.0002"),
                PathBuf::from("/dbg/0003:046D:C52B.0003"),
            ])
        });
        dir.expect_read_descriptor_line().returning(|path| {
            match path.to_str().unwrap() {
                "/dbg/0003:1111:2222.0001" => Err(io::Error::from_raw_os_error(libc::EACCES)),
                "/dbg/0003:046D:C52B.0002" => Ok("05 01 09 02 a1 \n".to_string()),
                _ => Ok("05 01 09 06 \n".to_string()),
            }
        });

        let found = locate(&dir, &mouse_descriptor()).unwrap();
        assert_eq!(found.source_path, PathBuf::from("/dbg/0003:046D:C52B.0003"));
        assert_eq!(found.events_path(), PathBuf::from("/dbg/0003:046D:C52B.0003/events"));
        assert_eq!(found.decoded_descriptor, mouse_descriptor());
    }

    #[test]
    fn test_locate_stops_at_first_match() {
        let mut dir = MockDebugDirectory::new();
        dir.expect_candidates()
            .returning(|| Ok(vec![PathBuf::from("/dbg/a"), PathBuf::from("/dbg/b")]));
        dir.expect_read_descriptor_line()
            .times(1)
            .returning(|_| Ok("05 01 09 06 \n".to_string()));

        let found = locate(&dir, &mouse_descriptor()).unwrap();
        assert_eq!(found.source_path, PathBuf::from("/dbg/a"));
    }

    #[test]
    fn test_locate_without_listing_is_no_match() {
        let mut dir = MockDebugDirectory::new();
        dir.expect_candidates()
            .returning(|| Err(io::Error::from_raw_os_error(libc::ENOENT)));
        dir.expect_read_descriptor_line().never();

        assert!(locate(&dir, &mouse_descriptor()).is_none());
    }

    #[test]
    fn test_fs_directory_reads_first_line() {
        let tmp = TempDir::new().unwrap();
        let entry = tmp.path().join("0003:046D:C52B.0004");
        fs::create_dir(&entry).unwrap();
        fs::write(
            entry.join(RDESC_FILE),
            "05 01 09 06 \n\n  INPUT(1)[INPUT]\n    Field(0)\n",
        )
        .unwrap();
        fs::create_dir(tmp.path().join("0003:0000:0000.0005")).unwrap();

        let dir = FsDebugDirectory::new(tmp.path());
        let mut candidates = dir.candidates().unwrap();
        candidates.sort();
        assert_eq!(candidates.len(), 2);
        assert_eq!(dir.read_descriptor_line(&entry).unwrap(), "05 01 09 06 \n");

        let found = locate(&dir, &mouse_descriptor()).unwrap();
        assert_eq!(found.source_path, entry);
    }

    #[test]
    fn test_fs_directory_missing_root() {
        let dir = FsDebugDirectory::new("/nonexistent/debug/hid");
        assert!(dir.candidates().is_err());
        assert!(locate(&dir, &mouse_descriptor()).is_none());
    }
}
