/*
 * Integration tests for hid-recorder
 *
 * These tests drive a whole capture session through the public API with
 * fake channels and a scripted clock.
 */

use hid_recorder::debugfs::{self, DebugDirectory, FsDebugDirectory};
use hid_recorder::descriptor::{fetch, ReportDescriptor};
use hid_recorder::encoder::{format_hex_bytes, Encoder};
use hid_recorder::hidraw::{PrimaryChannel, RawInfo};
use hid_recorder::session::{CaptureSession, SessionEnd};
use hid_recorder::source::{EventSource, SourceKind};
use hid_recorder::timestamp::Clock;
use std::cell::Cell;
use std::collections::VecDeque;
use std::fs;
use std::io::{self, BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

const DESCRIPTOR: [u8; 4] = [0x05, 0x01, 0x09, 0x06];

// Test utilities
struct FakeHidraw {
    descriptor: Vec<u8>,
    reports: VecDeque<Vec<u8>>,
}

impl FakeHidraw {
    fn new(reports: Vec<Vec<u8>>) -> Self {
        Self { descriptor: DESCRIPTOR.to_vec(), reports: reports.into() }
    }
}

impl PrimaryChannel for FakeHidraw {
    fn descriptor_size(&self) -> io::Result<usize> {
        Ok(self.descriptor.len())
    }
    fn descriptor(&self, size: usize) -> io::Result<Vec<u8>> {
        Ok(self.descriptor[..size].to_vec())
    }
    fn name(&self) -> io::Result<String> {
        Ok("Fake Mouse".to_string())
    }
    fn phys(&self) -> io::Result<String> {
        Ok("usb-fake-1/input0".to_string())
    }
    fn raw_info(&self) -> io::Result<RawInfo> {
        Ok(RawInfo { bus_type: 3, vendor: 0x1234, product: 0x5678 })
    }
    fn read_report(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reports.pop_front() {
            Some(report) => {
                buf[..report.len()].copy_from_slice(&report);
                Ok(report.len())
            }
            None => Err(io::Error::from_raw_os_error(libc::ENODEV)),
        }
    }
}

/// Arrivals spaced by a fixed step
struct TenMsClock {
    next: Cell<SystemTime>,
}

impl TenMsClock {
    fn new() -> Self {
        Self { next: Cell::new(UNIX_EPOCH + Duration::from_secs(1_700_000_000)) }
    }
}

impl Clock for TenMsClock {
    fn now(&self) -> SystemTime {
        let now = self.next.get();
        self.next.set(now + Duration::from_millis(10));
        now
    }
}

struct NoMatchDirectory;

impl DebugDirectory for NoMatchDirectory {
    fn candidates(&self) -> io::Result<Vec<PathBuf>> {
        Ok(vec![PathBuf::from("/dbg/one"), PathBuf::from("/dbg/two")])
    }
    fn read_descriptor_line(&self, candidate: &Path) -> io::Result<String> {
        if candidate.ends_with("one") {
            Ok("05 01 09 02 \n".to_string())
        } else {
            Ok("06 00 ff 09 01 a1 \n".to_string())
        }
    }
}

fn transcript(bytes: Vec<u8>) -> Vec<String> {
    String::from_utf8(bytes).unwrap().lines().map(str::to_string).collect()
}

#[test]
fn test_scenario_a_falls_back_to_raw_source() {
    let device = FakeHidraw::new(vec![vec![0x01, 0x02, 0x03], vec![0x0a, 0x0b, 0x0c, 0x0d, 0x0e]]);
    let snapshot = fetch(&device).unwrap();
    assert_eq!(snapshot.descriptor.size(), 4);

    assert!(debugfs::locate(&NoMatchDirectory, &snapshot.descriptor).is_none());

    let source: EventSource<FakeHidraw, Cursor<Vec<u8>>> = EventSource::raw(device, 4096).unwrap();
    let session = CaptureSession::with_clock(snapshot, source, TenMsClock::new());
    assert_eq!(session.source_kind(), SourceKind::Raw);

    let mut enc = Encoder::new(Vec::new());
    session.write_header(&mut enc).unwrap();
    let end = session.run(&mut enc).unwrap();

    let lines = transcript(enc.into_inner());
    assert_eq!(
        lines,
        vec![
            "R: 4 05 01 09 06",
            "N: Fake Mouse",
            "P: usb-fake-1/input0",
            "I: 3 1234 5678",
            "E: 0.000000 3 01 02 03",
            "E: 0.010000 5 0a 0b 0c 0d 0e",
        ]
    );
    assert!(matches!(end, SessionEnd::ReadError(_)));
    assert_eq!(end.exit_code(), libc::ENODEV);
}

#[test]
fn test_scenario_b_captures_from_debugfs() {
    let tmp = TempDir::new().unwrap();
    let other = tmp.path().join("0003:1111:2222.0001");
    let ours = tmp.path().join("0003:1234:5678.0002");
    fs::create_dir(&other).unwrap();
    fs::create_dir(&ours).unwrap();
    fs::write(other.join("rdesc"), "05 0c 09 01 \n\n").unwrap();
    fs::write(ours.join("rdesc"), "05 01 09 06 \n\n  INPUT[INPUT]\n").unwrap();
    fs::write(
        ours.join("events"),
        "some other trace output\nreport (size 3) (Input) = 01 02 03\n",
    )
    .unwrap();
    // An entry without rdesc is skipped
    fs::create_dir(tmp.path().join("0003:0000:0000.0003")).unwrap();

    let device = FakeHidraw::new(Vec::new());
    let snapshot = fetch(&device).unwrap();

    let candidate = debugfs::locate(&FsDebugDirectory::new(tmp.path()), &snapshot.descriptor)
        .expect("matching debugfs entry");
    assert_eq!(candidate.source_path, ours);
    assert_eq!(candidate.events_path(), ours.join("events"));

    let reader = BufReader::new(fs::File::open(candidate.events_path()).unwrap());
    let source = EventSource::text(device, reader).unwrap();
    let session = CaptureSession::with_clock(snapshot, source, TenMsClock::new());
    assert_eq!(session.source_kind(), SourceKind::Text);

    let mut enc = Encoder::new(Vec::new());
    let end = session.run(&mut enc).unwrap();

    assert_eq!(transcript(enc.into_inner()), vec!["E: 0.000000 3 01 02 03"]);
    assert!(matches!(end, SessionEnd::EndOfStream));
}

#[test]
fn test_descriptor_header_decodes_back_through_locator_rule() {
    let desc = ReportDescriptor::new((0..=255u8).collect());
    let line = format!("{} \n", format_hex_bytes(desc.bytes()));
    assert_eq!(debugfs::decode_descriptor_line(&line).unwrap(), desc);
    assert!(debugfs::matches_descriptor(&desc, &line));
}
