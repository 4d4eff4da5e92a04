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

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hid_recorder::config::{load_config, load_config_from};
use hid_recorder::debugfs::{self, FsDebugDirectory};
use hid_recorder::descriptor;
use hid_recorder::encoder::Encoder;
use hid_recorder::hidraw::HidrawDevice;
use hid_recorder::select::select_device;
use hid_recorder::session::{CaptureSession, SessionEnd};
use hid_recorder::source::EventSource;
use hid_recorder::RecorderError;

#[derive(Parser)]
#[command(name = "hid-recorder")]
#[command(version)]
#[command(about = "Record HID reports from a hidraw device as a text transcript")]
#[command(long_about = "Record HID reports from a hidraw device as a text transcript

The transcript starts with the report descriptor (R:), device name (N:),
physical path (P:) and bus/vendor/product ids (I:), followed by one E: line
per report with its offset from the first report.

EXAMPLES:
    hid-recorder                       Choose a device interactively
    hid-recorder /dev/hidraw3          Record from hidraw3
    hid-recorder -d /dev/hidraw3       Record through HID debugfs when available

ENVIRONMENT VARIABLES:
    RUST_LOG=debug         Enable debug logging (written to stderr)

FILES:
    ~/.config/hid-recorder/config.json    Directory and buffer settings")]
struct Cli {
    /// hidraw device to record, e.g. /dev/hidraw0
    device: Option<PathBuf>,

    /// Read reports from the matching HID debugfs entry instead of hidraw
    #[arg(short, long)]
    debugfs: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .with_level(true)
        .with_env_filter(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Ctrl-C is the normal way to stop a recording
    if let Err(e) = ctrlc::set_handler(|| std::process::exit(0)) {
        warn!("Failed to set signal handler: {}", e);
    }

    match record(cli) {
        Ok(SessionEnd::EndOfStream) => {
            eprintln!("device closed the event stream");
            std::process::exit(SessionEnd::EndOfStream.exit_code());
        }
        Ok(SessionEnd::ReadError(e)) => {
            eprintln!("read: {}", e);
            std::process::exit(SessionEnd::ReadError(e).exit_code());
        }
        Err(err) => {
            eprintln!("error: {:#}", err);
            let code = err
                .downcast_ref::<RecorderError>()
                .map(RecorderError::exit_code)
                .unwrap_or(1);
            std::process::exit(code);
        }
    }
}

fn record(cli: Cli) -> anyhow::Result<SessionEnd> {
    let cfg = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .context("loading configuration")?;
    let use_debugfs = cli.debugfs || cfg.use_debugfs;

    // SAFETY: geteuid has no preconditions and only returns the effective uid.
    if unsafe { libc::geteuid() } != 0 {
        warn!("Not running as root; hidraw and debugfs access may be denied");
    }

    let path = match cli.device {
        Some(path) => path,
        None => select_device(&cfg.hidraw_dir)?,
    };
    let device = HidrawDevice::open(&path)?;
    let snapshot = descriptor::fetch(&device)?;

    let located = if use_debugfs {
        debugfs::locate(&FsDebugDirectory::new(&cfg.debugfs_dir), &snapshot.descriptor)
    } else {
        None
    };
    let events = match located {
        Some(candidate) => {
            let events_path = candidate.events_path();
            match File::open(&events_path) {
                Ok(file) => Some(BufReader::new(file)),
                Err(source) => {
                    let err = RecorderError::EventStreamOpen { path: events_path, source };
                    warn!("{}; capturing from hidraw", err);
                    None
                }
            }
        }
        None => {
            if use_debugfs {
                warn!("No HID debugfs entry matches {}; capturing from hidraw", path.display());
            }
            None
        }
    };

    // The hidraw node stays open in both cases
    let source = match events {
        Some(reader) => EventSource::text(device, reader)?,
        None => EventSource::raw(device, cfg.read_buffer_size)?,
    };
    let session = CaptureSession::new(snapshot, source);
    info!(device = %path.display(), source = ?session.source_kind(), "Recording");

    let mut encoder = Encoder::new(io::stdout().lock());
    session.write_header(&mut encoder)?;
    Ok(session.run(&mut encoder)?)
}
