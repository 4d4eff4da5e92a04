/*
 * Test utilities and mock helpers for hid-recorder
 *
 * Shared fixtures for the unit tests: a canned device snapshot and a clock
 * that advances by a fixed step on every reading.
 */

#[cfg(test)]
pub mod test_utils {
    use crate::descriptor::{DeviceIdentity, DeviceSnapshot, ReportDescriptor};
    use crate::timestamp::Clock;
    use std::cell::Cell;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    /// Generic desktop mouse prefix used across tests
    pub const MOUSE_DESCRIPTOR: [u8; 4] = [0x05, 0x01, 0x09, 0x06];

    /// Creates a mock DeviceSnapshot for testing
    pub fn mock_snapshot() -> DeviceSnapshot {
        DeviceSnapshot {
            descriptor: ReportDescriptor::new(MOUSE_DESCRIPTOR.to_vec()),
            identity: DeviceIdentity {
                bus_type: 3,
                vendor_id: 0x046d,
                product_id: 0xc52b,
                name: "Logitech USB Receiver".to_string(),
                physical_path: "usb-0000:00:14.0-1/input0".to_string(),
            },
        }
    }

    /// Clock returning base, base + step, base + 2*step, ...
    pub struct StepClock {
        next: Cell<SystemTime>,
        step: Duration,
    }

    impl StepClock {
        pub fn new(step_us: u64) -> Self {
            Self {
                next: Cell::new(UNIX_EPOCH + Duration::from_secs(1_700_000_000)),
                step: Duration::from_micros(step_us),
            }
        }
    }

    impl Clock for StepClock {
        fn now(&self) -> SystemTime {
            let now = self.next.get();
            self.next.set(now + self.step);
            now
        }
    }
}
