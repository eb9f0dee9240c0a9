use embedded_hal::delay::DelayNs;
use std::thread::sleep;
use std::time::Duration;

/// [DelayNs] implementation that blocks the current thread.
///
/// The OS scheduler makes every delay at least as long as requested, which is all the HD44780
/// timings need, as they're all lower bounds.
#[derive(Copy, Clone, Debug, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        sleep(Duration::from_nanos(ns as u64));
    }

    fn delay_us(&mut self, us: u32) {
        sleep(Duration::from_micros(us as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        sleep(Duration::from_millis(ms as u64));
    }
}
