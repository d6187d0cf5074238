//! Timer Peripheral
//!
//! See [Chapter 4 Section 6](https://datasheets.raspberrypi.org/rp2040/rp2040_datasheet.pdf) of the datasheet for more details
//!
//! The counter advances once per microsecond as long as the watchdog tick
//! generator runs ([`crate::Pico::new`] starts it). Delays are plain busy
//! waits: the program has a single thread of control and nothing to
//! overlap the wait with.

use fugit::TimerInstantU64;
use rp2040_pac::{RESETS, TIMER};

use crate::resets::SubsystemReset;

/// Instant on the microsecond timebase.
pub type Instant = TimerInstantU64<1_000_000>;

/// Timer peripheral
pub struct Timer {
    device: TIMER,
}

impl Timer {
    /// Bring the timer out of reset and take ownership of it.
    pub fn new(device: TIMER, resets: &mut RESETS) -> Self {
        device.reset_bring_up(resets);
        Timer { device }
    }

    /// Free underlying register block
    pub fn free(self) -> TIMER {
        self.device
    }

    /// Get the current counter value.
    pub fn get_counter(&self) -> Instant {
        Instant::from_ticks(self.ticks())
    }

    fn ticks(&self) -> u64 {
        // The 64 bit count is split over two registers; re-read until the
        // high word is stable so a carry between the reads cannot tear it.
        let mut hi0 = self.device.timerawh().read().bits();
        loop {
            let low = self.device.timerawl().read().bits();
            let hi1 = self.device.timerawh().read().bits();
            if hi0 == hi1 {
                break (u64::from(hi0) << 32) | u64::from(low);
            }
            hi0 = hi1;
        }
    }

    /// Block for at least `us` microseconds.
    pub fn sleep_us(&self, us: u32) {
        let start = self.ticks();
        let ticks = u64::from(us);
        while self.ticks().wrapping_sub(start) < ticks {
            cortex_m::asm::nop();
        }
    }

    /// Block for at least `ms` milliseconds.
    pub fn sleep_ms(&self, ms: u32) {
        let start = self.ticks();
        let ticks = u64::from(ms) * 1_000;
        while self.ticks().wrapping_sub(start) < ticks {
            cortex_m::asm::nop();
        }
    }
}

impl embedded_hal::delay::DelayNs for Timer {
    fn delay_ns(&mut self, ns: u32) {
        // Microsecond granularity, rounded up.
        self.sleep_us(ns.div_ceil(1_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.sleep_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.sleep_ms(ms);
    }
}
