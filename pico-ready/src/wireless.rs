//! Wireless co-processor hook
//!
//! Pico W boards put the onboard LED (and the VBUS sense line) behind the
//! wireless co-processor, which needs its own firmware download and SPI
//! transport before it answers anything. That transport belongs in a
//! dedicated driver crate; this module only contributes what the rest of
//! the crate also guarantees for on-chip peripherals: the co-processor is
//! powered up at most once, transparently, by the first operation that
//! needs it, and can be shut down exactly once at the end of the program.

use crate::ready::InitOnce;

/// Operations the co-processor driver must provide.
pub trait WirelessDriver {
    /// Driver specific failure type.
    type Error;

    /// One-time bring-up: power, firmware, transport.
    fn power_up(&mut self) -> Result<(), Self::Error>;

    /// Drive the LED attached to the co-processor.
    fn set_led(&mut self, on: bool) -> Result<(), Self::Error>;

    /// Power the co-processor back down.
    fn power_down(&mut self) -> Result<(), Self::Error>;
}

/// Lazily powered wireless co-processor.
pub struct Wireless<D: WirelessDriver> {
    driver: D,
    ready: InitOnce,
}

impl<D: WirelessDriver> Wireless<D> {
    /// Wrap a driver. The co-processor stays unpowered until first use.
    pub fn new(driver: D) -> Self {
        Wireless {
            driver,
            ready: InitOnce::new(),
        }
    }

    /// Power the co-processor up if that has not happened yet.
    ///
    /// On failure the readiness flag is left unset, so the next call
    /// retries the bring-up.
    pub fn ensure_ready(&mut self) -> Result<(), D::Error> {
        if !self.ready.is_done() {
            self.driver.power_up()?;
            self.ready.take();
        }
        Ok(())
    }

    /// Set the co-processor LED, powering the chip up on first use.
    pub fn set_led(&mut self, on: bool) -> Result<(), D::Error> {
        self.ensure_ready()?;
        self.driver.set_led(on)
    }

    /// Power the co-processor down and hand the driver back.
    ///
    /// The only teardown in the crate; meant for the end of the program.
    /// If the chip was never powered up there is nothing to do.
    pub fn shutdown(mut self) -> Result<D, D::Error> {
        if self.ready.is_done() {
            self.driver.power_down()?;
        }
        Ok(self.driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MockDriver {
        power_ups: usize,
        power_downs: usize,
        led_writes: usize,
        fail_power_up: bool,
    }

    impl WirelessDriver for MockDriver {
        type Error = ();

        fn power_up(&mut self) -> Result<(), ()> {
            if self.fail_power_up {
                return Err(());
            }
            self.power_ups += 1;
            Ok(())
        }

        fn set_led(&mut self, _on: bool) -> Result<(), ()> {
            self.led_writes += 1;
            Ok(())
        }

        fn power_down(&mut self) -> Result<(), ()> {
            self.power_downs += 1;
            Ok(())
        }
    }

    #[test]
    fn power_up_fires_exactly_once() {
        let mut wireless = Wireless::new(MockDriver::default());
        for _ in 0..5 {
            wireless.set_led(true).unwrap();
        }
        wireless.set_led(false).unwrap();
        let driver = wireless.shutdown().unwrap();
        assert_eq!(driver.power_ups, 1);
        assert_eq!(driver.led_writes, 6);
        assert_eq!(driver.power_downs, 1);
    }

    #[test]
    fn failed_power_up_is_retried() {
        let mut wireless = Wireless::new(MockDriver {
            fail_power_up: true,
            ..MockDriver::default()
        });
        assert!(wireless.set_led(true).is_err());
        // Clear the fault; the guard must not have latched.
        wireless.driver.fail_power_up = false;
        wireless.set_led(true).unwrap();
        let driver = wireless.shutdown().unwrap();
        assert_eq!(driver.power_ups, 1);
        assert_eq!(driver.led_writes, 1);
    }

    #[test]
    fn shutdown_without_use_skips_power_down() {
        let wireless = Wireless::new(MockDriver::default());
        let driver = wireless.shutdown().unwrap();
        assert_eq!(driver.power_ups, 0);
        assert_eq!(driver.power_downs, 0);
    }
}
