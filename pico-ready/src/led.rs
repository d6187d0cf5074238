//! Onboard LED
//!
//! On a plain Pico the LED sits on GPIO25. The pin is configured as an
//! output by the first call that changes the LED state; after that the
//! stored [`SioOutput`] handle is reused and no pin setup is repeated.
//!
//! Boards that route the LED through the wireless co-processor cannot
//! reach it over bank 0 at all; use [`crate::wireless`] for those.

use rp2040_pac::RESETS;

use crate::gpio::{GpioBank, SioOutput};

/// GPIO carrying the onboard LED on the Pico.
pub const LED_PIN: u8 = 25;

/// The onboard LED, initialised on first use.
///
/// The stored output handle doubles as the readiness state: `None` until
/// the first `set` or `toggle`, then populated for the rest of the
/// program.
pub struct Led {
    pin: Option<SioOutput>,
}

impl Led {
    /// Create the LED wrapper. No hardware is touched yet.
    pub const fn new() -> Self {
        Led { pin: None }
    }

    fn pin(&mut self, gpio: &mut GpioBank, resets: &mut RESETS) -> &mut SioOutput {
        self.pin
            .get_or_insert_with(|| gpio.output_pin_unchecked(resets, LED_PIN))
    }

    /// Turn the LED on or off, configuring the pin on first use.
    pub fn set(&mut self, gpio: &mut GpioBank, resets: &mut RESETS, on: bool) {
        self.pin(gpio, resets).set(on);
    }

    /// Invert the LED state, configuring the pin on first use.
    pub fn toggle(&mut self, gpio: &mut GpioBank, resets: &mut RESETS) {
        self.pin(gpio, resets).toggle();
    }
}

impl Default for Led {
    fn default() -> Self {
        Self::new()
    }
}
