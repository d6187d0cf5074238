//! Power supply queries
//!
//! On the Pico, VSYS is brought out to ADC input 3 (GPIO29) through a 1:3
//! divider, and VBUS presence is readable on GPIO24. Both helpers ride on
//! the lazily initialised [`Adc`] and [`GpioBank`] wrappers, so no setup
//! call is needed before using them.

use rp2040_pac::RESETS;

use crate::adc::{self, Adc};
use crate::gpio::GpioBank;

/// ADC input wired to the VSYS divider.
pub const VSYS_ADC_INPUT: u8 = 3;

/// GPIO that reads high while VBUS is present (plain Pico wiring; Pico W
/// routes this through the wireless co-processor instead).
pub const VBUS_DETECT_PIN: u8 = 24;

// The board divides VSYS by three before it reaches the pin.
const VSYS_DIVIDER: f32 = 3.0;

/// What the board is currently running from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerSource {
    /// VBUS is present, so a USB host or supply is attached.
    Usb,
    /// No VBUS; running from battery or an external VSYS supply.
    BatteryOrExternal,
}

/// Convert a raw sample of the VSYS input to the rail voltage.
pub fn vsys_from_counts(counts: u16) -> f32 {
    adc::counts_to_volts(counts) * VSYS_DIVIDER
}

/// Measure the VSYS rail voltage.
pub fn vsys_voltage(
    adc: &mut Adc,
    gpio: &mut GpioBank,
    resets: &mut RESETS,
) -> Result<f32, adc::Error> {
    adc.read_input_raw(resets, gpio, VSYS_ADC_INPUT)
        .map(vsys_from_counts)
}

/// Whether VBUS is currently present.
pub fn vbus_present(gpio: &mut GpioBank, resets: &mut RESETS) -> bool {
    gpio.input_unchecked(resets, VBUS_DETECT_PIN);
    gpio.read_level_unchecked(VBUS_DETECT_PIN)
}

/// Classify the current supply.
pub fn power_source(gpio: &mut GpioBank, resets: &mut RESETS) -> PowerSource {
    if vbus_present(gpio, resets) {
        PowerSource::Usb
    } else {
        PowerSource::BatteryOrExternal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vsys_accounts_for_the_divider() {
        assert_eq!(vsys_from_counts(0), 0.0);
        // Half scale on the pin is 1.65 V, so 4.95 V on the rail.
        assert!((vsys_from_counts(2048) - 4.95).abs() < 1e-5);
        // A healthy 5 V rail reads around 1.667 V at the pin.
        let counts = (1.6667 / 3.3 * 4096.0) as u16;
        assert!((vsys_from_counts(counts) - 5.0).abs() < 0.01);
    }
}
