//! Pulse Width Modulation (PWM)
//!
//! See [Chapter 4 Section 5](https://datasheets.raspberrypi.org/rp2040/rp2040_datasheet.pdf) of the datasheet for more details
//!
//! Slices are addressed through the pin they drive: pin `n` belongs to
//! slice `(n / 2) % 8`, even pins to channel A, odd pins to channel B.
//! Only B pins can act as slice inputs, which
//! [`Pwm::measure_duty_cycle`] relies on: the slice counts while the pin
//! is high, so the count over a fixed window gives the duty cycle.

use rp2040_pac::{PWM, RESETS};

use crate::gpio::{GpioBank, PinFunction, BANK0_PIN_COUNT};
use crate::ready::InitOnce;
use crate::resets::SubsystemReset;
use crate::timer::Timer;

/// Number of PWM slices.
pub const SLICE_COUNT: u8 = 8;

// CSR.DIVMODE values (datasheet 4.5.2.6).
const DIVMODE_FREE_RUNNING: u8 = 0;
const DIVMODE_LEVEL_HIGH: u8 = 1;

// Duty measurement: count every 100th cycle while the input is high, over
// a 10 ms window.
const MEASUREMENT_DIVIDER: u8 = 100;
const MEASUREMENT_WINDOW_MS: u32 = 10;

/// Errors reported by the PWM wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The pin number does not exist in bank 0.
    InvalidPin,
    /// Only B channel (odd numbered) pins can be used as slice inputs.
    NotAnInputPin,
}

fn slice_for_pin(pin: u8) -> u8 {
    (pin >> 1) & (SLICE_COUNT - 1)
}

fn is_b_channel(pin: u8) -> bool {
    pin & 1 == 1
}

fn input_slice_for_pin(pin: u8) -> Result<u8, Error> {
    if pin >= BANK0_PIN_COUNT {
        return Err(Error::InvalidPin);
    }
    if !is_b_channel(pin) {
        return Err(Error::NotAnInputPin);
    }
    Ok(slice_for_pin(pin))
}

fn duty_cycle_ratio(count: u16, sys_freq_hz: u32) -> f32 {
    let counting_rate = sys_freq_hz as f32 / f32::from(MEASUREMENT_DIVIDER);
    let max_count = counting_rate * (MEASUREMENT_WINDOW_MS as f32 / 1000.0);
    f32::from(count) / max_count
}

/// The PWM block, brought out of reset on first use.
pub struct Pwm {
    device: PWM,
    ready: InitOnce,
}

impl Pwm {
    /// Take ownership of the PWM block. No hardware is touched yet.
    pub fn new(device: PWM) -> Self {
        Pwm {
            device,
            ready: InitOnce::new(),
        }
    }

    /// Bring the block out of reset if that has not happened yet.
    pub fn ensure_ready(&mut self, resets: &mut RESETS) {
        if self.ready.take() {
            self.device.reset_bring_up(resets);
        }
    }

    /// Free underlying register block
    pub fn free(self) -> PWM {
        self.device
    }

    /// Configure `pin` as a free-running PWM output.
    ///
    /// Sets the slice divider and wrap value, the compare level of the
    /// pin's channel, and enables the slice. Note that the other channel
    /// of the same slice shares divider and wrap value.
    pub fn configure_output(
        &mut self,
        resets: &mut RESETS,
        gpio: &mut GpioBank,
        pin: u8,
        div_int: u8,
        div_frac: u8,
        top: u16,
        level: u16,
    ) -> Result<(), Error> {
        if pin >= BANK0_PIN_COUNT {
            return Err(Error::InvalidPin);
        }
        self.ensure_ready(resets);
        gpio.set_function_unchecked(resets, pin, PinFunction::Pwm);

        let ch = self.device.ch(usize::from(slice_for_pin(pin)));
        ch.csr().modify(|_, w| w.en().clear_bit());
        ch.csr().modify(|_, w| {
            w.divmode()
                .bits(DIVMODE_FREE_RUNNING)
                .ph_correct()
                .clear_bit()
        });
        ch.div()
            .write(|w| unsafe { w.int().bits(div_int).frac().bits(div_frac) });
        ch.top().write(|w| unsafe { w.top().bits(top) });
        ch.ctr().write(|w| unsafe { w.ctr().bits(0) });
        Self::write_level(&self.device, pin, level);
        ch.csr().modify(|_, w| w.en().set_bit());
        Ok(())
    }

    /// Change the compare level of `pin`'s channel.
    pub fn set_level(&mut self, resets: &mut RESETS, pin: u8, level: u16) -> Result<(), Error> {
        if pin >= BANK0_PIN_COUNT {
            return Err(Error::InvalidPin);
        }
        self.ensure_ready(resets);
        Self::write_level(&self.device, pin, level);
        Ok(())
    }

    fn write_level(device: &PWM, pin: u8, level: u16) {
        let ch = device.ch(usize::from(slice_for_pin(pin)));
        if is_b_channel(pin) {
            ch.cc().modify(|_, w| unsafe { w.b().bits(level) });
        } else {
            ch.cc().modify(|_, w| unsafe { w.a().bits(level) });
        }
    }

    /// Start or stop the slice that owns `pin`.
    pub fn set_enabled(&mut self, resets: &mut RESETS, pin: u8, enabled: bool) -> Result<(), Error> {
        if pin >= BANK0_PIN_COUNT {
            return Err(Error::InvalidPin);
        }
        self.ensure_ready(resets);
        self.device
            .ch(usize::from(slice_for_pin(pin)))
            .csr()
            .modify(|_, w| w.en().bit(enabled));
        Ok(())
    }

    /// Measure the duty cycle of the signal on `pin`.
    ///
    /// Uses the pin's slice as an input counter: in level-high divider mode
    /// the counter only advances while the pin is high, so counting over a
    /// fixed window and dividing by the maximum possible count yields the
    /// high fraction, between 0.0 and 1.0. Blocks for the 10 ms window.
    ///
    /// `sys_freq_hz` is the current system clock frequency, which the
    /// counting rate is derived from.
    pub fn measure_duty_cycle(
        &mut self,
        resets: &mut RESETS,
        gpio: &mut GpioBank,
        timer: &Timer,
        pin: u8,
        sys_freq_hz: u32,
    ) -> Result<f32, Error> {
        let slice = input_slice_for_pin(pin)?;
        self.ensure_ready(resets);
        gpio.set_function_unchecked(resets, pin, PinFunction::Pwm);

        let ch = self.device.ch(usize::from(slice));
        ch.csr().modify(|_, w| w.en().clear_bit());
        ch.csr().modify(|_, w| {
            w.divmode()
                .bits(DIVMODE_LEVEL_HIGH)
                .ph_correct()
                .clear_bit()
        });
        ch.div()
            .write(|w| unsafe { w.int().bits(MEASUREMENT_DIVIDER).frac().bits(0) });
        ch.top().write(|w| unsafe { w.top().bits(0xffff) });
        ch.ctr().write(|w| unsafe { w.ctr().bits(0) });

        ch.csr().modify(|_, w| w.en().set_bit());
        timer.sleep_ms(MEASUREMENT_WINDOW_MS);
        ch.csr().modify(|_, w| w.en().clear_bit());

        let count = ch.ctr().read().ctr().bits();
        Ok(duty_cycle_ratio(count, sys_freq_hz))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pins_map_to_their_slices() {
        assert_eq!(slice_for_pin(0), 0);
        assert_eq!(slice_for_pin(1), 0);
        assert_eq!(slice_for_pin(14), 7);
        // The mapping wraps: pin 16 shares slice 0 with pin 0.
        assert_eq!(slice_for_pin(16), 0);
        assert_eq!(slice_for_pin(27), 5);
    }

    #[test]
    fn only_odd_pins_count_inputs() {
        assert_eq!(input_slice_for_pin(1), Ok(0));
        assert_eq!(input_slice_for_pin(27), Ok(5));
        assert_eq!(input_slice_for_pin(0), Err(Error::NotAnInputPin));
        assert_eq!(input_slice_for_pin(26), Err(Error::NotAnInputPin));
        assert_eq!(input_slice_for_pin(31), Err(Error::InvalidPin));
    }

    #[test]
    fn duty_ratio_scales_with_count() {
        // 125 MHz / 100 counts per second, 10 ms window: 12500 max.
        assert_eq!(duty_cycle_ratio(12_500, 125_000_000), 1.0);
        assert_eq!(duty_cycle_ratio(6_250, 125_000_000), 0.5);
        assert_eq!(duty_cycle_ratio(0, 125_000_000), 0.0);
    }
}
