//! Analog-Digital Converter (ADC)
//!
//! See [Chapter 4 Section 9](https://datasheets.raspberrypi.org/rp2040/rp2040_datasheet.pdf) of the datasheet for more details
//!
//! The wrapper defers the ADC bring-up until the first conversion, and
//! tracks which of the four analog-capable pins (GPIO26 to GPIO29) have
//! already been switched to high-impedance mode, so the pad configuration
//! call is issued at most once per pin no matter how often a pin is read.
//!
//! ## Usage
//!
//! ```no_run
//! use pico_ready::{adc::Adc, gpio::GpioBank, pac};
//!
//! let p = pac::Peripherals::take().unwrap();
//! let mut resets = p.RESETS;
//! let mut gpio = GpioBank::new(p.IO_BANK0, p.PADS_BANK0, p.SIO);
//! let mut adc = Adc::new(p.ADC);
//!
//! // First read brings the ADC up and configures the pad, later reads
//! // only select the channel and sample.
//! let raw = adc.read_input_raw(&mut resets, &mut gpio, 0).unwrap();
//! let volts = adc.read_input_volts(&mut resets, &mut gpio, 0).unwrap();
//! ```
//!
//! The channel tokens returned by [`Adc::configure_gpio_pin`] and
//! [`Adc::take_temp_sensor`] can also be read through the `embedded-hal`
//! 0.2 `OneShot` trait, mirroring the usual HAL surface.

use core::convert::Infallible;

use embedded_hal_0_2::adc::{Channel, OneShot};
use rp2040_pac::{ADC, RESETS};

use crate::gpio::GpioBank;
use crate::ready::{AnalogPinSet, CapacityError, InitOnce};
use crate::resets::SubsystemReset;

/// Channel the on-chip temperature sensor is wired to.
const TEMPERATURE_SENSOR_CHANNEL: u8 = 4;

/// First GPIO with an analog input; input `n` lives on pin `26 + n`.
const FIRST_ANALOG_PIN: u8 = 26;

/// Number of externally usable analog inputs.
pub const ANALOG_INPUT_COUNT: u8 = 4;

/// ADC reference voltage on the Pico board.
pub const VREF_VOLTS: f32 = 3.3;

/// Errors reported by the ADC wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The analog input number is not in `0..4`.
    InvalidInput,
    /// The channel number is not in `0..=4`.
    InvalidChannel,
    /// The analog pin table is full.
    PinSetFull,
}

impl From<CapacityError> for Error {
    fn from(_: CapacityError) -> Self {
        Error::PinSetFull
    }
}

/// Temperature scale for the onboard sensor readout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TemperatureUnit {
    /// Degrees Celsius
    Celsius,
    /// Degrees Fahrenheit
    Fahrenheit,
    /// Kelvin
    Kelvin,
}

/// Convert a 12-bit conversion result to volts.
///
/// Assumes the full scale corresponds to `ADC_VREF` (3.3 V on the Pico).
pub fn counts_to_volts(counts: u16) -> f32 {
    f32::from(counts) * (VREF_VOLTS / 4096.0)
}

/// Apply the on-chip sensor calibration from section 4.9.5 of the datasheet
/// to a sample voltage, then scale to the requested unit.
pub fn temperature_from_volts(volts: f32, unit: TemperatureUnit) -> f32 {
    let celsius = 27.0 - (volts - 0.706) / 0.001721;
    match unit {
        TemperatureUnit::Celsius => celsius,
        TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        TemperatureUnit::Kelvin => celsius + 273.15,
    }
}

/// An analog input whose pad has been configured for the ADC.
///
/// Returned by [`Adc::configure_gpio_pin`]; holding one proves the ADC is
/// up and the pad is in analog mode, which is what makes the [`OneShot`]
/// impl sound.
pub struct AnalogPin {
    channel: u8,
}

impl AnalogPin {
    /// The ADC channel this input is sampled on.
    pub fn channel(&self) -> u8 {
        self.channel
    }
}

/// Internal temperature sensor type
pub struct TempSense {
    __private: (),
}

impl Channel<Adc> for TempSense {
    type ID = u8; // ADC channels are identified numerically

    fn channel() -> u8 {
        TEMPERATURE_SENSOR_CHANNEL
    }
}

impl Channel<Adc> for AnalogPin {
    type ID = (); // ADC channels are identified at run time
    fn channel() {}
}

/// Analog to Digital Convertor (ADC).
///
/// Owns the `ADC` register block together with the readiness state: a
/// one-shot bring-up flag and the set of pins already configured for
/// analog input. Construction touches no hardware; the first operation
/// that needs the converter resets and enables it.
pub struct Adc {
    device: ADC,
    ready: InitOnce,
    analog_pins: AnalogPinSet,
}

impl Adc {
    /// Take ownership of the ADC block. No hardware is touched yet.
    pub fn new(device: ADC) -> Self {
        Adc {
            device,
            ready: InitOnce::new(),
            analog_pins: AnalogPinSet::new(),
        }
    }

    /// Free underlying register block
    pub fn free(self) -> ADC {
        self.device
    }

    /// Bring the converter up if that has not happened yet.
    ///
    /// Resets the block, enables it and waits for the READY flag. Runs the
    /// sequence at most once for the lifetime of the program; every
    /// conversion entry point calls this first, so it only needs to be
    /// called directly to control when the bring-up cost is paid.
    pub fn ensure_ready(&mut self, resets: &mut RESETS) {
        if self.ready.take() {
            self.device.reset_bring_down(resets);
            self.device.reset_bring_up(resets);

            self.device.cs().write(|w| w.en().set_bit());

            while !self.device.cs().read().ready().bit_is_set() {
                cortex_m::asm::nop();
            }
        }
    }

    /// Read the most recently completed conversion result.
    pub fn read_single(&self) -> u16 {
        self.device.result().read().result().bits()
    }

    fn wait_ready(&self) {
        while !self.device.cs().read().ready().bit_is_set() {
            cortex_m::asm::nop();
        }
    }

    // One conversion on `channel`. The converter must already be up.
    fn inner_read(&mut self, channel: u8) -> u16 {
        self.wait_ready();

        self.device
            .cs()
            .modify(|_, w| unsafe { w.ainsel().bits(channel).start_once().set_bit() });

        self.wait_ready();

        self.read_single()
    }

    /// Prepare analog input `input` (0 to 3, living on GPIO `26 + input`).
    ///
    /// Switches the pad to high-impedance analog mode the first time each
    /// input is seen; later calls for the same input skip the pad write.
    /// Returns a token for the channel, usable with [`OneShot`].
    pub fn configure_gpio_pin(
        &mut self,
        resets: &mut RESETS,
        gpio: &mut GpioBank,
        input: u8,
    ) -> Result<AnalogPin, Error> {
        if input >= ANALOG_INPUT_COUNT {
            return Err(Error::InvalidInput);
        }
        self.ensure_ready(resets);
        let pin = FIRST_ANALOG_PIN + input;
        if self.analog_pins.insert(pin)? {
            gpio.set_analog(resets, pin);
        }
        Ok(AnalogPin { channel: input })
    }

    /// Select which channel the next conversion samples.
    ///
    /// Channels 0 to 3 are the analog pins, channel 4 the temperature
    /// sensor. The pad of an analog pin is not touched here; use
    /// [`configure_gpio_pin`](Adc::configure_gpio_pin) for that.
    pub fn select_input(&mut self, resets: &mut RESETS, channel: u8) -> Result<(), Error> {
        if channel > TEMPERATURE_SENSOR_CHANNEL {
            return Err(Error::InvalidChannel);
        }
        self.ensure_ready(resets);
        self.device
            .cs()
            .modify(|_, w| unsafe { w.ainsel().bits(channel) });
        Ok(())
    }

    /// One blocking conversion on the currently selected channel.
    pub fn read_raw(&mut self, resets: &mut RESETS) -> u16 {
        self.ensure_ready(resets);
        self.wait_ready();
        self.device.cs().modify(|_, w| w.start_once().set_bit());
        self.wait_ready();
        self.read_single()
    }

    /// Like [`read_raw`](Adc::read_raw), scaled to volts.
    pub fn read_volts(&mut self, resets: &mut RESETS) -> f32 {
        counts_to_volts(self.read_raw(resets))
    }

    /// Sample analog input `input`, configuring pad and channel as needed.
    pub fn read_input_raw(
        &mut self,
        resets: &mut RESETS,
        gpio: &mut GpioBank,
        input: u8,
    ) -> Result<u16, Error> {
        let pin = self.configure_gpio_pin(resets, gpio, input)?;
        Ok(self.inner_read(pin.channel()))
    }

    /// Like [`read_input_raw`](Adc::read_input_raw), scaled to volts.
    pub fn read_input_volts(
        &mut self,
        resets: &mut RESETS,
        gpio: &mut GpioBank,
        input: u8,
    ) -> Result<f32, Error> {
        self.read_input_raw(resets, gpio, input).map(counts_to_volts)
    }

    /// Enable temperature sensor, returns a channel to use
    ///
    /// If the sensor has already been enabled, this method returns `None`.
    pub fn take_temp_sensor(&mut self, resets: &mut RESETS) -> Option<TempSense> {
        self.ensure_ready(resets);
        let mut disabled = false;
        self.device.cs().modify(|r, w| {
            disabled = r.ts_en().bit_is_clear();
            // if bit was already set, this is a nop
            w.ts_en().set_bit()
        });
        disabled.then_some(TempSense { __private: () })
    }

    /// Disable temperature sensor, consumes channel
    pub fn disable_temp_sensor(&mut self, _: TempSense) {
        self.device.cs().modify(|_, w| w.ts_en().clear_bit());
    }

    /// Sample the on-chip temperature sensor and convert to `unit`.
    ///
    /// Keeps the sensor bias enabled afterwards, so repeated readings do
    /// not pay the sensor settling time again.
    pub fn read_onboard_temperature(&mut self, resets: &mut RESETS, unit: TemperatureUnit) -> f32 {
        self.ensure_ready(resets);
        self.device.cs().modify(|_, w| w.ts_en().set_bit());
        let raw = self.inner_read(TEMPERATURE_SENSOR_CHANNEL);
        temperature_from_volts(counts_to_volts(raw), unit)
    }

    /// Fill `buf` with consecutive samples of the selected channel.
    ///
    /// Puts the converter into free-running mode and pulls exactly
    /// `buf.len()` samples out of the conversion FIFO, blocking on each one,
    /// then stops sampling, discards whatever else arrived and disables the
    /// FIFO again. There is no timeout: if the converter never produces a
    /// sample the call never returns.
    pub fn capture(&mut self, resets: &mut RESETS, buf: &mut [u16]) {
        self.ensure_ready(resets);
        self.device.fcs().modify(|_, w| w.en().set_bit());
        self.device.cs().modify(|_, w| w.start_many().set_bit());

        for slot in buf.iter_mut() {
            while self.device.fcs().read().level().bits() == 0 {
                cortex_m::asm::nop();
            }
            *slot = self.device.fifo().read().val().bits();
        }

        self.device.cs().modify(|_, w| w.start_many().clear_bit());
        // Drain samples that arrived between the last read and the stop.
        while self.device.fcs().read().level().bits() > 0 {
            let _ = self.device.fifo().read();
        }
        self.device.fcs().modify(|_, w| w.en().clear_bit());
    }
}

// Implementation for TempSense and other fixed-channel sources
impl<WORD, SRC> OneShot<Adc, WORD, SRC> for Adc
where
    WORD: From<u16>,
    SRC: Channel<Adc, ID = u8>,
{
    type Error = Infallible;

    fn read(&mut self, _pin: &mut SRC) -> nb::Result<WORD, Self::Error> {
        let chan = SRC::channel();

        Ok(self.inner_read(chan).into())
    }
}

// Implementation for pins whose channel is only known at run time
impl<WORD> OneShot<Adc, WORD, AnalogPin> for Adc
where
    WORD: From<u16>,
{
    type Error = Infallible;

    fn read(&mut self, pin: &mut AnalogPin) -> nb::Result<WORD, Self::Error> {
        Ok(self.inner_read(pin.channel).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rp2040_pac as pac;

    #[test]
    fn volts_use_the_full_scale_factor() {
        assert_eq!(counts_to_volts(0), 0.0);
        assert_eq!(counts_to_volts(4095), 4095.0 * (3.3 / 4096.0));
        // Half scale lands on half the reference.
        assert!((counts_to_volts(2048) - 1.65).abs() < 1e-6);
    }

    #[test]
    fn sensor_calibration_fixed_point() {
        // 0.706 V is the datasheet voltage for 27 degrees Celsius.
        assert_eq!(
            temperature_from_volts(0.706, TemperatureUnit::Celsius),
            27.0
        );
        assert!((temperature_from_volts(0.706, TemperatureUnit::Fahrenheit) - 80.6).abs() < 1e-4);
        assert!((temperature_from_volts(0.706, TemperatureUnit::Kelvin) - 300.15).abs() < 1e-4);
    }

    #[test]
    fn sensor_slope_is_negative() {
        let warm = temperature_from_volts(0.70, TemperatureUnit::Celsius);
        let cold = temperature_from_volts(0.71, TemperatureUnit::Celsius);
        assert!(warm > cold);
    }

    #[test]
    fn out_of_range_channel_is_rejected_before_hardware() {
        // Handles are only constructed here; the error paths return before
        // any register access, so this is safe to run on the host.
        let mut adc = Adc::new(unsafe { pac::ADC::steal() });
        let mut resets = unsafe { pac::RESETS::steal() };
        assert_eq!(adc.select_input(&mut resets, 5), Err(Error::InvalidChannel));
        assert_eq!(
            adc.select_input(&mut resets, 255),
            Err(Error::InvalidChannel)
        );
    }

    #[test]
    fn out_of_range_input_is_rejected_before_hardware() {
        let mut adc = Adc::new(unsafe { pac::ADC::steal() });
        let mut resets = unsafe { pac::RESETS::steal() };
        let mut gpio = GpioBank::new(
            unsafe { pac::IO_BANK0::steal() },
            unsafe { pac::PADS_BANK0::steal() },
            unsafe { pac::SIO::steal() },
        );
        let err = adc
            .configure_gpio_pin(&mut resets, &mut gpio, ANALOG_INPUT_COUNT)
            .err();
        assert_eq!(err, Some(Error::InvalidInput));
    }
}
