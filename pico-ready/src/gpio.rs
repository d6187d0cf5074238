//! General Purpose Input and Output (GPIO)
//!
//! See [Chapter 2 Section 19](https://datasheets.raspberrypi.org/rp2040/rp2040_datasheet.pdf) of the datasheet for more details
//!
//! Unlike a type-per-pin HAL, this wrapper addresses bank 0 pins by number,
//! because the convenience surface built on top of it is dynamic by design.
//! Pin numbers are validated up front and reported as [`InvalidPinError`]
//! instead of being handed to the hardware unchecked.
//!
//! The bank is brought out of reset lazily, by the first operation that
//! touches it.

use rp2040_pac as pac;
use rp2040_pac::{IO_BANK0, PADS_BANK0, RESETS, SIO};

use crate::ready::InitOnce;
use crate::resets::SubsystemReset;

/// Number of user GPIOs in bank 0.
pub const BANK0_PIN_COUNT: u8 = 30;

/// Pin function as selected through `IO_BANK0` (datasheet table 278).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PinFunction {
    /// JTAG debug port
    Jtag = 0x00,
    /// SPI peripheral
    Spi = 0x01,
    /// UART peripheral
    Uart = 0x02,
    /// I2C peripheral
    I2c = 0x03,
    /// PWM slice input or output
    Pwm = 0x04,
    /// Software control through SIO
    Sio = 0x05,
    /// PIO block 0
    Pio0 = 0x06,
    /// PIO block 1
    Pio1 = 0x07,
    /// Clock input or output
    Clock = 0x08,
    /// USB controller
    Usb = 0x09,
    /// No function, pad isolated (used for analog input)
    Null = 0x1f,
}

/// The pin number does not exist in bank 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidPinError;

/// Bank 0 pads, IO controls and the SIO fast access port, as one unit.
pub struct GpioBank {
    io: IO_BANK0,
    pads: PADS_BANK0,
    sio: SIO,
    ready: InitOnce,
}

impl GpioBank {
    /// Take ownership of the bank. No hardware is touched until first use.
    pub fn new(io: IO_BANK0, pads: PADS_BANK0, sio: SIO) -> Self {
        GpioBank {
            io,
            pads,
            sio,
            ready: InitOnce::new(),
        }
    }

    /// Bring `IO_BANK0` and `PADS_BANK0` out of reset.
    ///
    /// Runs the reset sequence at most once; later calls return immediately.
    /// Every operation on the bank calls this first, so it is only needed
    /// directly when the caller wants to control when the bring-up happens.
    pub fn ensure_ready(&mut self, resets: &mut RESETS) {
        if self.ready.take() {
            self.io.reset_bring_up(resets);
            self.pads.reset_bring_up(resets);
        }
    }

    /// Free the underlying register blocks.
    pub fn free(self) -> (IO_BANK0, PADS_BANK0, SIO) {
        (self.io, self.pads, self.sio)
    }

    fn check_pin(pin: u8) -> Result<(), InvalidPinError> {
        if pin < BANK0_PIN_COUNT {
            Ok(())
        } else {
            Err(InvalidPinError)
        }
    }

    /// Select the function multiplexed onto `pin`.
    pub fn set_function(
        &mut self,
        resets: &mut RESETS,
        pin: u8,
        function: PinFunction,
    ) -> Result<(), InvalidPinError> {
        Self::check_pin(pin)?;
        self.set_function_unchecked(resets, pin, function);
        Ok(())
    }

    pub(crate) fn set_function_unchecked(
        &mut self,
        resets: &mut RESETS,
        pin: u8,
        function: PinFunction,
    ) {
        self.ensure_ready(resets);
        self.io
            .gpio(usize::from(pin))
            .gpio_ctrl()
            .modify(|_, w| unsafe { w.funcsel().bits(function as u8) });
        // The digital input buffer is pointless (and on ADC pins harmful)
        // when the pad carries no function.
        let ie = function != PinFunction::Null;
        self.pads
            .gpio(usize::from(pin))
            .modify(|_, w| w.ie().bit(ie));
    }

    /// Disable both pull resistors on `pin`.
    pub fn disable_pulls(&mut self, resets: &mut RESETS, pin: u8) -> Result<(), InvalidPinError> {
        Self::check_pin(pin)?;
        self.ensure_ready(resets);
        self.pads
            .gpio(usize::from(pin))
            .modify(|_, w| w.pue().clear_bit().pde().clear_bit());
        Ok(())
    }

    /// Enable or disable the digital input buffer of `pin`.
    pub fn set_input_enabled(
        &mut self,
        resets: &mut RESETS,
        pin: u8,
        enabled: bool,
    ) -> Result<(), InvalidPinError> {
        Self::check_pin(pin)?;
        self.ensure_ready(resets);
        self.pads
            .gpio(usize::from(pin))
            .modify(|_, w| w.ie().bit(enabled));
        Ok(())
    }

    /// Configure `pin` as a software-controlled output.
    pub fn set_output(&mut self, resets: &mut RESETS, pin: u8) -> Result<(), InvalidPinError> {
        Self::check_pin(pin)?;
        self.output_unchecked(resets, pin);
        Ok(())
    }

    /// Configure `pin` as a software-readable input.
    pub fn set_input(&mut self, resets: &mut RESETS, pin: u8) -> Result<(), InvalidPinError> {
        Self::check_pin(pin)?;
        self.input_unchecked(resets, pin);
        Ok(())
    }

    /// Drive a software-controlled output pin high or low.
    ///
    /// The pin must have been put under software control first, either with
    /// [`set_output`](GpioBank::set_output) or through the bulk direction
    /// write; this call only sets the output level.
    pub fn set_level(
        &mut self,
        resets: &mut RESETS,
        pin: u8,
        high: bool,
    ) -> Result<(), InvalidPinError> {
        Self::check_pin(pin)?;
        self.ensure_ready(resets);
        let mask = 1u32 << pin;
        if high {
            self.sio.gpio_out_set().write(|w| unsafe { w.bits(mask) });
        } else {
            self.sio.gpio_out_clr().write(|w| unsafe { w.bits(mask) });
        }
        Ok(())
    }

    /// Read the input level of `pin`.
    pub fn read_level(&mut self, resets: &mut RESETS, pin: u8) -> Result<bool, InvalidPinError> {
        Self::check_pin(pin)?;
        self.ensure_ready(resets);
        Ok(self.read_level_unchecked(pin))
    }

    /// Set the output-enable bit for every bank 0 pin at once.
    ///
    /// Bit `n` of `mask` controls pin `n`; `0` means input.
    pub fn set_dir_all(&mut self, resets: &mut RESETS, mask: u32) {
        self.ensure_ready(resets);
        self.sio.gpio_oe().write(|w| unsafe { w.bits(mask) });
    }

    /// Set the output level of every bank 0 pin at once.
    pub fn put_all(&mut self, resets: &mut RESETS, mask: u32) {
        self.ensure_ready(resets);
        self.sio.gpio_out().write(|w| unsafe { w.bits(mask) });
    }

    /// Configure `pin` as an output and hand out a [`SioOutput`] for it.
    pub fn output_pin(
        &mut self,
        resets: &mut RESETS,
        pin: u8,
    ) -> Result<SioOutput, InvalidPinError> {
        Self::check_pin(pin)?;
        Ok(self.output_pin_unchecked(resets, pin))
    }

    pub(crate) fn output_pin_unchecked(&mut self, resets: &mut RESETS, pin: u8) -> SioOutput {
        self.output_unchecked(resets, pin);
        SioOutput { mask: 1u32 << pin }
    }

    fn output_unchecked(&mut self, resets: &mut RESETS, pin: u8) {
        self.ensure_ready(resets);
        self.pads
            .gpio(usize::from(pin))
            .modify(|_, w| w.ie().set_bit().od().clear_bit().pue().clear_bit().pde().clear_bit());
        self.io
            .gpio(usize::from(pin))
            .gpio_ctrl()
            .modify(|_, w| unsafe { w.funcsel().bits(PinFunction::Sio as u8) });
        self.sio
            .gpio_oe_set()
            .write(|w| unsafe { w.bits(1u32 << pin) });
    }

    pub(crate) fn input_unchecked(&mut self, resets: &mut RESETS, pin: u8) {
        self.ensure_ready(resets);
        self.pads
            .gpio(usize::from(pin))
            .modify(|_, w| w.ie().set_bit().od().clear_bit().pue().clear_bit().pde().clear_bit());
        self.io
            .gpio(usize::from(pin))
            .gpio_ctrl()
            .modify(|_, w| unsafe { w.funcsel().bits(PinFunction::Sio as u8) });
        self.sio
            .gpio_oe_clr()
            .write(|w| unsafe { w.bits(1u32 << pin) });
    }

    pub(crate) fn read_level_unchecked(&self, pin: u8) -> bool {
        self.sio.gpio_in().read().bits() & (1u32 << pin) != 0
    }

    /// Put `pin` into high-impedance analog mode: pad isolated, digital
    /// input and output disabled, no pulls.
    pub(crate) fn set_analog(&mut self, resets: &mut RESETS, pin: u8) {
        self.ensure_ready(resets);
        self.pads.gpio(usize::from(pin)).modify(|_, w| {
            w.ie()
                .clear_bit()
                .od()
                .set_bit()
                .pue()
                .clear_bit()
                .pde()
                .clear_bit()
        });
        self.io
            .gpio(usize::from(pin))
            .gpio_ctrl()
            .modify(|_, w| unsafe { w.funcsel().bits(PinFunction::Null as u8) });
    }
}

/// A pin configured as a SIO-driven output.
///
/// Obtained from [`GpioBank::output_pin`]. Level changes go through the
/// `GPIO_OUT_SET`/`CLR`/`XOR` aliases, which the hardware applies
/// atomically, so the handle does not need the bank to change the level.
pub struct SioOutput {
    mask: u32,
}

impl SioOutput {
    fn sio_regs(&self) -> &pac::sio::RegisterBlock {
        // Safety: this handle is only created by a GpioBank that owns the
        // SIO block, and the registers used here are set/clear aliases
        // without read-modify-write hazards.
        unsafe { &*pac::SIO::ptr() }
    }

    /// Drive the pin high or low.
    pub fn set(&mut self, high: bool) {
        let regs = self.sio_regs();
        if high {
            regs.gpio_out_set().write(|w| unsafe { w.bits(self.mask) });
        } else {
            regs.gpio_out_clr().write(|w| unsafe { w.bits(self.mask) });
        }
    }

    /// Invert the current output level.
    pub fn toggle(&mut self) {
        self.sio_regs()
            .gpio_out_xor()
            .write(|w| unsafe { w.bits(self.mask) });
    }

    fn is_high(&self) -> bool {
        self.sio_regs().gpio_out().read().bits() & self.mask != 0
    }
}

impl embedded_hal::digital::ErrorType for SioOutput {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::OutputPin for SioOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true);
        Ok(())
    }
}

impl embedded_hal::digital::StatefulOutputPin for SioOutput {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.is_high())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_high())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_numbers_are_validated() {
        assert_eq!(GpioBank::check_pin(0), Ok(()));
        assert_eq!(GpioBank::check_pin(29), Ok(()));
        assert_eq!(GpioBank::check_pin(30), Err(InvalidPinError));
        assert_eq!(GpioBank::check_pin(255), Err(InvalidPinError));
    }
}
