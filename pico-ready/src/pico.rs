//! Board-level convenience surface
//!
//! [`Pico`] bundles every wrapper in the crate behind one object that is
//! constructed once at the start of the program and passed around by the
//! caller. All peripheral state (readiness flags, the analog pin table)
//! lives inside it; there are no globals. Each method defers to the owning
//! wrapper, which brings its hardware up on first use.
//!
//! ## Usage
//!
//! ```no_run
//! use pico_ready::adc::TemperatureUnit;
//! use pico_ready::{pac, Pico};
//!
//! let mut pico = Pico::new(pac::Peripherals::take().unwrap());
//! loop {
//!     pico.set_led(true);
//!     pico.sleep_ms(250);
//!     pico.set_led(false);
//!     pico.sleep_ms(250);
//!
//!     let volts = pico.read_pin_volts(0).unwrap();
//!     let temp = pico.onboard_temperature(TemperatureUnit::Celsius);
//!     let _ = (volts, temp);
//! }
//! ```

use rp2040_pac as pac;
use rp2040_pac::RESETS;

use crate::adc::{self, Adc, TemperatureUnit};
use crate::clocks::{Clocks, FrequencySource};
use crate::gpio::{GpioBank, InvalidPinError, PinFunction};
use crate::led::Led;
use crate::power::{self, PowerSource};
use crate::pwm::{self, Pwm};
use crate::timer::Timer;

// The Pico carries a 12 MHz crystal; the watchdog tick generator divides
// it down to the 1 MHz timer tick.
const XTAL_FREQ_HZ: u32 = 12_000_000;

/// All peripheral wrappers of this crate, plus the reset controller they
/// share, in one place.
///
/// Construction claims the chip's peripherals and starts the watchdog tick
/// generator (so delays work), but leaves every other domain untouched
/// until its first use. Clock and PLL setup is expected to have happened
/// at boot, as usual.
pub struct Pico {
    resets: RESETS,
    adc: Adc,
    gpio: GpioBank,
    led: Led,
    pwm: Pwm,
    clocks: Clocks,
    timer: Timer,
}

impl Pico {
    /// Build the convenience surface from the chip's peripherals.
    pub fn new(p: pac::Peripherals) -> Self {
        let pac::Peripherals {
            ADC: adc,
            CLOCKS: clocks,
            IO_BANK0: io,
            PADS_BANK0: pads,
            PWM: pwm,
            RESETS: mut resets,
            SIO: sio,
            TIMER: timer,
            WATCHDOG: watchdog,
            ..
        } = p;

        // The timer counts microseconds only while the tick generator runs.
        watchdog.tick().write(|w| unsafe {
            w.cycles()
                .bits((XTAL_FREQ_HZ / 1_000_000) as u16)
                .enable()
                .set_bit()
        });
        let timer = Timer::new(timer, &mut resets);

        Pico {
            resets,
            adc: Adc::new(adc),
            gpio: GpioBank::new(io, pads, sio),
            led: Led::new(),
            pwm: Pwm::new(pwm),
            clocks: Clocks::new(clocks),
            timer,
        }
    }

    /// Block for at least `ms` milliseconds.
    pub fn sleep_ms(&self, ms: u32) {
        self.timer.sleep_ms(ms);
    }

    /// Block for at least `us` microseconds.
    pub fn sleep_us(&self, us: u32) {
        self.timer.sleep_us(us);
    }

    /// The microsecond timer, for direct use.
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Turn the onboard LED on or off.
    pub fn set_led(&mut self, on: bool) {
        self.led.set(&mut self.gpio, &mut self.resets, on);
    }

    /// Invert the onboard LED.
    pub fn toggle_led(&mut self) {
        self.led.toggle(&mut self.gpio, &mut self.resets);
    }

    /// Sample analog input `input` (0 to 3, on GPIO `26 + input`).
    pub fn read_pin_raw(&mut self, input: u8) -> Result<u16, adc::Error> {
        self.adc
            .read_input_raw(&mut self.resets, &mut self.gpio, input)
    }

    /// Like [`read_pin_raw`](Pico::read_pin_raw), scaled to volts.
    pub fn read_pin_volts(&mut self, input: u8) -> Result<f32, adc::Error> {
        self.adc
            .read_input_volts(&mut self.resets, &mut self.gpio, input)
    }

    /// Select the channel the next [`read_raw`](Pico::read_raw) samples.
    pub fn select_input(&mut self, channel: u8) -> Result<(), adc::Error> {
        self.adc.select_input(&mut self.resets, channel)
    }

    /// One conversion on the currently selected channel.
    pub fn read_raw(&mut self) -> u16 {
        self.adc.read_raw(&mut self.resets)
    }

    /// Like [`read_raw`](Pico::read_raw), scaled to volts.
    pub fn read_volts(&mut self) -> f32 {
        self.adc.read_volts(&mut self.resets)
    }

    /// Read the on-chip temperature sensor.
    pub fn onboard_temperature(&mut self, unit: TemperatureUnit) -> f32 {
        self.adc.read_onboard_temperature(&mut self.resets, unit)
    }

    /// Fill `buf` with consecutive samples of the selected channel.
    ///
    /// Blocks until the buffer is full; see [`Adc::capture`].
    pub fn capture(&mut self, buf: &mut [u16]) {
        self.adc.capture(&mut self.resets, buf);
    }

    /// Set the output-enable bit of every bank 0 pin from `mask`.
    pub fn set_all_directions(&mut self, mask: u32) {
        self.gpio.set_dir_all(&mut self.resets, mask);
    }

    /// Set the output level of every bank 0 pin from `mask`.
    pub fn put_all(&mut self, mask: u32) {
        self.gpio.put_all(&mut self.resets, mask);
    }

    /// Select the function multiplexed onto `pin`.
    pub fn set_function(&mut self, pin: u8, function: PinFunction) -> Result<(), InvalidPinError> {
        self.gpio.set_function(&mut self.resets, pin, function)
    }

    /// Disable both pull resistors on `pin`.
    pub fn disable_pulls(&mut self, pin: u8) -> Result<(), InvalidPinError> {
        self.gpio.disable_pulls(&mut self.resets, pin)
    }

    /// Enable or disable the digital input buffer of `pin`.
    pub fn set_input_enabled(&mut self, pin: u8, enabled: bool) -> Result<(), InvalidPinError> {
        self.gpio.set_input_enabled(&mut self.resets, pin, enabled)
    }

    /// Configure `pin` as a software-controlled output.
    pub fn set_output(&mut self, pin: u8) -> Result<(), InvalidPinError> {
        self.gpio.set_output(&mut self.resets, pin)
    }

    /// Drive a software-controlled output pin high or low.
    pub fn set_level(&mut self, pin: u8, high: bool) -> Result<(), InvalidPinError> {
        self.gpio.set_level(&mut self.resets, pin, high)
    }

    /// Measure the VSYS rail voltage.
    pub fn vsys_voltage(&mut self) -> Result<f32, adc::Error> {
        power::vsys_voltage(&mut self.adc, &mut self.gpio, &mut self.resets)
    }

    /// Classify the current supply (USB or battery/external).
    pub fn power_source(&mut self) -> PowerSource {
        power::power_source(&mut self.gpio, &mut self.resets)
    }

    /// Configure `pin` as a free-running PWM output.
    ///
    /// See [`Pwm::configure_output`] for the parameter meanings.
    pub fn configure_pwm_output(
        &mut self,
        pin: u8,
        div_int: u8,
        div_frac: u8,
        top: u16,
        level: u16,
    ) -> Result<(), pwm::Error> {
        self.pwm.configure_output(
            &mut self.resets,
            &mut self.gpio,
            pin,
            div_int,
            div_frac,
            top,
            level,
        )
    }

    /// Measure the duty cycle of the signal on an odd numbered pin.
    ///
    /// Counts the system clock against the pin level for 10 ms; the system
    /// clock frequency is taken from the hardware frequency counter.
    pub fn measure_duty_cycle(&mut self, pin: u8) -> Result<f32, pwm::Error> {
        let sys_freq_hz = self.clocks.frequency_count_khz(FrequencySource::ClkSys) * 1_000;
        self.pwm.measure_duty_cycle(
            &mut self.resets,
            &mut self.gpio,
            &self.timer,
            pin,
            sys_freq_hz,
        )
    }

    /// Measure a clock or oscillator with the FC0 frequency counter.
    pub fn frequency_count_khz(&mut self, source: FrequencySource) -> u32 {
        self.clocks.frequency_count_khz(source)
    }

    /// Split the facade back into its parts.
    pub fn free(self) -> (Adc, GpioBank, Led, Pwm, Clocks, Timer, RESETS) {
        (
            self.adc,
            self.gpio,
            self.led,
            self.pwm,
            self.clocks,
            self.timer,
            self.resets,
        )
    }
}
