//! Lazily-initialised convenience wrappers for the RP2040's on-chip
//! peripherals
//!
//! Every wrapper in this crate owns its PAC register block together with
//! the state that says whether the block has been brought up yet. The
//! first operation that needs a peripheral resets and enables it; every
//! later operation sees the flag and goes straight to the hardware. The
//! same idea guards the analog pads: a pin is switched to high-impedance
//! analog mode at most once, tracked in a small append-only set.
//!
//! The usual entry point is [`Pico`], which claims the chip's peripherals
//! once and forwards the whole convenience surface:
//!
//! ```no_run
//! use pico_ready::{pac, Pico};
//!
//! let mut pico = Pico::new(pac::Peripherals::take().unwrap());
//! pico.set_led(true);
//! let volts = pico.read_pin_volts(0).unwrap();
//! pico.sleep_ms(500);
//! # let _ = volts;
//! ```
//!
//! The wrappers can also be used on their own; they take the reset
//! controller (and, where pads are involved, the GPIO bank) as explicit
//! collaborators:
//!
//! ```no_run
//! use pico_ready::{adc::Adc, gpio::GpioBank, pac};
//!
//! let p = pac::Peripherals::take().unwrap();
//! let mut resets = p.RESETS;
//! let mut gpio = GpioBank::new(p.IO_BANK0, p.PADS_BANK0, p.SIO);
//! let mut adc = Adc::new(p.ADC);
//! let raw = adc.read_input_raw(&mut resets, &mut gpio, 0).unwrap();
//! # let _ = raw;
//! ```
//!
//! # Threading model
//!
//! Single-threaded and run-to-completion: all state sits behind `&mut`,
//! nothing is static, and blocking operations block the only thread.
//! Sharing a wrapper between cores or interrupt handlers needs a lock
//! around it, which is the caller's business.
//!
//! # What this crate does not do
//!
//! Boot-time clock and PLL setup, interrupts, DMA and USB are out of
//! scope; bring the board up the usual way first.

#![no_std]
#![warn(missing_docs)]

#[cfg(test)]
extern crate std;

pub use rp2040_pac as pac;

pub mod adc;
pub mod clocks;
pub mod gpio;
pub mod led;
pub mod pico;
pub mod power;
pub mod pwm;
pub mod ready;
mod resets;
pub mod timer;
pub mod wireless;

pub use pico::Pico;
