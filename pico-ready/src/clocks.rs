//! Clocks
//!
//! See [Chapter 2 Section 15](https://datasheets.raspberrypi.org/rp2040/rp2040_datasheet.pdf) of the datasheet for more details
//!
//! Two services: reading back what a clock actually runs at, through the
//! FC0 hardware frequency counter, and re-parenting the auxiliary-mux-only
//! generators (peri, usb, adc, rtc). Full system clock bring-up (XOSC,
//! PLLs, glitchless sys/ref muxes) is expected to have happened at boot
//! and is out of scope here.

use rp2040_pac::CLOCKS;

/// Frequency the FC0 counter reference (`clk_ref`) runs at, in kHz.
///
/// The standard Pico bring-up parks `clk_ref` on the 12 MHz crystal.
pub const REFERENCE_CLOCK_KHZ: u32 = 12_000;

// Cycles to let a stopped generator settle before re-parenting it
// (datasheet 2.15.3: the aux mux may only change while stopped).
const SWITCH_DELAY_CYCLES: u32 = 100;

/// Signals the FC0 counter can measure (CLOCKS_FC0_SRC values).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FrequencySource {
    /// System PLL output
    PllSys = 0x01,
    /// USB PLL output
    PllUsb = 0x02,
    /// Ring oscillator
    Rosc = 0x03,
    /// Ring oscillator, phase shifted tap
    RoscPhase = 0x04,
    /// Crystal oscillator
    Xosc = 0x05,
    /// Clock input pin 0
    Gpin0 = 0x06,
    /// Clock input pin 1
    Gpin1 = 0x07,
    /// Reference clock
    ClkRef = 0x08,
    /// System clock
    ClkSys = 0x09,
    /// Peripheral clock
    ClkPeri = 0x0a,
    /// USB clock
    ClkUsb = 0x0b,
    /// ADC clock
    ClkAdc = 0x0c,
    /// RTC clock
    ClkRtc = 0x0d,
}

/// Generators that only have an auxiliary source mux.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AuxClock {
    /// `clk_peri`, no divider
    Peri,
    /// `clk_usb`
    Usb,
    /// `clk_adc`
    Adc,
    /// `clk_rtc`
    Rtc,
}

/// Sources selectable on the auxiliary muxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AuxSource {
    /// The system clock (only `clk_peri` can use it)
    ClkSys,
    /// System PLL output
    PllSys,
    /// USB PLL output
    PllUsb,
    /// Ring oscillator, phase shifted tap
    Rosc,
    /// Crystal oscillator
    Xosc,
    /// Clock input pin 0
    Gpin0,
    /// Clock input pin 1
    Gpin1,
}

/// Errors reported by the clocks wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The source cannot feed the requested generator.
    InvalidSource,
    /// The divisor is outside the generator's divider range.
    InvalidDivisor,
}

// AUXSRC encodings differ between clk_peri and the other three
// (datasheet 2.15.7, CLK_x_CTRL register listings).
fn aux_bits(clock: AuxClock, source: AuxSource) -> Result<u8, Error> {
    let bits = match clock {
        AuxClock::Peri => match source {
            AuxSource::ClkSys => 0x0,
            AuxSource::PllSys => 0x1,
            AuxSource::PllUsb => 0x2,
            AuxSource::Rosc => 0x3,
            AuxSource::Xosc => 0x4,
            AuxSource::Gpin0 => 0x5,
            AuxSource::Gpin1 => 0x6,
        },
        AuxClock::Usb | AuxClock::Adc | AuxClock::Rtc => match source {
            AuxSource::ClkSys => return Err(Error::InvalidSource),
            AuxSource::PllUsb => 0x0,
            AuxSource::PllSys => 0x1,
            AuxSource::Rosc => 0x2,
            AuxSource::Xosc => 0x3,
            AuxSource::Gpin0 => 0x4,
            AuxSource::Gpin1 => 0x5,
        },
    };
    Ok(bits)
}

fn check_divisor(clock: AuxClock, div: u32) -> Result<(), Error> {
    let ok = match clock {
        // clk_peri has no divider at all.
        AuxClock::Peri => div == 1,
        // Two bit integer dividers.
        AuxClock::Usb | AuxClock::Adc => (1..=3).contains(&div),
        // 24 bit integer divider.
        AuxClock::Rtc => div >= 1 && div < (1 << 24),
    };
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidDivisor)
    }
}

/// The clock block: frequency counter access and aux generator control.
pub struct Clocks {
    device: CLOCKS,
}

impl Clocks {
    /// Take ownership of the clock block.
    pub fn new(device: CLOCKS) -> Self {
        Clocks { device }
    }

    /// Free underlying register block
    pub fn free(self) -> CLOCKS {
        self.device
    }

    /// Measure `source` with the FC0 frequency counter, in kHz.
    ///
    /// Blocks for the counting interval (about a millisecond). The result
    /// is only meaningful while `clk_ref` runs at
    /// [`REFERENCE_CLOCK_KHZ`].
    pub fn frequency_count_khz(&mut self, source: FrequencySource) -> u32 {
        let device = &self.device;
        while device.fc0_status().read().running().bit_is_set() {
            cortex_m::asm::nop();
        }
        device
            .fc0_ref_khz()
            .write(|w| unsafe { w.fc0_ref_khz().bits(REFERENCE_CLOCK_KHZ) });
        device
            .fc0_interval()
            .write(|w| unsafe { w.fc0_interval().bits(10) });
        device.fc0_min_khz().write(|w| unsafe { w.fc0_min_khz().bits(0) });
        device
            .fc0_max_khz()
            .write(|w| unsafe { w.fc0_max_khz().bits(0x1ff_ffff) });
        device
            .fc0_src()
            .write(|w| unsafe { w.fc0_src().bits(source as u8) });
        while device.fc0_status().read().done().bit_is_clear() {
            cortex_m::asm::nop();
        }
        device.fc0_result().read().khz().bits()
    }

    /// Re-parent an auxiliary-mux generator and set its integer divisor.
    ///
    /// The generator is stopped while the mux changes and re-enabled
    /// afterwards; anything clocked from it pauses for the switch.
    pub fn configure_aux(
        &mut self,
        clock: AuxClock,
        source: AuxSource,
        div: u32,
    ) -> Result<(), Error> {
        let aux = aux_bits(clock, source)?;
        check_divisor(clock, div)?;
        let device = &self.device;
        match clock {
            AuxClock::Peri => {
                device.clk_peri_ctrl().modify(|_, w| w.enable().clear_bit());
                cortex_m::asm::delay(SWITCH_DELAY_CYCLES);
                device
                    .clk_peri_ctrl()
                    .modify(|_, w| unsafe { w.auxsrc().bits(aux) });
                device.clk_peri_ctrl().modify(|_, w| w.enable().set_bit());
            }
            AuxClock::Usb => {
                device.clk_usb_ctrl().modify(|_, w| w.enable().clear_bit());
                cortex_m::asm::delay(SWITCH_DELAY_CYCLES);
                device
                    .clk_usb_ctrl()
                    .modify(|_, w| unsafe { w.auxsrc().bits(aux) });
                device.clk_usb_div().write(|w| unsafe { w.bits(div << 8) });
                device.clk_usb_ctrl().modify(|_, w| w.enable().set_bit());
            }
            AuxClock::Adc => {
                device.clk_adc_ctrl().modify(|_, w| w.enable().clear_bit());
                cortex_m::asm::delay(SWITCH_DELAY_CYCLES);
                device
                    .clk_adc_ctrl()
                    .modify(|_, w| unsafe { w.auxsrc().bits(aux) });
                device.clk_adc_div().write(|w| unsafe { w.bits(div << 8) });
                device.clk_adc_ctrl().modify(|_, w| w.enable().set_bit());
            }
            AuxClock::Rtc => {
                device.clk_rtc_ctrl().modify(|_, w| w.enable().clear_bit());
                cortex_m::asm::delay(SWITCH_DELAY_CYCLES);
                device
                    .clk_rtc_ctrl()
                    .modify(|_, w| unsafe { w.auxsrc().bits(aux) });
                device.clk_rtc_div().write(|w| unsafe { w.bits(div << 8) });
                device.clk_rtc_ctrl().modify(|_, w| w.enable().set_bit());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_source_encodings_match_the_datasheet() {
        assert_eq!(FrequencySource::PllSys as u8, 0x01);
        assert_eq!(FrequencySource::ClkRef as u8, 0x08);
        assert_eq!(FrequencySource::ClkSys as u8, 0x09);
        assert_eq!(FrequencySource::ClkRtc as u8, 0x0d);
    }

    #[test]
    fn aux_encodings_differ_between_peri_and_the_rest() {
        assert_eq!(aux_bits(AuxClock::Peri, AuxSource::ClkSys), Ok(0x0));
        assert_eq!(aux_bits(AuxClock::Peri, AuxSource::PllUsb), Ok(0x2));
        assert_eq!(aux_bits(AuxClock::Adc, AuxSource::PllUsb), Ok(0x0));
        assert_eq!(aux_bits(AuxClock::Rtc, AuxSource::Xosc), Ok(0x3));
        assert_eq!(
            aux_bits(AuxClock::Usb, AuxSource::ClkSys),
            Err(Error::InvalidSource)
        );
    }

    #[test]
    fn divisors_respect_the_divider_widths() {
        assert_eq!(check_divisor(AuxClock::Peri, 1), Ok(()));
        assert_eq!(check_divisor(AuxClock::Peri, 2), Err(Error::InvalidDivisor));
        assert_eq!(check_divisor(AuxClock::Adc, 0), Err(Error::InvalidDivisor));
        assert_eq!(check_divisor(AuxClock::Adc, 3), Ok(()));
        assert_eq!(check_divisor(AuxClock::Adc, 4), Err(Error::InvalidDivisor));
        assert_eq!(check_divisor(AuxClock::Rtc, 256), Ok(()));
        assert_eq!(
            check_divisor(AuxClock::Rtc, 1 << 24),
            Err(Error::InvalidDivisor)
        );
    }
}
