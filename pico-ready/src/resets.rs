//! Subsystem Resets
// See [Chapter 2 Section 14](https://datasheets.raspberrypi.org/rp2040/rp2040_datasheet.pdf) for more details
use rp2040_pac as pac;

mod private {
    pub trait SubsystemReset {
        fn reset_bring_up(&self, resets: &mut super::pac::RESETS);
        fn reset_bring_down(&self, resets: &mut super::pac::RESETS);
    }
}

pub(crate) use private::SubsystemReset;

macro_rules! generate_reset {
    ($MODULE:ident, $module:ident) => {
        impl SubsystemReset for pac::$MODULE {
            fn reset_bring_up(&self, resets: &mut pac::RESETS) {
                resets.reset().modify(|_, w| w.$module().clear_bit());
                while resets.reset_done().read().$module().bit_is_clear() {}
            }
            fn reset_bring_down(&self, resets: &mut pac::RESETS) {
                resets.reset().modify(|_, w| w.$module().set_bit());
            }
        }
    };
}

// In datasheet order
generate_reset!(TIMER, timer);
generate_reset!(PWM, pwm);
generate_reset!(PADS_BANK0, pads_bank0);
generate_reset!(IO_BANK0, io_bank0);
generate_reset!(ADC, adc);
