//! Register map of the detector unit front-end, as seen through the AXI slave interface.
//!
//! Each register is 16 bits wide. Registers that belong to a channel or a filter are laid out at
//! a fixed stride, so the per-channel addresses are computed rather than tabulated. Channel and
//! filter indices in this module are zero-based.

use bitflags::bitflags;

/// Control register
pub const ADDR_CONFIG: u16 = 0x000;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ConfigFlags: u16 {
        const EnableDaq     = 1<<0;
        const OnePps        = 1<<1;
        const FakeAdc       = 1<<6;
        const Filter1       = 1<<8;
        const Filter2       = 1<<9;
        const Filter3       = 1<<10;
        const Filter4       = 1<<11;
        const AutoReboot    = 1<<15;
    }
}

impl ConfigFlags {
    pub fn filter(index: usize) -> Self {
        match index {
            0 => ConfigFlags::Filter1,
            1 => ConfigFlags::Filter2,
            2 => ConfigFlags::Filter3,
            3 => ConfigFlags::Filter4,
            _ => unreachable!()
        }
    }
}

impl Default for ConfigFlags {
    fn default() -> Self {
        ConfigFlags::AutoReboot | ConfigFlags::OnePps | ConfigFlags::EnableDaq
    }
}

/// Trigger enable register
pub const ADDR_TRIGGER: u16 = 0x002;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TriggerFlags: u16 {
        const Ch3AndCh4         = 1<<0;
        /// Channels 1 and 2 in coincidence, with channel 2 above channel 1.
        const Ch1AndCh2Ch2GtCh1 = 1<<1;
        const NotCh1AndCh2      = 1<<2;
        const Internal          = 1<<4;
        /// Periodic trigger every 10 s.
        const TenSec            = 1<<5;
        /// Periodic trigger at 20 Hz.
        const TwentyHz          = 1<<6;
        const Ch1AndCh2         = 1<<7;
        const Channel1          = 1<<8;
        const Channel2          = 1<<9;
        const Channel3          = 1<<10;
        const Channel4          = 1<<11;
    }
}

impl TriggerFlags {
    pub fn channel(index: usize) -> Self {
        match index {
            0 => TriggerFlags::Channel1,
            1 => TriggerFlags::Channel2,
            2 => TriggerFlags::Channel3,
            3 => TriggerFlags::Channel4,
            _ => unreachable!()
        }
    }
}

impl Default for TriggerFlags {
    fn default() -> Self {
        TriggerFlags::Channel1 | TriggerFlags::Channel2 | TriggerFlags::TenSec
    }
}

/// Readout and test pulse register
pub const ADDR_READOUT: u16 = 0x004;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Readout: u16 {
        const Ch1Enabled    = 1<<0;
        const Ch2Enabled    = 1<<1;
        const Ch3Enabled    = 1<<2;
        const Ch4Enabled    = 1<<3;

        const TestPulse     = 1<<7;

        const _             = 0xff00;
    }
}

impl Readout {
    pub fn ch_enabled(index: usize) -> Self {
        match index {
            0 => Readout::Ch1Enabled,
            1 => Readout::Ch2Enabled,
            2 => Readout::Ch3Enabled,
            3 => Readout::Ch4Enabled,
            _ => unreachable!()
        }
    }

    pub fn with_divider_index(self, index: u8) -> Self {
        Readout::from_bits_retain((self.bits() & 0x00ff) | (index as u16) << 8)
    }

    pub fn divider_index(self) -> u8 {
        (self.bits() >> 8) as u8
    }
}

/// Trigger overlap time, in units of 2 ns
pub const ADDR_OVERLAP: u16 = 0x006;

/// Input selector; one nibble per channel
pub const ADDR_INPUT_SELECT: u16 = 0x008;

/// Battery voltage below which the unit switches off
pub const ADDR_BATTERY_LOW: u16 = 0x00C;
/// Battery voltage above which the unit switches back on
pub const ADDR_BATTERY_HIGH: u16 = 0x00E;

pub const ADDR_TIME_PRE_BASE: u16 = 0x010;
pub const ADDR_TIME_POST_BASE: u16 = 0x012;
const TIME_STRIDE: u16 = 0x4;

pub const ADDR_ADC_GAIN_BASE: u16 = 0x020;
pub const ADDR_ADC_INTEGRATION_BASE: u16 = 0x022;
pub const ADDR_ADC_BASE_MAX_BASE: u16 = 0x024;
pub const ADDR_ADC_BASE_MIN_BASE: u16 = 0x026;
const ADC_STRIDE: u16 = 0xC;

pub const ADDR_TRIG_SIGNAL_BASE: u16 = 0x050;
pub const ADDR_TRIG_NOISE_BASE: u16 = 0x052;
pub const ADDR_TRIG_TIMES_BASE: u16 = 0x054;
pub const ADDR_TRIG_TMAX_BASE: u16 = 0x056;
pub const ADDR_TRIG_NMIN_BASE: u16 = 0x058;
pub const ADDR_TRIG_QMIN_BASE: u16 = 0x05A;
const TRIG_STRIDE: u16 = 0xC;

pub const ADDR_FILTER_BASE: u16 = 0x080;
const FILTER_CHANNEL_STRIDE: u16 = 0x10;
const FILTER_STRIDE: u16 = 0x40;

/// Measured trigger rate, read only
pub const ADDR_RATE: u16 = 0x1E0;

pub fn addr_time_pre(index: usize) -> u16 {
    ADDR_TIME_PRE_BASE + TIME_STRIDE * index as u16
}

pub fn addr_time_post(index: usize) -> u16 {
    ADDR_TIME_POST_BASE + TIME_STRIDE * index as u16
}

pub fn addr_adc(base: u16, index: usize) -> u16 {
    base + ADC_STRIDE * index as u16
}

pub fn addr_trig(base: u16, index: usize) -> u16 {
    base + TRIG_STRIDE * index as u16
}

pub fn addr_filter(filter: usize, index: usize) -> u16 {
    ADDR_FILTER_BASE + FILTER_STRIDE * filter as u16 + FILTER_CHANNEL_STRIDE * index as u16
}

// The AXI slot numbers carried next to each address. They are informational only; decoding
// never looks at them.

pub const AXI_GLOBAL: u16 = 0;
pub const AXI_READOUT: u16 = 1;
pub const AXI_INPUT_SELECT: u16 = 2;
pub const AXI_BATTERY: u16 = 3;

pub fn axi_time(index: usize) -> u16 {
    4 + index as u16
}

pub fn axi_adc_gain(index: usize) -> u16 {
    8 + 3 * index as u16
}

pub fn axi_adc_baseline(index: usize) -> u16 {
    9 + 3 * index as u16
}

pub fn axi_trig_threshold(index: usize) -> u16 {
    20 + 3 * index as u16
}

pub fn axi_trig_times(index: usize) -> u16 {
    21 + 3 * index as u16
}

pub fn axi_trig_charge(index: usize) -> u16 {
    22 + 3 * index as u16
}

pub fn axi_filter(filter: usize, index: usize) -> u16 {
    32 + 16 * filter as u16 + 4 * index as u16
}

/// Which register a decoded address refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Config,
    Trigger,
    Readout,
    Overlap,
    InputSelect,
    BatteryLow,
    BatteryHigh,
    TimePre(usize),
    TimePost(usize),
    AdcGain(usize),
    AdcIntegration(usize),
    AdcBaseMax(usize),
    AdcBaseMin(usize),
    TrigSignal(usize),
    TrigNoise(usize),
    TrigTimes(usize),
    TrigTmax(usize),
    TrigNmin(usize),
    TrigQmin(usize),
    /// `(filter, channel)`
    Filter(usize, usize),
    Rate,
}

impl Register {
    pub fn from_address(address: u16) -> Option<Register> {
        let reg = match address {
            ADDR_CONFIG => Register::Config,
            ADDR_TRIGGER => Register::Trigger,
            ADDR_READOUT => Register::Readout,
            ADDR_OVERLAP => Register::Overlap,
            ADDR_INPUT_SELECT => Register::InputSelect,
            ADDR_BATTERY_LOW => Register::BatteryLow,
            ADDR_BATTERY_HIGH => Register::BatteryHigh,
            ADDR_RATE => Register::Rate,
            0x010..=0x01F => {
                let offset = address - ADDR_TIME_PRE_BASE;
                let index = (offset / TIME_STRIDE) as usize;
                match offset % TIME_STRIDE {
                    0 => Register::TimePre(index),
                    2 => Register::TimePost(index),
                    _ => return None,
                }
            }
            0x020..=0x04F => {
                let offset = address - ADDR_ADC_GAIN_BASE;
                let index = (offset / ADC_STRIDE) as usize;
                match offset % ADC_STRIDE {
                    0x0 => Register::AdcGain(index),
                    0x2 => Register::AdcIntegration(index),
                    0x4 => Register::AdcBaseMax(index),
                    0x6 => Register::AdcBaseMin(index),
                    _ => return None, // spare
                }
            }
            0x050..=0x07F => {
                let offset = address - ADDR_TRIG_SIGNAL_BASE;
                let index = (offset / TRIG_STRIDE) as usize;
                match offset % TRIG_STRIDE {
                    0x0 => Register::TrigSignal(index),
                    0x2 => Register::TrigNoise(index),
                    0x4 => Register::TrigTimes(index),
                    0x6 => Register::TrigTmax(index),
                    0x8 => Register::TrigNmin(index),
                    0xA => Register::TrigQmin(index),
                    _ => return None,
                }
            }
            0x080..=0x17F => {
                let offset = address - ADDR_FILTER_BASE;
                if offset % FILTER_CHANNEL_STRIDE != 0 { return None }
                Register::Filter((offset / FILTER_STRIDE) as usize,
                                 (offset % FILTER_STRIDE / FILTER_CHANNEL_STRIDE) as usize)
            }
            _ => return None,
        };
        Some(reg)
    }
}
