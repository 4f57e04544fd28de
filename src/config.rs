//! Canonical configuration of a detector unit, in terms of physical quantities.
//!
//! A [`DeviceConfig`] is what the register codec consumes and produces. Values obtained from
//! [`DeviceConfig::derive`] are always within the ranges the hardware accepts; values obtained
//! from decoding registers are taken as read from the board.

use crate::regs::axi::{ConfigFlags, TriggerFlags};

pub const CHANNEL_COUNT: usize = 4;
pub const FILTER_COUNT: usize = 4;

/// Signal routed into a readout channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Off,
    Adc1,
    Adc2,
    Adc3,
    Adc4,
    AdcFiltered1,
    AdcFiltered2,
    AdcFiltered3,
    AdcFiltered4,
}

impl Source {
    pub const ALL: [Source; 9] = [
        Source::Off,
        Source::Adc1,
        Source::Adc2,
        Source::Adc3,
        Source::Adc4,
        Source::AdcFiltered1,
        Source::AdcFiltered2,
        Source::AdcFiltered3,
        Source::AdcFiltered4,
    ];

    /// The unfiltered ADC input with the same number as the channel at `index`.
    pub fn adc(index: usize) -> Source {
        match index {
            0 => Source::Adc1,
            1 => Source::Adc2,
            2 => Source::Adc3,
            3 => Source::Adc4,
            _ => unreachable!()
        }
    }

    /// Nibble written into the input selector register. `Off` is expressed through the readout
    /// register instead, and selects ADC 1 here.
    pub(crate) fn selector_code(self) -> u16 {
        match self {
            Self::Off          => 0,
            Self::Adc1         => 0,
            Self::Adc2         => 1,
            Self::Adc3         => 2,
            Self::Adc4         => 3,
            Self::AdcFiltered1 => 4,
            Self::AdcFiltered2 => 5,
            Self::AdcFiltered3 => 6,
            Self::AdcFiltered4 => 7,
        }
    }

    pub(crate) fn from_selector_code(code: u16) -> Option<Source> {
        match code {
            0 => Some(Self::Adc1),
            1 => Some(Self::Adc2),
            2 => Some(Self::Adc3),
            3 => Some(Self::Adc4),
            4 => Some(Self::AdcFiltered1),
            5 => Some(Self::AdcFiltered2),
            6 => Some(Self::AdcFiltered3),
            7 => Some(Self::AdcFiltered4),
            _ => None,
        }
    }

    pub fn is_off(self) -> bool {
        self == Self::Off
    }
}

/// IIR notch filter applied to the filtered ADC inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotchFilter {
    /// Center frequency in MHz.
    pub mean_mhz: f32,
    /// Pole radius. `1.0` gives an infinitely narrow notch; smaller values widen it.
    pub width: f32,
}

impl NotchFilter {
    pub(crate) fn default_for(filter: usize) -> NotchFilter {
        NotchFilter { mean_mhz: 90.0 + 5.0 * filter as f32, width: 0.999 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerConfig {
    /// Signal threshold in ADC counts.
    pub signal_threshold: u16,
    /// Noise threshold in ADC counts.
    pub noise_threshold: u16,
    /// Required quiet time before the signal threshold is crossed; multiple of 4 ns.
    pub quiet_time_ns: u16,
    /// Maximum time between threshold crossings; multiple of 4 ns.
    pub max_crossing_gap_ns: u16,
    /// Time after the signal threshold crossing; multiple of 16 ns.
    pub after_threshold_ns: u16,
    pub min_crossings: u8,
    pub max_crossings: u8,
    pub min_charge: u8,
    pub max_charge: u8,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            signal_threshold: 100,
            noise_threshold: 50,
            quiet_time_ns: 512,
            max_crossing_gap_ns: 20,
            after_threshold_ns: 512,
            min_crossings: 0,
            max_crossings: 10,
            min_charge: 0,
            max_charge: 255,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelConfig {
    pub source: Source,
    /// Readout window before the trigger; multiple of 32 ns.
    pub pre_trigger_ns: u16,
    /// Readout window after the trigger; multiple of 32 ns.
    pub post_trigger_ns: u16,
    /// Additional gain in dB, from -14 to 23.5.
    pub gain_db: f32,
    pub integration_time: u8,
    pub baseline_min: u16,
    pub baseline_max: u16,
    pub trigger: TriggerConfig,
    pub notch: [NotchFilter; FILTER_COUNT],
}

impl ChannelConfig {
    pub fn default_for(index: usize) -> ChannelConfig {
        ChannelConfig {
            source: Source::adc(index),
            pre_trigger_ns: 1024,
            post_trigger_ns: 960,
            gain_db: 0.0,
            integration_time: 5,
            baseline_min: 6144,
            baseline_max: 10240,
            trigger: TriggerConfig::default(),
            notch: std::array::from_fn(NotchFilter::default_for),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalConfig {
    pub config_flags: ConfigFlags,
    pub trigger_flags: TriggerFlags,
    /// Internal test pulse rate; 0 when disabled.
    pub test_pulse_rate_hz: u32,
    /// Trigger overlap time; multiple of 32 ns.
    pub overlap_time_ns: u16,
    pub battery_low_v: f32,
    pub battery_high_v: f32,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            config_flags: ConfigFlags::default(),
            trigger_flags: TriggerFlags::default(),
            test_pulse_rate_hz: 0,
            overlap_time_ns: 64,
            battery_low_v: 9.0,
            battery_high_v: 12.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceConfig {
    pub global: GlobalConfig,
    pub channels: [ChannelConfig; CHANNEL_COUNT],
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            global: GlobalConfig::default(),
            channels: std::array::from_fn(ChannelConfig::default_for),
        }
    }
}
