//! Unvalidated configuration input.
//!
//! Every field is optional and wide enough to carry whatever a user typed or a file contained,
//! including negative or oversized numbers and NaN. [`DeviceConfig::derive`] turns these into
//! a canonical [`DeviceConfig`].
//!
//! [`DeviceConfig::derive`]: crate::DeviceConfig::derive

use crate::config::{ChannelConfig, DeviceConfig, GlobalConfig, NotchFilter, Source, TriggerConfig};
use crate::config::{CHANNEL_COUNT, FILTER_COUNT};
use crate::regs::axi::{ConfigFlags, TriggerFlags};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NotchSettings {
    pub mean_mhz: Option<f32>,
    pub width: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerSettings {
    pub signal_threshold: Option<i64>,
    pub noise_threshold: Option<i64>,
    pub quiet_time_ns: Option<i64>,
    pub max_crossing_gap_ns: Option<i64>,
    pub after_threshold_ns: Option<i64>,
    pub min_crossings: Option<i64>,
    pub max_crossings: Option<i64>,
    pub min_charge: Option<i64>,
    pub max_charge: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelSettings {
    pub source: Option<Source>,
    pub pre_trigger_ns: Option<i64>,
    pub post_trigger_ns: Option<i64>,
    pub gain_db: Option<f32>,
    pub integration_time: Option<i64>,
    pub baseline_min: Option<i64>,
    pub baseline_max: Option<i64>,
    pub trigger: TriggerSettings,
    pub notch: [NotchSettings; FILTER_COUNT],
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlobalSettings {
    pub config_flags: Option<ConfigFlags>,
    pub trigger_flags: Option<TriggerFlags>,
    pub test_pulse_rate_hz: Option<i64>,
    pub overlap_time_ns: Option<i64>,
    pub battery_low_v: Option<f32>,
    pub battery_high_v: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeviceSettings {
    pub global: GlobalSettings,
    pub channels: [ChannelSettings; CHANNEL_COUNT],
}

impl From<&NotchFilter> for NotchSettings {
    fn from(notch: &NotchFilter) -> Self {
        NotchSettings { mean_mhz: Some(notch.mean_mhz), width: Some(notch.width) }
    }
}

impl From<&TriggerConfig> for TriggerSettings {
    fn from(trigger: &TriggerConfig) -> Self {
        TriggerSettings {
            signal_threshold: Some(trigger.signal_threshold.into()),
            noise_threshold: Some(trigger.noise_threshold.into()),
            quiet_time_ns: Some(trigger.quiet_time_ns.into()),
            max_crossing_gap_ns: Some(trigger.max_crossing_gap_ns.into()),
            after_threshold_ns: Some(trigger.after_threshold_ns.into()),
            min_crossings: Some(trigger.min_crossings.into()),
            max_crossings: Some(trigger.max_crossings.into()),
            min_charge: Some(trigger.min_charge.into()),
            max_charge: Some(trigger.max_charge.into()),
        }
    }
}

impl From<&ChannelConfig> for ChannelSettings {
    fn from(channel: &ChannelConfig) -> Self {
        ChannelSettings {
            source: Some(channel.source),
            pre_trigger_ns: Some(channel.pre_trigger_ns.into()),
            post_trigger_ns: Some(channel.post_trigger_ns.into()),
            gain_db: Some(channel.gain_db),
            integration_time: Some(channel.integration_time.into()),
            baseline_min: Some(channel.baseline_min.into()),
            baseline_max: Some(channel.baseline_max.into()),
            trigger: (&channel.trigger).into(),
            notch: channel.notch.each_ref().map(NotchSettings::from),
        }
    }
}

impl From<&GlobalConfig> for GlobalSettings {
    fn from(global: &GlobalConfig) -> Self {
        GlobalSettings {
            config_flags: Some(global.config_flags),
            trigger_flags: Some(global.trigger_flags),
            test_pulse_rate_hz: Some(global.test_pulse_rate_hz.into()),
            overlap_time_ns: Some(global.overlap_time_ns.into()),
            battery_low_v: Some(global.battery_low_v),
            battery_high_v: Some(global.battery_high_v),
        }
    }
}

impl From<&DeviceConfig> for DeviceSettings {
    fn from(config: &DeviceConfig) -> Self {
        DeviceSettings {
            global: (&config.global).into(),
            channels: config.channels.each_ref().map(ChannelSettings::from),
        }
    }
}
