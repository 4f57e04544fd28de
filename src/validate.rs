//! Normalization of configuration input into ranges the hardware accepts.
//!
//! Validation never fails. Missing values take a default, out of range values are clamped,
//! timing values are rounded to the granularity of the hardware counters, and fields that share
//! a budget are reduced until the budget fits. The result is a fixed point: validating
//! a canonical configuration returns it unchanged.

use crate::config::{ChannelConfig, DeviceConfig, GlobalConfig, NotchFilter, TriggerConfig};
use crate::divider::{self, ClockDividerTable};
use crate::settings::{ChannelSettings, DeviceSettings, GlobalSettings, NotchSettings, TriggerSettings};

pub const OVERLAP_MIN_NS: i64 = 64;
pub const OVERLAP_MAX_NS: i64 = 32000;
pub const WINDOW_MIN_NS: i64 = 64;
pub const WINDOW_MAX_NS: i64 = 32000;
pub const WINDOW_STEP_NS: i64 = 32;
/// Overlap plus pre-trigger time may not exceed this.
pub const PRE_TRIGGER_BUDGET_NS: i64 = 32704;
/// Overlap plus pre- and post-trigger time may not exceed this.
pub const WINDOW_BUDGET_NS: i64 = 32768;

pub const TRIGGER_TIME_MAX_NS: i64 = 1020;
pub const TRIGGER_TIME_STEP_NS: i64 = 4;
pub const AFTER_THRESHOLD_MAX_NS: i64 = 4080;
pub const AFTER_THRESHOLD_STEP_NS: i64 = 16;
pub const INTEGRATION_TIME_MAX: i64 = 15;

pub const GAIN_MIN_DB: f32 = -14.0;
pub const GAIN_MAX_DB: f32 = 23.5;

pub const BATTERY_MIN_V: f32 = 5.0;
pub const BATTERY_MAX_V: f32 = 15.0;
/// Largest switch-off voltage that still leaves room for the hysteresis below the maximum.
pub const BATTERY_LOW_MAX_V: f32 = 12.0;
pub const BATTERY_HYSTERESIS_V: f32 = 2.0;

/// Notch frequencies are bounded by the Nyquist frequency of the 500 MSa/s ADC.
pub const NOTCH_MEAN_MAX_MHZ: f32 = 250.0;

/// Rounds `value` to a multiple of `step`, with halves going down.
pub fn quantize(value: i64, step: i64) -> i64 {
    step * (value + step / 2 - 1).div_euclid(step)
}

fn clamp_int(name: &str, value: Option<i64>, default: i64, min: i64, max: i64) -> i64 {
    let raw = value.unwrap_or(default);
    let clamped = raw.clamp(min, max);
    if clamped != raw {
        log::trace!("{}: clamped {} to {}", name, raw, clamped);
    }
    clamped
}

fn clamp_time(name: &str, value: Option<i64>, default: i64, min: i64, max: i64, step: i64) -> i64 {
    let clamped = clamp_int(name, value, default, min, max);
    let quantized = quantize(clamped, step);
    if quantized != clamped {
        log::trace!("{}: quantized {} to {}", name, clamped, quantized);
    }
    quantized
}

fn clamp_float(name: &str, value: Option<f32>, default: f32, min: f32, max: f32) -> f32 {
    let raw = value.filter(|value| !value.is_nan()).unwrap_or(default);
    let clamped = raw.clamp(min, max);
    if clamped != raw {
        log::trace!("{}: clamped {} to {}", name, raw, clamped);
    }
    clamped
}

fn derive_test_pulse(rate_hz: Option<i64>) -> u32 {
    match rate_hz.unwrap_or(0) {
        0 => 0,
        rate_hz => {
            let rate_hz = rate_hz.clamp(divider::MIN_REQUEST_HZ.into(), divider::REFERENCE_HZ.into());
            let (index, actual_hz) = ClockDividerTable::get().closest_index_for_rate(rate_hz as u32);
            log::trace!("test pulse: requested {} Hz, using divider {} at {} Hz",
                        rate_hz, index, actual_hz);
            actual_hz
        }
    }
}

fn derive_battery(low_v: Option<f32>, high_v: Option<f32>) -> (f32, f32) {
    let mut low_v = low_v.filter(|v| !v.is_nan()).unwrap_or(BATTERY_MIN_V).max(BATTERY_MIN_V);
    let mut high_v = high_v.filter(|v| !v.is_nan()).unwrap_or(BATTERY_MAX_V).min(BATTERY_MAX_V);
    if low_v > high_v - BATTERY_HYSTERESIS_V {
        low_v = low_v.clamp(BATTERY_MIN_V, BATTERY_LOW_MAX_V);
        high_v = low_v + BATTERY_HYSTERESIS_V;
        // the sum may round; make the difference exact
        low_v = high_v - BATTERY_HYSTERESIS_V;
        log::trace!("battery: moved window to {}..{} V", low_v, high_v);
    }
    (low_v, high_v)
}

impl GlobalConfig {
    fn derive(settings: &GlobalSettings) -> GlobalConfig {
        let defaults = GlobalConfig::default();
        let (battery_low_v, battery_high_v) =
            derive_battery(settings.battery_low_v, settings.battery_high_v);
        GlobalConfig {
            config_flags: settings.config_flags.unwrap_or(defaults.config_flags),
            trigger_flags: settings.trigger_flags.unwrap_or(defaults.trigger_flags),
            test_pulse_rate_hz: derive_test_pulse(settings.test_pulse_rate_hz),
            overlap_time_ns: clamp_time("overlap", settings.overlap_time_ns, OVERLAP_MIN_NS,
                                        OVERLAP_MIN_NS, OVERLAP_MAX_NS, WINDOW_STEP_NS) as u16,
            battery_low_v,
            battery_high_v,
        }
    }
}

impl TriggerConfig {
    fn derive(settings: &TriggerSettings) -> TriggerConfig {
        let defaults = TriggerConfig::default();
        let u16_max = u16::MAX.into();
        let u8_max = u8::MAX.into();
        let min_crossings = clamp_int("min crossings", settings.min_crossings, 0, 0, u8_max);
        let min_charge = clamp_int("min charge", settings.min_charge, 0, 0, u8_max);
        TriggerConfig {
            signal_threshold: clamp_int("signal threshold", settings.signal_threshold,
                                        defaults.signal_threshold.into(), 0, u16_max) as u16,
            noise_threshold: clamp_int("noise threshold", settings.noise_threshold,
                                       defaults.noise_threshold.into(), 0, u16_max) as u16,
            quiet_time_ns: clamp_time("quiet time", settings.quiet_time_ns, 0,
                                      0, TRIGGER_TIME_MAX_NS, TRIGGER_TIME_STEP_NS) as u16,
            max_crossing_gap_ns: clamp_time("crossing gap", settings.max_crossing_gap_ns, 0,
                                            0, TRIGGER_TIME_MAX_NS, TRIGGER_TIME_STEP_NS) as u16,
            after_threshold_ns: clamp_time("after threshold", settings.after_threshold_ns, 0,
                                           0, AFTER_THRESHOLD_MAX_NS, AFTER_THRESHOLD_STEP_NS) as u16,
            min_crossings: min_crossings as u8,
            max_crossings: clamp_int("max crossings", settings.max_crossings, min_crossings,
                                     min_crossings, u8_max) as u8,
            min_charge: min_charge as u8,
            max_charge: clamp_int("max charge", settings.max_charge, min_charge,
                                  min_charge, u8_max) as u8,
        }
    }
}

impl NotchFilter {
    fn derive(settings: &NotchSettings, filter: usize) -> NotchFilter {
        let defaults = NotchFilter::default_for(filter);
        NotchFilter {
            mean_mhz: clamp_float("notch mean", settings.mean_mhz, defaults.mean_mhz,
                                  0.0, NOTCH_MEAN_MAX_MHZ),
            width: clamp_float("notch width", settings.width, defaults.width, 0.0, 1.0),
        }
    }
}

impl ChannelConfig {
    fn derive(settings: &ChannelSettings, index: usize, overlap_time_ns: i64) -> ChannelConfig {
        let defaults = ChannelConfig::default_for(index);
        let u16_max = u16::MAX.into();

        let mut pre_trigger_ns = clamp_time("pre trigger", settings.pre_trigger_ns, WINDOW_MIN_NS,
                                            WINDOW_MIN_NS, WINDOW_MAX_NS, WINDOW_STEP_NS);
        if overlap_time_ns + pre_trigger_ns > PRE_TRIGGER_BUDGET_NS {
            pre_trigger_ns = PRE_TRIGGER_BUDGET_NS - overlap_time_ns;
            log::trace!("channel {}: pre trigger reduced to {} ns", index + 1, pre_trigger_ns);
        }
        let mut post_trigger_ns = clamp_time("post trigger", settings.post_trigger_ns, WINDOW_MIN_NS,
                                             WINDOW_MIN_NS, WINDOW_MAX_NS, WINDOW_STEP_NS);
        if overlap_time_ns + pre_trigger_ns + post_trigger_ns > WINDOW_BUDGET_NS {
            post_trigger_ns = WINDOW_BUDGET_NS - overlap_time_ns - pre_trigger_ns;
            log::trace!("channel {}: post trigger reduced to {} ns", index + 1, post_trigger_ns);
        }

        ChannelConfig {
            source: settings.source.unwrap_or(defaults.source),
            pre_trigger_ns: pre_trigger_ns as u16,
            post_trigger_ns: post_trigger_ns as u16,
            gain_db: clamp_float("gain", settings.gain_db, defaults.gain_db,
                                 GAIN_MIN_DB, GAIN_MAX_DB),
            integration_time: clamp_int("integration time", settings.integration_time, 0,
                                        0, INTEGRATION_TIME_MAX) as u8,
            baseline_min: clamp_int("baseline min", settings.baseline_min,
                                    defaults.baseline_min.into(), 0, u16_max) as u16,
            baseline_max: clamp_int("baseline max", settings.baseline_max,
                                    defaults.baseline_max.into(), 0, u16_max) as u16,
            trigger: TriggerConfig::derive(&settings.trigger),
            notch: std::array::from_fn(|filter| NotchFilter::derive(&settings.notch[filter], filter)),
        }
    }
}

impl DeviceConfig {
    /// Produces the canonical configuration for `settings`.
    ///
    /// Missing fields take their defaults, and every other field is brought into its hardware
    /// range. The pre- and post-trigger windows of each channel are shortened, in that order,
    /// when together with the overlap time they exceed the readout buffer.
    pub fn derive(settings: &DeviceSettings) -> DeviceConfig {
        let global = GlobalConfig::derive(&settings.global);
        let overlap_time_ns = global.overlap_time_ns.into();
        DeviceConfig {
            global,
            channels: std::array::from_fn(|index|
                ChannelConfig::derive(&settings.channels[index], index, overlap_time_ns)),
        }
    }

    pub fn canonicalize(&self) -> DeviceConfig {
        DeviceConfig::derive(&DeviceSettings::from(self))
    }
}
