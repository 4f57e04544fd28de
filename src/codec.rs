//! Translation between a [`DeviceConfig`] and the register records that program the board.

use std::fmt;

use crate::config::{ChannelConfig, DeviceConfig, Source, CHANNEL_COUNT, FILTER_COUNT};
use crate::divider::ClockDividerTable;
use crate::regs::axi::{self, ConfigFlags, Readout, Register, TriggerFlags};

/// Full scale of the gain DAC in dB: 37.5 dB gain range over a 2.5 V reference.
const GAIN_SCALE_DB: f64 = 37.5 * 2.5;
const GAIN_OFFSET_DB: f64 = 14.0;
const GAIN_CODES: f64 = 4096.0;

/// Battery voltage is sensed through an 18k/91k divider into a 12-bit 2.5 V ADC.
const BATTERY_VOLTS_PER_CODE: f64 = 2.5 * (18.0 + 91.0) / (18.0 * 4096.0);

/// Window and overlap registers count 2 ns clock ticks.
const WINDOW_TICK_NS: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegisterValue {
    Word(u16),
    /// Notch filter parameters, converted to coefficients by the acquisition software.
    Notch { mean_mhz: f32, width: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegisterRecord {
    /// Slot on the internal bus. Carried for documentation; `address` alone identifies
    /// the register.
    pub axi: u16,
    pub address: u16,
    pub value: RegisterValue,
}

impl RegisterRecord {
    pub fn word(axi: u16, address: u16, value: u16) -> RegisterRecord {
        RegisterRecord { axi, address, value: RegisterValue::Word(value) }
    }

    pub fn notch(axi: u16, address: u16, mean_mhz: f32, width: f32) -> RegisterRecord {
        RegisterRecord { axi, address, value: RegisterValue::Notch { mean_mhz, width } }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedKind {
    /// Fewer tokens than a record needs, or more than it can hold.
    TokenCount(usize),
    InvalidInteger(String),
    InvalidFloat(String),
    /// The value does not fit in a 16-bit register.
    OutOfRange(String),
    /// Filter parameters at a word register, or a word at a filter register.
    ValueKind { address: u16 },
}

/// A record that could not be interpreted. Decoding skips it and carries on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRecord {
    /// 1-based line number, if the record came from text.
    pub line: Option<usize>,
    pub text: String,
    pub kind: MalformedKind,
}

impl MalformedRecord {
    pub fn new(text: impl Into<String>, kind: MalformedKind) -> MalformedRecord {
        MalformedRecord { line: None, text: text.into(), kind }
    }

    pub fn at_line(self, line: usize) -> MalformedRecord {
        MalformedRecord { line: Some(line), ..self }
    }
}

impl fmt::Display for MalformedKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::TokenCount(count) =>
                write!(f, "expected 3 or 4 fields, found {}", count),
            Self::InvalidInteger(token) =>
                write!(f, "invalid integer {:?}", token),
            Self::InvalidFloat(token) =>
                write!(f, "invalid number {:?}", token),
            Self::OutOfRange(token) =>
                write!(f, "{:?} does not fit in 16 bits", token),
            Self::ValueKind { address } =>
                write!(f, "wrong kind of value for register {:#05x}", address),
        }
    }
}

impl fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {} in {:?}", line, self.kind, self.text),
            None => write!(f, "{} in {:?}", self.kind, self.text),
        }
    }
}

impl std::error::Error for MalformedRecord {}

fn parse_int(token: &str) -> Result<u16, MalformedKind> {
    let (digits, radix) = match token.get(..2) {
        Some("0x") | Some("0X") => (&token[2..], 16),
        Some("0o") | Some("0O") => (&token[2..], 8),
        Some("0b") | Some("0B") => (&token[2..], 2),
        _ => (token, 10),
    };
    let value = i64::from_str_radix(digits, radix)
        .map_err(|_| MalformedKind::InvalidInteger(token.to_owned()))?;
    u16::try_from(value).map_err(|_| MalformedKind::OutOfRange(token.to_owned()))
}

fn parse_float(token: &str) -> Result<f32, MalformedKind> {
    token.parse().map_err(|_| MalformedKind::InvalidFloat(token.to_owned()))
}

impl RegisterRecord {
    /// Interprets the whitespace-separated fields of one record:
    /// `axi address value` for a register word, or `axi address mean width` for a filter.
    pub fn from_tokens(tokens: &[&str]) -> Result<RegisterRecord, MalformedRecord> {
        let malformed = |kind| MalformedRecord::new(tokens.join(" "), kind);
        match *tokens {
            [axi, address, value] => Ok(RegisterRecord::word(
                parse_int(axi).map_err(malformed)?,
                parse_int(address).map_err(malformed)?,
                parse_int(value).map_err(malformed)?,
            )),
            [axi, address, mean_mhz, width] => Ok(RegisterRecord::notch(
                parse_int(axi).map_err(malformed)?,
                parse_int(address).map_err(malformed)?,
                parse_float(mean_mhz).map_err(malformed)?,
                parse_float(width).map_err(malformed)?,
            )),
            _ => Err(malformed(MalformedKind::TokenCount(tokens.len()))),
        }
    }
}

pub fn gain_code(gain_db: f32) -> u16 {
    ((gain_db as f64 + GAIN_OFFSET_DB) * GAIN_CODES / GAIN_SCALE_DB).round() as u16
}

pub fn gain_db(code: u16) -> f32 {
    let gain_db = code as f64 * GAIN_SCALE_DB / GAIN_CODES - GAIN_OFFSET_DB;
    ((gain_db * 100.0).round() / 100.0) as f32
}

pub fn battery_code(volts: f32) -> u16 {
    (volts as f64 / BATTERY_VOLTS_PER_CODE).round() as u16
}

pub fn battery_volts(code: u16) -> f32 {
    ((code as f64 * BATTERY_VOLTS_PER_CODE * 10.0).round() / 10.0) as f32
}

fn encode_channel_windows(records: &mut Vec<RegisterRecord>, index: usize, channel: &ChannelConfig) {
    records.push(RegisterRecord::word(axi::axi_time(index), axi::addr_time_pre(index),
                                      channel.pre_trigger_ns / WINDOW_TICK_NS));
    records.push(RegisterRecord::word(axi::axi_time(index), axi::addr_time_post(index),
                                      channel.post_trigger_ns / WINDOW_TICK_NS));
}

fn encode_channel_adc(records: &mut Vec<RegisterRecord>, index: usize, channel: &ChannelConfig) {
    let (gain_axi, baseline_axi) = (axi::axi_adc_gain(index), axi::axi_adc_baseline(index));
    records.extend([
        RegisterRecord::word(gain_axi, axi::addr_adc(axi::ADDR_ADC_GAIN_BASE, index),
                             gain_code(channel.gain_db)),
        RegisterRecord::word(gain_axi, axi::addr_adc(axi::ADDR_ADC_INTEGRATION_BASE, index),
                             (channel.integration_time as u16) << 8),
        RegisterRecord::word(baseline_axi, axi::addr_adc(axi::ADDR_ADC_BASE_MAX_BASE, index),
                             channel.baseline_max),
        RegisterRecord::word(baseline_axi, axi::addr_adc(axi::ADDR_ADC_BASE_MIN_BASE, index),
                             channel.baseline_min),
    ]);
}

fn encode_channel_trigger(records: &mut Vec<RegisterRecord>, index: usize, channel: &ChannelConfig) {
    let trigger = &channel.trigger;
    let times = (trigger.after_threshold_ns / 16) << 8 | trigger.quiet_time_ns / 4;
    let tmax = (trigger.max_crossings as u16) << 8 | trigger.max_crossing_gap_ns / 4;
    let nmin = (trigger.max_charge as u16) << 8 | trigger.min_crossings as u16;
    let (threshold_axi, times_axi, charge_axi) =
        (axi::axi_trig_threshold(index), axi::axi_trig_times(index), axi::axi_trig_charge(index));
    records.extend([
        RegisterRecord::word(threshold_axi, axi::addr_trig(axi::ADDR_TRIG_SIGNAL_BASE, index),
                             trigger.signal_threshold),
        RegisterRecord::word(threshold_axi, axi::addr_trig(axi::ADDR_TRIG_NOISE_BASE, index),
                             trigger.noise_threshold),
        RegisterRecord::word(times_axi, axi::addr_trig(axi::ADDR_TRIG_TIMES_BASE, index), times),
        RegisterRecord::word(times_axi, axi::addr_trig(axi::ADDR_TRIG_TMAX_BASE, index), tmax),
        RegisterRecord::word(charge_axi, axi::addr_trig(axi::ADDR_TRIG_NMIN_BASE, index), nmin),
        RegisterRecord::word(charge_axi, axi::addr_trig(axi::ADDR_TRIG_QMIN_BASE, index),
                             trigger.min_charge as u16),
    ]);
}

/// Produces the register records programming `config`.
///
/// The configuration is expected to be canonical (see [`DeviceConfig::derive`]); values are
/// only converted to register units, never range checked. The test pulse rate is mapped onto
/// the nearest divider position that does not exceed it.
pub fn encode(config: &DeviceConfig) -> Vec<RegisterRecord> {
    let global = &config.global;
    let mut records = Vec::new();

    records.push(RegisterRecord::word(axi::AXI_GLOBAL, axi::ADDR_CONFIG, global.config_flags.bits()));
    records.push(RegisterRecord::word(axi::AXI_GLOBAL, axi::ADDR_TRIGGER, global.trigger_flags.bits()));

    let mut readout = Readout::empty();
    if global.test_pulse_rate_hz != 0 {
        let (index, _) = ClockDividerTable::get().closest_index_for_rate(global.test_pulse_rate_hz);
        readout = (readout | Readout::TestPulse).with_divider_index(index);
    }
    let mut selector = 0;
    for (index, channel) in config.channels.iter().enumerate() {
        if !channel.source.is_off() {
            readout.insert(Readout::ch_enabled(index));
        }
        selector |= channel.source.selector_code() << (4 * index);
    }
    records.push(RegisterRecord::word(axi::AXI_READOUT, axi::ADDR_READOUT, readout.bits()));
    records.push(RegisterRecord::word(axi::AXI_READOUT, axi::ADDR_OVERLAP,
                                      global.overlap_time_ns / WINDOW_TICK_NS));
    records.push(RegisterRecord::word(axi::AXI_INPUT_SELECT, axi::ADDR_INPUT_SELECT, selector));
    records.push(RegisterRecord::word(axi::AXI_BATTERY, axi::ADDR_BATTERY_LOW,
                                      battery_code(global.battery_low_v)));
    records.push(RegisterRecord::word(axi::AXI_BATTERY, axi::ADDR_BATTERY_HIGH,
                                      battery_code(global.battery_high_v)));

    for (index, channel) in config.channels.iter().enumerate() {
        encode_channel_windows(&mut records, index, channel);
    }
    for (index, channel) in config.channels.iter().enumerate() {
        encode_channel_adc(&mut records, index, channel);
    }
    for (index, channel) in config.channels.iter().enumerate() {
        encode_channel_trigger(&mut records, index, channel);
    }
    for filter in 0..FILTER_COUNT {
        for (index, channel) in config.channels.iter().enumerate() {
            let notch = &channel.notch[filter];
            records.push(RegisterRecord::notch(axi::axi_filter(filter, index),
                                               axi::addr_filter(filter, index),
                                               notch.mean_mhz, notch.width));
        }
    }

    for record in records.iter() {
        log::trace!("encode: {:?}", record);
    }
    records
}

/// Result of decoding a sequence of register records.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub config: DeviceConfig,
    /// Records that were skipped, in input order.
    pub diagnostics: Vec<MalformedRecord>,
    /// Contents of the read-only rate register, if present.
    pub expected_rate: Option<u16>,
}

/// Reconstructs a configuration from register records.
///
/// Decoding is best effort. Records are applied on top of [`DeviceConfig::default`] in order,
/// identified by address only. Malformed records are collected into
/// [`Decoded::diagnostics`], and records at unknown addresses are ignored. The result is not
/// validated; it describes what the board was programmed with.
pub fn decode<I>(records: I) -> Decoded
        where I: IntoIterator<Item = Result<RegisterRecord, MalformedRecord>> {
    let table = ClockDividerTable::get();
    let mut config = DeviceConfig::default();
    let mut diagnostics = Vec::new();
    let mut expected_rate = None;
    let mut readout = None;
    let mut selector = None;

    for record in records {
        let record = match record {
            Ok(record) => record,
            Err(malformed) => {
                log::warn!("skipping malformed record: {}", malformed);
                diagnostics.push(malformed);
                continue
            }
        };
        log::trace!("decode: {:?}", record);
        let Some(register) = Register::from_address(record.address) else {
            log::debug!("ignoring register {:#05x}", record.address);
            continue
        };
        match (register, record.value) {
            (Register::Filter(filter, index), RegisterValue::Notch { mean_mhz, width }) => {
                config.channels[index].notch[filter].mean_mhz = mean_mhz;
                config.channels[index].notch[filter].width = width;
            }
            (Register::Filter(..), RegisterValue::Word(_)) |
            (_, RegisterValue::Notch { .. }) => {
                let malformed = MalformedRecord::new(
                    format!("{:?}", record), MalformedKind::ValueKind { address: record.address });
                log::warn!("skipping malformed record: {}", malformed);
                diagnostics.push(malformed);
            }
            (register, RegisterValue::Word(value)) => {
                let global = &mut config.global;
                match register {
                    Register::Config =>
                        global.config_flags = ConfigFlags::from_bits_truncate(value),
                    Register::Trigger =>
                        global.trigger_flags = TriggerFlags::from_bits_truncate(value),
                    Register::Readout => {
                        let value = Readout::from_bits_retain(value);
                        global.test_pulse_rate_hz = if value.contains(Readout::TestPulse) {
                            table.rate_for_index(value.divider_index())
                        } else {
                            0
                        };
                        readout = Some(value);
                    }
                    Register::Overlap =>
                        global.overlap_time_ns = value << 1,
                    Register::InputSelect =>
                        selector = Some(value),
                    Register::BatteryLow =>
                        global.battery_low_v = battery_volts(value),
                    Register::BatteryHigh =>
                        global.battery_high_v = battery_volts(value),
                    Register::Rate =>
                        expected_rate = Some(value),
                    register => decode_channel_word(&mut config.channels, register, value),
                }
            }
        }
    }

    if let Some(selector) = selector {
        for (index, channel) in config.channels.iter_mut().enumerate() {
            let code = (selector >> (4 * index)) & 0xf;
            match Source::from_selector_code(code) {
                Some(source) => channel.source = source,
                None => log::warn!("channel {}: unknown input selector {}", index + 1, code),
            }
        }
    }
    if let Some(readout) = readout {
        for (index, channel) in config.channels.iter_mut().enumerate() {
            if !readout.contains(Readout::ch_enabled(index)) {
                channel.source = Source::Off;
            }
        }
    }

    Decoded { config, diagnostics, expected_rate }
}

fn decode_channel_word(channels: &mut [ChannelConfig; CHANNEL_COUNT], register: Register, value: u16) {
    let [high, low] = value.to_be_bytes();
    match register {
        Register::TimePre(index) =>
            channels[index].pre_trigger_ns = value << 1,
        Register::TimePost(index) =>
            channels[index].post_trigger_ns = value << 1,
        Register::AdcGain(index) =>
            channels[index].gain_db = gain_db(value),
        Register::AdcIntegration(index) =>
            channels[index].integration_time = high & 0xf,
        Register::AdcBaseMax(index) =>
            channels[index].baseline_max = value,
        Register::AdcBaseMin(index) =>
            channels[index].baseline_min = value,
        Register::TrigSignal(index) =>
            channels[index].trigger.signal_threshold = value,
        Register::TrigNoise(index) =>
            channels[index].trigger.noise_threshold = value,
        Register::TrigTimes(index) => {
            channels[index].trigger.after_threshold_ns = 16 * high as u16;
            channels[index].trigger.quiet_time_ns = 4 * low as u16;
        }
        Register::TrigTmax(index) => {
            channels[index].trigger.max_crossings = high;
            channels[index].trigger.max_crossing_gap_ns = 4 * low as u16;
        }
        Register::TrigNmin(index) => {
            channels[index].trigger.max_charge = high;
            channels[index].trigger.min_crossings = low;
        }
        Register::TrigQmin(index) =>
            channels[index].trigger.min_charge = low,
        _ => unreachable!("global register {:?}", register),
    }
}

/// Decodes records that are known to be well formed.
pub fn decode_records(records: &[RegisterRecord]) -> Decoded {
    decode(records.iter().copied().map(Ok))
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;
    use crate::settings::strategy::device_settings;

    fn find(records: &[RegisterRecord], address: u16) -> RegisterRecord {
        *records.iter().find(|record| record.address == address)
            .unwrap_or_else(|| panic!("no record at {:#05x}", address))
    }

    macro_rules! assert_word {
        ($records:expr, $address:expr => $axi:expr, $value:expr) => {
            assert_eq!(find(&$records, $address), RegisterRecord::word($axi, $address, $value));
        };
    }

    fn assert_config_eq(actual: &DeviceConfig, expected: &DeviceConfig) {
        let (a, e) = (&actual.global, &expected.global);
        assert_eq!(a.config_flags, e.config_flags);
        assert_eq!(a.trigger_flags, e.trigger_flags);
        assert_eq!(a.test_pulse_rate_hz, e.test_pulse_rate_hz);
        assert_eq!(a.overlap_time_ns, e.overlap_time_ns);
        assert!((a.battery_low_v - e.battery_low_v).abs() <= 0.06, "{:?} {:?}", a, e);
        assert!((a.battery_high_v - e.battery_high_v).abs() <= 0.06, "{:?} {:?}", a, e);
        for (a, e) in actual.channels.iter().zip(expected.channels.iter()) {
            assert!((a.gain_db - e.gain_db).abs() <= 0.02, "{:?} {:?}", a, e);
            assert_eq!(ChannelConfig { gain_db: 0.0, ..*a }, ChannelConfig { gain_db: 0.0, ..*e });
        }
    }

    #[test]
    fn test_gain_codes() {
        assert_eq!(gain_code(-14.0), 0);
        assert_eq!(gain_code(0.0), 612);
        assert_eq!(gain_code(7.5), 939);
        assert_eq!(gain_code(23.5), 1638);
        assert!((gain_db(gain_code(7.5)) - 7.5).abs() <= 0.02);
        assert_eq!(gain_db(0), -14.0);
    }

    #[test]
    fn test_battery_codes() {
        assert_eq!(battery_code(9.0), 2435);
        assert_eq!(battery_code(12.5), 3382);
        assert_eq!(battery_volts(2435), 9.0);
        assert_eq!(battery_volts(3382), 12.5);
    }

    #[test]
    fn test_encode_default() {
        let records = encode(&DeviceConfig::default());
        assert_eq!(records.len(), 7 + 8 + 16 + 24 + 16);
        assert_word!(records, 0x000 => 0, 0x8003);
        assert_word!(records, 0x002 => 0, 0x0320);
        assert_word!(records, 0x004 => 1, 0x000f);
        assert_word!(records, 0x006 => 1, 32);
        assert_word!(records, 0x008 => 2, 0x3210);
        assert_word!(records, 0x00C => 3, 2435);
        assert_word!(records, 0x01C => 7, 512);
        assert_word!(records, 0x01E => 7, 480);
        assert_word!(records, 0x02C => 11, 612);
        assert_word!(records, 0x02E => 11, 0x0500);
        assert_word!(records, 0x030 => 12, 10240);
        assert_word!(records, 0x032 => 12, 6144);
        assert_word!(records, 0x050 => 20, 100);
        assert_word!(records, 0x052 => 20, 50);
        assert_word!(records, 0x054 => 21, 0x2080);
        assert_word!(records, 0x056 => 21, 0x0a05);
        assert_word!(records, 0x058 => 22, 0xff00);
        assert_word!(records, 0x05A => 22, 0);
        assert_eq!(find(&records, 0x0D0), RegisterRecord::notch(52, 0x0D0, 95.0, 0.999));
        assert_eq!(records[0].address, 0x000);
        assert_eq!(records.last().unwrap().address, 0x170);
    }

    #[test]
    fn test_encode_test_pulse_and_sources() {
        let mut config = DeviceConfig::default();
        config.global.test_pulse_rate_hz = 50_000;
        config.channels[0].source = Source::AdcFiltered3;
        config.channels[2].source = Source::Off;
        let records = encode(&config);
        assert_word!(records, 0x004 => 1, 20 << 8 | 1 << 7 | 0b1011);
        assert_word!(records, 0x008 => 2, 0x3016);
    }

    #[test]
    fn test_decode_scenario() {
        let records = [
            RegisterRecord::word(1, 0x004, 161 << 8 | 1 << 7 | 0b0101),
            RegisterRecord::word(2, 0x008, 0x7654),
            RegisterRecord::word(1, 0x006, 100),
            RegisterRecord::word(5, 0x014, 300),
            RegisterRecord::word(14, 0x044, 1638),
            RegisterRecord::word(17, 0x046, 0x0f00),
            RegisterRecord::word(30, 0x078, 0xff01),
            RegisterRecord::word(31, 0x07C, 0x0c03),
            RegisterRecord::notch(92, 0x170, 42.5, 0.5),
            RegisterRecord::word(0, 0x1E0, 77),
        ];
        let decoded = decode_records(&records);
        let config = decoded.config;
        assert!(decoded.diagnostics.is_empty());
        assert_eq!(decoded.expected_rate, Some(77));
        assert_eq!(config.global.test_pulse_rate_hz, 976);
        assert_eq!(config.global.overlap_time_ns, 200);
        assert_eq!(config.channels.map(|channel| channel.source), [
            Source::AdcFiltered1, Source::Off, Source::AdcFiltered3, Source::Off
        ]);
        assert_eq!(config.channels[1].pre_trigger_ns, 600);
        assert_eq!(config.channels[3].gain_db, 23.49);
        assert_eq!(config.channels[3].integration_time, 15);
        assert_eq!(config.channels[3].trigger.after_threshold_ns, 4080);
        assert_eq!(config.channels[3].trigger.quiet_time_ns, 4);
        assert_eq!(config.channels[3].trigger.max_charge, 12);
        assert_eq!(config.channels[3].trigger.min_crossings, 3);
        assert_eq!(config.channels[3].notch[3], crate::config::NotchFilter { mean_mhz: 42.5, width: 0.5 });
    }

    #[test]
    fn test_decode_test_pulse_disabled() {
        let decode_readout = |value| {
            decode_records(&[RegisterRecord::word(1, 0x004, value)]).config.global.test_pulse_rate_hz
        };
        assert_eq!(decode_readout(20 << 8 | 0xf), 0);
        assert_eq!(decode_readout(1 << 7 | 0xf), 0);
        assert_eq!(decode_readout(20 << 8 | 1 << 7), 50_000);
    }

    #[test]
    fn test_decode_best_effort() {
        let records = vec![
            Err(MalformedRecord::new("1 0x006 zz", MalformedKind::InvalidInteger("zz".into()))),
            Ok(RegisterRecord::word(1, 0x006, 64)),
            Ok(RegisterRecord::notch(0, 0x000, 1.0, 2.0)),
            Ok(RegisterRecord::word(32, 0x080, 5)),
            Ok(RegisterRecord::word(9, 0x028, 5)),
            Ok(RegisterRecord::word(0, 0x1FC, 5)),
        ];
        let decoded = decode(records);
        assert_eq!(decoded.config.global.overlap_time_ns, 128);
        assert_eq!(decoded.diagnostics.len(), 3);
        assert_eq!(decoded.diagnostics[1].kind, MalformedKind::ValueKind { address: 0x000 });
        assert_eq!(decoded.diagnostics[2].kind, MalformedKind::ValueKind { address: 0x080 });
        let expected = DeviceConfig { global: decoded.config.global, ..DeviceConfig::default() };
        assert_eq!(decoded.config, expected);
    }

    #[test]
    fn test_from_tokens() {
        assert_eq!(RegisterRecord::from_tokens(&["3", "0x00C", "0x983"]),
                   Ok(RegisterRecord::word(3, 0x00C, 0x983)));
        assert_eq!(RegisterRecord::from_tokens(&["32", "0x80", "90", "0.999"]),
                   Ok(RegisterRecord::notch(32, 0x080, 90.0, 0.999)));
        assert_eq!(RegisterRecord::from_tokens(&["1", "6", "0b101"]),
                   Ok(RegisterRecord::word(1, 6, 5)));
        assert_eq!(RegisterRecord::from_tokens(&["1", "0x006"]).unwrap_err().kind,
                   MalformedKind::TokenCount(2));
        assert_eq!(RegisterRecord::from_tokens(&["1", "0x006", "0x10000"]).unwrap_err().kind,
                   MalformedKind::OutOfRange("0x10000".into()));
        assert_eq!(RegisterRecord::from_tokens(&["1", "0x006", "-1"]).unwrap_err().kind,
                   MalformedKind::OutOfRange("-1".into()));
        assert_eq!(RegisterRecord::from_tokens(&["x", "0x006", "1"]).unwrap_err().kind,
                   MalformedKind::InvalidInteger("x".into()));
        assert_eq!(RegisterRecord::from_tokens(&["1", "0x080", "1", "wide"]).unwrap_err().kind,
                   MalformedKind::InvalidFloat("wide".into()));
    }

    #[test]
    fn test_round_trip_default() {
        let config = DeviceConfig::default();
        let decoded = decode_records(&encode(&config)).config;
        assert_config_eq(&decoded, &config);
        assert_eq!(decoded.channels[0].gain_db, 0.01);
    }

    proptest! {
        #[test]
        fn prop_round_trip(settings in device_settings()) {
            let config = DeviceConfig::derive(&settings);
            let decoded = decode_records(&encode(&config));
            prop_assert!(decoded.diagnostics.is_empty());
            assert_config_eq(&decoded.config, &config);
        }

        #[test]
        fn prop_gain_round_trip(gain in -14f32..=23.5) {
            prop_assert!((gain_db(gain_code(gain)) - gain).abs() <= 0.02);
        }
    }
}
