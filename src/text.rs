//! Line-oriented text form of register records, as kept in detector unit configuration files.
//!
//! ```text
//! # comment
//! 1 0x006 0x0020
//! 32 0x080 90 0.999
//! ```

use std::io::{BufRead, Write};

use crate::codec::{MalformedRecord, RegisterRecord, RegisterValue};

/// Parses one line. Returns `None` for blank lines and comments.
pub fn parse_line(line: &str) -> Option<Result<RegisterRecord, MalformedRecord>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None
    }
    let tokens = line.split_whitespace().collect::<Vec<_>>();
    Some(RegisterRecord::from_tokens(&tokens))
}

/// Parses every line of `text`. Malformed records carry their 1-based line number.
pub fn parse(text: &str) -> Vec<Result<RegisterRecord, MalformedRecord>> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| {
            parse_line(line).map(|result| result.map_err(|malformed| malformed.at_line(index + 1)))
        })
        .collect()
}

pub fn read_records(reader: impl BufRead) -> crate::Result<Vec<Result<RegisterRecord, MalformedRecord>>> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        if let Some(result) = parse_line(&line?) {
            records.push(result.map_err(|malformed| malformed.at_line(index + 1)));
        }
    }
    log::debug!("read {} records", records.len());
    Ok(records)
}

pub fn format_record(record: &RegisterRecord) -> String {
    match record.value {
        RegisterValue::Word(value) =>
            format!("{} {:#05x} {:#06x}", record.axi, record.address, value),
        RegisterValue::Notch { mean_mhz, width } =>
            format!("{} {:#05x} {} {}", record.axi, record.address, mean_mhz, width),
    }
}

pub fn write_records(mut writer: impl Write, records: &[RegisterRecord]) -> crate::Result<()> {
    writeln!(writer, "# axi address value")?;
    let mut in_filters = false;
    for record in records {
        if !in_filters && matches!(record.value, RegisterValue::Notch { .. }) {
            writeln!(writer, "# notch filters: axi address mean_mhz width")?;
            in_filters = true;
        }
        writeln!(writer, "{}", format_record(record))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::{self, MalformedKind};
    use crate::config::DeviceConfig;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("# 1 0x006 0x20"), None);
        assert_eq!(parse_line(" 1 0x006 0x20 "), Some(Ok(RegisterRecord::word(1, 0x006, 0x20))));
        assert_eq!(parse_line("32\t0x080  90.5 0.999"),
                   Some(Ok(RegisterRecord::notch(32, 0x080, 90.5, 0.999))));
    }

    #[test]
    fn test_parse_line_numbers() {
        let records = parse("# header\n1 0x006 0x20\n\n1 0x006\n2 0x008 0x3210\n");
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], Ok(RegisterRecord::word(1, 0x006, 0x20)));
        let malformed = records[1].clone().unwrap_err();
        assert_eq!(malformed.line, Some(4));
        assert_eq!(malformed.text, "1 0x006");
        assert_eq!(malformed.kind, MalformedKind::TokenCount(2));
        assert_eq!(malformed.to_string(), "line 4: expected 3 or 4 fields, found 2 in \"1 0x006\"");
    }

    #[test]
    fn test_format() {
        assert_eq!(format_record(&RegisterRecord::word(1, 0x006, 0x20)), "1 0x006 0x0020");
        assert_eq!(format_record(&RegisterRecord::word(0, 0x1E0, 0xffff)), "0 0x1e0 0xffff");
        assert_eq!(format_record(&RegisterRecord::notch(32, 0x080, 90.0, 0.999)), "32 0x080 90 0.999");
    }

    #[test]
    fn test_write_read() {
        let config = DeviceConfig::default();
        let records = codec::encode(&config);
        let mut text = Vec::new();
        write_records(&mut text, &records).unwrap();
        let text = String::from_utf8(text).unwrap();
        assert!(text.starts_with("# axi address value\n0 0x000 0x8003\n"));
        assert_eq!(text.matches("# notch filters").count(), 1);

        let parsed = read_records(text.as_bytes()).unwrap();
        let parsed = parsed.into_iter().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_read_decode() {
        let text = "\
            # overlap and a bad line\n\
            1 0x006 0x0040\n\
            1 0x006 oops\n\
            0 0x1e0 0x10\n";
        let decoded = codec::decode(read_records(text.as_bytes()).unwrap());
        assert_eq!(decoded.config.global.overlap_time_ns, 128);
        assert_eq!(decoded.expected_rate, Some(16));
        assert_eq!(decoded.diagnostics.len(), 1);
        assert_eq!(decoded.diagnostics[0].line, Some(3));
    }
}
