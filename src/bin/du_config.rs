use std::fs::File;
use std::io::{stdin, stdout, BufReader, BufWriter, Write};

use argh::FromArgs;

use duconfig::{RegisterRecord, RunCommand};

#[derive(Debug, FromArgs)]
/// Read a detector unit register file, and write it back out in canonical order.
struct CliArgs {
    /// register file to read; '-' or nothing reads standard input
    #[argh(positional)]
    input: Option<String>,
    /// file to write to (standard output by default)
    #[argh(option, short = 'o')]
    out: Option<String>,
    /// bring every setting into the range the hardware accepts
    #[argh(switch, short = 'c')]
    canonicalize: bool,
    /// replace filter records with the coefficient words the firmware reads
    #[argh(switch)]
    expand_filters: bool,
    /// print the payload of a run command (init, start or stop) and exit
    #[argh(option)]
    command: Option<RunCommand>,
}

fn main() -> duconfig::Result<()> {
    env_logger::init();
    let args: CliArgs = argh::from_env();

    let mut output: Box<dyn Write> = match args.out.as_deref() {
        None => Box::new(stdout().lock()),
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
    };

    if let Some(command) = args.command {
        let words = command.payload().map(|word| format!("{:#06x}", word));
        writeln!(output, "{}", words.join(" "))?;
        output.flush()?;
        return Ok(())
    }

    let records = match args.input.as_deref() {
        None | Some("-") => duconfig::text::read_records(stdin().lock())?,
        Some(path) => duconfig::text::read_records(BufReader::new(File::open(path)?))?,
    };
    let decoded = duconfig::decode(records);
    for malformed in decoded.diagnostics.iter() {
        log::warn!("{}", malformed);
    }
    if let Some(rate) = decoded.expected_rate {
        log::info!("expected trigger rate register: {:#06x}", rate);
    }

    let config = if args.canonicalize {
        decoded.config.canonicalize()
    } else {
        decoded.config
    };
    let mut records = duconfig::encode(&config);
    if args.expand_filters {
        records = records.iter()
            .flat_map(|record| duconfig::expand_notch_record(record).unwrap_or_else(|| vec![*record]))
            .collect::<Vec<RegisterRecord>>();
    }
    duconfig::text::write_records(output, &records)
}
