pub mod regs;
mod config;
mod settings;
mod validate;
mod divider;
mod codec;
mod notch;
mod command;

pub mod text;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    UnknownCommand(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Io(io_error) =>
                write!(f, "I/O error: {}", io_error),
            Self::UnknownCommand(name) =>
                write!(f, "unknown run command {:?} (expected init, start or stop)", name),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            &Self::Io(ref io_error) => Some(io_error),
            _ => None
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io(error)
    }
}

pub type Result<T> =
    core::result::Result<T, Error>;

pub use regs::axi::{
    ConfigFlags,
    TriggerFlags,
    Readout,
    Register,
};

pub use config::{
    CHANNEL_COUNT,
    FILTER_COUNT,
    Source,
    NotchFilter,
    TriggerConfig,
    ChannelConfig,
    GlobalConfig,
    DeviceConfig,
};

pub use settings::{
    NotchSettings,
    TriggerSettings,
    ChannelSettings,
    GlobalSettings,
    DeviceSettings,
};

pub use validate::quantize;

pub use divider::{
    ClockDividerEntry,
    ClockDividerTable,
};

pub use codec::{
    RegisterValue,
    RegisterRecord,
    MalformedKind,
    MalformedRecord,
    Decoded,
    encode,
    decode,
    decode_records,
};

pub use notch::{
    Pipeline,
    NotchCoefficients,
    expand_notch_record,
};

pub use command::RunCommand;
