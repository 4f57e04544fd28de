//! Fixed-point coefficients of the IIR notch filters.
//!
//! Filter records carry a center frequency and a pole radius. The front-end firmware expects the
//! feedback and feed-forward coefficients instead, so acquisition software expands each filter
//! record into eight register words before the configuration is sent to the board.

use crate::codec::{RegisterRecord, RegisterValue};
use crate::config::NotchFilter;

/// ADC sample rate the notch frequencies are relative to.
pub const SAMPLE_RATE_MHZ: f64 = 500.0;

/// Fractional bits of the coefficient format.
pub const FRACTION_BITS: u32 = 12;

// Matches the constant the firmware coefficients were generated with.
const PI_APPROX: f64 = 3.1416;

/// Extra pipeline stages in the feedback loop of the filter.
///
/// Each pair of stages is compensated by moving the poles further out in the feedback terms,
/// which adds two feed-forward terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pipeline {
    Stages0,
    Stages2,
    /// The configuration used by the detector unit firmware.
    #[default]
    Stages4,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotchCoefficients {
    /// Feedback terms `a1` and `a2`.
    pub a: [i32; 2],
    /// Feed-forward terms `b0` onwards; 3, 5 or 7 of them depending on the pipeline.
    pub b: Vec<i32>,
}

fn to_fixed(value: f64) -> i32 {
    let scaled = (value as f32 * (1 << FRACTION_BITS) as f32) as f64;
    (scaled + 0.5f64.copysign(scaled)) as i32
}

impl NotchFilter {
    pub fn coefficients(&self, pipeline: Pipeline) -> NotchCoefficients {
        let nu = self.mean_mhz as f64 / SAMPLE_RATE_MHZ;
        let r = self.width as f64;
        let cos = |harmonic: f64| (harmonic * 2.0 * PI_APPROX * nu).cos();

        let (a, b) = match pipeline {
            Pipeline::Stages0 => (
                [-2.0 * r * cos(1.0), r.powi(2)],
                vec![1.0, -2.0 * cos(1.0), 1.0],
            ),
            Pipeline::Stages2 => (
                [2.0 * r.powi(2) * cos(2.0), -r.powi(4)],
                vec![1.0, -2.0 * cos(1.0), 1.0, 2.0 * r * cos(1.0), r.powi(2)],
            ),
            Pipeline::Stages4 => (
                [2.0 * r.powi(4) * cos(4.0), -r.powi(8)],
                vec![1.0, -2.0 * cos(1.0), 1.0, 2.0 * r * cos(1.0), r.powi(2),
                     2.0 * r.powi(2) * cos(2.0), r.powi(4)],
            ),
        };
        let coefficients = NotchCoefficients {
            a: a.map(to_fixed),
            b: b.into_iter().map(to_fixed).collect(),
        };
        log::trace!("notch {:?} with {:?}: {:?}", self, pipeline, coefficients);
        coefficients
    }
}

/// Replaces a filter record with the coefficient words the firmware reads.
///
/// The words are `a1, a2, b1, ..., b6` at eight consecutive registers starting at the filter
/// address, two registers per AXI slot. Returns `None` for records that hold a plain word.
pub fn expand_notch_record(record: &RegisterRecord) -> Option<Vec<RegisterRecord>> {
    let RegisterValue::Notch { mean_mhz, width } = record.value else {
        return None
    };
    let NotchCoefficients { a, b } =
        NotchFilter { mean_mhz, width }.coefficients(Pipeline::Stages4);
    let words = a.iter().chain(b[1..].iter());
    Some(words.enumerate().map(|(offset, &coefficient)| {
        let offset = offset as u16;
        RegisterRecord::word(record.axi + offset / 2, record.address + 2 * offset,
                             coefficient as u16)
    }).collect())
}
