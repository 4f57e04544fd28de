//! Test pulse clock divider.
//!
//! The internal test pulse is derived from a 1 MHz reference by a staged divider with 254
//! positions. Each position adds an increment to the division ratio, and the increment doubles
//! every 32 positions, so that an 8-bit index covers rates from 1 MHz down to 126 Hz.

/// Frequency of the divider input.
pub const REFERENCE_HZ: u32 = 1_000_000;

/// Lowest rate a caller may request; smaller nonzero requests are raised to this.
pub const MIN_REQUEST_HZ: u32 = 124;

pub const MIN_INDEX: u8 = 1;
pub const MAX_INDEX: u8 = 254;

const fn increment(index: u32) -> u32 {
    // 1 for positions 1..=32, 2 for 33..=64, ..., 128 for 225..=254
    if index <= 32 { 1 } else { 1 << ((index - 1) / 32) }
}

const fn build_dividers() -> [u32; MAX_INDEX as usize + 1] {
    let mut dividers = [0; MAX_INDEX as usize + 1];
    let mut index = 1;
    while index <= MAX_INDEX as usize {
        dividers[index] = dividers[index - 1] + increment(index as u32);
        index += 1;
    }
    dividers
}

static DIVIDERS: [u32; MAX_INDEX as usize + 1] = build_dividers();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockDividerEntry {
    pub index: u8,
    /// Cumulative division ratio at this position.
    pub divider: u32,
    pub rate_hz: u32,
}

/// The table of rates the divider can produce, indexed by divider position.
#[derive(Debug, Clone, Copy)]
pub struct ClockDividerTable {
    dividers: &'static [u32; MAX_INDEX as usize + 1],
}

impl Default for ClockDividerTable {
    fn default() -> Self {
        Self::get()
    }
}

impl ClockDividerTable {
    pub fn get() -> ClockDividerTable {
        ClockDividerTable { dividers: &DIVIDERS }
    }

    pub fn entry(&self, index: u8) -> Option<ClockDividerEntry> {
        if !(MIN_INDEX..=MAX_INDEX).contains(&index) {
            return None
        }
        let divider = self.dividers[index as usize];
        Some(ClockDividerEntry { index, divider, rate_hz: REFERENCE_HZ / divider })
    }

    pub fn entries(&self) -> impl Iterator<Item = ClockDividerEntry> + '_ {
        (MIN_INDEX..=MAX_INDEX).filter_map(move |index| self.entry(index))
    }

    /// Returns the rate produced at divider position `index`, or 0 if there is no such position.
    ///
    /// Index 0 is what the readout register holds when no divider was ever selected, and is
    /// treated as "test pulse off".
    pub fn rate_for_index(&self, index: u8) -> u32 {
        self.entry(index).map(|entry| entry.rate_hz).unwrap_or(0)
    }

    /// Selects the divider position for a requested test pulse rate.
    ///
    /// Rates fall monotonically with the divider position. The position chosen is the first one
    /// whose rate does not exceed `requested_hz`, that is, the one where `requested_hz` falls
    /// into `[rate(index), rate(index - 1))`. The result is therefore the fastest achievable rate
    /// that is not faster than requested.
    ///
    /// Requests below [`MIN_REQUEST_HZ`] are raised to it first. Since the slowest achievable
    /// rate (126 Hz) is above that, requests between 124 and 125 Hz select the last position.
    /// Requests above the reference frequency select the first position.
    pub fn closest_index_for_rate(&self, requested_hz: u32) -> (u8, u32) {
        let requested_hz = requested_hz.max(MIN_REQUEST_HZ);
        let mut prev_rate_hz = REFERENCE_HZ + 1;
        for entry in self.entries() {
            if requested_hz >= entry.rate_hz && requested_hz < prev_rate_hz {
                return (entry.index, entry.rate_hz)
            }
            prev_rate_hz = entry.rate_hz;
        }
        if requested_hz > REFERENCE_HZ {
            (MIN_INDEX, self.rate_for_index(MIN_INDEX))
        } else {
            (MAX_INDEX, self.rate_for_index(MAX_INDEX))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // Rates for positions 1..=254, as produced by the hardware divider.
    const RATES: [u32; 254] = [
        1000000, 500000, 333333, 250000, 200000, 166666, 142857, 125000, 111111, 100000,
        90909, 83333, 76923, 71428, 66666, 62500, 58823, 55555, 52631, 50000,
        47619, 45454, 43478, 41666, 40000, 38461, 37037, 35714, 34482, 33333,
        32258, 31250, 29411, 27777, 26315, 25000, 23809, 22727, 21739, 20833,
        20000, 19230, 18518, 17857, 17241, 16666, 16129, 15625, 15151, 14705,
        14285, 13888, 13513, 13157, 12820, 12500, 12195, 11904, 11627, 11363,
        11111, 10869, 10638, 10416, 10000, 9615, 9259, 8928, 8620, 8333,
        8064, 7812, 7575, 7352, 7142, 6944, 6756, 6578, 6410, 6250,
        6097, 5952, 5813, 5681, 5555, 5434, 5319, 5208, 5102, 5000,
        4901, 4807, 4716, 4629, 4545, 4464, 4310, 4166, 4032, 3906,
        3787, 3676, 3571, 3472, 3378, 3289, 3205, 3125, 3048, 2976,
        2906, 2840, 2777, 2717, 2659, 2604, 2551, 2500, 2450, 2403,
        2358, 2314, 2272, 2232, 2192, 2155, 2118, 2083, 2016, 1953,
        1893, 1838, 1785, 1736, 1689, 1644, 1602, 1562, 1524, 1488,
        1453, 1420, 1388, 1358, 1329, 1302, 1275, 1250, 1225, 1201,
        1179, 1157, 1136, 1116, 1096, 1077, 1059, 1041, 1024, 1008,
        976, 946, 919, 892, 868, 844, 822, 801, 781, 762,
        744, 726, 710, 694, 679, 664, 651, 637, 625, 612,
        600, 589, 578, 568, 558, 548, 538, 529, 520, 512,
        504, 496, 480, 466, 452, 440, 428, 416, 405, 395,
        385, 376, 367, 359, 351, 343, 336, 328, 322, 315,
        309, 303, 297, 292, 286, 281, 276, 271, 267, 262,
        258, 254, 250, 246, 238, 231, 224, 218, 212, 206,
        201, 196, 191, 187, 182, 178, 174, 170, 167, 163,
        160, 157, 153, 150, 148, 145, 142, 140, 137, 135,
        132, 130, 128, 126,
    ];

    #[test]
    fn test_rate_table() {
        let table = ClockDividerTable::get();
        let rates = table.entries().map(|entry| entry.rate_hz).collect::<Vec<_>>();
        assert_eq!(rates, RATES);
    }

    #[test]
    fn test_band_edges() {
        let table = ClockDividerTable::get();
        let divider = |index| table.entry(index).unwrap().divider;
        assert_eq!(divider(1), 1);
        assert_eq!(divider(32), 32);
        assert_eq!(divider(33), 34);
        assert_eq!(divider(64), 96);
        assert_eq!(divider(96), 224);
        assert_eq!(divider(128), 480);
        assert_eq!(divider(160), 992);
        assert_eq!(divider(192), 2016);
        assert_eq!(divider(224), 4064);
        assert_eq!(divider(254), 7904);
    }

    #[test]
    fn test_monotonic() {
        let entries = ClockDividerTable::get().entries().collect::<Vec<_>>();
        for pair in entries.windows(2) {
            assert!(pair[0].divider < pair[1].divider, "{:?}", pair);
            assert!(pair[0].rate_hz > pair[1].rate_hz, "{:?}", pair);
        }
    }

    #[test]
    fn test_rate_for_index() {
        let table = ClockDividerTable::get();
        assert_eq!(table.rate_for_index(0), 0);
        assert_eq!(table.rate_for_index(1), 1_000_000);
        assert_eq!(table.rate_for_index(20), 50_000);
        assert_eq!(table.rate_for_index(254), 126);
        assert_eq!(table.rate_for_index(255), 0);
    }

    #[test]
    fn test_closest_exact() {
        let table = ClockDividerTable::get();
        assert_eq!(table.closest_index_for_rate(1_000_000), (1, 1_000_000));
        assert_eq!(table.closest_index_for_rate(50_000), (20, 50_000));
        assert_eq!(table.closest_index_for_rate(1008), (160, 1008));
        for (position, &rate) in RATES.iter().enumerate() {
            assert_eq!(table.closest_index_for_rate(rate), (position as u8 + 1, rate));
        }
    }

    #[test]
    fn test_closest_between() {
        let table = ClockDividerTable::get();
        assert_eq!(table.closest_index_for_rate(999_999), (2, 500_000));
        assert_eq!(table.closest_index_for_rate(51_000), (20, 50_000));
        assert_eq!(table.closest_index_for_rate(49_999), (21, 47_619));
        assert_eq!(table.closest_index_for_rate(1000), (161, 976));
        assert_eq!(table.closest_index_for_rate(127), (254, 126));
    }

    #[test]
    fn test_closest_out_of_range() {
        let table = ClockDividerTable::get();
        assert_eq!(table.closest_index_for_rate(0), (254, 126));
        assert_eq!(table.closest_index_for_rate(124), (254, 126));
        assert_eq!(table.closest_index_for_rate(125), (254, 126));
        assert_eq!(table.closest_index_for_rate(2_000_000), (1, 1_000_000));
    }
}
