//! Buckets a cycle's readings for the periodic report.
//!
//! The report bands are independent of the alert gate: a reading of 71 lands
//! in `High` here without ever being alert eligible.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

/// One RSI observation taken during a scan cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub symbol: String,
    pub rsi: f64,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    VeryHigh,
    High,
    Moderate,
    Low,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [
        Bucket::VeryHigh,
        Bucket::High,
        Bucket::Moderate,
        Bucket::Low,
    ];
}

/// Lower bounds of the report bands. Anything below `moderate` is `Low`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportBands {
    pub very_high: f64,
    pub high: f64,
    pub moderate: f64,
}

impl Default for ReportBands {
    fn default() -> Self {
        Self {
            very_high: 90.0,
            high: 70.0,
            moderate: 50.0,
        }
    }
}

impl ReportBands {
    pub fn bucket_for(&self, rsi: f64) -> Bucket {
        if rsi >= self.very_high {
            Bucket::VeryHigh
        } else if rsi >= self.high {
            Bucket::High
        } else if rsi >= self.moderate {
            Bucket::Moderate
        } else {
            Bucket::Low
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buckets {
    pub very_high: Vec<Reading>,
    pub high: Vec<Reading>,
    pub moderate: Vec<Reading>,
    pub low: Vec<Reading>,
}

impl Buckets {
    pub fn get(&self, bucket: Bucket) -> &[Reading] {
        match bucket {
            Bucket::VeryHigh => &self.very_high,
            Bucket::High => &self.high,
            Bucket::Moderate => &self.moderate,
            Bucket::Low => &self.low,
        }
    }

    fn get_mut(&mut self, bucket: Bucket) -> &mut Vec<Reading> {
        match bucket {
            Bucket::VeryHigh => &mut self.very_high,
            Bucket::High => &mut self.high,
            Bucket::Moderate => &mut self.moderate,
            Bucket::Low => &mut self.low,
        }
    }

    pub fn total(&self) -> usize {
        Bucket::ALL.iter().map(|b| self.get(*b).len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanSummary {
    pub scan_number: u64,
    /// Symbols that produced a reading this cycle.
    pub checked_count: usize,
    /// Symbols listed by the provider this cycle.
    pub universe_count: usize,
    /// Immediate alerts delivered during this cycle.
    pub alerts_sent: u64,
    pub buckets: Buckets,
}

/// Partitions `readings` into report buckets, each sorted by RSI descending
/// and then symbol ascending.
pub fn classify(scan_number: u64, readings: Vec<Reading>, bands: &ReportBands) -> ScanSummary {
    let checked_count = readings.len();
    let mut buckets = Buckets::default();

    for r in readings {
        buckets.get_mut(bands.bucket_for(r.rsi)).push(r);
    }

    for b in Bucket::ALL {
        buckets.get_mut(b).sort_by(by_rsi_desc_then_symbol);
    }

    ScanSummary {
        scan_number,
        checked_count,
        universe_count: checked_count,
        alerts_sent: 0,
        buckets,
    }
}

fn by_rsi_desc_then_symbol(a: &Reading, b: &Reading) -> Ordering {
    b.rsi
        .partial_cmp(&a.rsi)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.symbol.cmp(&b.symbol))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn readings() -> impl Strategy<Value = Vec<Reading>> {
        prop::collection::vec((0u32..40, 0.0..=100.0f64), 0..60).prop_map(|raw| {
            let t = DateTime::from_timestamp(0, 0).unwrap();
            raw.into_iter()
                .enumerate()
                .map(|(i, (sym, rsi))| Reading {
                    // unique symbols, but with shared prefixes to exercise ordering
                    symbol: format!("S{sym:02}-{i}"),
                    rsi,
                    observed_at: t,
                })
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]
        #[test]
        fn buckets_partition_the_input(input in readings()) {
            let bands = ReportBands::default();
            let s = classify(1, input.clone(), &bands);

            prop_assert_eq!(s.buckets.total(), input.len());
            prop_assert_eq!(s.checked_count, input.len());

            for b in Bucket::ALL {
                for reading in s.buckets.get(b) {
                    prop_assert_eq!(bands.bucket_for(reading.rsi), b);
                }
            }

            let mut seen: Vec<&str> = Bucket::ALL
                .iter()
                .flat_map(|b| s.buckets.get(*b).iter().map(|r| r.symbol.as_str()))
                .collect();
            let mut expected: Vec<&str> = input.iter().map(|r| r.symbol.as_str()).collect();
            seen.sort();
            expected.sort();
            prop_assert_eq!(seen, expected);
        }

        #[test]
        fn buckets_are_sorted(input in readings(), dup in 0.0..=100.0f64) {
            let mut input = input;
            // force some exact ties
            for r in input.iter_mut().step_by(3) {
                r.rsi = dup;
            }

            let s = classify(1, input, &ReportBands::default());

            for b in Bucket::ALL {
                for pair in s.buckets.get(b).windows(2) {
                    prop_assert!(pair[0].rsi >= pair[1].rsi);
                    if pair[0].rsi == pair[1].rsi {
                        prop_assert!(pair[0].symbol < pair[1].symbol);
                    }
                }
            }
        }
    }
}
