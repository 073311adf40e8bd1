// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Decoder for the JSON form of Lotus RLE+ bitfields.
//!
//! Lotus renders a `go-bitfield` as its run lengths: `[gap, run, gap, run, ...]`,
//! where each gap is a run of unset bits and each run a run of set bits,
//! starting at bit zero. `[1, 1]` is `{1}`, and the empty set is written `[0]`.

use crate::rpc_client::types::SectorNumber;
use enumflags2::{BitFlags, bitflags};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BitfieldError {
    #[error("bitfield has an odd number of run lengths ({0})")]
    OddLength(usize),
}

/// Run-length encoded set of sector numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bitfield(Vec<u64>);

impl Bitfield {
    /// Fewer than two elements is the empty set. Any longer input must come in
    /// `(gap, run)` pairs.
    pub fn new(runs: Vec<u64>) -> Result<Self, BitfieldError> {
        if runs.len() >= 2 && runs.len() % 2 != 0 {
            return Err(BitfieldError::OddLength(runs.len()));
        }
        Ok(Bitfield(runs))
    }

    /// `(first member, run length)` of every run of set bits.
    pub fn ranges(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.0
            .chunks_exact(2)
            .scan(0u64, |cursor, pair| {
                let (gap, run) = (pair[0], pair[1]);
                let start = cursor.saturating_add(gap);
                *cursor = start.saturating_add(run);
                Some((start, run))
            })
    }

    /// Members in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.ranges()
            .flat_map(|(start, run)| start..start.saturating_add(run))
    }

    /// Cardinality, the sum of all run lengths.
    pub fn count(&self) -> u64 {
        self.ranges().map(|(_, run)| run).sum()
    }

    #[cfg(test)]
    pub fn decode(&self) -> std::collections::BTreeSet<u64> {
        self.iter().collect()
    }

    /// Sets `flag` on every member in `target`, creating entries as needed.
    /// Flags already present are kept. Returns the cardinality of this
    /// bitfield, whether or not its members were already in `target`.
    pub fn decode_into(&self, flag: SectorFlag, target: &mut SectorState) -> u64 {
        for sector in self.iter() {
            target.set(sector, flag);
        }
        self.count()
    }
}

impl<'de> Deserialize<'de> for Bitfield {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let runs = Option::<Vec<u64>>::deserialize(deserializer)?.unwrap_or_default();
        Bitfield::new(runs).map_err(serde::de::Error::custom)
    }
}

#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum SectorFlag {
    Active,
    Live,
    Recovering,
    Faulty,
}

/// Flags of every sector seen in one or more bitfields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectorState(BTreeMap<SectorNumber, BitFlags<SectorFlag>>);

impl SectorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, sector: SectorNumber, flag: SectorFlag) {
        self.0.entry(sector).or_default().insert(flag);
    }

    #[cfg(test)]
    pub fn flags(&self, sector: SectorNumber) -> BitFlags<SectorFlag> {
        self.0.get(&sector).copied().unwrap_or_default()
    }

    /// Number of distinct sectors.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn bitfield(runs: &[u64]) -> Bitfield {
        Bitfield::new(runs.to_vec()).unwrap()
    }

    #[test]
    fn decode_examples() {
        assert_eq!(bitfield(&[0, 3]).decode(), BTreeSet::from([0, 1, 2]));
        assert_eq!(bitfield(&[2, 2, 1, 1]).decode(), BTreeSet::from([2, 3, 5]));
        assert_eq!(bitfield(&[1, 1]).decode(), BTreeSet::from([1]));
    }

    #[test]
    fn short_input_is_empty() {
        assert!(bitfield(&[]).decode().is_empty());
        assert!(bitfield(&[0]).decode().is_empty());
        assert!(bitfield(&[7]).decode().is_empty());
        assert_eq!(bitfield(&[7]).count(), 0);
    }

    #[test]
    fn odd_length_is_rejected() {
        assert_eq!(
            Bitfield::new(vec![0, 1, 2]),
            Err(BitfieldError::OddLength(3))
        );
        assert!(serde_json::from_value::<Bitfield>(json!([0, 1, 2])).is_err());
    }

    #[test]
    fn deserialize_lotus_json() {
        let bf: Bitfield = serde_json::from_value(json!([3, 2])).unwrap();
        assert_eq!(bf.decode(), BTreeSet::from([3, 4]));
        let bf: Bitfield = serde_json::from_value(json!(null)).unwrap();
        assert_eq!(bf.count(), 0);
        let bf: Bitfield = serde_json::from_value(json!([0])).unwrap();
        assert_eq!(bf.count(), 0);
    }

    #[test]
    fn decode_into_accumulates_flags() {
        let mut state = SectorState::new();
        let faulty = bitfield(&[0, 2]).decode_into(SectorFlag::Faulty, &mut state);
        let live = bitfield(&[1, 3]).decode_into(SectorFlag::Live, &mut state);
        assert_eq!((faulty, live), (2, 3));
        assert_eq!(state.len(), 4);
        assert_eq!(state.flags(0), SectorFlag::Faulty);
        assert_eq!(state.flags(1), SectorFlag::Faulty | SectorFlag::Live);
        assert_eq!(state.flags(3), SectorFlag::Live);
        assert!(state.flags(4).is_empty());
    }

    #[test]
    fn decode_into_counts_existing_members() {
        let mut state = SectorState::new();
        bitfield(&[0, 3]).decode_into(SectorFlag::Live, &mut state);
        let count = bitfield(&[0, 3]).decode_into(SectorFlag::Active, &mut state);
        assert_eq!(count, 3);
        assert_eq!(state.len(), 3);
    }

    #[quickcheck]
    fn cardinality_is_sum_of_runs(pairs: Vec<(u8, u8)>) -> bool {
        let runs = pairs
            .iter()
            .flat_map(|(gap, run)| [u64::from(*gap), u64::from(*run)])
            .collect::<Vec<_>>();
        let bf = Bitfield::new(runs).unwrap();
        let expected: u64 = pairs.iter().map(|(_, run)| u64::from(*run)).sum();
        bf.count() == expected && bf.decode().len() as u64 == expected
    }

    #[quickcheck]
    fn members_are_increasing(pairs: Vec<(u8, u8)>) -> bool {
        let runs = pairs
            .iter()
            .flat_map(|(gap, run)| [u64::from(*gap), u64::from(*run)])
            .collect::<Vec<_>>();
        let members = Bitfield::new(runs).unwrap().iter().collect::<Vec<_>>();
        members.windows(2).all(|w| w[0] < w[1])
    }
}
