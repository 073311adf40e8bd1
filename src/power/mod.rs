// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Quality adjusted power of a sector, computed the way the builtin miner
//! actor does, bit for bit.

use crate::rpc_client::types::ChainEpoch;
use num_bigint::BigInt;
use num_traits::Zero as _;

pub const QUALITY_BASE_MULTIPLIER: u64 = 10;
pub const DEAL_WEIGHT_MULTIPLIER: u64 = 10;
pub const VERIFIED_DEAL_WEIGHT_MULTIPLIER: u64 = 100;
/// Fixed point precision of the quality, in bits.
pub const SECTOR_QUALITY_PRECISION: usize = 20;

/// Quality adjusted power of a sector of `size` bytes committed for
/// `duration` epochs. A duration of zero or less is treated as one epoch, an
/// empty sector has no power.
pub fn qa_power(
    size: u64,
    duration: ChainEpoch,
    deal_weight: &BigInt,
    verified_deal_weight: &BigInt,
) -> BigInt {
    if size == 0 {
        return BigInt::zero();
    }
    let size = BigInt::from(size);
    let duration = BigInt::from(duration.max(1));

    let sector_space_time = &size * duration;
    let total_deal_space_time = deal_weight + verified_deal_weight;

    let weighted_base_space_time =
        (&sector_space_time - total_deal_space_time) * QUALITY_BASE_MULTIPLIER;
    let weighted_deal_space_time = deal_weight * DEAL_WEIGHT_MULTIPLIER;
    let weighted_verified_space_time = verified_deal_weight * VERIFIED_DEAL_WEIGHT_MULTIPLIER;
    let weighted_sum_space_time =
        weighted_base_space_time + weighted_deal_space_time + weighted_verified_space_time;
    let scaled_up_weighted_sum_space_time = weighted_sum_space_time << SECTOR_QUALITY_PRECISION;

    let quality = scaled_up_weighted_sum_space_time / (sector_space_time * QUALITY_BASE_MULTIPLIER);

    (size * quality) >> SECTOR_QUALITY_PRECISION
}
