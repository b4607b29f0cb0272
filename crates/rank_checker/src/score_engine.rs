use common::config::{self, ActivityThresholds, NftMultipliers, ScoringWeights};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::account::AccountRecord;

/// Weights, multiplier table and tier thresholds. Defaults: 100 points per
/// native token, 10 per transaction, 5 per token transfer, 50 per SoulBound
/// NFT; multiplier 1.0 / 1.5 / 2.5 / 3.0 at 0 / 1 / 2 / 3+ NFTs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoringPolicy {
    pub weights: ScoringWeights,
    pub multipliers: NftMultipliers,
    pub thresholds: ActivityThresholds,
}

impl From<&config::Scoring> for ScoringPolicy {
    fn from(cfg: &config::Scoring) -> Self {
        Self {
            weights: cfg.weights,
            multipliers: cfg.multipliers,
            thresholds: cfg.thresholds,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub balance_score: f64,
    pub transaction_score: f64,
    pub token_score: f64,
    pub nft_score: f64,
    pub nft_multiplier: f64,
    pub total: f64,
}

pub fn nft_multiplier(soulbound_nft_count: u32, table: &NftMultipliers) -> f64 {
    match soulbound_nft_count {
        0 => table.none,
        1 => table.one,
        2 => table.two,
        _ => table.three_or_more,
    }
}

/// Pure: same record and policy, same breakdown.
pub fn compute_score(record: &AccountRecord, policy: &ScoringPolicy) -> ScoreBreakdown {
    let w = &policy.weights;

    let balance = record.balance.to_f64().unwrap_or(0.0).max(0.0);
    let balance_score = balance * w.balance;
    let transaction_score = record.transaction_count as f64 * w.transaction;
    let token_score = record.token_transfer_count as f64 * w.token_transfer;
    let nft_score = f64::from(record.soulbound_nft_count) * w.soulbound_nft;
    let multiplier = nft_multiplier(record.soulbound_nft_count, &policy.multipliers);

    ScoreBreakdown {
        balance_score,
        transaction_score,
        token_score,
        nft_score,
        nft_multiplier: multiplier,
        total: (balance_score + transaction_score + token_score + nft_score) * multiplier,
    }
}
