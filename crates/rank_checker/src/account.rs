use common::config;
use common::types::NftTransfer;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// Where a resolved field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Primary,
    Relay,
    VerifiedOverride,
    DerivedFromTokenTransfers,
    StaticFallback,
    /// Explorer answered with an empty result.
    Empty,
    /// Every source failed; zero assumed.
    #[default]
    Default,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Relay => "relay",
            Self::VerifiedOverride => "verified_override",
            Self::DerivedFromTokenTransfers => "derived_from_token_transfers",
            Self::StaticFallback => "static_fallback",
            Self::Empty => "empty",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct DataProvenance {
    pub balance: Provenance,
    pub transaction_count: Provenance,
    pub token_transfers: Provenance,
    pub nft: Provenance,
}

impl DataProvenance {
    /// Some field fell back to zero because every source for it failed.
    pub fn is_degraded(&self) -> bool {
        [
            self.balance,
            self.transaction_count,
            self.token_transfers,
            self.nft,
        ]
        .contains(&Provenance::Default)
    }
}

/// Normalized view of one address. Numeric fields are zero when no source
/// could supply them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountRecord {
    /// Lowercased.
    pub address: String,
    /// Native units.
    pub balance: Decimal,
    pub transaction_count: u64,
    pub token_transfer_count: u64,
    /// Capped, in `0..=3`.
    pub soulbound_nft_count: u32,
    pub provenance: DataProvenance,
}

impl AccountRecord {
    pub fn empty(address: &str) -> Self {
        Self {
            address: normalize_address(address),
            balance: Decimal::ZERO,
            transaction_count: 0,
            token_transfer_count: 0,
            soulbound_nft_count: 0,
            provenance: DataProvenance::default(),
        }
    }
}

pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// `0x` followed by 40 hex characters, any case.
pub fn is_valid_address(address: &str) -> bool {
    let a = address.trim();
    a.len() == 42
        && (a.starts_with("0x") || a.starts_with("0X"))
        && a[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Per-address data consulted when the explorer cannot answer.
///
/// Keys are stored lowercased, so lookups ignore address checksum casing.
#[derive(Debug, Clone, Default)]
pub struct FallbackTables {
    transaction_counts: HashMap<String, u64>,
    nft_holdings: HashMap<String, Vec<NftTransfer>>,
}

impl FallbackTables {
    pub fn new(
        transaction_counts: impl IntoIterator<Item = (String, u64)>,
        nft_holdings: impl IntoIterator<Item = (String, Vec<NftTransfer>)>,
    ) -> Self {
        Self {
            transaction_counts: transaction_counts
                .into_iter()
                .map(|(k, v)| (normalize_address(&k), v))
                .collect(),
            nft_holdings: nft_holdings
                .into_iter()
                .map(|(k, v)| (normalize_address(&k), v))
                .collect(),
        }
    }

    pub fn from_config(cfg: &config::Fallbacks) -> Self {
        Self::new(
            cfg.transaction_counts.clone(),
            cfg.nft_holdings.clone(),
        )
    }

    pub fn verified_transaction_count(&self, address: &str) -> Option<u64> {
        self.transaction_counts
            .get(&normalize_address(address))
            .copied()
    }

    pub fn known_nft_transfers(&self, address: &str) -> Option<&[NftTransfer]> {
        self.nft_holdings
            .get(&normalize_address(address))
            .map(Vec::as_slice)
    }
}
