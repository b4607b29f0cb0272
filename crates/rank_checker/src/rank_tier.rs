use common::config::ActivityThresholds;
use serde::Serialize;

use crate::account::AccountRecord;
use crate::soulbound::MAX_SOULBOUND;

/// Rank tiers, best first. SoulBound ownership outranks raw activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankTier {
    SoulboundLegend,
    WhitelistGuardian,
    SoulboundHolder,
    PowerUser,
    Veteran,
    Active,
    Regular,
    Newcomer,
}

impl RankTier {
    pub const ALL: [RankTier; 8] = [
        Self::SoulboundLegend,
        Self::WhitelistGuardian,
        Self::SoulboundHolder,
        Self::PowerUser,
        Self::Veteran,
        Self::Active,
        Self::Regular,
        Self::Newcomer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::SoulboundLegend => "SoulBound Legend",
            Self::WhitelistGuardian => "Whitelist Guardian",
            Self::SoulboundHolder => "SoulBound Holder",
            Self::PowerUser => "Power User",
            Self::Veteran => "Veteran",
            Self::Active => "Active",
            Self::Regular => "Regular",
            Self::Newcomer => "Newcomer",
        }
    }

    /// Higher is better.
    pub fn level(&self) -> u8 {
        match self {
            Self::SoulboundLegend => 8,
            Self::WhitelistGuardian => 7,
            Self::SoulboundHolder => 6,
            Self::PowerUser => 5,
            Self::Veteran => 4,
            Self::Active => 3,
            Self::Regular => 2,
            Self::Newcomer => 1,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::SoulboundLegend => "#ffd700",
            Self::WhitelistGuardian => "#c0c0c0",
            Self::SoulboundHolder => "#cd7f32",
            Self::PowerUser => "#9b59b6",
            Self::Veteran => "#3498db",
            Self::Active => "#2ecc71",
            Self::Regular => "#95a5a6",
            Self::Newcomer => "#7f8c8d",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::SoulboundLegend => "👑",
            Self::WhitelistGuardian => "🛡️",
            Self::SoulboundHolder => "💎",
            Self::PowerUser => "⚡",
            Self::Veteran => "🎖️",
            Self::Active => "🔥",
            Self::Regular => "🌱",
            Self::Newcomer => "🥚",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::SoulboundLegend => "Holds the full SoulBound set (two whitelist, one regular)",
            Self::WhitelistGuardian => "Holds two SoulBound NFTs",
            Self::SoulboundHolder => "Holds one SoulBound NFT",
            Self::PowerUser => "Very high on-chain activity",
            Self::Veteran => "High on-chain activity",
            Self::Active => "Steady on-chain activity",
            Self::Regular => "Some on-chain activity",
            Self::Newcomer => "Little or no on-chain activity yet",
        }
    }
}

impl PartialOrd for RankTier {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankTier {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.level().cmp(&other.level())
    }
}

impl Serialize for RankTier {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut s = serializer.serialize_struct("RankTier", 5)?;
        s.serialize_field("name", self.name())?;
        s.serialize_field("level", &self.level())?;
        s.serialize_field("color", self.color())?;
        s.serialize_field("icon", self.icon())?;
        s.serialize_field("description", self.description())?;
        s.end()
    }
}

/// First matching rule wins:
/// 3+ SoulBound, 2, 1, then transaction-count thresholds, then `Newcomer`.
pub fn derive_tier(record: &AccountRecord, thresholds: &ActivityThresholds) -> RankTier {
    let nfts = record.soulbound_nft_count;
    let tx = record.transaction_count;

    if nfts >= MAX_SOULBOUND {
        RankTier::SoulboundLegend
    } else if nfts == 2 {
        RankTier::WhitelistGuardian
    } else if nfts == 1 {
        RankTier::SoulboundHolder
    } else if tx >= thresholds.power_user {
        RankTier::PowerUser
    } else if tx >= thresholds.veteran {
        RankTier::Veteran
    } else if tx >= thresholds.active {
        RankTier::Active
    } else if tx >= thresholds.regular {
        RankTier::Regular
    } else {
        RankTier::Newcomer
    }
}
