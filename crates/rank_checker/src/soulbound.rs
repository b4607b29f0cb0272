use common::types::NftTransfer;
use std::collections::HashSet;

pub const WHITELIST_CAP: u32 = 2;
pub const REGULAR_CAP: u32 = 1;
/// Largest value `SoulboundCount::total` can take.
pub const MAX_SOULBOUND: u32 = WHITELIST_CAP + REGULAR_CAP;

/// Capped per-class SoulBound token counts for one address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SoulboundCount {
    pub whitelist: u32,
    pub regular: u32,
}

impl SoulboundCount {
    pub fn total(&self) -> u32 {
        self.whitelist + self.regular
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_ascii_lowercase().contains(needle)
}

fn capped(ids: &HashSet<&str>, cap: u32) -> u32 {
    u32::try_from(ids.len()).unwrap_or(u32::MAX).min(cap)
}

/// Count distinct SoulBound tokens received by `address`.
///
/// A transfer qualifies when its token name contains "soulbound"; names that
/// also contain "whitelist" go to the whitelist class. Tokens are counted by
/// `tokenID`, so repeated transfers of one token count once. Transfers without
/// a `tokenID` are skipped.
pub fn count_soulbound(transfers: &[NftTransfer], address: &str) -> SoulboundCount {
    let mut whitelist: HashSet<&str> = HashSet::new();
    let mut regular: HashSet<&str> = HashSet::new();

    for t in transfers {
        let Some(name) = t.token_name.as_deref() else {
            continue;
        };
        if !contains_ignore_case(name, "soulbound") {
            continue;
        }
        let received = t
            .to
            .as_deref()
            .is_some_and(|to| to.trim().eq_ignore_ascii_case(address.trim()));
        if !received {
            continue;
        }
        let Some(token_id) = t.token_id.as_deref() else {
            continue;
        };

        if contains_ignore_case(name, "whitelist") {
            whitelist.insert(token_id);
        } else {
            regular.insert(token_id);
        }
    }

    SoulboundCount {
        whitelist: capped(&whitelist, WHITELIST_CAP),
        regular: capped(&regular, REGULAR_CAP),
    }
}
