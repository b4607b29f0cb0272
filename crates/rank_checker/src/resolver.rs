use common::config;
use common::error::FetchError;
use common::types::{NftTransfer, TokenTransfer, Transport};
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::account::{normalize_address, AccountRecord, DataProvenance, FallbackTables, Provenance};
use crate::encoding::{parse_native_amount, parse_quantity};
use crate::fallback::FallbackPolicy;
use crate::soulbound::count_soulbound;
use crate::sources::AccountDataSource;

/// Transport/timeout chain per endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverPolicies {
    pub balance: FallbackPolicy,
    pub transaction_count: FallbackPolicy,
    pub token_transfers: FallbackPolicy,
    pub nft_transfers: FallbackPolicy,
}

impl ResolverPolicies {
    /// Only NFT history goes through the relay; the other endpoints have
    /// data-level fallbacks instead.
    pub fn from_timeouts(t: &config::Timeouts) -> Self {
        Self {
            balance: FallbackPolicy::direct(t.balance()),
            transaction_count: FallbackPolicy::direct(t.transaction_count()),
            token_transfers: FallbackPolicy::direct(t.token_transfers()),
            nft_transfers: FallbackPolicy::direct_then_relay(t.nft_direct(), t.nft_relay()),
        }
    }
}

impl Default for ResolverPolicies {
    fn default() -> Self {
        Self::from_timeouts(&config::Timeouts::default())
    }
}

fn transport_provenance(transport: Transport) -> Provenance {
    match transport {
        Transport::Direct => Provenance::Primary,
        Transport::Relay => Provenance::Relay,
    }
}

fn record_source(field: &'static str, provenance: Provenance) {
    metrics::counter!(
        "rank_checker_fallback_source_total",
        "field" => field,
        "source" => provenance.as_str()
    )
    .increment(1);
}

/// Number of distinct transaction hashes in a token-transfer history.
pub fn distinct_transaction_hashes(transfers: &[TokenTransfer]) -> u64 {
    let hashes: HashSet<String> = transfers
        .iter()
        .filter_map(|t| t.hash.as_deref())
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    hashes.len() as u64
}

/// Builds an [`AccountRecord`] from a data source, degrading to fallbacks
/// and finally to zero. Never fails.
pub struct AccountDataResolver<S> {
    source: S,
    policies: ResolverPolicies,
    fallbacks: FallbackTables,
}

impl<S: AccountDataSource + Sync> AccountDataResolver<S> {
    pub fn new(source: S, policies: ResolverPolicies, fallbacks: FallbackTables) -> Self {
        Self {
            source,
            policies,
            fallbacks,
        }
    }

    pub async fn resolve(&self, address: &str) -> AccountRecord {
        let address = normalize_address(address);
        let addr = address.as_str();

        let (balance, primary_tx, tokens, nfts) = tokio::join!(
            self.resolve_balance(addr),
            self.fetch_primary_transaction_count(addr),
            self.resolve_token_transfers(addr),
            self.resolve_nft_transfers(addr),
        );

        let (balance, balance_src) = balance;
        let (transfers, tokens_src) = tokens;
        let (nft_transfers, nft_src) = nfts;
        let (transaction_count, tx_src) =
            self.settle_transaction_count(addr, primary_tx, &transfers);

        let soulbound = count_soulbound(&nft_transfers, addr);

        let record = AccountRecord {
            address: address.clone(),
            balance,
            transaction_count,
            token_transfer_count: transfers.len() as u64,
            soulbound_nft_count: soulbound.total(),
            provenance: DataProvenance {
                balance: balance_src,
                transaction_count: tx_src,
                token_transfers: tokens_src,
                nft: nft_src,
            },
        };

        record_source("balance", balance_src);
        record_source("transaction_count", tx_src);
        record_source("token_transfers", tokens_src);
        record_source("nft", nft_src);

        info!(
            address = %record.address,
            balance = %record.balance,
            transaction_count = record.transaction_count,
            transaction_count_source = tx_src.as_str(),
            token_transfer_count = record.token_transfer_count,
            soulbound_whitelist = soulbound.whitelist,
            soulbound_regular = soulbound.regular,
            nft_source = nft_src.as_str(),
            "account resolved"
        );

        record
    }

    async fn resolve_balance(&self, address: &str) -> (Decimal, Provenance) {
        let res = self
            .policies
            .balance
            .run("balance", |t, d| self.source.fetch_balance(address, t, d))
            .await;

        match res {
            Ok((raw, transport)) => match parse_native_amount(&raw) {
                Ok(v) => (v, transport_provenance(transport)),
                Err(e) => {
                    warn!(address, raw = %raw, error = %e, "unparseable balance, using 0");
                    (Decimal::ZERO, Provenance::Default)
                }
            },
            Err(FetchError::NotFound) => (Decimal::ZERO, Provenance::Empty),
            Err(e) => {
                warn!(address, error = %e, "balance unavailable, using 0");
                (Decimal::ZERO, Provenance::Default)
            }
        }
    }

    /// `None` when the count query failed in any way.
    async fn fetch_primary_transaction_count(&self, address: &str) -> Option<(u64, Provenance)> {
        let res = self
            .policies
            .transaction_count
            .run("transaction_count", |t, d| {
                self.source.fetch_transaction_count(address, t, d)
            })
            .await;

        match res {
            Ok((raw, transport)) => match parse_quantity(&raw) {
                Ok(n) => Some((n, transport_provenance(transport))),
                Err(e) => {
                    warn!(address, raw = %raw, error = %e, "unparseable transaction count");
                    None
                }
            },
            Err(e) => {
                debug!(address, error = %e, "transaction count query failed");
                None
            }
        }
    }

    /// Primary answer, else verified override, else distinct hashes from
    /// token history, else zero.
    fn settle_transaction_count(
        &self,
        address: &str,
        primary: Option<(u64, Provenance)>,
        transfers: &[TokenTransfer],
    ) -> (u64, Provenance) {
        if let Some(found) = primary {
            return found;
        }

        if let Some(n) = self.fallbacks.verified_transaction_count(address) {
            info!(address, count = n, "using verified transaction count override");
            return (n, Provenance::VerifiedOverride);
        }

        let derived = distinct_transaction_hashes(transfers);
        if derived > 0 {
            info!(
                address,
                count = derived,
                transfers = transfers.len(),
                "estimating transaction count from token transfers"
            );
            return (derived, Provenance::DerivedFromTokenTransfers);
        }

        warn!(address, "no transaction count source available, using 0");
        (0, Provenance::Default)
    }

    async fn resolve_token_transfers(&self, address: &str) -> (Vec<TokenTransfer>, Provenance) {
        let res = self
            .policies
            .token_transfers
            .run("token_transfers", |t, d| {
                self.source.fetch_token_transfers(address, t, d)
            })
            .await;

        match res {
            Ok((list, transport)) => (list, transport_provenance(transport)),
            Err(FetchError::NotFound) => (Vec::new(), Provenance::Empty),
            Err(e) => {
                warn!(address, error = %e, "token transfers unavailable");
                (Vec::new(), Provenance::Default)
            }
        }
    }

    async fn resolve_nft_transfers(&self, address: &str) -> (Vec<NftTransfer>, Provenance) {
        let res = self
            .policies
            .nft_transfers
            .run("nft_transfers", |t, d| {
                self.source.fetch_nft_transfers(address, t, d)
            })
            .await;

        match res {
            Ok((list, transport)) => (list, transport_provenance(transport)),
            Err(FetchError::NotFound) => (Vec::new(), Provenance::Empty),
            Err(e) if e.advances_fallback() => match self.fallbacks.known_nft_transfers(address) {
                Some(known) => {
                    info!(
                        address,
                        error = %e,
                        transfers = known.len(),
                        "nft sources exhausted, using known holdings"
                    );
                    (known.to_vec(), Provenance::StaticFallback)
                }
                None => {
                    warn!(address, error = %e, "nft transfers unavailable");
                    (Vec::new(), Provenance::Default)
                }
            },
            Err(e) => {
                warn!(address, error = %e, "nft transfers malformed, treating as empty");
                (Vec::new(), Provenance::Default)
            }
        }
    }
}

#[cfg(test)]
impl<S> AccountDataResolver<S> {
    pub(crate) fn source(&self) -> &S {
        &self.source
    }
}
