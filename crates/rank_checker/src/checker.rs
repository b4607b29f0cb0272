use chrono::{DateTime, Utc};
use common::config::Config;
use futures_util::future::join_all;
use serde::Serialize;
use std::time::Duration;

use crate::account::{AccountRecord, FallbackTables};
use crate::cache::RecordCache;
use crate::rank_tier::{derive_tier, RankTier};
use crate::resolver::{AccountDataResolver, ResolverPolicies};
use crate::score_engine::{compute_score, ScoreBreakdown, ScoringPolicy};
use crate::sources::AccountDataSource;

#[derive(Debug, Clone, Serialize)]
pub struct RankReport {
    pub record: AccountRecord,
    pub breakdown: ScoreBreakdown,
    pub tier: RankTier,
    pub cached: bool,
    pub checked_at: DateTime<Utc>,
}

/// Score and tier for a record. No I/O.
pub fn evaluate(record: &AccountRecord, policy: &ScoringPolicy) -> (ScoreBreakdown, RankTier) {
    (
        compute_score(record, policy),
        derive_tier(record, &policy.thresholds),
    )
}

/// Resolve, score and rank addresses.
pub struct RankChecker<S> {
    resolver: AccountDataResolver<S>,
    cache: Option<RecordCache>,
    policy: ScoringPolicy,
}

impl<S: AccountDataSource + Sync> RankChecker<S> {
    pub fn new(
        resolver: AccountDataResolver<S>,
        cache: Option<RecordCache>,
        policy: ScoringPolicy,
    ) -> Self {
        Self {
            resolver,
            cache,
            policy,
        }
    }

    pub fn from_config(source: S, cfg: &Config) -> Self {
        let resolver = AccountDataResolver::new(
            source,
            ResolverPolicies::from_timeouts(&cfg.timeouts),
            FallbackTables::from_config(&cfg.fallbacks),
        );
        let cache = cfg
            .cache
            .enabled
            .then(|| RecordCache::new(Duration::from_secs(cfg.cache.ttl_secs)));
        Self::new(resolver, cache, ScoringPolicy::from(&cfg.scoring))
    }

    pub async fn cached_accounts(&self) -> usize {
        match &self.cache {
            Some(cache) => cache.entry_count().await,
            None => 0,
        }
    }

    async fn record_for(&self, address: &str) -> (AccountRecord, bool) {
        if let Some(cache) = &self.cache {
            if let Some(record) = cache.get(address).await {
                metrics::counter!("rank_checker_cache_hits_total").increment(1);
                return (record, true);
            }
        }

        let record = self.resolver.resolve(address).await;
        // Zero-filled records stay out so the next check retries the explorer.
        match &self.cache {
            Some(cache) if !record.provenance.is_degraded() => {
                cache.insert(record.clone()).await;
            }
            Some(_) => {
                tracing::debug!(address = %record.address, "degraded record not cached");
            }
            None => {}
        }
        (record, false)
    }

    pub async fn check(&self, address: &str) -> RankReport {
        let (record, cached) = self.record_for(address).await;
        let (breakdown, tier) = evaluate(&record, &self.policy);

        metrics::counter!("rank_checker_checks_total", "tier" => tier.name()).increment(1);
        tracing::info!(
            address = %record.address,
            total = breakdown.total,
            multiplier = breakdown.nft_multiplier,
            tier = tier.name(),
            level = tier.level(),
            cached,
            "rank computed"
        );

        RankReport {
            record,
            breakdown,
            tier,
            cached,
            checked_at: Utc::now(),
        }
    }

    /// Checks run concurrently; reports come back in input order.
    pub async fn check_many(&self, addresses: &[String]) -> Vec<RankReport> {
        join_all(addresses.iter().map(|a| self.check(a))).await
    }
}
