use common::error::FetchError;
use common::explorer::ExplorerClient;
use common::types::{NftTransfer, TokenTransfer, Transport};
use std::future::Future;
use std::time::{Duration, Instant};

use super::source_traits::AccountDataSource;

/// Await `fut`, recording request count, latency and error kind for `endpoint`.
async fn instrumented<T>(
    endpoint: &'static str,
    transport: Transport,
    fut: impl Future<Output = Result<T, FetchError>>,
) -> Result<T, FetchError> {
    let start = Instant::now();
    let res = fut.await;
    let ms = start.elapsed().as_secs_f64() * 1000.0;
    metrics::histogram!(
        "rank_checker_api_latency_ms",
        "endpoint" => endpoint,
        "transport" => transport.as_str()
    )
    .record(ms);
    match &res {
        Ok(_) => {
            metrics::counter!("rank_checker_api_requests_total", "endpoint" => endpoint, "status" => "ok").increment(1);
        }
        // An explicit empty answer is a successful request.
        Err(FetchError::NotFound) => {
            metrics::counter!("rank_checker_api_requests_total", "endpoint" => endpoint, "status" => "empty").increment(1);
        }
        Err(e) => {
            metrics::counter!("rank_checker_api_requests_total", "endpoint" => endpoint, "status" => "error").increment(1);
            metrics::counter!(
                "rank_checker_api_errors_total",
                "endpoint" => endpoint,
                "kind" => e.kind()
            )
            .increment(1);
        }
    }
    res
}

impl AccountDataSource for ExplorerClient {
    async fn fetch_balance(
        &self,
        address: &str,
        transport: Transport,
        timeout: Duration,
    ) -> Result<String, FetchError> {
        instrumented(
            "balance",
            transport,
            self.fetch_balance_raw(address, transport, timeout),
        )
        .await
    }

    async fn fetch_transaction_count(
        &self,
        address: &str,
        transport: Transport,
        timeout: Duration,
    ) -> Result<String, FetchError> {
        instrumented(
            "transaction_count",
            transport,
            self.fetch_transaction_count_raw(address, transport, timeout),
        )
        .await
    }

    async fn fetch_token_transfers(
        &self,
        address: &str,
        transport: Transport,
        timeout: Duration,
    ) -> Result<Vec<TokenTransfer>, FetchError> {
        instrumented(
            "token_transfers",
            transport,
            ExplorerClient::fetch_token_transfers(self, address, transport, timeout),
        )
        .await
    }

    async fn fetch_nft_transfers(
        &self,
        address: &str,
        transport: Transport,
        timeout: Duration,
    ) -> Result<Vec<NftTransfer>, FetchError> {
        instrumented(
            "nft_transfers",
            transport,
            ExplorerClient::fetch_nft_transfers(self, address, transport, timeout),
        )
        .await
    }
}
