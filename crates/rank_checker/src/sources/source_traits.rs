use common::error::FetchError;
use common::types::{NftTransfer, TokenTransfer, Transport};
use std::future::Future;
use std::time::Duration;

/// Per-address queries the resolver needs from a block explorer.
///
/// Each call is a single attempt over one transport; retries and fallbacks
/// are the resolver's concern.
pub trait AccountDataSource {
    /// Base-unit balance, hex (`0x`) or decimal.
    fn fetch_balance(
        &self,
        address: &str,
        transport: Transport,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;

    /// `0x`-encoded nonce.
    fn fetch_transaction_count(
        &self,
        address: &str,
        transport: Transport,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;

    fn fetch_token_transfers(
        &self,
        address: &str,
        transport: Transport,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<TokenTransfer>, FetchError>> + Send;

    fn fetch_nft_transfers(
        &self,
        address: &str,
        transport: Transport,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<NftTransfer>, FetchError>> + Send;
}
