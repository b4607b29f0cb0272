use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::config;
use crate::error::FetchError;
use crate::types::{ExplorerEnvelope, NftTransfer, PageRequest, TokenTransfer, Transport};

/// Client for an Etherscan-compatible block-explorer API.
pub struct ExplorerClient {
    base_url: String,
    api_key: Option<String>,
    relay_url: Option<String>,
    page: PageRequest,
    client: reqwest::Client,
}

impl ExplorerClient {
    pub fn new(cfg: &config::Explorer) -> Result<Self> {
        // Per-request deadlines are applied by the caller; this one only
        // catches requests that never get a deadline.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone().filter(|k| !k.is_empty()),
            relay_url: cfg.relay_url.clone().filter(|r| !r.is_empty()),
            page: PageRequest {
                page: 1,
                offset: cfg.page_size,
                sort: cfg.sort,
            },
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn page_request(&self) -> PageRequest {
        self.page
    }

    pub fn has_relay(&self) -> bool {
        self.relay_url.is_some()
    }

    fn query_url(&self, pairs: &[(&str, &str)]) -> String {
        let mut url = format!("{}?", self.base_url);
        for (i, (k, v)) in pairs.iter().enumerate() {
            if i > 0 {
                url.push('&');
            }
            url.push_str(k);
            url.push('=');
            url.push_str(&urlencoding::encode(v));
        }
        if let Some(key) = &self.api_key {
            url.push_str("&apikey=");
            url.push_str(&urlencoding::encode(key));
        }
        url
    }

    pub fn balance_url(&self, address: &str) -> String {
        self.query_url(&[
            ("module", "account"),
            ("action", "balance"),
            ("address", address),
            ("tag", "latest"),
        ])
    }

    /// Nonce query through the explorer's JSON-RPC proxy.
    pub fn transaction_count_url(&self, address: &str) -> String {
        self.query_url(&[
            ("module", "proxy"),
            ("action", "eth_getTransactionCount"),
            ("address", address),
            ("tag", "latest"),
        ])
    }

    fn transfers_url(&self, action: &str, address: &str, page: &PageRequest) -> String {
        self.query_url(&[
            ("module", "account"),
            ("action", action),
            ("address", address),
            ("startblock", "0"),
            ("endblock", "latest"),
            ("page", &page.page.to_string()),
            ("offset", &page.offset.to_string()),
            ("sort", page.sort.as_str()),
        ])
    }

    pub fn token_transfers_url(&self, address: &str, page: &PageRequest) -> String {
        self.transfers_url("tokentx", address, page)
    }

    pub fn nft_transfers_url(&self, address: &str, page: &PageRequest) -> String {
        self.transfers_url("tokennfttx", address, page)
    }

    /// Wrap `url` for the relay transport. `None` when no relay is configured.
    pub fn relayed_url(&self, url: &str) -> Option<String> {
        self.relay_url
            .as_ref()
            .map(|prefix| format!("{prefix}{}", urlencoding::encode(url)))
    }

    /// GET `url` through `transport`, bounded by `timeout`.
    pub async fn get_envelope(
        &self,
        url: &str,
        transport: Transport,
        timeout: Duration,
    ) -> std::result::Result<ExplorerEnvelope, FetchError> {
        let target = match transport {
            Transport::Direct => url.to_string(),
            Transport::Relay => self
                .relayed_url(url)
                .ok_or_else(|| FetchError::NetworkFailure("no relay configured".to_string()))?,
        };

        let request = async {
            let resp = self.client.get(&target).send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(FetchError::NetworkFailure(format!(
                    "explorer returned {status}"
                )));
            }
            let body = resp.bytes().await?;
            decode_envelope(&body)
        };

        match tokio::time::timeout(timeout, request).await {
            Ok(res) => res,
            Err(_elapsed) => Err(FetchError::Timeout(timeout)),
        }
    }

    /// Raw base-unit balance string, hex or decimal.
    pub async fn fetch_balance_raw(
        &self,
        address: &str,
        transport: Transport,
        timeout: Duration,
    ) -> std::result::Result<String, FetchError> {
        debug!(address, transport = transport.as_str(), "fetching balance");
        let env = self
            .get_envelope(&self.balance_url(address), transport, timeout)
            .await?;
        interpret_scalar(env)
    }

    /// Raw `0x`-prefixed nonce.
    pub async fn fetch_transaction_count_raw(
        &self,
        address: &str,
        transport: Transport,
        timeout: Duration,
    ) -> std::result::Result<String, FetchError> {
        debug!(address, transport = transport.as_str(), "fetching transaction count");
        let env = self
            .get_envelope(&self.transaction_count_url(address), transport, timeout)
            .await?;
        interpret_scalar(env)
    }

    pub async fn fetch_token_transfers(
        &self,
        address: &str,
        transport: Transport,
        timeout: Duration,
    ) -> std::result::Result<Vec<TokenTransfer>, FetchError> {
        debug!(address, transport = transport.as_str(), "fetching token transfers");
        let url = self.token_transfers_url(address, &self.page);
        let env = self.get_envelope(&url, transport, timeout).await?;
        interpret_list(env)
    }

    pub async fn fetch_nft_transfers(
        &self,
        address: &str,
        transport: Transport,
        timeout: Duration,
    ) -> std::result::Result<Vec<NftTransfer>, FetchError> {
        debug!(address, transport = transport.as_str(), "fetching nft transfers");
        let url = self.nft_transfers_url(address, &self.page);
        let env = self.get_envelope(&url, transport, timeout).await?;
        interpret_list(env)
    }
}

/// A body that is not JSON at all (block page, CDN challenge, proxy error
/// page) is an outage of this transport, not an answer.
pub fn decode_envelope(body: &[u8]) -> std::result::Result<ExplorerEnvelope, FetchError> {
    serde_json::from_slice(body)
        .map_err(|e| FetchError::NetworkFailure(format!("undecodable explorer body: {e}")))
}

fn rejection(env: &ExplorerEnvelope) -> FetchError {
    let message = env.message.as_deref().unwrap_or("NOTOK");
    match env.result.as_str() {
        Some(detail) => {
            FetchError::NetworkFailure(format!("explorer rejected request: {message}: {detail}"))
        }
        None => FetchError::NetworkFailure(format!("explorer rejected request: {message}")),
    }
}

/// Extract a string `result` (balance, JSON-RPC quantity).
pub fn interpret_scalar(env: ExplorerEnvelope) -> std::result::Result<String, FetchError> {
    if let Some(err) = &env.error {
        return Err(FetchError::NetworkFailure(format!("rpc error: {err}")));
    }
    if env.status.as_deref() == Some("0") {
        return Err(rejection(&env));
    }
    match env.result {
        serde_json::Value::String(s) => Ok(s),
        other => Err(FetchError::MalformedResponse(format!(
            "expected string result, got {other}"
        ))),
    }
}

/// Extract an array `result` of records.
///
/// An explicit empty answer is `NotFound`; a `status = "0"` answer carrying a
/// text reason is a rejection and is retried elsewhere.
pub fn interpret_list<T: DeserializeOwned>(
    env: ExplorerEnvelope,
) -> std::result::Result<Vec<T>, FetchError> {
    if let Some(err) = &env.error {
        return Err(FetchError::NetworkFailure(format!("rpc error: {err}")));
    }

    if let serde_json::Value::Array(items) = &env.result {
        if items.is_empty() {
            return Err(FetchError::NotFound);
        }
    }

    if env.status.as_deref() == Some("0") {
        let message = env.message.as_deref().unwrap_or_default().to_ascii_lowercase();
        if message.contains("no transactions found") || message.contains("no records found") {
            return Err(FetchError::NotFound);
        }
        if env.result.is_string() {
            return Err(rejection(&env));
        }
    }

    match env.result {
        serde_json::Value::Array(_) => Ok(serde_json::from_value(env.result)?),
        other => Err(FetchError::MalformedResponse(format!(
            "expected array result, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SortOrder;

    fn client(api_key: Option<&str>, relay: Option<&str>) -> ExplorerClient {
        ExplorerClient::new(&config::Explorer {
            base_url: "https://api.etherscan.io/api/".to_string(),
            api_key: api_key.map(str::to_string),
            relay_url: relay.map(str::to_string),
            page_size: 50,
            sort: SortOrder::Desc,
        })
        .unwrap()
    }

    fn envelope(json: &str) -> ExplorerEnvelope {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_balance_url() {
        let c = client(None, None);
        assert_eq!(
            c.balance_url("0xabc"),
            "https://api.etherscan.io/api?module=account&action=balance&address=0xabc&tag=latest"
        );
    }

    #[test]
    fn test_api_key_appended() {
        let c = client(Some("KEY"), None);
        assert!(c.transaction_count_url("0xabc").ends_with("&apikey=KEY"));
        assert!(c
            .transaction_count_url("0xabc")
            .contains("action=eth_getTransactionCount"));
    }

    #[test]
    fn test_nft_transfers_url_pagination() {
        let c = client(None, None);
        let url = c.nft_transfers_url("0xabc", &c.page_request());
        assert!(url.contains("action=tokennfttx"));
        assert!(url.contains("startblock=0&endblock=latest"));
        assert!(url.contains("page=1&offset=50&sort=desc"));
    }

    #[test]
    fn test_relayed_url_encodes_target() {
        let c = client(None, Some("https://relay.example/?url="));
        let relayed = c.relayed_url("https://api.etherscan.io/api?module=account").unwrap();
        assert_eq!(
            relayed,
            "https://relay.example/?url=https%3A%2F%2Fapi.etherscan.io%2Fapi%3Fmodule%3Daccount"
        );
        assert!(client(None, None).relayed_url("https://x").is_none());
    }

    #[tokio::test]
    async fn test_relay_without_prefix_is_network_failure() {
        let c = client(None, None);
        let err = c
            .get_envelope("https://x", Transport::Relay, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NetworkFailure(_)));
    }

    #[test]
    fn test_decode_envelope_html_body_advances_fallback() {
        let err = decode_envelope(b"<html>Access denied</html>").unwrap_err();
        assert!(matches!(err, FetchError::NetworkFailure(_)));
        assert!(err.advances_fallback());

        let env = decode_envelope(br#"{"status":"1","message":"OK","result":"0x1"}"#).unwrap();
        assert_eq!(interpret_scalar(env).unwrap(), "0x1");
    }

    #[tokio::test]
    async fn test_html_page_from_server_is_network_failure() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = sock.read(&mut buf).await;
            let body = "<html>Access denied</html>";
            let resp = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(resp.as_bytes()).await.unwrap();
            sock.shutdown().await.unwrap();
        });

        let c = ExplorerClient::new(&config::Explorer {
            base_url: format!("http://{addr}/api"),
            api_key: None,
            relay_url: None,
            page_size: 10,
            sort: SortOrder::Desc,
        })
        .unwrap();
        let err = c
            .fetch_nft_transfers("0xabc", Transport::Direct, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NetworkFailure(_)), "{err:?}");
        assert!(err.advances_fallback());
    }

    #[test]
    fn test_interpret_scalar_ok() {
        let env = envelope(r#"{"status":"1","message":"OK","result":"0x2c68119335cd870"}"#);
        assert_eq!(interpret_scalar(env).unwrap(), "0x2c68119335cd870");
    }

    #[test]
    fn test_interpret_scalar_rejected() {
        let env = envelope(r#"{"status":"0","message":"NOTOK","result":"Max rate limit reached"}"#);
        let err = interpret_scalar(env).unwrap_err();
        assert!(err.advances_fallback());
        assert!(err.to_string().contains("Max rate limit reached"));
    }

    #[test]
    fn test_interpret_scalar_rpc_error() {
        let env = envelope(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"invalid"}}"#);
        assert!(matches!(
            interpret_scalar(env),
            Err(FetchError::NetworkFailure(_))
        ));
    }

    #[test]
    fn test_interpret_scalar_wrong_shape() {
        let env = envelope(r#"{"status":"1","message":"OK","result":12}"#);
        assert!(matches!(
            interpret_scalar(env),
            Err(FetchError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_interpret_list_empty_is_not_found() {
        let env = envelope(r#"{"status":"0","message":"No transactions found","result":[]}"#);
        assert_eq!(
            interpret_list::<TokenTransfer>(env).unwrap_err(),
            FetchError::NotFound
        );
    }

    #[test]
    fn test_interpret_list_records() {
        let env = envelope(
            r#"{"status":"1","message":"OK","result":[
                {"hash":"0x1","tokenName":"A","to":"0xb"},
                {"hash":"0x2","tokenName":"B","to":"0xb"}
            ]}"#,
        );
        let list: Vec<TokenTransfer> = interpret_list(env).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].hash.as_deref(), Some("0x2"));
    }

    #[test]
    fn test_interpret_list_rejected() {
        let env = envelope(r#"{"status":"0","message":"NOTOK","result":"Invalid API Key"}"#);
        let err = interpret_list::<NftTransfer>(env).unwrap_err();
        assert!(matches!(err, FetchError::NetworkFailure(_)));
    }

    #[test]
    fn test_interpret_list_wrong_shape() {
        let env = envelope(r#"{"status":"1","message":"OK","result":{"unexpected":true}}"#);
        assert!(matches!(
            interpret_list::<NftTransfer>(env),
            Err(FetchError::MalformedResponse(_))
        ));

        let env = envelope(r#"{"status":"1","message":"OK","result":[1,2]}"#);
        assert!(matches!(
            interpret_list::<NftTransfer>(env),
            Err(FetchError::MalformedResponse(_))
        ));
    }
}
