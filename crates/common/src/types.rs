use serde::{Deserialize, Serialize};

/// How a request reaches the explorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    Direct,
    /// Pass-through relay used when the explorer is unreachable directly.
    Relay,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Relay => "relay",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Pagination for the transfer-history endpoints. Block range is always
/// `0..latest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub offset: u32,
    pub sort: SortOrder,
}

/// Response wrapper shared by the explorer's REST endpoints (`status`,
/// `message`, `result`) and its JSON-RPC proxy (`jsonrpc`, `result`, `error`).
#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerEnvelope {
    pub status: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub result: serde_json::Value,
    pub error: Option<serde_json::Value>,
}

/// ERC-20 transfer from `action=tokentx`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenTransfer {
    pub hash: Option<String>,
    #[serde(rename = "tokenName")]
    pub token_name: Option<String>,
    #[serde(rename = "tokenSymbol")]
    pub token_symbol: Option<String>,
    #[serde(rename = "contractAddress")]
    pub contract_address: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(deserialize_with = "de_opt_string_any", default)]
    pub value: Option<String>,
    #[serde(
        rename = "tokenDecimal",
        deserialize_with = "de_opt_string_any",
        default
    )]
    pub token_decimal: Option<String>,
    #[serde(rename = "timeStamp", deserialize_with = "de_opt_string_any", default)]
    pub time_stamp: Option<String>,
}

/// ERC-721 transfer from `action=tokennfttx`.
///
/// Also used for the static holdings table in config, hence the aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NftTransfer {
    #[serde(rename = "tokenName", alias = "token_name")]
    pub token_name: Option<String>,
    #[serde(rename = "tokenSymbol", alias = "token_symbol", default)]
    pub token_symbol: Option<String>,
    #[serde(
        rename = "tokenID",
        alias = "token_id",
        deserialize_with = "de_opt_string_any",
        default
    )]
    pub token_id: Option<String>,
    #[serde(rename = "contractAddress", alias = "contract_address", default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(
        rename = "timeStamp",
        alias = "timestamp",
        deserialize_with = "de_opt_string_any",
        default
    )]
    pub time_stamp: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
}

/// Deserialize a field that can be either a string or a number into Option<String>.
fn de_opt_string_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct StringOrNumber;

    impl de::Visitor<'_> for StringOrNumber {
        type Value = Option<String>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a string or number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}
