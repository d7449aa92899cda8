//! Ways of reaching a feed: directly or through a CORS proxy.

use serde::{Deserialize, Serialize};

pub const CORSPROXY_PREFIX: &str = "https://corsproxy.io/?";
pub const ALLORIGINS_PREFIX: &str = "https://api.allorigins.win/get?url=";

fn default_json_field() -> String {
    "contents".to_string()
}

/// One retrieval attempt. Configured as
/// `{ kind = "proxy", prefix = "https://corsproxy.io/?" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchStrategy {
    /// GET the feed URL as-is.
    Direct,
    /// GET `prefix` + percent-encoded feed URL; the body is the feed.
    Proxy { prefix: String },
    /// Like `Proxy`, but the body is JSON with the feed in `field`.
    JsonProxy {
        prefix: String,
        #[serde(default = "default_json_field")]
        field: String,
    },
}

/// Direct, then corsproxy.io, then allorigins.
pub fn default_strategies() -> Vec<FetchStrategy> {
    vec![
        FetchStrategy::Direct,
        FetchStrategy::Proxy {
            prefix: CORSPROXY_PREFIX.to_string(),
        },
        FetchStrategy::JsonProxy {
            prefix: ALLORIGINS_PREFIX.to_string(),
            field: default_json_field(),
        },
    ]
}

impl FetchStrategy {
    pub fn request_url(&self, feed_url: &str) -> String {
        match self {
            FetchStrategy::Direct => feed_url.to_string(),
            FetchStrategy::Proxy { prefix } | FetchStrategy::JsonProxy { prefix, .. } => {
                let encoded: String = url::form_urlencoded::byte_serialize(feed_url.as_bytes()).collect();
                format!("{prefix}{encoded}")
            }
        }
    }

    /// Pull the feed text out of a response body.
    pub fn extract(&self, body: String) -> Result<String, String> {
        let FetchStrategy::JsonProxy { field, .. } = self else {
            return Ok(body);
        };

        let json: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| format!("proxy answered with invalid JSON: {e}"))?;
        json.get(field)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| format!("proxy response has no '{field}' string"))
    }

    pub fn name(&self) -> String {
        match self {
            FetchStrategy::Direct => "direct".to_string(),
            FetchStrategy::Proxy { prefix } | FetchStrategy::JsonProxy { prefix, .. } => {
                url::Url::parse(prefix)
                    .ok()
                    .and_then(|u| u.host_str().map(str::to_string))
                    .unwrap_or_else(|| prefix.clone())
            }
        }
    }
}
