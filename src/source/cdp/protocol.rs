//! DevTools wire types and target discovery.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error_handling::SourceError;

/// Any message received on the DevTools socket: a command reply (with `id`)
/// or an event (with `method`).
#[derive(Debug, Deserialize, Clone)]
pub struct WsResponse {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<Value>,
    pub method: Option<String>,
    pub params: Option<Value>,
}

#[derive(Debug, Serialize, Clone)]
pub struct WsCommand<P: Serialize> {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<P>,
}

#[derive(Debug, Serialize)]
pub struct NoParams {}

#[derive(Debug, Serialize)]
pub struct NavigateParams<'a> {
    pub url: &'a str,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ChromeTarget {
    title: String,
    r#type: String,
    url: String,
    #[serde(default)]
    web_socket_debugger_url: String,
}

/// Looks up the WebSocket URL of the first page target at `endpoint`
/// (`host:port` of the DevTools HTTP server).
pub async fn get_websocket_url(endpoint: &str) -> Result<String, SourceError> {
    let url = format!("http://{}/json/list", endpoint);

    let targets: Vec<ChromeTarget> = reqwest::get(&url).await?.json().await?;

    let target = targets
        .into_iter()
        .find(|t| t.r#type == "page" && !t.web_socket_debugger_url.is_empty())
        .ok_or_else(|| SourceError::NoPageTarget(endpoint.to_string()))?;

    debug!("Found page target: {} - {}", target.title, target.url);

    Ok(target.web_socket_debugger_url)
}

/// Maps a reply's `error` object to [`SourceError::Protocol`].
pub fn protocol_error(error: &Value) -> SourceError {
    SourceError::Protocol {
        code: error["code"].as_i64().unwrap_or(-1),
        message: error["message"]
            .as_str()
            .unwrap_or("Unknown DevTools error")
            .to_string(),
    }
}
