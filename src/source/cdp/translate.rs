//! Translation of DevTools events into [`SourceEvent`]s.

use std::collections::HashMap;

use serde_json::Value;

use crate::source::SourceEvent;

/// Stateful mapper from DevTools events to source events.
///
/// `Network.loadingFailed` only carries a request id, so the URL of every
/// request still in flight is remembered until it finishes or fails.
#[derive(Debug, Default)]
pub struct NetworkTranslator {
    in_flight: HashMap<String, String>,
}

impl NetworkTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the source event for a DevTools event, if it is one we count.
    pub fn translate(&mut self, method: &str, params: Option<&Value>) -> Option<SourceEvent> {
        match method {
            "Network.requestWillBeSent" => {
                let params = params?;
                let id = request_id(params)?;
                let url = params.get("request")?.get("url")?.as_str()?;
                // Redirects reuse the request id with the new URL
                self.in_flight.insert(id.to_string(), url.to_string());
                Some(SourceEvent::Request(url.to_string()))
            }
            "Network.loadingFailed" => {
                let url = self.in_flight.remove(request_id(params?)?)?;
                Some(SourceEvent::RequestFailed(url))
            }
            "Network.loadingFinished" => {
                self.in_flight.remove(request_id(params?)?);
                None
            }
            "Page.loadEventFired" => Some(SourceEvent::LoadComplete),
            "Inspector.detached" | "Inspector.targetCrashed" => Some(SourceEvent::Closed),
            _ => None,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

fn request_id(params: &Value) -> Option<&str> {
    params.get("requestId")?.as_str()
}
