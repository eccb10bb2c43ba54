//! Observation sources.
//!
//! A source opens a target in a browsing context and delivers what happens
//! there as [`SourceEvent`] messages over a channel, in the order the browser
//! reported them.

pub mod cdp;
pub mod replay;

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::classify::RequestEvent;
use crate::error_handling::SourceError;

pub use cdp::CdpSource;
pub use replay::{ReplaySource, Script};

/// One message from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// The page issued a request to this URL.
    Request(String),
    /// A request to this URL failed.
    RequestFailed(String),
    /// The page fired its load event.
    LoadComplete,
    /// The browsing context went away; nothing follows.
    Closed,
}

impl SourceEvent {
    /// The request event carried by this message, if any.
    pub fn into_request(self) -> Option<RequestEvent> {
        match self {
            SourceEvent::Request(url) => Some(RequestEvent::issued(url)),
            SourceEvent::RequestFailed(url) => Some(RequestEvent::failed(url)),
            SourceEvent::LoadComplete | SourceEvent::Closed => None,
        }
    }
}

/// Receiving end of a source's event channel.
pub type EventStream = mpsc::Receiver<SourceEvent>;

/// Something that can open targets and report their network activity.
#[async_trait]
pub trait ObservationSource: Send {
    /// Starts navigating to `target` and returns the stream of its events.
    ///
    /// `nav_timeout` bounds the navigation request itself; the caller also
    /// bounds the wait for [`SourceEvent::LoadComplete`].
    async fn open(&mut self, target: &str, nav_timeout: Duration)
        -> Result<EventStream, SourceError>;

    /// Releases whatever `open` acquired. Called once per opened target,
    /// whether or not it loaded.
    async fn close(&mut self) -> Result<(), SourceError>;
}
