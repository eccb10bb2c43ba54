//! Scripted observation source.
//!
//! Replays a fixed list of events per target, optionally with pauses between
//! them. Useful for tests and for driving the census without a browser.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{EventStream, ObservationSource, SourceEvent};
use crate::config::EVENT_CHANNEL_CAPACITY;
use crate::error_handling::SourceError;

#[derive(Debug, Clone)]
enum Step {
    Emit(SourceEvent),
    Wait(Duration),
}

/// The events one target produces, in delivery order.
///
/// ```
/// use request_census::source::Script;
/// use std::time::Duration;
///
/// let script = Script::new()
///     .request("https://a.com/")
///     .load()
///     .wait(Duration::from_millis(50))
///     .failed("https://tracker.example/pixel.gif");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Script {
    steps: Vec<Step>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(self, url: impl Into<String>) -> Self {
        self.emit(SourceEvent::Request(url.into()))
    }

    pub fn failed(self, url: impl Into<String>) -> Self {
        self.emit(SourceEvent::RequestFailed(url.into()))
    }

    pub fn load(self) -> Self {
        self.emit(SourceEvent::LoadComplete)
    }

    /// Ends the stream early, as a crashed tab would.
    pub fn close(self) -> Self {
        self.emit(SourceEvent::Closed)
    }

    pub fn emit(mut self, event: SourceEvent) -> Self {
        self.steps.push(Step::Emit(event));
        self
    }

    pub fn wait(mut self, pause: Duration) -> Self {
        self.steps.push(Step::Wait(pause));
        self
    }
}

/// Source that plays back a [`Script`] per target.
///
/// After the last step the stream stays open (and silent) until the window
/// drops it, so a script without [`Script::load`] never finishes navigating.
#[derive(Debug, Default)]
pub struct ReplaySource {
    scripts: HashMap<String, Script>,
    opened: Vec<String>,
    closed: usize,
    player: Option<JoinHandle<()>>,
}

impl ReplaySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the script played when `target` is opened.
    pub fn with_script(mut self, target: impl Into<String>, script: Script) -> Self {
        self.scripts.insert(target.into(), script);
        self
    }

    /// Targets opened so far, in order.
    pub fn opened(&self) -> &[String] {
        &self.opened
    }

    /// Number of `close` calls.
    pub fn closed(&self) -> usize {
        self.closed
    }
}

#[async_trait]
impl ObservationSource for ReplaySource {
    async fn open(
        &mut self,
        target: &str,
        _nav_timeout: Duration,
    ) -> Result<EventStream, SourceError> {
        self.opened.push(target.to_string());
        let script = self
            .scripts
            .get(target)
            .cloned()
            .ok_or_else(|| SourceError::UnknownTarget(target.to_string()))?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        if let Some(previous) = self.player.take() {
            previous.abort();
        }
        self.player = Some(tokio::spawn(async move {
            for step in script.steps {
                match step {
                    Step::Wait(pause) => tokio::time::sleep(pause).await,
                    Step::Emit(event) => {
                        if tx.send(event).await.is_err() {
                            debug!("Replay receiver dropped, stopping playback");
                            return;
                        }
                    }
                }
            }
            tx.closed().await;
        }));
        Ok(rx)
    }

    async fn close(&mut self) -> Result<(), SourceError> {
        self.closed += 1;
        if let Some(player) = self.player.take() {
            player.abort();
        }
        Ok(())
    }
}
