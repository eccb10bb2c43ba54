//! DevTools-protocol observation source.
//!
//! Attaches to a page of an already running Chromium
//! (`--remote-debugging-port`), enables the `Network` and `Page` domains and
//! navigates. Launching the browser is left to the operator.

mod protocol;
mod translate;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use log::{debug, error, trace, warn};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

pub use protocol::{get_websocket_url, WsResponse};
pub use translate::NetworkTranslator;

use protocol::{protocol_error, NavigateParams, NoParams, WsCommand};

use super::{EventStream, ObservationSource, SourceEvent};
use crate::config::{DEVTOOLS_COMMAND_TIMEOUT, EVENT_CHANNEL_CAPACITY};
use crate::error_handling::SourceError;

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<WsResponse>>>>;

/// Observation source backed by the Chrome DevTools Protocol.
pub struct CdpSource {
    endpoint: String,
    command_timeout: Duration,
    session: Option<Session>,
}

impl CdpSource {
    /// `endpoint` is the `host:port` of the DevTools HTTP server.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            command_timeout: DEVTOOLS_COMMAND_TIMEOUT,
            session: None,
        }
    }

    pub fn with_command_timeout(mut self, command_timeout: Duration) -> Self {
        self.command_timeout = command_timeout;
        self
    }
}

#[async_trait]
impl ObservationSource for CdpSource {
    async fn open(
        &mut self,
        target: &str,
        nav_timeout: Duration,
    ) -> Result<EventStream, SourceError> {
        if self.session.is_some() {
            self.close().await?;
        }

        let ws_url = get_websocket_url(&self.endpoint).await?;
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let session = Session::connect(&ws_url, events_tx).await?;

        session
            .send_command("Network.enable", NoParams {}, self.command_timeout)
            .await?;
        session
            .send_command("Page.enable", NoParams {}, self.command_timeout)
            .await?;

        let reply = session
            .send_command("Page.navigate", NavigateParams { url: target }, nav_timeout)
            .await;
        // Keep the session even on failure so close() tears it down
        self.session = Some(session);
        let reply = reply?;

        if let Some(reason) = reply
            .result
            .as_ref()
            .and_then(|r| r.get("errorText"))
            .and_then(|e| e.as_str())
        {
            return Err(SourceError::NavigationFailed {
                target: target.to_string(),
                reason: reason.to_string(),
            });
        }

        Ok(events_rx)
    }

    async fn close(&mut self) -> Result<(), SourceError> {
        if let Some(session) = self.session.take() {
            if session.is_alive() {
                if let Err(e) = session
                    .send_command("Network.disable", NoParams {}, self.command_timeout)
                    .await
                {
                    debug!("Network.disable failed while closing: {}", e);
                }
            }
            session.shutdown();
        }
        Ok(())
    }
}

/// One WebSocket connection to a page target, with a writer task and a
/// reader task.
struct Session {
    command_tx: mpsc::UnboundedSender<String>,
    pending: PendingMap,
    next_id: AtomicU64,
    is_alive: Arc<AtomicBool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Session {
    async fn connect(
        ws_url: &str,
        events_tx: mpsc::Sender<SourceEvent>,
    ) -> Result<Self, SourceError> {
        let (ws_stream, _) = connect_async(ws_url).await?;
        let (mut ws_sink, mut ws_stream) = ws_stream.split();

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let pending_reader = Arc::clone(&pending);

        let (command_tx, mut command_rx) = mpsc::unbounded_channel::<String>();

        let is_alive = Arc::new(AtomicBool::new(true));
        let is_alive_reader = Arc::clone(&is_alive);

        let writer = tokio::spawn(async move {
            let result: Result<(), SourceError> = async {
                while let Some(json_str) = command_rx.recv().await {
                    trace!("Sending DevTools command {}", json_str);
                    ws_sink.send(Message::Text(json_str.into())).await?;
                }
                Ok(())
            }
            .await;

            if let Err(e) = result {
                error!("Fatal error in DevTools writer task: {}", e);
            }
        });

        let reader = tokio::spawn(async move {
            let mut translator = NetworkTranslator::new();
            let reader_result: Result<(), SourceError> = async {
                while let Some(frame) = ws_stream.next().await {
                    let Message::Text(text) = frame? else {
                        continue;
                    };
                    let response: WsResponse = serde_json::from_str(&text)?;

                    if let Some(id) = response.id {
                        let responder = pending_reader
                            .lock()
                            .map_err(|_| {
                                SourceError::Protocol {
                                    code: -1,
                                    message: "pending request map poisoned".to_string(),
                                }
                            })?
                            .remove(&id);
                        match responder {
                            Some(responder) => {
                                let _ = responder.send(response);
                            }
                            None => trace!("Discarded reply {} (no listener)", id),
                        }
                    } else if let Some(ref method) = response.method {
                        if let Some(event) = translator.translate(method, response.params.as_ref())
                        {
                            // The window may already be gone; replies still matter
                            let _ = events_tx.send(event).await;
                        }
                    }
                }
                Ok(())
            }
            .await;

            is_alive_reader.store(false, Ordering::SeqCst);
            match reader_result {
                Err(e) => debug!("DevTools connection lost: {}", e),
                Ok(()) => debug!("DevTools connection closed"),
            }
            let _ = events_tx.send(SourceEvent::Closed).await;

            if let Ok(mut map) = pending_reader.lock() {
                // Dropping the senders wakes every waiter with an error
                map.clear();
            }
        });

        Ok(Self {
            command_tx,
            pending,
            next_id: AtomicU64::new(1),
            is_alive,
            tasks: vec![writer, reader],
        })
    }

    fn is_alive(&self) -> bool {
        self.is_alive.load(Ordering::SeqCst)
    }

    async fn send_command<P: Serialize>(
        &self,
        method: &str,
        params: P,
        limit: Duration,
    ) -> Result<WsResponse, SourceError> {
        if !self.is_alive() {
            return Err(SourceError::Disconnected);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .map_err(|_| SourceError::Disconnected)?
            .insert(id, tx);

        let payload = serde_json::to_string(&WsCommand {
            id,
            method: method.to_string(),
            params: Some(params),
        })?;
        if self.command_tx.send(payload).is_err() {
            self.is_alive.store(false, Ordering::SeqCst);
            return Err(SourceError::Disconnected);
        }

        match timeout(limit, rx).await {
            Ok(Ok(response)) => match response.error {
                Some(ref error) => Err(protocol_error(error)),
                None => Ok(response),
            },
            Ok(Err(_)) => Err(SourceError::Disconnected),
            Err(_) => {
                if let Ok(mut map) = self.pending.lock() {
                    map.remove(&id);
                }
                warn!("DevTools command {} got no reply within {:?}", method, limit);
                Err(SourceError::CommandTimeout {
                    method: method.to_string(),
                    timeout: limit,
                })
            }
        }
    }

    fn shutdown(self) {
        for task in self.tasks {
            task.abort();
        }
    }
}
