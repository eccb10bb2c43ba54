//! Observation window lifecycle.
//!
//! One [`ObservationWindow`] per target, moving strictly through
//! `Idle -> Navigating -> Observing -> Closed`:
//!
//! - [`begin_navigation`](ObservationWindow::begin_navigation) opens the
//!   target on the source and waits for its load event, bounded by the
//!   timeout. Requests reported while the page loads are held back in
//!   delivery order.
//! - [`observe`](ObservationWindow::observe) classifies the held-back
//!   requests, then every event that arrives during the observation duration.
//! - [`close`](ObservationWindow::close) consumes the window and produces the
//!   [`TargetReport`]. Only a window that completed observation has one.
//!
//! Any failure sends the window straight to `Closed`.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, trace, warn};
use tokio_util::sync::CancellationToken;

use crate::app::truncate_for_log;
use crate::classify::{Classifier, InclusionRule, RequestEvent};
use crate::error_handling::{
    ClassifyError, ErrorType, ProcessingStats, SourceError, WindowError,
};
use crate::report::TargetReport;
use crate::source::{EventStream, ObservationSource, SourceEvent};

/// Lifecycle state of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Idle,
    Navigating,
    Observing,
    Closed,
}

/// Per-target observation state. Never reused across targets.
pub struct ObservationWindow {
    target: String,
    rule: InclusionRule,
    timeout: Duration,
    state: WindowState,
    classifier: Option<Classifier>,
    events: Option<EventStream>,
    held_back: Vec<RequestEvent>,
    malformed: usize,
    observed: bool,
    stats: Arc<ProcessingStats>,
}

impl ObservationWindow {
    /// `timeout` bounds navigation and is also the observation duration.
    pub fn new(
        target: impl Into<String>,
        rule: InclusionRule,
        timeout: Duration,
        stats: Arc<ProcessingStats>,
    ) -> Self {
        Self {
            target: target.into(),
            rule,
            timeout,
            state: WindowState::Idle,
            classifier: None,
            events: None,
            held_back: Vec::new(),
            malformed: 0,
            observed: false,
            stats,
        }
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    /// Tables classified so far; `None` while `Idle`.
    pub fn classifier(&self) -> Option<&Classifier> {
        self.classifier.as_ref()
    }

    /// `Idle -> Navigating -> Observing`.
    ///
    /// Opens the target on `source` and waits for [`SourceEvent::LoadComplete`].
    ///
    /// # Errors
    ///
    /// `NavigationTimeout` if no load event arrives within the timeout,
    /// `Cancelled` if `cancel` fires first, `Source` if the source fails or its
    /// stream ends. The window is `Closed` afterwards in every error case.
    pub async fn begin_navigation<S>(
        &mut self,
        source: &mut S,
        cancel: &CancellationToken,
    ) -> Result<(), WindowError>
    where
        S: ObservationSource + ?Sized,
    {
        self.expect_state(WindowState::Idle, "navigate")?;
        self.state = WindowState::Navigating;
        self.classifier = Some(Classifier::new(self.rule.clone()));
        debug!("Navigating to {}", self.target);

        let target = self.target.clone();
        let timeout = self.timeout;
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(WindowError::Cancelled { target }),
            opened = tokio::time::timeout(timeout, self.open_and_wait_for_load(source)) => {
                match opened {
                    Ok(result) => result,
                    Err(_) => Err(WindowError::NavigationTimeout { target, timeout }),
                }
            }
        };

        match result {
            Ok(()) => {
                self.state = WindowState::Observing;
                debug!(
                    "{} loaded, {} request(s) reported while loading",
                    self.target,
                    self.held_back.len()
                );
                Ok(())
            }
            Err(e) => {
                self.fail();
                Err(e)
            }
        }
    }

    async fn open_and_wait_for_load<S>(&mut self, source: &mut S) -> Result<(), WindowError>
    where
        S: ObservationSource + ?Sized,
    {
        let events = self
            .events
            .insert(source.open(&self.target, self.timeout).await?);

        loop {
            match events.recv().await {
                Some(SourceEvent::LoadComplete) => return Ok(()),
                Some(SourceEvent::Closed) | None => {
                    return Err(WindowError::Source(SourceError::Disconnected))
                }
                Some(event) => {
                    if let Some(request) = event.into_request() {
                        self.held_back.push(request);
                    }
                }
            }
        }
    }

    /// `Observing -> Closed`.
    ///
    /// Classifies held-back requests, then accepts events until the
    /// observation duration elapses, `cancel` fires, or the source's stream
    /// ends. Events still queued at that point are discarded.
    pub async fn observe(&mut self, cancel: &CancellationToken) -> Result<(), WindowError> {
        self.expect_state(WindowState::Observing, "observe")?;

        for request in std::mem::take(&mut self.held_back) {
            self.ingest(&request);
        }

        info!("Waiting for {} ms", self.timeout.as_millis());
        let Some(mut events) = self.events.take() else {
            self.fail();
            return Err(WindowError::Source(SourceError::Disconnected));
        };

        let sleep = tokio::time::sleep(self.timeout);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Observation of {} cancelled", self.target);
                    break;
                }
                _ = &mut sleep => break,
                event = events.recv() => match event {
                    Some(SourceEvent::LoadComplete) => trace!("Repeated load event for {}", self.target),
                    Some(SourceEvent::Closed) | None => {
                        warn!("Event stream for {} ended before the observation window elapsed", self.target);
                        break;
                    }
                    Some(event) => {
                        if let Some(request) = event.into_request() {
                            self.ingest(&request);
                        }
                    }
                },
            }
        }

        self.state = WindowState::Closed;
        self.observed = true;
        Ok(())
    }

    fn ingest(&mut self, request: &RequestEvent) {
        let Some(classifier) = self.classifier.as_mut() else {
            return;
        };
        if let Err(ClassifyError::MalformedIdentity { identity, reason }) =
            classifier.classify(request)
        {
            self.malformed += 1;
            self.stats.increment_error(ErrorType::MalformedIdentity);
            warn!(
                "Skipping domain for malformed identity {} on {}: {}",
                truncate_for_log(&identity),
                self.target,
                reason
            );
        }
    }

    /// `Closed -> report`. Runs the aggregation exactly once.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the window completed observation.
    pub fn close(mut self, verbose: bool) -> Result<TargetReport, WindowError> {
        if self.state != WindowState::Closed || !self.observed {
            return Err(WindowError::InvalidTransition {
                state: self.state,
                action: "close",
            });
        }
        let classifier = self.classifier.take().unwrap_or_default();
        let (urls, hosts) = classifier.into_tables();
        Ok(TargetReport::aggregate(
            self.target,
            urls,
            &hosts,
            self.malformed,
            verbose,
        ))
    }

    fn expect_state(&self, expected: WindowState, action: &'static str) -> Result<(), WindowError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(WindowError::InvalidTransition {
                state: self.state,
                action,
            })
        }
    }

    fn fail(&mut self) {
        self.state = WindowState::Closed;
        self.events = None;
        self.held_back.clear();
        self.classifier = None;
    }
}
