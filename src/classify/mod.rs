//! Event classification.
//!
//! The [`Classifier`] folds request lifecycle events into two deduplicated
//! tables: one keyed by full URL (only identities passing the
//! [`InclusionRule`]) and one keyed by host (every event). A later event for a
//! key always replaces the earlier status, so a success can be downgraded to a
//! failure and back.

mod rule;
mod table;

use log::trace;
use serde::Serialize;

pub use rule::{host_of, InclusionRule};
pub use table::{ClassificationTable, IdentityRecord};

use crate::error_handling::ClassifyError;

/// Outcome of a request as reported by the observation source.
///
/// Says nothing about HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The request was issued.
    Success,
    /// The request failed.
    Failure,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// A single request lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEvent {
    pub identity: String,
    pub outcome: Outcome,
}

impl RequestEvent {
    pub fn new(identity: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            identity: identity.into(),
            outcome,
        }
    }

    pub fn issued(identity: impl Into<String>) -> Self {
        Self::new(identity, Outcome::Success)
    }

    pub fn failed(identity: impl Into<String>) -> Self {
        Self::new(identity, Outcome::Failure)
    }
}

/// Per-window classification state.
#[derive(Debug, Default)]
pub struct Classifier {
    rule: InclusionRule,
    urls: ClassificationTable,
    hosts: ClassificationTable,
}

impl Classifier {
    pub fn new(rule: InclusionRule) -> Self {
        Self {
            rule,
            urls: ClassificationTable::new(),
            hosts: ClassificationTable::new(),
        }
    }

    /// Applies one event to both tables.
    ///
    /// The URL table is updated first (if the identity passes the inclusion
    /// rule), then the host table. When no host can be derived the host
    /// update is skipped and `MalformedIdentity` is returned; the URL update
    /// has already happened by then. An empty identity touches neither table.
    pub fn classify(&mut self, event: &RequestEvent) -> Result<(), ClassifyError> {
        let identity = event.identity.as_str();
        let status = event.outcome.is_success();

        if identity.is_empty() {
            return Err(ClassifyError::MalformedIdentity {
                identity: String::new(),
                reason: "empty identity".to_string(),
            });
        }

        if self.rule.includes(identity) {
            self.urls.upsert(identity, status);
        }

        let host = host_of(identity).map_err(|reason| ClassifyError::MalformedIdentity {
            identity: identity.to_string(),
            reason,
        })?;
        self.hosts.upsert(&host, status);

        trace!("Classified {:?} {} (host {})", event.outcome, identity, host);
        Ok(())
    }

    pub fn urls(&self) -> &ClassificationTable {
        &self.urls
    }

    pub fn hosts(&self) -> &ClassificationTable {
        &self.hosts
    }

    /// Consumes the classifier, returning `(urls, hosts)`.
    pub fn into_tables(self) -> (ClassificationTable, ClassificationTable) {
        (self.urls, self.hosts)
    }
}
