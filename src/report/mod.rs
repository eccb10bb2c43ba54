//! Aggregation of classification tables into per-target reports.

use serde::Serialize;

use crate::classify::{ClassificationTable, IdentityRecord};

/// Counts derived from one table.
///
/// `failure` is always `total - success`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub success: usize,
    pub failure: usize,
}

impl Summary {
    /// Single pass over `table`.
    pub fn of(table: &ClassificationTable) -> Self {
        let total = table.len();
        let success = table.iter().filter(|r| r.status).count();
        Self {
            total,
            success,
            failure: total - success,
        }
    }
}

/// Result of one closed observation window.
#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    /// Target page URL
    pub target: String,
    /// Counts for the URL table
    pub requests: Summary,
    /// Counts for the host table
    pub domains: Summary,
    /// Events whose identity had no derivable host
    pub malformed: usize,
    /// URL table records in first-seen order, kept only when verbose
    #[serde(skip_serializing_if = "Option::is_none")]
    entries: Option<Vec<IdentityRecord>>,
}

impl TargetReport {
    /// Builds the report from a window's tables.
    ///
    /// With `verbose` the URL table's records are kept for [`listing`](Self::listing);
    /// the host table is only counted.
    pub fn aggregate(
        target: impl Into<String>,
        urls: ClassificationTable,
        hosts: &ClassificationTable,
        malformed: usize,
        verbose: bool,
    ) -> Self {
        let requests = Summary::of(&urls);
        let domains = Summary::of(hosts);
        Self {
            target: target.into(),
            requests,
            domains,
            malformed,
            entries: verbose.then(|| urls.into_records()),
        }
    }

    /// The six counts in output order: requests total/success/failure, then
    /// domains total/success/failure.
    pub fn counts(&self) -> [usize; 6] {
        [
            self.requests.total,
            self.requests.success,
            self.requests.failure,
            self.domains.total,
            self.domains.success,
            self.domains.failure,
        ]
    }

    /// `(identity, status)` pairs of the URL table in first-seen order.
    ///
    /// Empty unless the report was aggregated with `verbose`.
    pub fn listing(&self) -> Listing<'_> {
        Listing {
            inner: self.entries.as_deref().unwrap_or_default().iter(),
        }
    }

    /// Consumes the report, yielding owned `(identity, status)` pairs once.
    pub fn into_listing(self) -> impl Iterator<Item = (String, bool)> {
        self.entries
            .unwrap_or_default()
            .into_iter()
            .map(|r| (r.identity, r.status))
    }
}

/// Lazy iterator over a report's URL records.
#[derive(Debug, Clone)]
pub struct Listing<'a> {
    inner: std::slice::Iter<'a, IdentityRecord>,
}

impl<'a> Iterator for Listing<'a> {
    type Item = (&'a str, bool);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|r| (r.identity.as_str(), r.status))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Listing<'_> {}
