//! Report and statistics printing.

use log::{debug, info};
use strum::IntoEnumIterator;

use crate::error_handling::{ErrorType, ProcessingStats};
use crate::report::TargetReport;

/// Logs the six counts of a target report and, when it is verbose, every
/// recorded URL with its status.
pub fn log_target_report(report: &TargetReport) {
    info!("Requests count: {}", report.requests.total);
    info!("Success count: {}", report.requests.success);
    info!("Failed count: {}", report.requests.failure);

    info!("Domains count: {}", report.domains.total);
    info!("Success domains count: {}", report.domains.success);
    info!("Failed domains count: {}", report.domains.failure);

    if report.malformed > 0 {
        info!(
            "Events without a derivable domain: {}",
            report.malformed
        );
    }

    for (url, success) in report.listing() {
        debug!("{} {}", url, if success { "✅" } else { "❌" });
    }
}

/// Prints error statistics to the log.
pub fn print_error_statistics(error_stats: &ProcessingStats) {
    let total_errors = error_stats.total_errors();

    if total_errors > 0 {
        info!("Error Counts ({} total):", total_errors);
        for error_type in ErrorType::iter() {
            let count = error_stats.get_error_count(error_type);
            if count > 0 {
                info!("   {}: {}", error_type.as_str(), count);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ClassificationTable;

    #[test]
    fn test_print_error_statistics_no_errors() {
        let stats = ProcessingStats::new();
        // Should not panic when there are no errors
        print_error_statistics(&stats);
    }

    #[test]
    fn test_print_error_statistics_with_errors() {
        let stats = ProcessingStats::new();
        stats.increment_error(ErrorType::NavigationTimeout);
        stats.increment_error(ErrorType::MalformedIdentity);
        stats.increment_error(ErrorType::MalformedIdentity);
        print_error_statistics(&stats);
    }

    #[test]
    fn test_log_target_report_verbose() {
        let mut urls = ClassificationTable::new();
        urls.upsert("https://a.com/", true);
        urls.upsert("https://a.com/missing.js", false);
        let mut hosts = ClassificationTable::new();
        hosts.upsert("a.com", false);

        let report = TargetReport::aggregate("https://a.com/", urls, &hosts, 1, true);
        // Should not panic, and must leave the listing intact
        log_target_report(&report);
        assert_eq!(report.listing().count(), 2);
    }
}
