//! Per-consumer resumption status.

use indexmap::IndexMap;
use resumption_messages::{Directive, HmiMessage};
use resumption_types::{AppId, CorrelationKey};
use std::collections::BTreeSet;

/// A request sent (or registered on a consumer's behalf) and awaiting its
/// response.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub key: CorrelationKey,
    pub app_id: AppId,
    /// Snapshot of the message, used to build inverses during rollback.
    pub message: HmiMessage,
}

/// Outstanding, succeeded and failed requests of one consumer's resumption.
#[derive(Debug, Default)]
pub struct ConsumerResumptionStatus {
    /// Insertion-ordered so rollback and logs follow dispatch order.
    pub outstanding: IndexMap<CorrelationKey, PendingRequest>,
    pub succeeded: Vec<PendingRequest>,
    pub failed: Vec<PendingRequest>,
    /// Directives that could not even be addressed (no free correlation id).
    pub unsent: Vec<Directive>,
    /// Vehicle data items restored successfully.
    pub successful_vehicle_data: BTreeSet<String>,
    /// Vehicle data items that failed to restore.
    pub unsuccessful_vehicle_data: BTreeSet<String>,
}

impl ConsumerResumptionStatus {
    /// Whether no response is awaited any more.
    pub fn is_complete(&self) -> bool {
        self.outstanding.is_empty()
    }

    /// Whether every directive and every vehicle data item succeeded.
    pub fn is_successful(&self) -> bool {
        self.failed.is_empty()
            && self.unsent.is_empty()
            && self.unsuccessful_vehicle_data.is_empty()
    }

    /// Human-readable summary for the completion callback.
    pub fn summary(&self) -> String {
        if self.is_successful() {
            return "Data resumption succeeded".to_string();
        }
        let mut failures: Vec<String> = self
            .failed
            .iter()
            .map(|request| request.key.to_string())
            .collect();
        failures.extend(
            self.unsent
                .iter()
                .map(|directive| format!("{} (not sent)", directive.function.name())),
        );
        if !self.unsuccessful_vehicle_data.is_empty() {
            let items: Vec<&str> = self
                .unsuccessful_vehicle_data
                .iter()
                .map(String::as_str)
                .collect();
            failures.push(format!("vehicle data [{}]", items.join(", ")));
        }
        format!("Data resumption failed: {}", failures.join("; "))
    }
}
