//! Operational view of the dereference queues
//!
//! Values are read on demand; reading never changes them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dereference::{OperationQueue, RecordQueue};

/// Point-in-time monitor values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorSnapshot {
    pub last_updated: DateTime<Utc>,
    pub current_queue_size: usize,
    pub max_queue_size: usize,
    pub queue_add_attempts: u64,
    pub queue_add_failures: u64,
    pub member_dn_queue_size: usize,
    pub member_entry_queue_size: usize,
}

impl MonitorSnapshot {
    /// Values as named attributes, in a stable order.
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        vec![
            ("monitor-last-updated", self.last_updated.format("%m/%d/%Y %H:%M:%S").to_string()),
            ("current-queue-size", self.current_queue_size.to_string()),
            ("max-queue-size", self.max_queue_size.to_string()),
            ("queue-add-attempts", self.queue_add_attempts.to_string()),
            ("queue-add-failures", self.queue_add_failures.to_string()),
            ("member-dn-queue-size", self.member_dn_queue_size.to_string()),
            ("member-entry-queue-size", self.member_entry_queue_size.to_string()),
        ]
    }
}

/// Reads depth and enqueue counters of the pipeline queues.
#[derive(Debug, Clone)]
pub struct DereferenceMonitor {
    operations: Arc<OperationQueue>,
    member_dns: Arc<RecordQueue>,
    member_entries: Arc<RecordQueue>,
}

impl DereferenceMonitor {
    pub fn new(
        operations: Arc<OperationQueue>,
        member_dns: Arc<RecordQueue>,
        member_entries: Arc<RecordQueue>,
    ) -> Self {
        Self { operations, member_dns, member_entries }
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        let metrics = self.operations.metrics();
        MonitorSnapshot {
            last_updated: Utc::now(),
            current_queue_size: self.operations.len(),
            max_queue_size: metrics.max_depth,
            queue_add_attempts: metrics.enqueue_attempts,
            queue_add_failures: metrics.enqueue_failures,
            member_dn_queue_size: self.member_dns.len(),
            member_entry_queue_size: self.member_entries.len(),
        }
    }

    /// Shorthand for `snapshot().attributes()`.
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        self.snapshot().attributes()
    }
}

#[cfg(test)]
mod tests {
    use groupderef_common::sync::{QueueConfig, WorkQueue};
    use groupderef_domain::MemberReference;

    use super::*;
    use crate::dereference::DereferenceOperation;

    fn operation(dn: &str) -> DereferenceOperation {
        DereferenceOperation::enqueue_reference(MemberReference::parse(dn).unwrap())
    }

    #[test]
    fn snapshot_reports_queue_counters() {
        let operations = Arc::new(WorkQueue::with_config(QueueConfig::bounded("ops", 2)).unwrap());
        let monitor = DereferenceMonitor::new(
            Arc::clone(&operations),
            Arc::new(WorkQueue::new("dns")),
            Arc::new(WorkQueue::new("entries")),
        );

        operations.push(operation("uid=a")).unwrap();
        operations.push(operation("uid=b")).unwrap();
        assert!(operations.push(operation("uid=c")).is_err());
        operations.try_pop();

        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.current_queue_size, 1);
        assert_eq!(snapshot.max_queue_size, 2);
        assert_eq!(snapshot.queue_add_attempts, 3);
        assert_eq!(snapshot.queue_add_failures, 1);

        // Reading has no side effects
        assert_eq!(monitor.snapshot().queue_add_attempts, 3);
    }

    #[test]
    fn attributes_use_monitor_names() {
        let monitor = DereferenceMonitor::new(
            Arc::new(WorkQueue::new("ops")),
            Arc::new(WorkQueue::new("dns")),
            Arc::new(WorkQueue::new("entries")),
        );

        let names: Vec<_> = monitor.attributes().into_iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                "monitor-last-updated",
                "current-queue-size",
                "max-queue-size",
                "queue-add-attempts",
                "queue-add-failures",
                "member-dn-queue-size",
                "member-entry-queue-size",
            ]
        );
    }
}
