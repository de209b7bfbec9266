//! Group change processor: turns one group change into member operations

use std::sync::Arc;

use groupderef_domain::{
    Attribute, ChangeDetail, ChangeEvent, DereferenceConfig, MemberReference, ParseMode,
};
use tracing::{debug, info, instrument, warn};

use super::operation::{DereferenceOperation, OperationQueue};
use crate::directory::ConnectionHandle;

/// Whether the host should keep propagating the group entry itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupSyncDecision {
    Continue,
    Abort,
}

impl GroupSyncDecision {
    #[must_use]
    pub const fn from_abort_flag(abort_group_sync: bool) -> Self {
        if abort_group_sync {
            Self::Abort
        } else {
            Self::Continue
        }
    }

    #[must_use]
    pub const fn is_abort(self) -> bool {
        matches!(self, Self::Abort)
    }
}

/// Outcome of processing one group change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessReport {
    pub decision: GroupSyncDecision,
    /// Valid member references found in the change
    pub references: usize,
    /// Operations accepted by the queue
    pub enqueued: usize,
    /// Operations the queue refused (full or closed)
    pub failed: usize,
    /// Blank values and operations that could not be built
    pub rejected: usize,
    /// The event was skipped as a whole (oversized group or missing input)
    pub skipped: bool,
}

impl ProcessReport {
    const fn skipped(decision: GroupSyncDecision) -> Self {
        Self { decision, references: 0, enqueued: 0, failed: 0, rejected: 0, skipped: true }
    }
}

/// Values pulled from the watched attributes of a change.
#[derive(Debug)]
struct Extraction<'a> {
    values: Vec<&'a str>,
    skipped: bool,
}

impl Extraction<'_> {
    fn skipped() -> Self {
        Self { values: Vec::new(), skipped: true }
    }
}

/// Producer side of the pipeline.
///
/// Safe to call from several host threads at once; the queue is the only
/// shared state.
#[derive(Debug, Clone)]
pub struct GroupChangeProcessor {
    queue: Arc<OperationQueue>,
}

impl GroupChangeProcessor {
    pub fn new(queue: Arc<OperationQueue>) -> Self {
        Self { queue }
    }

    pub fn queue(&self) -> &Arc<OperationQueue> {
        &self.queue
    }

    /// Extract member references from `event` and enqueue one operation
    /// for each, per the configured strategy.
    ///
    /// Never fails: problems with single references are logged and counted
    /// in the report, and the decision always follows `abort_group_sync`.
    #[instrument(skip_all, fields(target_dn = %event.target_dn, kind = %event.kind()))]
    pub fn process(
        &self,
        event: &ChangeEvent,
        config: &DereferenceConfig,
        connection: Option<&ConnectionHandle>,
    ) -> ProcessReport {
        let decision = GroupSyncDecision::from_abort_flag(config.abort_group_sync);

        if config.strategy.requires_connection() && connection.is_none() {
            debug!(
                strategy = %config.strategy,
                "no connection attached to the change; this strategy needs one, \
                 attach the source connection to the change"
            );
            return ProcessReport::skipped(decision);
        }

        let extraction = extract_values(event, config);
        if extraction.skipped {
            return ProcessReport::skipped(decision);
        }

        let mut report = ProcessReport {
            decision,
            references: 0,
            enqueued: 0,
            failed: 0,
            rejected: 0,
            skipped: false,
        };

        for raw in extraction.values {
            let reference = match MemberReference::parse(raw) {
                Ok(reference) => reference,
                Err(err) => {
                    debug!(error = %err, "skipping blank member value");
                    report.rejected += 1;
                    continue;
                }
            };
            report.references += 1;

            let operation =
                match DereferenceOperation::for_strategy(config.strategy, reference, connection) {
                    Ok(operation) => operation,
                    Err(err) => {
                        warn!(error = %err, "could not build dereference operation");
                        report.rejected += 1;
                        continue;
                    }
                };

            let member = operation.reference().to_string();
            match self.queue.push(operation) {
                Ok(()) => {
                    report.enqueued += 1;
                    if config.verbose {
                        info!(member = %member, strategy = %config.strategy, "dereference queued");
                    } else {
                        debug!(member = %member, strategy = %config.strategy, "dereference queued");
                    }
                }
                Err(err) => {
                    report.failed += 1;
                    warn!(member = %member, error = %err, "dereference operation dropped");
                }
            }
        }

        debug!(
            references = report.references,
            enqueued = report.enqueued,
            failed = report.failed,
            rejected = report.rejected,
            "group change processed"
        );
        report
    }
}

/// Raw member values of `event` the configuration asks for, without
/// enqueuing anything.
pub fn extract_member_values<'a>(
    event: &'a ChangeEvent,
    config: &DereferenceConfig,
) -> Vec<&'a str> {
    extract_values(event, config).values
}

fn extract_values<'a>(event: &'a ChangeEvent, config: &DereferenceConfig) -> Extraction<'a> {
    match config.parse_mode {
        ParseMode::WholeGroup => extract_whole_group(event, config),
        ParseMode::ChangeOnly => extract_change(event, config),
    }
}

fn extract_whole_group<'a>(event: &'a ChangeEvent, config: &DereferenceConfig) -> Extraction<'a> {
    let Some(entry) = event.current_entry.as_ref() else {
        debug!("whole-group parsing needs the current group entry, none attached");
        return Extraction::skipped();
    };

    let values = watched_values(&entry.attributes, config);

    if let Some(max_group_size) = config.max_group_size {
        if values.len() >= max_group_size {
            info!(members = values.len(), max_group_size, "group too large, skipped");
            return Extraction::skipped();
        }
    }

    Extraction { values, skipped: false }
}

fn extract_change<'a>(event: &'a ChangeEvent, config: &DereferenceConfig) -> Extraction<'a> {
    let values = match &event.detail {
        ChangeDetail::Add { attributes } => watched_values(attributes, config),
        ChangeDetail::Delete { deleted_attributes } => watched_values(deleted_attributes, config),
        // Removed members are notified the same way as added ones.
        ChangeDetail::Modify { modifications } => modifications
            .iter()
            .filter(|modification| config.watches(&modification.attribute))
            .flat_map(|modification| modification.values.iter().map(String::as_str))
            .collect(),
        // Moving the group leaves its membership untouched.
        ChangeDetail::Rename { .. } => Vec::new(),
    };

    Extraction { values, skipped: false }
}

fn watched_values<'a>(attributes: &'a [Attribute], config: &DereferenceConfig) -> Vec<&'a str> {
    attributes
        .iter()
        .filter(|attribute| config.watches(&attribute.name))
        .flat_map(|attribute| attribute.values.iter().map(String::as_str))
        .collect()
}

#[cfg(test)]
mod tests {
    use groupderef_common::sync::WorkQueue;
    use groupderef_domain::{Entry, Modification, Strategy};

    use super::*;

    fn processor() -> GroupChangeProcessor {
        GroupChangeProcessor::new(Arc::new(WorkQueue::new("ops")))
    }

    #[test]
    fn add_enqueues_one_operation_per_member() {
        let processor = processor();
        let event = ChangeEvent::add(
            "cn=staff",
            vec![
                Attribute::new("cn", ["staff"]),
                Attribute::new("member", ["uid=a", "uid=b", "uid=c"]),
            ],
        );

        let report = processor.process(&event, &DereferenceConfig::default(), None);

        assert_eq!(report.enqueued, 3);
        assert_eq!(report.decision, GroupSyncDecision::Continue);
        let queued: Vec<String> = processor
            .queue()
            .pop_batch(10)
            .iter()
            .map(|op| op.reference().to_string())
            .collect();
        assert_eq!(queued, vec!["uid=a", "uid=b", "uid=c"]);
    }

    #[test]
    fn modify_of_unwatched_attributes_enqueues_nothing() {
        let processor = processor();
        let event = ChangeEvent::modify(
            "cn=staff",
            vec![Modification::replace("description", ["x"]), Modification::add("owner", ["uid=o"])],
        );

        let report = processor.process(&event, &DereferenceConfig::default(), None);

        assert_eq!(report.enqueued, 0);
        assert!(processor.queue().is_empty());
    }

    #[test]
    fn modify_dereferences_added_and_removed_members() {
        let event = ChangeEvent::modify(
            "cn=staff",
            vec![
                Modification::add("uniqueMember", ["uid=new"]),
                Modification::delete("member", ["uid=gone"]),
            ],
        );

        let values = extract_member_values(&event, &DereferenceConfig::default());
        assert_eq!(values, vec!["uid=new", "uid=gone"]);
    }

    #[test]
    fn delete_uses_attributes_of_deleted_group() {
        let event = ChangeEvent::delete("cn=old", vec![Attribute::new("member", ["uid=x", "uid=y"])]);
        let values = extract_member_values(&event, &DereferenceConfig::default());
        assert_eq!(values, vec!["uid=x", "uid=y"]);
    }

    #[test]
    fn rename_produces_nothing() {
        let event = ChangeEvent::rename("cn=staff", "cn=team")
            .with_current_entry(Entry::new("cn=staff").with_attribute(Attribute::new("member", ["uid=a"])));
        assert!(extract_member_values(&event, &DereferenceConfig::default()).is_empty());
    }

    #[test]
    fn whole_group_reads_current_entry() {
        let entry = Entry::new("cn=staff")
            .with_attribute(Attribute::new("member", ["uid=a", "uid=b"]))
            .with_attribute(Attribute::new("uniqueMember", ["uid=c"]));
        let event =
            ChangeEvent::modify("cn=staff", vec![Modification::replace("description", ["x"])])
                .with_current_entry(entry);
        let config = DereferenceConfig { parse_mode: ParseMode::WholeGroup, ..Default::default() };

        let report = processor().process(&event, &config, None);
        assert_eq!(report.enqueued, 3);
    }

    #[test]
    fn whole_group_skips_groups_at_max_size() {
        let entry = Entry::new("cn=big").with_attribute(Attribute::new("member", ["uid=a", "uid=b"]));
        let event = ChangeEvent::modify("cn=big", vec![]).with_current_entry(entry);
        let config = DereferenceConfig {
            parse_mode: ParseMode::WholeGroup,
            max_group_size: Some(2),
            ..Default::default()
        };

        let processor = processor();
        let report = processor.process(&event, &config, None);

        assert!(report.skipped);
        assert_eq!(report.enqueued, 0);
        assert_eq!(processor.queue().metrics().enqueue_attempts, 0);
    }

    #[test]
    fn whole_group_without_current_entry_is_skipped() {
        let event = ChangeEvent::modify("cn=staff", vec![Modification::add("member", ["uid=a"])]);
        let config = DereferenceConfig { parse_mode: ParseMode::WholeGroup, ..Default::default() };

        let report = processor().process(&event, &config, None);
        assert!(report.skipped);
    }

    #[test]
    fn touch_without_connection_enqueues_nothing_and_keeps_decision() {
        let event = ChangeEvent::add("cn=staff", vec![Attribute::new("member", ["uid=a"])]);

        for abort in [false, true] {
            let processor = processor();
            let config = DereferenceConfig {
                strategy: Strategy::TouchWrite,
                abort_group_sync: abort,
                ..Default::default()
            };

            let report = processor.process(&event, &config, None);

            assert_eq!(report.decision, GroupSyncDecision::from_abort_flag(abort));
            assert!(processor.queue().is_empty());
            assert_eq!(processor.queue().metrics().enqueue_attempts, 0);
        }
    }

    #[test]
    fn full_entry_without_connection_skips_whole_event() {
        let event = ChangeEvent::add("cn=staff", vec![Attribute::new("member", ["uid=a", "uid=b"])]);
        let config = DereferenceConfig { strategy: Strategy::EnqueueFullEntry, ..Default::default() };

        let processor = processor();
        let report = processor.process(&event, &config, None);

        assert!(report.skipped);
        assert_eq!(report.references, 0);
        assert_eq!(report.rejected, 0);
        assert_eq!(report.enqueued, 0);
        assert!(processor.queue().is_empty());
        assert_eq!(processor.queue().metrics().enqueue_attempts, 0);
    }

    #[test]
    fn blank_values_are_skipped_individually() {
        let event = ChangeEvent::add("cn=staff", vec![Attribute::new("member", ["uid=a", "  ", ""])]);

        let report = processor().process(&event, &DereferenceConfig::default(), None);

        assert_eq!(report.enqueued, 1);
        assert_eq!(report.rejected, 2);
    }

    #[test]
    fn full_queue_counts_failures() {
        let queue = Arc::new(
            WorkQueue::with_config(groupderef_common::sync::QueueConfig::bounded("ops", 1)).unwrap(),
        );
        let processor = GroupChangeProcessor::new(queue);
        let event = ChangeEvent::add("cn=staff", vec![Attribute::new("member", ["uid=a", "uid=b"])]);

        let report = processor.process(&event, &DereferenceConfig::default(), None);

        assert_eq!(report.enqueued, 1);
        assert_eq!(report.failed, 1);
        let metrics = processor.queue().metrics();
        assert_eq!(metrics.enqueue_attempts, 2);
        assert_eq!(metrics.enqueue_failures, 1);
    }

    #[test]
    fn attribute_options_and_case_are_ignored() {
        let event =
            ChangeEvent::add("cn=staff", vec![Attribute::new("MEMBER;range=0-1", ["uid=a"])]);
        assert_eq!(extract_member_values(&event, &DereferenceConfig::default()), vec!["uid=a"]);
    }
}
