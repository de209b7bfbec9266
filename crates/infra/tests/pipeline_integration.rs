//! Integration tests for the dereference pipeline
//!
//! Drives `DereferencePipeline` the way a host engine does: report group
//! changes, let the workers run, drain the record queues.

mod support;

use std::sync::Arc;
use std::time::Duration;

use groupderef_core::{ChangeSource, ConnectionHandle, GroupSyncDecision};
use groupderef_domain::{
    Attribute, ChangeEvent, DereferenceConfig, Entry, Modification, ParseMode, Strategy,
};
use groupderef_infra::DereferencePipeline;
use support::{group_added, wait_until, MockDirectory};

async fn wait_for_executed(pipeline: &DereferencePipeline, expected: u64) {
    while pipeline.worker_stats().await.executed() < expected {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Validates the DN strategy from group change to drained records.
///
/// # Test Steps
/// 1. Start a pipeline with two workers
/// 2. Report an added group with three members
/// 3. Drain the DN source once the workers are done
#[tokio::test]
async fn test_member_dns_reach_drain_adapter() -> anyhow::Result<()> {
    let config = DereferenceConfig { worker_count: 2, ..Default::default() };
    let pipeline = DereferencePipeline::new(config)?;
    pipeline.start().await?;

    let decision = pipeline.on_group_change(&group_added(&["uid=ann", "uid=bob", "uid=cy"]), None);
    assert_eq!(decision, GroupSyncDecision::Continue);

    let source = pipeline.member_dn_source();
    wait_until(|| source.pending() == 3).await;

    let mut dns: Vec<String> = source
        .poll_batch(5)
        .iter()
        .filter_map(|record| record.dn_property().map(ToString::to_string))
        .collect();
    dns.sort();
    assert_eq!(dns, vec!["uid=ann", "uid=bob", "uid=cy"]);
    assert!(source.poll_batch(5).is_empty());

    assert_eq!(pipeline.worker_stats().await.enqueued, 3);
    assert_eq!(pipeline.monitor().snapshot().max_queue_size, 3);

    pipeline.shutdown().await?;
    Ok(())
}

/// Validates that a failed fetch loses only its own member.
#[tokio::test]
async fn test_full_entry_fetch_failure_drops_one_member() -> anyhow::Result<()> {
    let directory = Arc::new(
        MockDirectory::new()
            .with_people(&["uid=ann", "uid=bob", "uid=cy"])
            .unreachable_for("uid=bob"),
    );
    let connection: ConnectionHandle = directory;

    let config = DereferenceConfig { strategy: Strategy::EnqueueFullEntry, ..Default::default() };
    let pipeline = DereferencePipeline::new(config)?;
    pipeline.start().await?;

    pipeline.on_group_change(&group_added(&["uid=ann", "uid=bob", "uid=cy"]), Some(&connection));
    wait_for_executed(&pipeline, 3).await;

    let stats = pipeline.worker_stats().await;
    assert_eq!(stats.enqueued, 2);
    assert_eq!(stats.dropped, 1);

    let source = pipeline.member_entry_source();
    let records = source.poll_batch(10);
    assert_eq!(records.len(), 2);
    for record in &records {
        let entry = source.fetch_entry(record).await?.expect("snapshot carried in the record");
        assert_eq!(entry.dn, record.target_dn);
        assert!(entry.attribute("cn").is_some());
    }

    // Nothing reached the DN queue
    assert_eq!(pipeline.member_dn_source().pending(), 0);

    pipeline.shutdown().await?;
    Ok(())
}

/// Validates touch writes and the abort decision.
#[tokio::test]
async fn test_touch_writes_each_member_and_aborts_group_sync() -> anyhow::Result<()> {
    let directory = Arc::new(MockDirectory::new().with_people(&["uid=ann", "uid=bob"]));
    let connection: ConnectionHandle = directory.clone();

    let config = DereferenceConfig {
        strategy: Strategy::TouchWrite,
        abort_group_sync: true,
        ..Default::default()
    };
    let pipeline = DereferencePipeline::new(config)?;
    pipeline.start().await?;

    let change = ChangeEvent::modify(
        "cn=engineering,ou=groups,dc=example,dc=com",
        vec![Modification::add("member", ["uid=ann"]), Modification::delete("member", ["uid=bob"])],
    );
    let decision = pipeline.on_group_change(&change, Some(&connection));
    assert_eq!(decision, GroupSyncDecision::Abort);

    wait_until(|| directory.modified_dns().len() == 2).await;
    let mut touched = directory.modified_dns();
    touched.sort();
    assert_eq!(touched, vec!["uid=ann", "uid=bob"]);

    assert_eq!(pipeline.worker_stats().await.touched, 2);
    assert_eq!(pipeline.member_dn_source().pending(), 0);
    assert_eq!(pipeline.member_entry_source().pending(), 0);

    pipeline.shutdown().await?;
    Ok(())
}

/// Validates that touch without a connection produces nothing.
#[tokio::test]
async fn test_touch_without_connection_enqueues_nothing() -> anyhow::Result<()> {
    let config = DereferenceConfig { strategy: Strategy::TouchWrite, ..Default::default() };
    let pipeline = DereferencePipeline::new(config)?;

    let decision = pipeline.on_group_change(&group_added(&["uid=ann"]), None);

    assert_eq!(decision, GroupSyncDecision::Continue);
    let snapshot = pipeline.monitor().snapshot();
    assert_eq!(snapshot.current_queue_size, 0);
    assert_eq!(snapshot.queue_add_attempts, 0);
    Ok(())
}

/// Validates that full-entry fetches without a connection produce nothing.
#[tokio::test]
async fn test_full_entry_without_connection_enqueues_nothing() -> anyhow::Result<()> {
    let config = DereferenceConfig { strategy: Strategy::EnqueueFullEntry, ..Default::default() };
    let pipeline = DereferencePipeline::new(config)?;

    let decision = pipeline.on_group_change(&group_added(&["uid=ann", "uid=bob"]), None);

    assert_eq!(decision, GroupSyncDecision::Continue);
    let snapshot = pipeline.monitor().snapshot();
    assert_eq!(snapshot.current_queue_size, 0);
    assert_eq!(snapshot.queue_add_attempts, 0);
    Ok(())
}

/// Validates that oversized groups are skipped in whole-group mode.
#[tokio::test]
async fn test_whole_group_limit_skips_large_groups() -> anyhow::Result<()> {
    let config = DereferenceConfig {
        parse_mode: ParseMode::WholeGroup,
        max_group_size: Some(3),
        ..Default::default()
    };
    let pipeline = DereferencePipeline::new(config)?;

    let group = |members: &[&str]| {
        Entry::new("cn=engineering,ou=groups,dc=example,dc=com")
            .with_attribute(Attribute::new("member", members.iter().copied()))
    };
    let touch_description = || {
        ChangeEvent::modify(
            "cn=engineering,ou=groups,dc=example,dc=com",
            vec![Modification::replace("description", ["updated"])],
        )
    };

    pipeline.on_group_change(
        &touch_description().with_current_entry(group(&["uid=a", "uid=b", "uid=c"])),
        None,
    );
    assert_eq!(pipeline.monitor().snapshot().current_queue_size, 0);

    pipeline.on_group_change(&touch_description().with_current_entry(group(&["uid=a", "uid=b"])), None);
    assert_eq!(pipeline.monitor().snapshot().current_queue_size, 2);
    Ok(())
}

/// Validates that resizing keeps draining the same queue.
#[tokio::test]
async fn test_resize_while_running() -> anyhow::Result<()> {
    let pipeline = DereferencePipeline::new(DereferenceConfig::default())?;
    pipeline.start().await?;

    pipeline.on_group_change(&group_added(&["uid=a", "uid=b"]), None);
    wait_for_executed(&pipeline, 2).await;

    let resized = DereferenceConfig { worker_count: 4, ..Default::default() };
    pipeline.apply_config(resized).await?;
    assert!(pipeline.is_running().await);
    assert_eq!(pipeline.config().worker_count, 4);

    pipeline.on_group_change(&group_added(&["uid=c", "uid=d", "uid=e"]), None);
    wait_for_executed(&pipeline, 5).await;
    assert_eq!(pipeline.member_dn_source().pending(), 5);

    pipeline.shutdown().await?;
    Ok(())
}

/// Validates the aggregate rate ceiling on tokio's paused clock.
#[tokio::test(start_paused = true)]
async fn test_rate_ceiling_spans_all_workers() -> anyhow::Result<()> {
    let config = DereferenceConfig {
        worker_count: 4,
        max_rate_per_second: Some(5),
        ..Default::default()
    };
    let pipeline = DereferencePipeline::new(config)?;

    let members: Vec<String> = (0..15).map(|i| format!("uid=user{i}")).collect();
    let members: Vec<&str> = members.iter().map(String::as_str).collect();
    pipeline.on_group_change(&group_added(&members), None);

    let started = tokio::time::Instant::now();
    pipeline.start().await?;
    wait_for_executed(&pipeline, 15).await;
    let elapsed = started.elapsed();

    // Five at once, then five per second
    assert!(elapsed >= Duration::from_secs(2), "finished too fast: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(3), "finished too slow: {elapsed:?}");

    pipeline.shutdown().await?;
    Ok(())
}

/// Validates re-reading members through the external directory.
#[tokio::test]
async fn test_dn_source_reads_external_directory() -> anyhow::Result<()> {
    let external: ConnectionHandle = Arc::new(MockDirectory::new().with_people(&["uid=ann"]));
    let pipeline =
        DereferencePipeline::new(DereferenceConfig::default())?.with_external_directory(external);
    pipeline.start().await?;

    pipeline.on_group_change(&group_added(&["uid=ann", "uid=gone"]), None);
    let source = pipeline.member_dn_source();
    wait_until(|| source.pending() == 2).await;

    let mut found = Vec::new();
    for record in source.poll_batch(2) {
        found.push(source.fetch_entry(&record).await?.map(|entry| entry.dn));
    }
    found.sort();
    assert_eq!(found, vec![None, Some("uid=ann".to_string())]);

    pipeline.shutdown().await?;
    Ok(())
}

/// Validates that shutdown keeps produced records drainable.
#[tokio::test]
async fn test_shutdown_closes_operation_queue_only() -> anyhow::Result<()> {
    let pipeline = DereferencePipeline::new(DereferenceConfig::default())?;
    pipeline.start().await?;

    pipeline.on_group_change(&group_added(&["uid=a"]), None);
    wait_for_executed(&pipeline, 1).await;
    pipeline.shutdown().await?;

    // Changes after shutdown are refused by the closed queue and counted
    pipeline.on_group_change(&group_added(&["uid=b"]), None);
    let snapshot = pipeline.monitor().snapshot();
    assert_eq!(snapshot.queue_add_attempts, 2);
    assert_eq!(snapshot.queue_add_failures, 1);

    assert_eq!(pipeline.member_dn_source().poll_batch(10).len(), 1);
    Ok(())
}
