use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::platform::{OperationKind, WriteOutcome};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub applied: usize,
    pub already_existed: usize,
    pub skipped: usize,
    pub planned: usize,
}

impl OutcomeCounts {
    fn add(&mut self, other: &OutcomeCounts) {
        self.applied += other.applied;
        self.already_existed += other.already_existed;
        self.skipped += other.skipped;
        self.planned += other.planned;
    }

    pub fn total(&self) -> usize {
        self.applied + self.already_existed + self.skipped + self.planned
    }
}

/// Per-kind outcome counts of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub writes: BTreeMap<OperationKind, OutcomeCounts>,
    /// Association entries that could not become rules.
    pub rejected_rules: usize,
    /// Tags that should have been removed but carried no id.
    pub unremovable_tags: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SyncReport {
    pub fn started() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn elapsed(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }

    pub fn record(&mut self, kind: OperationKind, outcome: &WriteOutcome) {
        let counts = self.writes.entry(kind).or_default();
        match outcome {
            WriteOutcome::Applied => counts.applied += 1,
            WriteOutcome::AlreadyExists => counts.already_existed += 1,
            WriteOutcome::Skipped { .. } => counts.skipped += 1,
            WriteOutcome::Planned => counts.planned += 1,
        }
    }

    pub fn count(&self, kind: OperationKind) -> OutcomeCounts {
        self.writes.get(&kind).copied().unwrap_or_default()
    }

    pub fn totals(&self) -> OutcomeCounts {
        let mut totals = OutcomeCounts::default();
        for counts in self.writes.values() {
            totals.add(counts);
        }
        totals
    }

    pub fn log_summary(&self) {
        for (kind, counts) in &self.writes {
            log::info!(
                "{:<20} applied={} existing={} skipped={} planned={}",
                kind.to_string(),
                counts.applied,
                counts.already_existed,
                counts.skipped,
                counts.planned
            );
        }
        let totals = self.totals();
        log::info!(
            "Sync finished: {} writes ({} applied, {} already existed, {} skipped, {} planned)",
            totals.total(),
            totals.applied,
            totals.already_existed,
            totals.skipped,
            totals.planned
        );
        if let Some(elapsed) = self.elapsed() {
            log::info!("Elapsed: {}s", elapsed.num_seconds());
        }
        if self.rejected_rules > 0 {
            log::warn!("{} association entries were invalid and skipped", self.rejected_rules);
        }
        if self.unremovable_tags > 0 {
            log::warn!("{} stale tags could not be removed (no id)", self.unremovable_tags);
        }
    }
}
