//! Recompute driver.
//!
//! A [`RecomputeSession`] owns the live record of one editing session. Every
//! accepted mutation goes through [`RecomputeSession::apply`] or
//! [`RecomputeSession::replace`], which settle the record in a single pass:
//!
//! 1. synchronize assistance entries with the selection (at most one write),
//! 2. compute the record signature and stop if it matches the cached one,
//! 3. recompute derived fields and re-validate.
//!
//! The sync is idempotent, so the pass never feeds back into itself.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::borrow::Cow;

use crate::config::EngineConfig;
use crate::derived::{compute_derived, DerivedSummary};
use crate::export::{export_record, ExportDocument, ExportError};
use crate::store::{KeyValueStore, RecordStore, SavedRecord, SavedRef, StoreError};
use crate::sync::reconcile_assistance_entries;
use crate::types::{AssistanceActivity, CostRecord};
use crate::validation::{validate_with, ValidationResult};

/// Error types for gated session actions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Persist/export gate is closed
    #[error("Record not ready: {errors} blocking violation(s), method tabs complete: {tabs_complete}")]
    NotReady { errors: usize, tabs_complete: bool },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Outputs of the latest recompute.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recomputed {
    /// SHA-256 of the record snapshot these outputs were computed from
    pub signature: String,
    pub derived: DerivedSummary,
    pub validation: ValidationResult,
    pub ready_to_persist: bool,
}

/// SHA-256 hex digest of the record's JSON form.
pub fn record_signature(record: &CostRecord) -> String {
    let json = serde_json::to_vec(record).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&json);
    hex::encode(hasher.finalize())
}

/// Editing session over one live record.
pub struct RecomputeSession {
    record: CostRecord,
    config: EngineConfig,
    latest: Recomputed,
    recompute_count: u64,
    skipped_count: u64,
}

impl RecomputeSession {
    /// Start a session on an empty record.
    pub fn new(config: EngineConfig) -> Self {
        let record = CostRecord::with_time_horizon(config.time_horizon.default_years);
        Self::from_record(record, config)
    }

    /// Start a session on an existing record.
    pub fn from_record(record: CostRecord, config: EngineConfig) -> Self {
        let mut record = record;
        sync_entries(&mut record);
        let latest = recompute(&record, &config);
        Self {
            record,
            config,
            latest,
            recompute_count: 1,
            skipped_count: 0,
        }
    }

    /// Start a session editing a copy of a saved snapshot.
    pub fn from_saved(saved: &SavedRecord, config: EngineConfig) -> Self {
        tracing::debug!(record_id = %saved.id, "Editing saved record");
        Self::from_record(saved.record.clone(), config)
    }

    pub fn record(&self) -> &CostRecord {
        &self.record
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Outputs for the current record.
    pub fn latest(&self) -> &Recomputed {
        &self.latest
    }

    pub fn ready_to_persist(&self) -> bool {
        self.latest.ready_to_persist
    }

    /// Number of full recomputes and of skipped (unchanged) settles.
    pub fn stats(&self) -> (u64, u64) {
        (self.recompute_count, self.skipped_count)
    }

    /// Apply a field edit and settle.
    pub fn apply<F>(&mut self, edit: F) -> &Recomputed
    where
        F: FnOnce(&mut CostRecord),
    {
        edit(&mut self.record);
        self.settle()
    }

    /// Replace the live record with a full snapshot from the form and settle.
    pub fn replace(&mut self, snapshot: CostRecord) -> &Recomputed {
        self.record = snapshot;
        self.settle()
    }

    /// Select or deselect an assistance activity.
    pub fn set_assistance(&mut self, activity: AssistanceActivity, selected: bool) -> &Recomputed {
        self.apply(|record| {
            let list = &mut record.selected_assistances;
            if selected {
                if !list.contains(&activity) {
                    list.push(activity);
                }
            } else {
                list.retain(|a| *a != activity);
            }
        })
    }

    fn settle(&mut self) -> &Recomputed {
        sync_entries(&mut self.record);
        debug_assert!(matches!(
            reconcile_assistance_entries(
                &self.record.selected_assistances,
                &self.record.assistance_costs
            ),
            Cow::Borrowed(_)
        ));

        let signature = record_signature(&self.record);
        if signature == self.latest.signature {
            self.skipped_count += 1;
            tracing::trace!("Record unchanged, skipping recompute");
            return &self.latest;
        }

        self.latest = recompute(&self.record, &self.config);
        self.recompute_count += 1;
        &self.latest
    }

    /// Save a snapshot of the live record. Refused while the gate is closed.
    pub fn persist<S: KeyValueStore>(
        &self,
        store: &mut RecordStore<S>,
    ) -> Result<SavedRef, SessionError> {
        self.ensure_ready()?;
        Ok(store.save(&self.record)?)
    }

    /// Export the live record, stamped now. Refused while the gate is closed.
    pub fn export(&self) -> Result<ExportDocument, SessionError> {
        self.export_at(Utc::now())
    }

    pub fn export_at(&self, at: DateTime<Utc>) -> Result<ExportDocument, SessionError> {
        self.ensure_ready()?;
        Ok(export_record(&self.record, at)?)
    }

    fn ensure_ready(&self) -> Result<(), SessionError> {
        if self.latest.ready_to_persist {
            return Ok(());
        }
        let errors = self.latest.validation.error_count;
        let tabs_complete = self.latest.derived.method_tabs_complete;
        tracing::warn!(errors, tabs_complete, "Persist/export refused");
        Err(SessionError::NotReady {
            errors,
            tabs_complete,
        })
    }
}

fn sync_entries(record: &mut CostRecord) {
    let synced = match reconcile_assistance_entries(
        &record.selected_assistances,
        &record.assistance_costs,
    ) {
        Cow::Owned(next) => Some(next),
        Cow::Borrowed(_) => None,
    };
    if let Some(next) = synced {
        record.assistance_costs = next;
    }
}

fn recompute(record: &CostRecord, config: &EngineConfig) -> Recomputed {
    let signature = record_signature(record);
    let derived = compute_derived(record, config);
    let validation = validate_with(record, config);
    let ready_to_persist = derived.method_tabs_complete && validation.is_valid();

    tracing::debug!(
        signature = %&signature[..12],
        errors = validation.error_count,
        warnings = validation.warning_count,
        ready_to_persist,
        "Recomputed record outputs"
    );

    Recomputed {
        signature,
        derived,
        validation,
        ready_to_persist,
    }
}
