//! Restoration Cost Model Engine
//!
//! Validation and reconciliation core for the restoration cost-model form.
//! A [`CostRecord`] describes what it costs to restore one ecosystem with one
//! method: per-method baselines, context cost drivers, a favorable and an
//! unfavorable scenario, and the assistance activities that bridge them.
//!
//! # Key Components
//!
//! - [`RecordSchema`]: Declares every structural and cross-field invariant
//! - [`validate`]: Evaluates all invariants into a field-shaped [`ValidationResult`]
//! - [`compute_derived`]: Totals, reconciliation and factor-share weighting
//! - [`reconcile_assistance_entries`]: Keeps assistance entries in step with the selection
//! - [`RecomputeSession`]: Drives sync, recompute and the persist/export gate
//! - [`RecordStore`]: Append-only saved-record list over a [`KeyValueStore`]
//!
//! # Flow
//!
//! ```text
//! form edit ──► RecomputeSession::apply
//!                 │
//!                 ├─ sync assistance entries (no-op when already matching)
//!                 ├─ signature unchanged? ──► keep cached outputs
//!                 └─ compute_derived + validate ──► Recomputed
//!                                                      │
//!                            ready_to_persist ─────────┴──► persist / export
//! ```
//!
//! # Example
//!
//! ```ignore
//! use restoration_model::{AssistanceActivity, EngineConfig, RecomputeSession};
//!
//! let mut session = RecomputeSession::new(EngineConfig::default());
//! session.set_assistance(AssistanceActivity::Fencing, true);
//! session.apply(|record| record.country = "Brazil".to_string());
//!
//! for violation in session.latest().validation.violations() {
//!     println!("{}: {}", violation.path, violation.reason);
//! }
//! ```

pub mod config;
pub mod derived;
pub mod export;
pub mod path;
pub mod schema;
pub mod session;
pub mod store;
pub mod sync;
pub mod types;
pub mod validation;

// Re-export main types
pub use config::EngineConfig;
pub use derived::{compute_derived, DerivedSummary, Reconciliation};
pub use export::{export_record, import_record, ExportDocument, ExportError};
pub use path::{FieldPath, PathSegment};
pub use schema::{RecordSchema, Rule, Severity, ViolationKind};
pub use session::{RecomputeSession, Recomputed, SessionError};
pub use store::{
    FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, RecordStore, SavedRecord, SavedRef,
    StoreError,
};
pub use sync::reconcile_assistance_entries;
pub use types::*;
pub use validation::{validate, validate_with, Check, ValidationNode, ValidationResult, Violation};
