//! Restoration Model WASM - Browser Bridge
//!
//! Exposes the cost-model engine to the form running in the browser. Every
//! value crosses the boundary as JSON text in the record's wire format
//! (camelCase fields, snake_case identifiers).
//!
//! ## Usage in JavaScript
//!
//! ```javascript
//! import init, { CostModelSession, load_saved } from 'restoration-model-wasm';
//!
//! await init();
//!
//! const session = new CostModelSession();
//! const outputs = JSON.parse(session.replace(JSON.stringify(formSnapshot)));
//! render(outputs.derived, outputs.validation);
//!
//! if (session.ready_to_persist) {
//!     const key = session.store_key;
//!     const saved = JSON.parse(session.save_into(localStorage.getItem(key)));
//!     localStorage.setItem(key, saved.stored);
//! }
//! ```
//!
//! ## Build
//!
//! ```bash
//! wasm-pack build --target web --out-dir pkg
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use restoration_model::{
    AssistanceActivity, AssistanceCostEntry, CostRecord, EngineConfig, MemoryKeyValueStore,
    RecomputeSession, RecordStore, SavedRef,
};

// Initialize panic hook for better error messages in browser console
#[cfg(feature = "console_error_panic_hook")]
#[wasm_bindgen]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

// ============================================================================
// Stateless functions
// ============================================================================

/// Validate a record snapshot; returns the validation tree as JSON.
#[wasm_bindgen]
pub fn validate_record(record_json: &str) -> Result<String, JsValue> {
    validate_json(record_json).map_err(to_js)
}

/// Compute derived fields for a record snapshot; returns the summary as JSON.
#[wasm_bindgen]
pub fn compute_derived(record_json: &str) -> Result<String, JsValue> {
    derived_json(record_json).map_err(to_js)
}

/// Bring assistance entries in line with the selected identifiers.
///
/// Returns `undefined` when the entries already match, so the caller can
/// skip writing them back.
#[wasm_bindgen]
pub fn reconcile_assistance_entries(
    selected_json: &str,
    entries_json: &str,
) -> Result<Option<String>, JsValue> {
    reconcile_json(selected_json, entries_json).map_err(to_js)
}

/// Download filename for a record at `now_millis` (epoch milliseconds).
#[wasm_bindgen]
pub fn export_filename(record_json: &str, now_millis: f64) -> Result<String, JsValue> {
    let record = parse_record(record_json).map_err(to_js)?;
    let at = timestamp_from_millis(now_millis).map_err(to_js)?;
    Ok(restoration_model::export::export_filename(&record, at))
}

/// Saved records from raw stored text, oldest first. Unreadable text
/// yields an empty list.
#[wasm_bindgen]
pub fn load_saved(stored: Option<String>) -> String {
    load_saved_json(stored, &EngineConfig::default())
}

// ============================================================================
// Session
// ============================================================================

/// Outcome of a save: the new snapshot's reference plus the full stored
/// text to write back under the store key.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveOutcome {
    #[serde(flatten)]
    saved: SavedRef,
    stored: String,
}

#[derive(Debug, Serialize)]
struct ExportPayload {
    filename: String,
    json: String,
}

/// Live editing session for one record.
#[wasm_bindgen]
pub struct CostModelSession {
    inner: RecomputeSession,
}

#[wasm_bindgen]
impl CostModelSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> CostModelSession {
        CostModelSession {
            inner: RecomputeSession::new(EngineConfig::default()),
        }
    }

    /// Session using an engine config given as YAML.
    pub fn with_config(config_yaml: &str) -> Result<CostModelSession, JsValue> {
        let config = EngineConfig::from_yaml(config_yaml).map_err(to_js)?;
        Ok(CostModelSession {
            inner: RecomputeSession::new(config),
        })
    }

    /// Replace the live record with a form snapshot; returns the outputs.
    pub fn replace(&mut self, record_json: &str) -> Result<String, JsValue> {
        self.replace_json(record_json).map_err(to_js)
    }

    /// Toggle one assistance activity; returns the outputs.
    pub fn set_assistance(&mut self, activity: &str, selected: bool) -> Result<String, JsValue> {
        self.set_assistance_json(activity, selected).map_err(to_js)
    }

    /// Current record, including synchronized assistance entries.
    pub fn record(&self) -> Result<String, JsValue> {
        to_json(self.inner.record()).map_err(to_js)
    }

    /// Latest derived summary and validation tree.
    pub fn outputs(&self) -> Result<String, JsValue> {
        to_json(self.inner.latest()).map_err(to_js)
    }

    #[wasm_bindgen(getter)]
    pub fn ready_to_persist(&self) -> bool {
        self.inner.ready_to_persist()
    }

    /// Key the saved-record list lives under.
    #[wasm_bindgen(getter)]
    pub fn store_key(&self) -> String {
        self.inner.config().store.key.clone()
    }

    /// Append a snapshot to the stored list text; returns `{id, timestamp, stored}`.
    pub fn save_into(&self, stored: Option<String>) -> Result<String, JsValue> {
        self.save_into_json(stored).map_err(to_js)
    }

    /// Export document `{filename, json}` stamped at `now_millis`.
    pub fn export(&self, now_millis: f64) -> Result<String, JsValue> {
        self.export_json(now_millis).map_err(to_js)
    }
}

impl Default for CostModelSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CostModelSession {
    fn replace_json(&mut self, record_json: &str) -> Result<String, String> {
        let record = parse_record(record_json)?;
        to_json(self.inner.replace(record))
    }

    fn set_assistance_json(&mut self, activity: &str, selected: bool) -> Result<String, String> {
        let activity = parse_activity(activity)?;
        to_json(self.inner.set_assistance(activity, selected))
    }

    fn save_into_json(&self, stored: Option<String>) -> Result<String, String> {
        let config = self.inner.config();
        let mut store = RecordStore::with_config(seeded_backend(stored, config), &config.store);
        let saved = self.inner.persist(&mut store).map_err(|e| e.to_string())?;
        let stored = store
            .backend()
            .raw(&config.store.key)
            .unwrap_or_default()
            .to_string();
        to_json(&SaveOutcome { saved, stored })
    }

    fn export_json(&self, now_millis: f64) -> Result<String, String> {
        let at = timestamp_from_millis(now_millis)?;
        let doc = self.inner.export_at(at).map_err(|e| e.to_string())?;
        to_json(&ExportPayload {
            filename: doc.filename,
            json: doc.json,
        })
    }
}

// ============================================================================
// JSON plumbing
// ============================================================================

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

fn parse_record(record_json: &str) -> Result<CostRecord, String> {
    restoration_model::import_record(record_json).map_err(|e| e.to_string())
}

fn parse_activity(id: &str) -> Result<AssistanceActivity, String> {
    serde_json::from_value(serde_json::Value::String(id.to_string()))
        .map_err(|_| format!("Unknown assistance activity: {}", id))
}

fn timestamp_from_millis(now_millis: f64) -> Result<DateTime<Utc>, String> {
    if !now_millis.is_finite() {
        return Err(format!("Invalid timestamp: {}", now_millis));
    }
    Utc.timestamp_millis_opt(now_millis as i64)
        .single()
        .ok_or_else(|| format!("Invalid timestamp: {}", now_millis))
}

fn seeded_backend(stored: Option<String>, config: &EngineConfig) -> MemoryKeyValueStore {
    match stored {
        Some(text) => MemoryKeyValueStore::new().with_entry(config.store.key.clone(), text),
        None => MemoryKeyValueStore::new(),
    }
}

fn validate_json(record_json: &str) -> Result<String, String> {
    let record = parse_record(record_json)?;
    to_json(&restoration_model::validate(&record))
}

fn derived_json(record_json: &str) -> Result<String, String> {
    let record = parse_record(record_json)?;
    to_json(&restoration_model::compute_derived(
        &record,
        &EngineConfig::default(),
    ))
}

fn reconcile_json(selected_json: &str, entries_json: &str) -> Result<Option<String>, String> {
    let selected: Vec<AssistanceActivity> =
        serde_json::from_str(selected_json).map_err(|e| e.to_string())?;
    let entries: Vec<AssistanceCostEntry> =
        serde_json::from_str(entries_json).map_err(|e| e.to_string())?;

    match restoration_model::reconcile_assistance_entries(&selected, &entries) {
        std::borrow::Cow::Borrowed(_) => Ok(None),
        std::borrow::Cow::Owned(next) => to_json(&next).map(Some),
    }
}

fn load_saved_json(stored: Option<String>, config: &EngineConfig) -> String {
    let store = RecordStore::with_config(seeded_backend(stored, config), &config.store);
    to_json(&store.load_all()).unwrap_or_else(|_| "[]".to_string())
}

// ============================================================================
// Tests
// ============================================================================


// ============================================================================
// WASM-specific Tests
// ============================================================================
