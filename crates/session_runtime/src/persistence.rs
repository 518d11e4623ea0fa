//! Snapshot shapes used to save tab instances at shutdown and read them back at startup.
//!
//! The runtime performs no I/O. Hosts serialize a [`SessionSnapshot`] wherever they like and feed
//! its items back through a `tabsRestored` event.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use session_contract::{NavigationEntry, SessionAction, TabData, TabId, WebContentsId, WindowId};
use thiserror::Error;

use crate::model::{TabInstance, TabInstances};

/// Current [`SessionSnapshot`] schema version.
pub const TABS_SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Snapshot fields interpreted by the runtime. Everything else passes through untouched.
const RESERVED_FIELDS: [&str; 6] = [
    "id",
    "history",
    "currentIndex",
    "webContentsId",
    "data",
    "sleepy",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Data-quality problems with a single persisted tab record.
pub enum SnapshotItemError {
    /// The record is not a JSON object.
    #[error("snapshot item is not an object")]
    NotAnObject,
    /// The record has no usable `id`.
    #[error("snapshot item has no id")]
    MissingId,
    /// The record's history is missing or empty.
    #[error("snapshot item `{id}` has no history")]
    EmptyHistory {
        /// Record id.
        id: String,
    },
    /// A known field has the wrong shape.
    #[error("snapshot item `{id}` has a malformed `{field}`: {message}")]
    Malformed {
        /// Record id.
        id: String,
        /// Offending field.
        field: &'static str,
        /// Decoder message.
        message: String,
    },
    /// `currentIndex` does not point into the history.
    #[error("snapshot item `{id}` points at entry {index} of a {len}-entry history")]
    IndexOutOfRange {
        /// Record id.
        id: String,
        /// Persisted index.
        index: u64,
        /// History length.
        len: usize,
    },
}

#[derive(Debug, Error)]
/// Failures encoding or decoding a whole snapshot.
pub enum SnapshotError {
    /// JSON encode or decode failure.
    #[error("snapshot json error: {0}")]
    Json(#[from] serde_json::Error),
    /// The snapshot was written by a newer runtime.
    #[error("unsupported snapshot schema version {0}")]
    UnsupportedSchema(u32),
}

/// One saved tab: a tab instance without its fetched data or wake state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSnapshotItem {
    pub id: TabId,
    pub history: Vec<NavigationEntry>,
    pub current_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_contents_id: Option<WebContentsId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Versioned list of saved tabs for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub schema_version: u32,
    /// Raw records in save order, kept raw so a damaged record only loses itself.
    pub items: Vec<Value>,
}

impl SessionSnapshot {
    /// Captures every live tab of a window. Placeholders have no history and are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Json`] if a record cannot be encoded.
    pub fn capture(tabs: &TabInstances) -> Result<Self, SnapshotError> {
        let items = save_items(tabs)
            .into_iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            schema_version: TABS_SNAPSHOT_SCHEMA_VERSION,
            items,
        })
    }

    /// Encodes the snapshot as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Json`] on encode failure.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decodes a snapshot, migrating older layouts.
    ///
    /// A bare JSON array is the unversioned layout (schema 0) and is wrapped as-is.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Json`] on malformed JSON and [`SnapshotError::UnsupportedSchema`]
    /// for snapshots newer than [`TABS_SNAPSHOT_SCHEMA_VERSION`].
    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let value: Value = serde_json::from_str(raw)?;
        if let Value::Array(items) = value {
            return Ok(Self {
                schema_version: TABS_SNAPSHOT_SCHEMA_VERSION,
                items,
            });
        }
        let snapshot: Self = serde_json::from_value(value)?;
        if snapshot.schema_version > TABS_SNAPSHOT_SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedSchema(snapshot.schema_version));
        }
        Ok(snapshot)
    }

    /// Event that restores this snapshot into `window`.
    pub fn into_restore_action(self, window: WindowId) -> SessionAction {
        SessionAction::TabsRestored {
            window,
            items: self.items,
        }
    }
}

/// Saved form of every live tab in tab id order.
pub fn save_items(tabs: &TabInstances) -> Vec<TabSnapshotItem> {
    tabs.instances()
        .map(|(id, instance)| TabSnapshotItem {
            id: id.clone(),
            history: instance.history.clone(),
            current_index: instance.current_index,
            web_contents_id: instance.web_contents_id,
            extra: instance.extra.clone(),
        })
        .collect()
}

/// Rebuilds a tab instance from one persisted record.
///
/// The instance always comes back sleepy with empty data; unknown fields are carried over.
///
/// # Errors
///
/// Returns a [`SnapshotItemError`] describing why the record cannot be restored.
pub fn restore_item(item: &Value) -> Result<(TabId, TabInstance), SnapshotItemError> {
    let Value::Object(fields) = item else {
        return Err(SnapshotItemError::NotAnObject);
    };

    let id = match fields.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        _ => return Err(SnapshotItemError::MissingId),
    };

    let history: Vec<NavigationEntry> = match fields.get("history") {
        None | Some(Value::Null) => Vec::new(),
        Some(raw) => serde_json::from_value(raw.clone()).map_err(|err| {
            SnapshotItemError::Malformed {
                id: id.clone(),
                field: "history",
                message: err.to_string(),
            }
        })?,
    };
    if history.is_empty() {
        return Err(SnapshotItemError::EmptyHistory { id });
    }

    let index = fields
        .get("currentIndex")
        .and_then(Value::as_u64)
        .ok_or_else(|| SnapshotItemError::Malformed {
            id: id.clone(),
            field: "currentIndex",
            message: "expected a non-negative integer".to_string(),
        })?;
    let current_index = usize::try_from(index)
        .ok()
        .filter(|index| *index < history.len())
        .ok_or(SnapshotItemError::IndexOutOfRange {
            id: id.clone(),
            index,
            len: history.len(),
        })?;

    let web_contents_id = match fields.get("webContentsId") {
        None | Some(Value::Null) => None,
        Some(raw) => Some(serde_json::from_value(raw.clone()).map_err(|err| {
            SnapshotItemError::Malformed {
                id: id.clone(),
                field: "webContentsId",
                message: err.to_string(),
            }
        })?),
    };

    let extra = fields
        .iter()
        .filter(|(key, _)| !RESERVED_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let instance = TabInstance {
        history,
        current_index,
        sleepy: true,
        data: TabData::new(),
        web_contents_id,
        extra,
    };
    Ok((TabId::new(id), instance))
}
