//! Shared session contracts used by the session runtime, its hosts, and replay tooling.
//!
//! This crate is intentionally runtime-agnostic. It defines the identifiers, navigation entries,
//! tab data buckets, and the closed set of session events without depending on reducer internals
//! or any delivery mechanism.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Opaque top-level window identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(String);

impl WindowId {
    /// Creates a window identifier from trusted caller input.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque tab identifier, unique within its owning window.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(String);

impl TabId {
    /// Creates a tab identifier from trusted caller input.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the rendering surface attached to a tab by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebContentsId(pub i64);

/// One visited location in a tab's navigation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEntry {
    /// Location shown for this entry.
    pub url: String,
    /// Logical resource path backing the location, such as `games/12`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl NavigationEntry {
    /// Creates an entry without a resource.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            resource: None,
        }
    }

    /// Creates an entry with an optional resource.
    pub fn with_resource(url: impl Into<String>, resource: Option<String>) -> Self {
        Self {
            url: url.into(),
            resource,
        }
    }
}

/// Fetched tab content, keyed by bucket name (`games`, `web`, `label`, ...).
///
/// Bucket values are arbitrary JSON. Which buckets merge one level deeper is decided by the
/// runtime configuration, not by this type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabData(Map<String, Value>);

impl TabData {
    /// Creates an empty data set.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Returns a bucket by name.
    pub fn get(&self, bucket: &str) -> Option<&Value> {
        self.0.get(bucket)
    }

    /// Inserts or replaces a bucket, returning the previous value.
    pub fn insert(&mut self, bucket: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(bucket.into(), value)
    }

    /// Builder-style [`TabData::insert`].
    pub fn with(mut self, bucket: impl Into<String>, value: Value) -> Self {
        self.insert(bucket, value);
        self
    }

    /// Whether a bucket is present.
    pub fn contains(&self, bucket: &str) -> bool {
        self.0.contains_key(bucket)
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no bucket is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates buckets in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Borrows the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the data set into its JSON object.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for TabData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Closed set of events applied to the windows state.
///
/// Wire names follow the host event names (`openTab`, `tabDataFetched`, ...) with the event name
/// stored under `type` next to the payload fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SessionAction {
    /// A top-level window was created and should start with a bootstrap tab.
    WindowOpened {
        /// New window.
        window: WindowId,
        /// Location of the bootstrap tab.
        #[serde(rename = "initialURL")]
        initial_url: String,
    },
    /// A top-level window was destroyed along with all of its tabs.
    WindowClosed {
        /// Destroyed window.
        window: WindowId,
    },
    /// Open a new sleepy tab.
    OpenTab {
        /// Owning window.
        window: WindowId,
        /// New tab; an empty id is ignored.
        tab: TabId,
        /// Initial location.
        url: String,
        /// Initial resource.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resource: Option<String>,
        /// Initial data, copied into the new instance.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<TabData>,
    },
    /// Close a tab.
    CloseTab {
        /// Owning window.
        window: WindowId,
        /// Tab to close.
        tab: TabId,
    },
    /// Focus a tab, waking it if it is sleepy.
    FocusTab {
        /// Owning window.
        window: WindowId,
        /// Tab to focus.
        tab: TabId,
    },
    /// The host attached a rendering surface to a tab.
    TabGotWebContents {
        /// Owning window.
        window: WindowId,
        /// Tab receiving the surface.
        tab: TabId,
        /// Attached surface.
        web_contents_id: WebContentsId,
    },
    /// Fetched data arrived for a tab.
    TabDataFetched {
        /// Owning window.
        window: WindowId,
        /// Tab the data belongs to.
        tab: TabId,
        /// Partial data to merge.
        data: TabData,
        /// Replace whole buckets instead of merging deep buckets key by key.
        #[serde(default, deserialize_with = "null_as_false")]
        shallow: bool,
    },
    /// Navigate a tab, pushing or replacing a history entry.
    EvolveTab {
        /// Owning window.
        window: WindowId,
        /// Tab to navigate.
        tab: TabId,
        /// New location; keeps the current one when omitted.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        /// New resource; inherits the current one when omitted.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resource: Option<String>,
        /// Data to merge after navigating.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<TabData>,
        /// Overwrite the current entry instead of pushing a new one.
        #[serde(default, deserialize_with = "null_as_false")]
        replace: bool,
    },
    /// Move one entry back in a tab's history.
    TabGoBack {
        /// Owning window.
        window: WindowId,
        /// Tab to move.
        tab: TabId,
    },
    /// Move one entry forward in a tab's history.
    TabGoForward {
        /// Owning window.
        window: WindowId,
        /// Tab to move.
        tab: TabId,
    },
    /// The user logged out; every tab of every window is dropped.
    Logout,
    /// Persisted tabs were read back at startup.
    TabsRestored {
        /// Owning window.
        window: WindowId,
        /// Persisted records in save order. Items are raw JSON so malformed ones can be skipped
        /// one by one.
        items: Vec<Value>,
    },
    /// Show the window's context menu.
    PopupContextMenu {
        /// Owning window.
        window: WindowId,
        /// Pointer x position in client coordinates.
        client_x: f64,
        /// Pointer y position in client coordinates.
        client_y: f64,
        /// Menu template, passed through to the presentation layer.
        #[serde(default)]
        template: Vec<Value>,
    },
    /// Hide the window's context menu.
    CloseContextMenu {
        /// Owning window.
        window: WindowId,
    },
}

/// Optional host flags arrive as `true`, `false`, `null`, or not at all.
fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_default())
}

impl SessionAction {
    /// Window this event is addressed to, if any.
    pub fn window(&self) -> Option<&WindowId> {
        match self {
            Self::WindowOpened { window, .. }
            | Self::WindowClosed { window }
            | Self::OpenTab { window, .. }
            | Self::CloseTab { window, .. }
            | Self::FocusTab { window, .. }
            | Self::TabGotWebContents { window, .. }
            | Self::TabDataFetched { window, .. }
            | Self::EvolveTab { window, .. }
            | Self::TabGoBack { window, .. }
            | Self::TabGoForward { window, .. }
            | Self::TabsRestored { window, .. }
            | Self::PopupContextMenu { window, .. }
            | Self::CloseContextMenu { window } => Some(window),
            Self::Logout => None,
        }
    }

    /// Tab this event is addressed to, if any.
    pub fn tab(&self) -> Option<&TabId> {
        match self {
            Self::OpenTab { tab, .. }
            | Self::CloseTab { tab, .. }
            | Self::FocusTab { tab, .. }
            | Self::TabGotWebContents { tab, .. }
            | Self::TabDataFetched { tab, .. }
            | Self::EvolveTab { tab, .. }
            | Self::TabGoBack { tab, .. }
            | Self::TabGoForward { tab, .. } => Some(tab),
            Self::WindowOpened { .. }
            | Self::WindowClosed { .. }
            | Self::Logout
            | Self::TabsRestored { .. }
            | Self::PopupContextMenu { .. }
            | Self::CloseContextMenu { .. } => None,
        }
    }

    /// Wire name of the event, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::WindowOpened { .. } => "windowOpened",
            Self::WindowClosed { .. } => "windowClosed",
            Self::OpenTab { .. } => "openTab",
            Self::CloseTab { .. } => "closeTab",
            Self::FocusTab { .. } => "focusTab",
            Self::TabGotWebContents { .. } => "tabGotWebContents",
            Self::TabDataFetched { .. } => "tabDataFetched",
            Self::EvolveTab { .. } => "evolveTab",
            Self::TabGoBack { .. } => "tabGoBack",
            Self::TabGoForward { .. } => "tabGoForward",
            Self::Logout => "logout",
            Self::TabsRestored { .. } => "tabsRestored",
            Self::PopupContextMenu { .. } => "popupContextMenu",
            Self::CloseContextMenu { .. } => "closeContextMenu",
        }
    }
}
