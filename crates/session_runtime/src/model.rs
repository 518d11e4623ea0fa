//! Session state tree: windows, their sub-states, and tab instances.
//!
//! Every level is shared through [`Arc`]. A transition copies only the path it touches, so
//! untouched windows and tabs stay pointer-equal across transitions and downstream consumers can
//! detect change with the `ptr_eq` helpers.

use std::{collections::BTreeMap, sync::Arc};

use serde::Serialize;
use serde_json::{Map, Value};
use session_contract::{NavigationEntry, TabData, TabId, WebContentsId, WindowId};

/// Navigation history, fetched data, and lifecycle flags of one tab.
///
/// `history` is never empty and `current_index` always points into it. Instances are only built
/// inside this crate so the invariant holds for every reachable state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInstance {
    pub(crate) history: Vec<NavigationEntry>,
    pub(crate) current_index: usize,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub(crate) sleepy: bool,
    pub(crate) data: TabData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) web_contents_id: Option<WebContentsId>,
    /// Fields read from a snapshot that this runtime does not interpret.
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl TabInstance {
    /// A sleepy instance with a single history entry.
    pub(crate) fn new(entry: NavigationEntry, data: TabData) -> Self {
        Self {
            history: vec![entry],
            current_index: 0,
            sleepy: true,
            data,
            web_contents_id: None,
            extra: Map::new(),
        }
    }

    pub fn history(&self) -> &[NavigationEntry] {
        &self.history
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Entry the tab is currently showing.
    pub fn current_entry(&self) -> &NavigationEntry {
        &self.history[self.current_index]
    }

    pub fn current_url(&self) -> &str {
        &self.current_entry().url
    }

    pub fn can_go_back(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.current_index + 1 < self.history.len()
    }

    /// Whether the tab was created but not yet woken by focus or data.
    pub fn is_sleepy(&self) -> bool {
        self.sleepy
    }

    pub fn data(&self) -> &TabData {
        &self.data
    }

    pub fn web_contents_id(&self) -> Option<WebContentsId> {
        self.web_contents_id
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

/// Rendering surface announced for a tab that has not been opened yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabPlaceholder {
    pub web_contents_id: WebContentsId,
}

/// Value stored under a tab id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TabSlot {
    /// A fully initialized tab.
    Live(TabInstance),
    /// Only a rendering surface is known; navigation state does not exist yet.
    Placeholder(TabPlaceholder),
}

impl TabSlot {
    pub fn as_live(&self) -> Option<&TabInstance> {
        match self {
            Self::Live(instance) => Some(instance),
            Self::Placeholder(_) => None,
        }
    }

    pub fn web_contents_id(&self) -> Option<WebContentsId> {
        match self {
            Self::Live(instance) => instance.web_contents_id,
            Self::Placeholder(placeholder) => Some(placeholder.web_contents_id),
        }
    }
}

/// Tab id to tab mapping owned by one window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TabInstances(Arc<BTreeMap<TabId, Arc<TabSlot>>>);

impl TabInstances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any slot, live or placeholder, exists for `tab`.
    pub fn contains(&self, tab: &TabId) -> bool {
        self.0.contains_key(tab)
    }

    /// Live instance for `tab`. Placeholders are not returned.
    pub fn get(&self, tab: &TabId) -> Option<&TabInstance> {
        self.0.get(tab).and_then(|slot| slot.as_live())
    }

    pub fn slot(&self, tab: &TabId) -> Option<&Arc<TabSlot>> {
        self.0.get(tab)
    }

    /// All slots in tab id order.
    pub fn iter(&self) -> impl Iterator<Item = (&TabId, &Arc<TabSlot>)> {
        self.0.iter()
    }

    /// Live instances in tab id order.
    pub fn instances(&self) -> impl Iterator<Item = (&TabId, &TabInstance)> {
        self.0
            .iter()
            .filter_map(|(id, slot)| slot.as_live().map(|instance| (id, instance)))
    }

    /// Whether both values share the same underlying mapping.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn with_slot(&self, tab: TabId, slot: TabSlot) -> Self {
        let mut entries = (*self.0).clone();
        entries.insert(tab, Arc::new(slot));
        Self(Arc::new(entries))
    }

    pub(crate) fn with_instance(&self, tab: TabId, instance: TabInstance) -> Self {
        self.with_slot(tab, TabSlot::Live(instance))
    }

    /// Copy without `tab`. Returns a shared clone when `tab` is absent.
    pub(crate) fn without(&self, tab: &TabId) -> Self {
        if !self.0.contains_key(tab) {
            return self.clone();
        }
        let mut entries = (*self.0).clone();
        entries.remove(tab);
        Self(Arc::new(entries))
    }
}

/// Pointer position and template of a window's context menu.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextMenuData {
    pub client_x: f64,
    pub client_y: f64,
    pub template: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextMenuState {
    pub open: bool,
    pub data: ContextMenuData,
}

/// Everything one window owns. Destroyed atomically with its window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowState {
    pub tab_instances: TabInstances,
    pub context_menu: Arc<ContextMenuState>,
}

impl WindowState {
    /// Live tab instance by id.
    pub fn tab(&self, tab: &TabId) -> Option<&TabInstance> {
        self.tab_instances.get(tab)
    }
}

/// Window id to window state mapping; the root of the session tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WindowsState(Arc<BTreeMap<WindowId, Arc<WindowState>>>);

impl WindowsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, window: &WindowId) -> bool {
        self.0.contains_key(window)
    }

    pub fn window(&self, window: &WindowId) -> Option<&WindowState> {
        self.0.get(window).map(Arc::as_ref)
    }

    /// Shared handle to a window's state, for pointer comparisons across transitions.
    pub fn window_arc(&self, window: &WindowId) -> Option<&Arc<WindowState>> {
        self.0.get(window)
    }

    pub fn window_ids(&self) -> impl Iterator<Item = &WindowId> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WindowId, &Arc<WindowState>)> {
        self.0.iter()
    }

    /// Live tab instance in a given window.
    pub fn tab(&self, window: &WindowId, tab: &TabId) -> Option<&TabInstance> {
        self.window(window).and_then(|state| state.tab(tab))
    }

    /// Whether both values share the same underlying mapping.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn from_entries(entries: BTreeMap<WindowId, Arc<WindowState>>) -> Self {
        Self(Arc::new(entries))
    }

    pub(crate) fn with_window(&self, window: WindowId, state: Arc<WindowState>) -> Self {
        let mut entries = (*self.0).clone();
        entries.insert(window, state);
        Self(Arc::new(entries))
    }

    /// Copy without `window`. Returns a shared clone when `window` is absent.
    pub(crate) fn without(&self, window: &WindowId) -> Self {
        if !self.0.contains_key(window) {
            return self.clone();
        }
        let mut entries = (*self.0).clone();
        entries.remove(window);
        Self(Arc::new(entries))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn new_instance_is_sleepy_at_its_only_entry() {
        let instance = TabInstance::new(NavigationEntry::new("itch://library"), TabData::new());
        assert!(instance.is_sleepy());
        assert_eq!(instance.current_url(), "itch://library");
        assert!(!instance.can_go_back());
        assert!(!instance.can_go_forward());
    }

    #[test]
    fn removing_absent_tab_shares_the_mapping() {
        let tabs = TabInstances::new().with_instance(
            TabId::new("a"),
            TabInstance::new(NavigationEntry::new("u1"), TabData::new()),
        );
        assert!(tabs.without(&TabId::new("missing")).ptr_eq(&tabs));
        assert!(!tabs.without(&TabId::new("a")).ptr_eq(&tabs));
    }

    #[test]
    fn placeholders_are_hidden_from_live_lookups() {
        let tab = TabId::new("a");
        let tabs = TabInstances::new().with_slot(
            tab.clone(),
            TabSlot::Placeholder(TabPlaceholder {
                web_contents_id: WebContentsId(3),
            }),
        );
        assert!(tabs.contains(&tab));
        assert_eq!(tabs.get(&tab), None);
        assert_eq!(tabs.instances().count(), 0);
        assert_eq!(
            tabs.slot(&tab).and_then(|slot| slot.web_contents_id()),
            Some(WebContentsId(3))
        );
    }

    #[test]
    fn instances_serialize_with_camel_case_fields() {
        let mut instance = TabInstance::new(
            NavigationEntry::with_resource("itch://games/1", Some("games/1".into())),
            TabData::new(),
        );
        instance.web_contents_id = Some(WebContentsId(9));
        let value = serde_json::to_value(&instance).expect("encode");
        assert_eq!(
            value,
            json!({
                "history": [{ "url": "itch://games/1", "resource": "games/1" }],
                "currentIndex": 0,
                "sleepy": true,
                "data": {},
                "webContentsId": 9
            })
        );
    }
}
