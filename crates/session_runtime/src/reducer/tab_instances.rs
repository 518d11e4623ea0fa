//! Tab instance store: per-tab navigation, data, and lifecycle transitions.
//!
//! Every event naming a tab that has no live instance returns the input mapping unchanged (same
//! `Arc`), which keeps late fetch results from resurrecting closed tabs.

use std::sync::Arc;

use session_contract::{NavigationEntry, SessionAction, TabData, TabId, WebContentsId};
use tracing::{debug, warn};

use crate::{
    config::SessionConfig,
    merge::merge_tab_data,
    model::{TabInstance, TabInstances, TabPlaceholder, TabSlot},
    persistence::restore_item,
};

/// Applies `action` to one window's tab mapping.
pub fn reduce_tab_instances(
    state: &TabInstances,
    action: &SessionAction,
    config: &SessionConfig,
) -> TabInstances {
    match action {
        SessionAction::WindowOpened { initial_url, .. } => state.with_instance(
            config.bootstrap_tab.clone(),
            TabInstance::new(NavigationEntry::new(initial_url.clone()), TabData::new()),
        ),
        SessionAction::OpenTab {
            tab,
            url,
            resource,
            data,
            ..
        } => open_tab(state, tab, url, resource.as_deref(), data.as_ref()),
        SessionAction::CloseTab { tab, .. } => state.without(tab),
        SessionAction::FocusTab { tab, .. } => focus_tab(state, tab),
        SessionAction::TabGotWebContents {
            tab,
            web_contents_id,
            ..
        } => attach_web_contents(state, tab, *web_contents_id),
        SessionAction::TabDataFetched {
            tab, data, shallow, ..
        } => data_fetched(state, tab, data, *shallow, config),
        SessionAction::EvolveTab {
            tab,
            url,
            resource,
            data,
            replace,
            ..
        } => evolve_tab(
            state,
            tab,
            EvolveRequest {
                url: url.as_deref(),
                resource: resource.as_deref(),
                data: data.as_ref(),
                replace: *replace,
            },
            config,
        ),
        SessionAction::TabGoBack { tab, .. } => step_history(state, tab, Step::Back),
        SessionAction::TabGoForward { tab, .. } => step_history(state, tab, Step::Forward),
        SessionAction::Logout if state.is_empty() => state.clone(),
        SessionAction::Logout => TabInstances::new(),
        SessionAction::TabsRestored { items, .. } => restore_tabs(state, items),
        SessionAction::WindowClosed { .. }
        | SessionAction::PopupContextMenu { .. }
        | SessionAction::CloseContextMenu { .. } => state.clone(),
    }
}

fn open_tab(
    state: &TabInstances,
    tab: &TabId,
    url: &str,
    resource: Option<&str>,
    data: Option<&TabData>,
) -> TabInstances {
    if tab.is_empty() {
        debug!("ignoring openTab without a tab id");
        return state.clone();
    }

    let mut instance = TabInstance::new(
        NavigationEntry::with_resource(url, resource.map(str::to_owned)),
        data.cloned().unwrap_or_default(),
    );
    if let Some(TabSlot::Placeholder(pending)) = state.slot(tab).map(Arc::as_ref) {
        instance.web_contents_id = Some(pending.web_contents_id);
    }
    state.with_instance(tab.clone(), instance)
}

fn focus_tab(state: &TabInstances, tab: &TabId) -> TabInstances {
    match state.get(tab) {
        Some(instance) if instance.sleepy => {
            let mut awake = instance.clone();
            awake.sleepy = false;
            state.with_instance(tab.clone(), awake)
        }
        _ => state.clone(),
    }
}

fn attach_web_contents(
    state: &TabInstances,
    tab: &TabId,
    web_contents_id: WebContentsId,
) -> TabInstances {
    if state.slot(tab).and_then(|slot| slot.web_contents_id()) == Some(web_contents_id) {
        return state.clone();
    }

    match state.get(tab) {
        Some(instance) => {
            let mut attached = instance.clone();
            attached.web_contents_id = Some(web_contents_id);
            state.with_instance(tab.clone(), attached)
        }
        None => {
            debug!(%tab, "web contents arrived before the tab was opened");
            state.with_slot(
                tab.clone(),
                TabSlot::Placeholder(TabPlaceholder { web_contents_id }),
            )
        }
    }
}

fn data_fetched(
    state: &TabInstances,
    tab: &TabId,
    data: &TabData,
    shallow: bool,
    config: &SessionConfig,
) -> TabInstances {
    let Some(instance) = state.get(tab) else {
        debug!(%tab, "ignoring fetched data for a closed tab");
        return state.clone();
    };

    let mut next = instance.clone();
    next.data = merge_tab_data(&instance.data, data, shallow, &config.deep_fields);
    // Arriving data also wakes the tab.
    next.sleepy = false;
    state.with_instance(tab.clone(), next)
}

struct EvolveRequest<'a> {
    url: Option<&'a str>,
    resource: Option<&'a str>,
    data: Option<&'a TabData>,
    replace: bool,
}

fn evolve_tab(
    state: &TabInstances,
    tab: &TabId,
    request: EvolveRequest<'_>,
    config: &SessionConfig,
) -> TabInstances {
    let Some(instance) = state.get(tab) else {
        debug!(%tab, "ignoring navigation for a closed tab");
        return state.clone();
    };

    let current = instance.current_entry();
    let resource = request
        .resource
        .filter(|resource| !resource.is_empty())
        .map(str::to_owned)
        .or_else(|| current.resource.clone());

    let url = match resource.as_deref() {
        Some(resource) if config.is_collection_resource(resource) => config.internal_url(resource),
        _ => request
            .url
            .map_or_else(|| current.url.clone(), str::to_owned),
    };
    let replace = request.replace || url == current.url;

    let entry = NavigationEntry { url, resource };
    let mut next = instance.clone();
    if replace {
        next.history[next.current_index] = entry;
    } else {
        next.history.truncate(next.current_index + 1);
        next.history.push(entry);
        next.current_index = next.history.len() - 1;
    }

    let empty = TabData::new();
    next.data = merge_tab_data(
        &instance.data,
        request.data.unwrap_or(&empty),
        false,
        &config.deep_fields,
    );
    state.with_instance(tab.clone(), next)
}

#[derive(Clone, Copy)]
enum Step {
    Back,
    Forward,
}

fn step_history(state: &TabInstances, tab: &TabId, step: Step) -> TabInstances {
    let Some(instance) = state.get(tab) else {
        return state.clone();
    };

    let current_index = match step {
        Step::Back if instance.can_go_back() => instance.current_index - 1,
        Step::Forward if instance.can_go_forward() => instance.current_index + 1,
        _ => return state.clone(),
    };

    let mut next = instance.clone();
    next.current_index = current_index;
    state.with_instance(tab.clone(), next)
}

fn restore_tabs(state: &TabInstances, items: &[serde_json::Value]) -> TabInstances {
    items
        .iter()
        .enumerate()
        .fold(state.clone(), |acc, (position, item)| match restore_item(item) {
            Ok((id, instance)) => acc.with_instance(id, instance),
            Err(err) => {
                warn!(position, %err, "skipping malformed snapshot item");
                acc
            }
        })
}
