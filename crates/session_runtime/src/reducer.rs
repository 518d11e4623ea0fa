//! Action router: owns the window mapping and sends each event to the windows it concerns.

mod context_menu;
pub mod tab_instances;
pub mod window;

use std::{collections::BTreeMap, sync::Arc};

use session_contract::{SessionAction, WindowId};
use tracing::debug;

use crate::{
    config::SessionConfig,
    model::{WindowState, WindowsState},
};

pub use tab_instances::reduce_tab_instances;
pub use window::reduce_window;

/// Applies an event to the windows state.
///
/// - `windowOpened` builds a fresh window (bootstrap tab included) under its id.
/// - `windowClosed` drops the window and everything it owns.
/// - An event addressed to an existing window only reaches that window; every other window keeps
///   its `Arc`.
/// - Anything else (no window, or an unknown one) is broadcast to every window.
///
/// `None` and events that change nothing return `state` itself.
pub fn reduce_windows(
    state: &WindowsState,
    action: Option<&SessionAction>,
    config: &SessionConfig,
) -> WindowsState {
    let Some(action) = action else {
        return state.clone();
    };

    match action {
        SessionAction::WindowOpened { window, .. } => {
            let fresh = Arc::new(WindowState::default());
            state.with_window(window.clone(), reduce_window(&fresh, action, config))
        }
        SessionAction::WindowClosed { window } => state.without(window),
        _ => match action.window() {
            Some(window) if state.contains(window) => route(state, window, action, config),
            Some(window) => {
                debug!(%window, kind = action.kind(), "unknown window, broadcasting");
                broadcast(state, action, config)
            }
            None => broadcast(state, action, config),
        },
    }
}

fn route(
    state: &WindowsState,
    window: &WindowId,
    action: &SessionAction,
    config: &SessionConfig,
) -> WindowsState {
    let Some(current) = state.window_arc(window) else {
        return state.clone();
    };
    let next = reduce_window(current, action, config);
    if Arc::ptr_eq(&next, current) {
        return state.clone();
    }
    state.with_window(window.clone(), next)
}

fn broadcast(state: &WindowsState, action: &SessionAction, config: &SessionConfig) -> WindowsState {
    let mut changed = false;
    let entries: BTreeMap<WindowId, Arc<WindowState>> = state
        .iter()
        .map(|(window, current)| {
            let next = reduce_window(current, action, config);
            changed |= !Arc::ptr_eq(&next, current);
            (window.clone(), next)
        })
        .collect();

    if !changed {
        return state.clone();
    }
    WindowsState::from_entries(entries)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use session_contract::{TabData, TabId};

    use super::*;

    fn apply(state: &WindowsState, action: SessionAction) -> WindowsState {
        reduce_windows(state, Some(&action), &SessionConfig::default())
    }

    fn open_window(state: &WindowsState, id: &str) -> WindowsState {
        apply(
            state,
            SessionAction::WindowOpened {
                window: WindowId::new(id),
                initial_url: format!("itch://{id}"),
            },
        )
    }

    fn two_windows() -> WindowsState {
        open_window(&open_window(&WindowsState::new(), "w1"), "w2")
    }

    fn open_tab(window: &str, tab: &str) -> SessionAction {
        SessionAction::OpenTab {
            window: WindowId::new(window),
            tab: TabId::new(tab),
            url: format!("itch://{tab}"),
            resource: None,
            data: None,
        }
    }

    #[test]
    fn window_opened_starts_with_the_bootstrap_tab() {
        let state = open_window(&WindowsState::new(), "w1");
        let tab = state
            .tab(&WindowId::new("w1"), &TabId::new("initial-tab"))
            .expect("bootstrap tab");
        assert_eq!(tab.current_url(), "itch://w1");
        assert!(tab.is_sleepy());
    }

    #[test]
    fn window_events_only_touch_their_window() {
        let state = two_windows();
        let next = apply(&state, open_tab("w1", "A"));

        let w1 = WindowId::new("w1");
        let w2 = WindowId::new("w2");
        assert!(next.tab(&w1, &TabId::new("A")).is_some());
        assert!(next.tab(&w2, &TabId::new("A")).is_none());
        assert!(Arc::ptr_eq(
            state.window_arc(&w2).expect("w2"),
            next.window_arc(&w2).expect("w2")
        ));
        assert!(!Arc::ptr_eq(
            state.window_arc(&w1).expect("w1"),
            next.window_arc(&w1).expect("w1")
        ));
    }

    #[test]
    fn window_closed_removes_exactly_that_window() {
        let state = open_window(&two_windows(), "w3");
        let next = apply(
            &state,
            SessionAction::WindowClosed {
                window: WindowId::new("w2"),
            },
        );

        assert_eq!(
            next.window_ids().map(WindowId::as_str).collect::<Vec<_>>(),
            vec!["w1", "w3"]
        );
        for id in ["w1", "w3"] {
            let id = WindowId::new(id);
            assert!(Arc::ptr_eq(
                state.window_arc(&id).expect("before"),
                next.window_arc(&id).expect("after")
            ));
        }
    }

    #[test]
    fn closing_an_unknown_window_is_reference_stable() {
        let state = two_windows();
        let next = apply(
            &state,
            SessionAction::WindowClosed {
                window: WindowId::new("nope"),
            },
        );
        assert!(next.ptr_eq(&state));
    }

    #[test]
    fn missing_event_returns_the_same_state() {
        let state = two_windows();
        assert!(reduce_windows(&state, None, &SessionConfig::default()).ptr_eq(&state));
    }

    #[test]
    fn logout_reaches_every_window() {
        let state = apply(&two_windows(), open_tab("w2", "B"));
        let next = apply(&state, SessionAction::Logout);

        assert_eq!(next.len(), 2);
        for (_, window) in next.iter() {
            assert!(window.tab_instances.is_empty());
        }
    }

    #[test]
    fn unknown_window_events_are_broadcast() {
        let state = two_windows();
        let next = apply(
            &state,
            SessionAction::TabDataFetched {
                window: WindowId::new("ghost"),
                tab: TabId::new("initial-tab"),
                data: TabData::new().with("label", json!("Home")),
                shallow: true,
            },
        );

        assert_eq!(next.len(), 2);
        assert!(!next.contains(&WindowId::new("ghost")));
        for (_, window) in next.iter() {
            let tab = window.tab(&TabId::new("initial-tab")).expect("tab");
            assert_eq!(tab.data().get("label"), Some(&json!("Home")));
        }
    }

    #[test]
    fn broadcasts_that_change_nothing_keep_the_state() {
        let state = two_windows();
        let next = apply(
            &state,
            SessionAction::FocusTab {
                window: WindowId::new("ghost"),
                tab: TabId::new("missing"),
            },
        );
        assert!(next.ptr_eq(&state));
    }

    #[test]
    fn events_for_absent_tabs_keep_the_whole_tree() {
        let state = two_windows();
        let next = apply(
            &state,
            SessionAction::TabDataFetched {
                window: WindowId::new("w1"),
                tab: TabId::new("closed"),
                data: TabData::new(),
                shallow: false,
            },
        );
        assert!(next.ptr_eq(&state));
    }

    #[test]
    fn reopening_a_window_replaces_its_state() {
        let state = apply(&two_windows(), open_tab("w1", "A"));
        let next = open_window(&state, "w1");

        let w1 = next.window(&WindowId::new("w1")).expect("w1");
        assert_eq!(w1.tab_instances.len(), 1);
        assert!(w1.tab(&TabId::new("initial-tab")).is_some());
    }
}
