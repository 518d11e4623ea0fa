//! Window state composer: feeds each event to every per-window sub-state.

use std::sync::Arc;

use session_contract::SessionAction;

use super::{context_menu::reduce_context_menu, tab_instances::reduce_tab_instances};
use crate::{config::SessionConfig, model::WindowState};

/// Applies `action` to one window.
///
/// Returns `state` itself (same `Arc`) when no sub-state changed.
pub fn reduce_window(
    state: &Arc<WindowState>,
    action: &SessionAction,
    config: &SessionConfig,
) -> Arc<WindowState> {
    let tab_instances = reduce_tab_instances(&state.tab_instances, action, config);
    let context_menu = reduce_context_menu(&state.context_menu, action);

    if tab_instances.ptr_eq(&state.tab_instances) && Arc::ptr_eq(&context_menu, &state.context_menu)
    {
        return Arc::clone(state);
    }

    Arc::new(WindowState {
        tab_instances,
        context_menu,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use session_contract::{TabData, TabId, WindowId};

    use super::*;

    fn window() -> WindowId {
        WindowId::new("root")
    }

    fn opened() -> Arc<WindowState> {
        reduce_window(
            &Arc::new(WindowState::default()),
            &SessionAction::WindowOpened {
                window: window(),
                initial_url: "itch://library".into(),
            },
            &SessionConfig::default(),
        )
    }

    #[test]
    fn tab_events_leave_the_context_menu_shared() {
        let state = opened();
        let next = reduce_window(
            &state,
            &SessionAction::TabDataFetched {
                window: window(),
                tab: TabId::new("initial-tab"),
                data: TabData::new().with("web", json!({ "loading": true })),
                shallow: false,
            },
            &SessionConfig::default(),
        );

        assert!(!Arc::ptr_eq(&state, &next));
        assert!(Arc::ptr_eq(&state.context_menu, &next.context_menu));
    }

    #[test]
    fn menu_events_leave_the_tabs_shared() {
        let state = opened();
        let next = reduce_window(
            &state,
            &SessionAction::PopupContextMenu {
                window: window(),
                client_x: 1.0,
                client_y: 2.0,
                template: Vec::new(),
            },
            &SessionConfig::default(),
        );

        assert!(next.context_menu.open);
        assert!(next.tab_instances.ptr_eq(&state.tab_instances));
    }

    #[test]
    fn no_op_events_return_the_same_window() {
        let state = opened();
        let next = reduce_window(
            &state,
            &SessionAction::TabGoBack {
                window: window(),
                tab: TabId::new("initial-tab"),
            },
            &SessionConfig::default(),
        );
        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn custom_bootstrap_tab_id_is_used() {
        let config = SessionConfig {
            bootstrap_tab: TabId::new("home"),
            ..SessionConfig::default()
        };
        let state = reduce_window(
            &Arc::new(WindowState::default()),
            &SessionAction::WindowOpened {
                window: window(),
                initial_url: "itch://library".into(),
            },
            &config,
        );
        assert!(state.tab(&TabId::new("home")).is_some());
        assert!(state.tab(&TabId::new("initial-tab")).is_none());
    }
}
