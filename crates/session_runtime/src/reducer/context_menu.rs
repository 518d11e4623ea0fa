//! Reducer for the per-window context menu.

use std::sync::Arc;

use session_contract::SessionAction;

use crate::model::{ContextMenuData, ContextMenuState};

pub(super) fn reduce_context_menu(
    state: &Arc<ContextMenuState>,
    action: &SessionAction,
) -> Arc<ContextMenuState> {
    match action {
        SessionAction::PopupContextMenu {
            client_x,
            client_y,
            template,
            ..
        } => Arc::new(ContextMenuState {
            open: true,
            data: ContextMenuData {
                client_x: *client_x,
                client_y: *client_y,
                template: template.clone(),
            },
        }),
        SessionAction::CloseContextMenu { .. } if state.open => Arc::new(ContextMenuState {
            open: false,
            data: state.data.clone(),
        }),
        _ => Arc::clone(state),
    }
}
