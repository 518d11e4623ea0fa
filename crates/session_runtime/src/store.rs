//! Long-lived session container: applies events one at a time in submission order.
//!
//! Producers (navigation, fetch completions, content attachment, restore) hold a
//! [`SessionDispatcher`] and submit events without waiting for or reading back the result. The
//! owner of the [`SessionStore`] drains the queue; each event is a single synchronous transition.

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use session_contract::{SessionAction, WindowId};
use tracing::{debug, trace};

use crate::{
    config::SessionConfig,
    model::WindowsState,
    persistence::{SessionSnapshot, SnapshotError},
    reducer::reduce_windows,
};

/// Cloneable, fire-and-forget handle for submitting events to a [`SessionStore`].
#[derive(Debug, Clone)]
pub struct SessionDispatcher {
    sender: UnboundedSender<SessionAction>,
}

impl SessionDispatcher {
    /// Queues `action`. Events sent after the store is dropped are discarded.
    pub fn dispatch(&self, action: SessionAction) {
        if let Err(err) = self.sender.unbounded_send(action) {
            debug!(
                kind = err.into_inner().kind(),
                "session store is gone, dropping event"
            );
        }
    }
}

/// Owner of the windows state and the configuration every transition reads.
#[derive(Debug)]
pub struct SessionStore {
    config: SessionConfig,
    state: WindowsState,
    sender: UnboundedSender<SessionAction>,
    receiver: UnboundedReceiver<SessionAction>,
}

impl SessionStore {
    /// Creates a store with no windows.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_state(config, WindowsState::new())
    }

    /// Creates a store starting from an existing state.
    pub fn with_state(config: SessionConfig, state: WindowsState) -> Self {
        let (sender, receiver) = mpsc::unbounded();
        Self {
            config,
            state,
            sender,
            receiver,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current state. Cheap: shares the tree.
    pub fn state(&self) -> WindowsState {
        self.state.clone()
    }

    /// New handle for queueing events.
    pub fn dispatcher(&self) -> SessionDispatcher {
        SessionDispatcher {
            sender: self.sender.clone(),
        }
    }

    /// Applies one event immediately. Returns whether the state changed.
    pub fn apply(&mut self, action: &SessionAction) -> bool {
        let next = reduce_windows(&self.state, Some(action), &self.config);
        let changed = !next.ptr_eq(&self.state);
        trace!(kind = action.kind(), changed, "applied session event");
        self.state = next;
        changed
    }

    /// Applies every queued event in submission order and returns how many ran.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(Some(action)) = self.receiver.try_next() {
            self.apply(&action);
            applied += 1;
        }
        applied
    }

    /// Saved form of a window's tabs, or `None` when the window does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Json`] if a record cannot be encoded.
    pub fn capture_window(&self, window: &WindowId) -> Result<Option<SessionSnapshot>, SnapshotError> {
        self.state
            .window(window)
            .map(|state| SessionSnapshot::capture(&state.tab_instances))
            .transpose()
    }
}
