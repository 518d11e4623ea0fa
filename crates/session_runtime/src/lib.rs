//! Window and tab session state machine.
//!
//! Events flow router -> window composer -> tab store. Every transition is a pure function over
//! an `Arc`-shared tree, so untouched windows and tabs are pointer-equal before and after.

pub mod config;
pub mod merge;
pub mod model;
pub mod persistence;
pub mod reducer;
pub mod store;

pub use config::{ConfigError, DeepFieldSet, SessionConfig};
pub use merge::merge_tab_data;
pub use model::*;
pub use persistence::{
    restore_item, save_items, SessionSnapshot, SnapshotError, SnapshotItemError, TabSnapshotItem,
    TABS_SNAPSHOT_SCHEMA_VERSION,
};
pub use reducer::{reduce_tab_instances, reduce_window, reduce_windows};
pub use session_contract::{
    NavigationEntry, SessionAction, TabData, TabId, WebContentsId, WindowId,
};
pub use store::{SessionDispatcher, SessionStore};
