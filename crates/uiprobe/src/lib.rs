//! uiprobe: bounded popup automation for GUI test harnesses
//!
//! Test scripts drive the application under test through *commanders*. The
//! central one, [`PopupButtonClicker`], polls the open popup dialogs for a
//! button with an exact label and clicks it on the UI event thread once it
//! is enabled and showing, or fails when the timeout runs out.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    UIPROBE Architecture                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Commander  │    │ Popup      │    │ Toolkit    │            │
//! │   │ (args)     │───►│ Locator    │───►│ (dialogs,  │            │
//! │   │            │    │ (polling)  │    │  widgets)  │            │
//! │   └────────────┘    └─────┬──────┘    └────────────┘            │
//! │                           │ invoke_and_wait                     │
//! │                     ┌─────▼──────┐                              │
//! │                     │ Event      │                              │
//! │                     │ Queue      │                              │
//! │                     └────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use std::sync::Arc;
//! use uiprobe::{CommanderRegistry, ProbeConfig, Scene, SceneDialog, SceneNode, SceneToolkit};
//!
//! let scene = Scene::new().with_dialog(SceneDialog::new(
//!     "Confirm",
//!     SceneNode::container(vec![SceneNode::button("OK"), SceneNode::button("Cancel")]),
//! ));
//! let toolkit = Arc::new(SceneToolkit::new(scene).unwrap());
//! let config = ProbeConfig::new();
//! let registry = CommanderRegistry::with_defaults(toolkit.clone(), &config);
//!
//! let ok = registry
//!     .execute("clickOnPopupButton", &[json!("1"), json!("OK")])
//!     .unwrap();
//! assert!(ok);
//! assert_eq!(toolkit.clicks()[0].text.as_deref(), Some("OK"));
//! ```

#![warn(missing_docs)]

mod commander;
mod config;
mod event_queue;
mod locator;
mod result;
mod scene;
mod script;
mod wait;
mod widget;

pub use commander::{Commander, CommanderRegistry, PopupButtonClicker};
pub use config::ProbeConfig;
pub use event_queue::{EventQueue, DEFAULT_EVENT_THREAD_NAME};
pub use locator::{find_button, select_target_dialog, PopupLocator};
pub use result::{ProbeError, ProbeResult};
pub use scene::{ClickRecord, DialogId, Scene, SceneDialog, SceneNode, SceneToolkit};
pub use script::{find_file_in, CompanionReport, TestScript};
pub use wait::{
    pause, Deadline, PauseOutcome, PollOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_SECS,
};
pub use widget::{Dialog, Toolkit, Widget, WidgetKind};
