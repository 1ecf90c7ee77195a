//! Widget toolkit seam
//!
//! The locator never talks to a concrete toolkit. It sees the application
//! under test through three traits:
//!
//! - [`Toolkit`]: the set of open popup dialogs and the UI event queue
//! - [`Dialog`]: a top-level popup window and its window state
//! - [`Widget`]: a node of the component tree
//!
//! Handles are live views. Every accessor re-reads the current state of the
//! underlying UI, so two calls may disagree if the UI changed in between.

use crate::event_queue::EventQueue;
use crate::result::ProbeResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Kind of a widget in the component tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    /// Push button
    Button,
    /// Check box
    CheckBox,
    /// Radio button
    RadioButton,
    /// Two-state toggle button
    ToggleButton,
    /// Plain container holding other widgets
    #[default]
    Container,
    /// Static text
    Label,
    /// Editable text field
    TextField,
}

impl WidgetKind {
    /// Whether widgets of this kind are clickable buttons
    #[must_use]
    pub const fn is_button(self) -> bool {
        matches!(
            self,
            Self::Button | Self::CheckBox | Self::RadioButton | Self::ToggleButton
        )
    }

    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::CheckBox => "check_box",
            Self::RadioButton => "radio_button",
            Self::ToggleButton => "toggle_button",
            Self::Container => "container",
            Self::Label => "label",
            Self::TextField => "text_field",
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A node of the live component tree
pub trait Widget: Send + Sync + fmt::Debug {
    /// Widget kind
    fn kind(&self) -> WidgetKind;

    /// Text shown by the widget, if it has any
    fn text(&self) -> Option<String>;

    /// Whether the widget accepts input
    fn is_enabled(&self) -> bool;

    /// Whether the widget and all of its ancestors are visible
    fn is_showing(&self) -> bool;

    /// Direct children, in layout order
    fn children(&self) -> Vec<Arc<dyn Widget>>;

    /// Perform a click. Must be called on the UI event thread.
    fn click(&self) -> ProbeResult<()>;
}

/// A popup dialog owned by the application under test
pub trait Dialog: Send + Sync + fmt::Debug {
    /// Window title
    fn title(&self) -> String;

    /// Whether the window is visible
    fn is_visible(&self) -> bool;

    /// Whether the window accepts input
    fn is_enabled(&self) -> bool;

    /// Whether the window currently has focus
    fn is_active(&self) -> bool;

    /// Root of the dialog's component tree
    fn content(&self) -> Arc<dyn Widget>;
}

/// Access to the application under test
pub trait Toolkit: Send + Sync {
    /// Dialogs open right now, in stacking order
    fn popups(&self) -> Vec<Arc<dyn Dialog>>;

    /// Queue running jobs on the toolkit's event thread
    fn event_queue(&self) -> &EventQueue;
}
