//! Popup button locator
//!
//! Finds a button by its exact text inside the popup dialogs of the
//! application under test, polling until it is clickable or the deadline
//! passes, then clicks it on the UI event thread.
//!
//! # Dialog selection
//!
//! - A lone popup is always searched, whatever its window state.
//! - With several popups, only those that are visible, enabled and active
//!   qualify, and the **last** qualifying one in stacking order is searched.
//!
//! # Validation
//!
//! A button is accepted only when it is enabled and showing at the moment
//! of the check. Handles are live, so the label and both checks are
//! repeated after the polling loop before anything is clicked.

use crate::result::{ProbeError, ProbeResult};
use crate::wait::{pause, PollOptions};
use crate::widget::{Dialog, Toolkit, Widget};
use std::sync::Arc;

/// Pick the popup to search among the currently open ones
pub fn select_target_dialog(popups: &[Arc<dyn Dialog>]) -> Option<Arc<dyn Dialog>> {
    if let [only] = popups {
        return Some(Arc::clone(only));
    }

    let mut target = None;
    for dialog in popups {
        let visible = dialog.is_visible();
        let enabled = dialog.is_enabled();
        let active = dialog.is_active();
        if visible && enabled && active {
            target = Some(Arc::clone(dialog));
            continue;
        }

        let mut reasons = Vec::new();
        if !visible {
            reasons.push("not visible");
        }
        if !enabled {
            reasons.push("not enabled");
        }
        if !active {
            reasons.push("not active");
        }
        tracing::info!(
            title = %dialog.title(),
            reasons = %reasons.join(", "),
            "ignoring dialog"
        );
    }
    target
}

/// Depth-first search for a button whose text equals `text` exactly
pub fn find_button(root: &Arc<dyn Widget>, text: &str) -> Option<Arc<dyn Widget>> {
    if root.kind().is_button() && root.text().as_deref() == Some(text) {
        return Some(Arc::clone(root));
    }
    root.children()
        .iter()
        .find_map(|child| find_button(child, text))
}

/// Bounded search for popup buttons
#[derive(Clone, Copy)]
pub struct PopupLocator<'a> {
    toolkit: &'a dyn Toolkit,
    options: PollOptions,
}

impl std::fmt::Debug for PopupLocator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PopupLocator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'a> PopupLocator<'a> {
    /// Create a locator over `toolkit`
    #[must_use]
    pub fn new(toolkit: &'a dyn Toolkit, options: PollOptions) -> Self {
        Self { toolkit, options }
    }

    /// Polling options in use
    #[must_use]
    pub const fn options(&self) -> &PollOptions {
        &self.options
    }

    /// One poll: select a dialog and search it
    fn poll_once(&self, text: &str) -> Option<Arc<dyn Widget>> {
        let popups = self.toolkit.popups();
        let dialog = select_target_dialog(&popups)?;
        tracing::debug!(popups = popups.len(), title = %dialog.title(), "searching dialog");
        find_button(&dialog.content(), text)
    }

    /// Poll until a clickable button labelled `text` is found.
    ///
    /// Fails with [`ProbeError::ButtonNotFound`], [`ProbeError::ButtonNotEnabled`]
    /// or [`ProbeError::ButtonNotVisible`] once the deadline has passed.
    pub fn locate(&self, text: &str) -> ProbeResult<Arc<dyn Widget>> {
        let deadline = self.options.deadline();
        let mut found = None;

        while deadline.is_pending() {
            found = self.poll_once(text);
            if let Some(button) = &found {
                if button.is_enabled() && button.is_showing() {
                    break;
                }
            }
            pause(self.options.poll_interval());
        }

        let Some(button) = found.filter(|b| b.text().as_deref() == Some(text)) else {
            return Err(ProbeError::ButtonNotFound {
                text: text.to_string(),
            });
        };
        if !button.is_enabled() {
            return Err(ProbeError::ButtonNotEnabled {
                text: text.to_string(),
            });
        }
        if !button.is_showing() {
            return Err(ProbeError::ButtonNotVisible {
                text: text.to_string(),
            });
        }
        Ok(button)
    }

    /// Locate the button labelled `text` and click it on the event thread,
    /// returning once the click has completed.
    pub fn click(&self, text: &str) -> ProbeResult<()> {
        let button = self.locate(text)?;
        tracing::debug!(text, "clicking popup button");
        self.toolkit
            .event_queue()
            .invoke_and_wait(move || button.click())?
    }
}
