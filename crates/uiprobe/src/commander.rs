//! Commanders
//!
//! A commander performs one interaction with the application under test. It
//! receives its arguments as an untyped positional list, the way test
//! scripts pass them over the wire, and reports success as `Ok(true)`.

use crate::config::ProbeConfig;
use crate::locator::PopupLocator;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::PollOptions;
use crate::widget::Toolkit;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// An action on the application under test
pub trait Commander: Send + Sync {
    /// Name scripts use to invoke the commander
    fn name(&self) -> &'static str;

    /// Run with positional arguments
    fn execute(&self, data: &[Value]) -> ProbeResult<bool>;
}

// =============================================================================
// ARGUMENT DECODING
// =============================================================================

/// Render a scalar argument as text. Strings are taken verbatim.
fn arg_text(data: &[Value], index: usize, what: &str) -> ProbeResult<String> {
    match data.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(ProbeError::invalid_argument(format!(
            "{what} must be a scalar, got {other}"
        ))),
        None => Err(ProbeError::invalid_argument(format!(
            "missing argument {index} ({what})"
        ))),
    }
}

/// Decode a non-negative whole number of seconds
fn arg_timeout(data: &[Value], index: usize) -> ProbeResult<u64> {
    let raw = arg_text(data, index, "timeout")?;
    raw.trim().parse::<u64>().map_err(|_| {
        ProbeError::invalid_argument(format!(
            "timeout must be a non-negative whole number of seconds, got {raw:?}"
        ))
    })
}

/// Require at least `arity` arguments; trailing extras are ignored
fn expect_arity(name: &str, data: &[Value], arity: usize) -> ProbeResult<()> {
    if data.len() >= arity {
        Ok(())
    } else {
        Err(ProbeError::invalid_argument(format!(
            "{name} expects {arity} arguments, got {}",
            data.len()
        )))
    }
}

// =============================================================================
// POPUP BUTTON CLICKER
// =============================================================================

/// Clicks a button inside a popup dialog.
///
/// Arguments: `[timeout_secs, button_text, ..]`; anything after the
/// button text is ignored.
pub struct PopupButtonClicker {
    toolkit: Arc<dyn Toolkit>,
    poll_interval_ms: u64,
}

impl std::fmt::Debug for PopupButtonClicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PopupButtonClicker")
            .field("poll_interval_ms", &self.poll_interval_ms)
            .finish_non_exhaustive()
    }
}

impl PopupButtonClicker {
    /// Registry name
    pub const NAME: &'static str = "clickOnPopupButton";

    /// Create a clicker polling at the configured interval
    #[must_use]
    pub fn new(toolkit: Arc<dyn Toolkit>, config: &ProbeConfig) -> Self {
        Self {
            toolkit,
            poll_interval_ms: config.poll_interval_ms,
        }
    }

    /// Click the popup button labelled `text`, waiting up to `timeout_secs`
    pub fn click(&self, timeout_secs: u64, text: &str) -> ProbeResult<bool> {
        let options = PollOptions::new()
            .with_timeout_secs(timeout_secs)
            .with_poll_interval(self.poll_interval_ms);
        PopupLocator::new(self.toolkit.as_ref(), options).click(text)?;
        Ok(true)
    }
}

impl Commander for PopupButtonClicker {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn execute(&self, data: &[Value]) -> ProbeResult<bool> {
        expect_arity(Self::NAME, data, 2)?;
        let timeout_secs = arg_timeout(data, 0)?;
        let text = arg_text(data, 1, "button text")?;
        tracing::info!(timeout_secs, text = %text, "clicking popup button");
        self.click(timeout_secs, &text)
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Commanders indexed by name
#[derive(Default)]
pub struct CommanderRegistry {
    commanders: BTreeMap<&'static str, Box<dyn Commander>>,
}

impl std::fmt::Debug for CommanderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommanderRegistry")
            .field("commanders", &self.names())
            .finish()
    }
}

impl CommanderRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in commander wired to `toolkit`
    #[must_use]
    pub fn with_defaults(toolkit: Arc<dyn Toolkit>, config: &ProbeConfig) -> Self {
        let mut registry = Self::new();
        registry.register(PopupButtonClicker::new(toolkit, config));
        registry
    }

    /// Add a commander, replacing any with the same name
    pub fn register<C: Commander + 'static>(&mut self, commander: C) {
        self.commanders.insert(commander.name(), Box::new(commander));
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.commanders.keys().copied().collect()
    }

    /// Run the commander registered as `name`
    pub fn execute(&self, name: &str, data: &[Value]) -> ProbeResult<bool> {
        let commander = self
            .commanders
            .get(name)
            .ok_or_else(|| ProbeError::UnknownCommand {
                name: name.to_string(),
            })?;
        commander.execute(data)
    }
}
