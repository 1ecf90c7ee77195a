//! In-memory toolkit
//!
//! A [`Scene`] is a serialisable description of open dialogs and their
//! component trees. [`SceneToolkit`] serves a scene through the
//! [`Toolkit`](crate::Toolkit) traits with handles that re-read shared state
//! on every call, so a scene can be mutated from another thread while a
//! search is running.

use crate::event_queue::EventQueue;
use crate::result::{ProbeError, ProbeResult};
use crate::widget::{Dialog, Toolkit, Widget, WidgetKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

const fn yes() -> bool {
    true
}

// =============================================================================
// SCENE MODEL
// =============================================================================

/// One widget of a scene
///
/// A clone is a new widget: it gets its own identity once it is added to a
/// toolkit.
#[derive(Debug, Serialize, Deserialize)]
pub struct SceneNode {
    // Assigned by the owning toolkit, 0 until then
    #[serde(skip)]
    id: u64,
    /// Widget kind
    #[serde(default)]
    pub kind: WidgetKind,
    /// Displayed text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Enabled flag
    #[serde(default = "yes")]
    pub enabled: bool,
    /// Visible flag
    #[serde(default = "yes")]
    pub visible: bool,
    /// Clicking this widget closes its dialog
    #[serde(default)]
    pub dismisses: bool,
    /// Child widgets
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Create a node of the given kind
    #[must_use]
    pub const fn new(kind: WidgetKind) -> Self {
        Self {
            id: 0,
            kind,
            text: None,
            enabled: true,
            visible: true,
            dismisses: false,
            children: Vec::new(),
        }
    }

    /// Create a push button
    #[must_use]
    pub fn button(text: impl Into<String>) -> Self {
        Self::new(WidgetKind::Button).with_text(text)
    }

    /// Create a label
    #[must_use]
    pub fn label(text: impl Into<String>) -> Self {
        Self::new(WidgetKind::Label).with_text(text)
    }

    /// Create a container holding `children`
    #[must_use]
    pub fn container(children: Vec<Self>) -> Self {
        Self {
            children,
            ..Self::new(WidgetKind::Container)
        }
    }

    /// Set the text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append a child
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Mark as disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Mark as hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Close the owning dialog when clicked
    #[must_use]
    pub const fn dismissing(mut self) -> Self {
        self.dismisses = true;
        self
    }

    fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Self> {
        path.iter()
            .try_fold(self, |node, &i| node.children.get_mut(i))
    }

    fn find(&self, id: u64) -> Option<&Self> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Visibility of node `id` combined with that of all its ancestors
    fn showing(&self, id: u64) -> Option<bool> {
        if self.id == id {
            return Some(self.visible);
        }
        self.children
            .iter()
            .find_map(|c| c.showing(id))
            .map(|showing| showing && self.visible)
    }

    fn assign_ids(&mut self, next: &mut u64) {
        if self.id == 0 {
            *next += 1;
            self.id = *next;
        }
        for child in &mut self.children {
            child.assign_ids(next);
        }
    }
}

impl Clone for SceneNode {
    fn clone(&self) -> Self {
        Self {
            id: 0,
            kind: self.kind,
            text: self.text.clone(),
            enabled: self.enabled,
            visible: self.visible,
            dismisses: self.dismisses,
            children: self.children.clone(),
        }
    }
}

// Toolkit-assigned ids are not part of a node's description.
impl PartialEq for SceneNode {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.text == other.text
            && self.enabled == other.enabled
            && self.visible == other.visible
            && self.dismisses == other.dismisses
            && self.children == other.children
    }
}

impl Eq for SceneNode {}

/// One popup dialog of a scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneDialog {
    /// Window title
    pub title: String,
    /// Visible flag
    #[serde(default = "yes")]
    pub visible: bool,
    /// Enabled flag
    #[serde(default = "yes")]
    pub enabled: bool,
    /// Focus flag
    #[serde(default = "yes")]
    pub active: bool,
    /// Root widget
    pub content: SceneNode,
}

impl SceneDialog {
    /// Create a visible, enabled, active dialog
    #[must_use]
    pub fn new(title: impl Into<String>, content: SceneNode) -> Self {
        Self {
            title: title.into(),
            visible: true,
            enabled: true,
            active: true,
            content,
        }
    }

    /// Mark as not focused
    #[must_use]
    pub const fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Mark as hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Mark as disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Dialogs open in the application under test, in stacking order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// Open dialogs
    #[serde(default)]
    pub dialogs: Vec<SceneDialog>,
}

impl Scene {
    /// Create an empty scene
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dialog
    #[must_use]
    pub fn with_dialog(mut self, dialog: SceneDialog) -> Self {
        self.dialogs.push(dialog);
        self
    }

    /// Parse a scene from JSON
    pub fn from_json_str(json: &str) -> ProbeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a scene from YAML
    pub fn from_yaml_str(yaml: &str) -> ProbeResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load a scene file; `.yaml`/`.yml` files are YAML, anything else JSON
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }
}

// =============================================================================
// SHARED STATE
// =============================================================================

/// Stable identifier of a dialog inside a [`SceneToolkit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DialogId(u64);

/// A click performed on a scene widget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickRecord {
    /// Title of the dialog the widget belongs to
    pub dialog: String,
    /// Widget text at the time of the click
    pub text: Option<String>,
    /// Name of the thread that performed the click
    pub thread: Option<String>,
}

#[derive(Debug, Default)]
struct SceneState {
    next_id: u64,
    next_node: u64,
    dialogs: Vec<(DialogId, SceneDialog)>,
    clicks: Vec<ClickRecord>,
}

impl SceneState {
    fn dialog(&self, id: DialogId) -> Option<&SceneDialog> {
        self.dialogs.iter().find(|(d, _)| *d == id).map(|(_, d)| d)
    }

    fn open(&mut self, mut dialog: SceneDialog) -> DialogId {
        let id = DialogId(self.next_id);
        self.next_id += 1;
        dialog.content.assign_ids(&mut self.next_node);
        self.dialogs.push((id, dialog));
        id
    }

    /// Mutate a dialog, then give any inserted nodes their own ids
    fn edit<T>(&mut self, id: DialogId, f: impl FnOnce(&mut SceneDialog) -> T) -> Option<T> {
        let Self {
            next_node, dialogs, ..
        } = self;
        let dialog = dialogs
            .iter_mut()
            .find(|(d, _)| *d == id)
            .map(|(_, d)| d)?;
        let out = f(dialog);
        dialog.content.assign_ids(next_node);
        Some(out)
    }
}

type SharedState = Arc<Mutex<SceneState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, SceneState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// TOOLKIT
// =============================================================================

/// [`Toolkit`] backed by an in-memory [`Scene`]
#[derive(Debug)]
pub struct SceneToolkit {
    state: SharedState,
    queue: EventQueue,
}

impl SceneToolkit {
    /// Serve `scene` with a fresh event thread
    pub fn new(scene: Scene) -> ProbeResult<Self> {
        Ok(Self::with_queue(scene, EventQueue::new()?))
    }

    /// Serve `scene` with the given event queue
    #[must_use]
    pub fn with_queue(scene: Scene, queue: EventQueue) -> Self {
        let mut state = SceneState::default();
        for dialog in scene.dialogs {
            state.open(dialog);
        }
        Self {
            state: Arc::new(Mutex::new(state)),
            queue,
        }
    }

    /// Ids of the open dialogs, in stacking order
    #[must_use]
    pub fn dialog_ids(&self) -> Vec<DialogId> {
        lock(&self.state).dialogs.iter().map(|(id, _)| *id).collect()
    }

    /// Open a new dialog on top of the stack
    pub fn open_dialog(&self, dialog: SceneDialog) -> DialogId {
        lock(&self.state).open(dialog)
    }

    /// Close a dialog; returns false if it was not open
    pub fn close_dialog(&self, id: DialogId) -> bool {
        let mut state = lock(&self.state);
        let before = state.dialogs.len();
        state.dialogs.retain(|(d, _)| *d != id);
        state.dialogs.len() != before
    }

    /// Mutate an open dialog; returns false if it was not open
    pub fn update_dialog<F>(&self, id: DialogId, f: F) -> bool
    where
        F: FnOnce(&mut SceneDialog),
    {
        lock(&self.state).edit(id, f).is_some()
    }

    /// Mutate the widget at `path` (child indices from the dialog content)
    pub fn update_node<F>(&self, id: DialogId, path: &[usize], f: F) -> bool
    where
        F: FnOnce(&mut SceneNode),
    {
        lock(&self.state)
            .edit(id, |d| d.content.node_at_mut(path).map(f).is_some())
            .unwrap_or(false)
    }

    /// Clicks performed so far
    #[must_use]
    pub fn clicks(&self) -> Vec<ClickRecord> {
        lock(&self.state).clicks.clone()
    }

    /// Current state as a plain scene
    #[must_use]
    pub fn snapshot(&self) -> Scene {
        Scene {
            dialogs: lock(&self.state)
                .dialogs
                .iter()
                .map(|(_, d)| d.clone())
                .collect(),
        }
    }
}

impl Toolkit for SceneToolkit {
    fn popups(&self) -> Vec<Arc<dyn Dialog>> {
        self.dialog_ids()
            .into_iter()
            .map(|id| {
                Arc::new(SceneDialogHandle {
                    state: Arc::clone(&self.state),
                    id,
                }) as Arc<dyn Dialog>
            })
            .collect()
    }

    fn event_queue(&self) -> &EventQueue {
        &self.queue
    }
}

// =============================================================================
// LIVE HANDLES
// =============================================================================

#[derive(Debug)]
struct SceneDialogHandle {
    state: SharedState,
    id: DialogId,
}

impl SceneDialogHandle {
    fn read<T>(&self, f: impl FnOnce(&SceneDialog) -> T) -> Option<T> {
        lock(&self.state).dialog(self.id).map(f)
    }
}

impl Dialog for SceneDialogHandle {
    fn title(&self) -> String {
        self.read(|d| d.title.clone()).unwrap_or_default()
    }

    fn is_visible(&self) -> bool {
        self.read(|d| d.visible).unwrap_or(false)
    }

    fn is_enabled(&self) -> bool {
        self.read(|d| d.enabled).unwrap_or(false)
    }

    fn is_active(&self) -> bool {
        self.read(|d| d.active).unwrap_or(false)
    }

    fn content(&self) -> Arc<dyn Widget> {
        Arc::new(SceneWidget {
            state: Arc::clone(&self.state),
            dialog: self.id,
            node: self.read(|d| d.content.id).unwrap_or_default(),
        })
    }
}

/// Handle on one node, followed by identity so sibling edits never retarget it
#[derive(Debug)]
struct SceneWidget {
    state: SharedState,
    dialog: DialogId,
    node: u64,
}

impl SceneWidget {
    // A widget whose dialog closed or that was removed reads as absent.
    fn read<T>(&self, f: impl FnOnce(&SceneNode) -> T) -> Option<T> {
        lock(&self.state)
            .dialog(self.dialog)
            .and_then(|d| d.content.find(self.node))
            .map(f)
    }
}

impl Widget for SceneWidget {
    fn kind(&self) -> WidgetKind {
        self.read(|n| n.kind).unwrap_or_default()
    }

    fn text(&self) -> Option<String> {
        self.read(|n| n.text.clone()).flatten()
    }

    fn is_enabled(&self) -> bool {
        self.read(|n| n.enabled).unwrap_or(false)
    }

    fn is_showing(&self) -> bool {
        lock(&self.state)
            .dialog(self.dialog)
            .and_then(|d| {
                d.content
                    .showing(self.node)
                    .map(|showing| showing && d.visible)
            })
            .unwrap_or(false)
    }

    fn children(&self) -> Vec<Arc<dyn Widget>> {
        let ids = self
            .read(|n| n.children.iter().map(|c| c.id).collect::<Vec<_>>())
            .unwrap_or_default();
        ids.into_iter()
            .map(|node| {
                Arc::new(Self {
                    state: Arc::clone(&self.state),
                    dialog: self.dialog,
                    node,
                }) as Arc<dyn Widget>
            })
            .collect()
    }

    fn click(&self) -> ProbeResult<()> {
        let showing = self.is_showing();
        let mut state = lock(&self.state);
        let Some(dialog) = state.dialog(self.dialog) else {
            return Err(ProbeError::action("dialog is no longer open"));
        };
        let Some(node) = dialog.content.find(self.node) else {
            return Err(ProbeError::action("widget is no longer present"));
        };
        if !node.enabled || !showing {
            return Err(ProbeError::action(format!(
                "cannot click {} {:?}: not interactable",
                node.kind,
                node.text.as_deref().unwrap_or_default()
            )));
        }

        let record = ClickRecord {
            dialog: dialog.title.clone(),
            text: node.text.clone(),
            thread: thread::current().name().map(str::to_string),
        };
        let dismisses = node.dismisses;
        state.clicks.push(record);
        if dismisses {
            state.dialogs.retain(|(id, _)| *id != self.dialog);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn confirm_scene() -> Scene {
        Scene::new().with_dialog(SceneDialog::new(
            "Confirm",
            SceneNode::container(vec![
                SceneNode::label("Really quit?"),
                SceneNode::container(vec![
                    SceneNode::button("OK").dismissing(),
                    SceneNode::button("Cancel"),
                ]),
            ]),
        ))
    }

    mod model_tests {
        use super::*;

        #[test]
        fn test_node_defaults_from_json() {
            let node: SceneNode = serde_json::from_str(r#"{"kind":"button","text":"OK"}"#).unwrap();
            assert_eq!(node.kind, WidgetKind::Button);
            assert!(node.enabled);
            assert!(node.visible);
            assert!(!node.dismisses);
            assert!(node.children.is_empty());
        }

        #[test]
        fn test_dialog_defaults_from_yaml() {
            let yaml = "
dialogs:
  - title: Save
    content:
      children:
        - kind: button
          text: Save
          enabled: false
";
            let scene = Scene::from_yaml_str(yaml).unwrap();
            assert_eq!(scene.dialogs.len(), 1);
            let dialog = &scene.dialogs[0];
            assert!(dialog.visible && dialog.enabled && dialog.active);
            assert_eq!(dialog.content.kind, WidgetKind::Container);
            assert!(!dialog.content.children[0].enabled);
        }

        #[test]
        fn test_load_picks_format_from_extension() {
            let dir = tempfile::tempdir().unwrap();
            let json_path = dir.path().join("scene.json");
            let yaml_path = dir.path().join("scene.yml");
            fs::write(&json_path, serde_json::to_string(&confirm_scene()).unwrap()).unwrap();
            fs::write(&yaml_path, serde_yaml_ng::to_string(&confirm_scene()).unwrap()).unwrap();

            assert_eq!(Scene::load(&json_path).unwrap(), confirm_scene());
            assert_eq!(Scene::load(&yaml_path).unwrap(), confirm_scene());
        }

        #[test]
        fn test_load_rejects_garbage() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("scene.json");
            fs::write(&path, "not json").unwrap();
            assert!(matches!(Scene::load(&path), Err(ProbeError::Json(_))));
        }
    }

    mod handle_tests {
        use super::*;
        use crate::locator::find_button;

        fn find_ok(toolkit: &SceneToolkit) -> Arc<dyn Widget> {
            find_button(&toolkit.popups()[0].content(), "OK").unwrap()
        }

        #[test]
        fn test_popups_follow_stacking_order() {
            let toolkit = SceneToolkit::new(
                Scene::new()
                    .with_dialog(SceneDialog::new("first", SceneNode::container(vec![])))
                    .with_dialog(SceneDialog::new("second", SceneNode::container(vec![]))),
            )
            .unwrap();
            let titles: Vec<String> = toolkit.popups().iter().map(|d| d.title()).collect();
            assert_eq!(titles, vec!["first", "second"]);
        }

        #[test]
        fn test_handles_read_live_state() {
            let toolkit = SceneToolkit::new(confirm_scene()).unwrap();
            let id = toolkit.dialog_ids()[0];
            let ok = toolkit.popups()[0].content().children()[1].children()[0].clone();
            assert!(ok.is_enabled());

            assert!(toolkit.update_node(id, &[1, 0], |n| n.enabled = false));
            assert!(!ok.is_enabled());
        }

        #[test]
        fn test_showing_requires_visible_ancestors() {
            let toolkit = SceneToolkit::new(confirm_scene()).unwrap();
            let id = toolkit.dialog_ids()[0];
            let ok = toolkit.popups()[0].content().children()[1].children()[0].clone();
            assert!(ok.is_showing());

            toolkit.update_node(id, &[1], |n| n.visible = false);
            assert!(!ok.is_showing());

            toolkit.update_node(id, &[1], |n| n.visible = true);
            toolkit.update_dialog(id, |d| d.visible = false);
            assert!(!ok.is_showing());
        }

        #[test]
        fn test_handle_survives_sibling_insertion() {
            let toolkit = SceneToolkit::new(confirm_scene()).unwrap();
            let id = toolkit.dialog_ids()[0];
            let ok = find_ok(&toolkit);

            assert!(toolkit.update_node(id, &[1], |n| {
                n.children.insert(0, SceneNode::button("Delete"));
            }));
            assert_eq!(ok.text().as_deref(), Some("OK"));
            ok.click().unwrap();
            assert_eq!(toolkit.clicks()[0].text.as_deref(), Some("OK"));
        }

        #[test]
        fn test_removed_widget_reads_as_absent() {
            let toolkit = SceneToolkit::new(confirm_scene()).unwrap();
            let id = toolkit.dialog_ids()[0];
            let ok = find_ok(&toolkit);

            toolkit.update_node(id, &[1], |n| {
                n.children.remove(0);
            });
            assert_eq!(ok.text(), None);
            assert!(!ok.is_enabled());
            assert!(!ok.is_showing());
            assert!(matches!(ok.click(), Err(ProbeError::ActionFailed { .. })));
            assert!(toolkit.clicks().is_empty());
        }

        #[test]
        fn test_cloned_node_gets_its_own_identity() {
            let toolkit = SceneToolkit::new(confirm_scene()).unwrap();
            let id = toolkit.dialog_ids()[0];
            let ok = find_ok(&toolkit);

            toolkit.update_node(id, &[1], |n| {
                let mut copy = n.children[0].clone();
                copy.enabled = false;
                n.children.insert(0, copy);
            });
            assert!(ok.is_enabled());
            let buttons = toolkit.popups()[0].content().children()[1].children();
            assert!(!buttons[0].is_enabled());
        }

        #[test]
        fn test_closed_dialog_reads_as_absent() {
            let toolkit = SceneToolkit::new(confirm_scene()).unwrap();
            let dialog = toolkit.popups()[0].clone();
            let root = dialog.content();
            assert!(toolkit.close_dialog(toolkit.dialog_ids()[0]));

            assert!(!dialog.is_visible());
            assert!(dialog.title().is_empty());
            assert!(root.children().is_empty());
            assert!(!root.is_enabled());
            assert!(root.click().is_err());
        }
    }

    mod click_tests {
        use super::*;

        #[test]
        fn test_click_records_and_dismisses() {
            let toolkit = SceneToolkit::new(confirm_scene()).unwrap();
            let ok = toolkit.popups()[0].content().children()[1].children()[0].clone();
            ok.click().unwrap();

            let clicks = toolkit.clicks();
            assert_eq!(clicks.len(), 1);
            assert_eq!(clicks[0].dialog, "Confirm");
            assert_eq!(clicks[0].text.as_deref(), Some("OK"));
            assert!(toolkit.popups().is_empty());
        }

        #[test]
        fn test_click_without_dismiss_keeps_dialog() {
            let toolkit = SceneToolkit::new(confirm_scene()).unwrap();
            let cancel = toolkit.popups()[0].content().children()[1].children()[1].clone();
            cancel.click().unwrap();
            assert_eq!(toolkit.popups().len(), 1);
        }

        #[test]
        fn test_click_disabled_fails() {
            let toolkit = SceneToolkit::new(confirm_scene()).unwrap();
            let id = toolkit.dialog_ids()[0];
            toolkit.update_node(id, &[1, 1], |n| n.enabled = false);
            let cancel = toolkit.popups()[0].content().children()[1].children()[1].clone();
            assert!(matches!(
                cancel.click(),
                Err(ProbeError::ActionFailed { .. })
            ));
            assert!(toolkit.clicks().is_empty());
        }

        #[test]
        fn test_snapshot_reflects_mutations() {
            let toolkit = SceneToolkit::new(confirm_scene()).unwrap();
            toolkit.open_dialog(SceneDialog::new("Late", SceneNode::button("Go")));
            let snapshot = toolkit.snapshot();
            assert_eq!(snapshot.dialogs.len(), 2);
            assert_eq!(snapshot.dialogs[1].title, "Late");
        }
    }
}
