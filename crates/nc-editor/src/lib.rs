//! Interaction layer for notecanvas: input normalisation, drag tools, the
//! inline-edit state machine, the board engine and file workflows.

pub mod editing;
pub mod engine;
pub mod input;
pub mod persist;
pub mod prefs;
pub mod shortcuts;
pub mod tools;

pub use editing::{EditController, EditSession, EditState, KeyOutcome};
pub use engine::{Applied, BoardEngine, BoardMutation};
pub use input::{InputEvent, Modifiers};
pub use persist::{FileBridge, OpenOutcome, SaveOutcome, WorkspaceError, WorkspaceFile};
pub use prefs::{MemoryPreferences, PreferenceStore, SidebarConfig};
pub use shortcuts::{ShortcutAction, ShortcutMap, apply_view_action};
pub use tools::{CanvasFrame, Interaction, Tool, ToolKind};
