//! Save / open workflows over the host's file bridge.
//!
//! Every workflow either completes or leaves the engine exactly as it was;
//! a [`WorkspaceError`] is what the host shows in its blocking dialog.
//! Malformed workspace text is not an error: it opens as an empty
//! workspace (see `nc_core::load_or_default`).

use crate::engine::BoardEngine;
use chrono::{DateTime, Utc};
use nc_core::load_or_default;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Suggested name in the save dialog.
pub const DEFAULT_FILE_NAME: &str = "workspace.json";

/// Result of a save dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveDialogResult {
    pub canceled: bool,
    pub file_path: Option<PathBuf>,
}

/// Result of an open dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenDialogResult {
    pub canceled: bool,
    pub file_paths: Vec<PathBuf>,
}

/// Host process services: native dialogs, file access and the
/// last-opened-file record.
pub trait FileBridge {
    fn show_save_dialog(&mut self, default_name: &str) -> Result<SaveDialogResult, String>;
    fn show_open_dialog(&mut self) -> Result<OpenDialogResult, String>;
    fn read_file(&mut self, path: &Path) -> Result<String, String>;
    fn write_file(&mut self, path: &Path, contents: &str) -> Result<(), String>;
    fn last_opened_path(&mut self) -> Option<PathBuf>;
    fn set_last_opened_path(&mut self, path: &Path);
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("File dialog failed: {0}")]
    Dialog(String),

    #[error("Could not read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("Could not write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },

    #[error("Could not serialize workspace: {0}")]
    Serialize(String),
}

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened(PathBuf),
    Canceled,
    /// No last-opened file is recorded.
    NothingToOpen,
}

/// The file the board is bound to, if any.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceFile {
    path: Option<PathBuf>,
}

impl WorkspaceFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Save to the bound file, or ask for one first.
    pub fn save(
        &mut self,
        bridge: &mut dyn FileBridge,
        engine: &mut BoardEngine,
        now: DateTime<Utc>,
    ) -> WorkspaceResult<SaveOutcome> {
        match self.path.clone() {
            Some(path) => {
                write_workspace(bridge, engine, &path, now)?;
                Ok(SaveOutcome::Saved(path))
            }
            None => self.save_as(bridge, engine, now),
        }
    }

    /// Ask for a file, then save there and bind to it.
    pub fn save_as(
        &mut self,
        bridge: &mut dyn FileBridge,
        engine: &mut BoardEngine,
        now: DateTime<Utc>,
    ) -> WorkspaceResult<SaveOutcome> {
        let result = bridge
            .show_save_dialog(DEFAULT_FILE_NAME)
            .map_err(WorkspaceError::Dialog)?;
        let path = match result.file_path {
            Some(path) if !result.canceled => path,
            _ => return Ok(SaveOutcome::Canceled),
        };
        write_workspace(bridge, engine, &path, now)?;
        bridge.set_last_opened_path(&path);
        self.path = Some(path.clone());
        Ok(SaveOutcome::Saved(path))
    }

    /// Ask for a file and load it.
    pub fn open(
        &mut self,
        bridge: &mut dyn FileBridge,
        engine: &mut BoardEngine,
        now: DateTime<Utc>,
    ) -> WorkspaceResult<OpenOutcome> {
        let result = bridge.show_open_dialog().map_err(WorkspaceError::Dialog)?;
        let path = match result.file_paths.into_iter().next() {
            Some(path) if !result.canceled => path,
            _ => return Ok(OpenOutcome::Canceled),
        };
        self.load_from(bridge, engine, path, now)
    }

    /// Reopen the file recorded by the last open/save-as.
    pub fn open_last(
        &mut self,
        bridge: &mut dyn FileBridge,
        engine: &mut BoardEngine,
        now: DateTime<Utc>,
    ) -> WorkspaceResult<OpenOutcome> {
        let Some(path) = bridge.last_opened_path() else {
            return Ok(OpenOutcome::NothingToOpen);
        };
        self.load_from(bridge, engine, path, now)
    }

    fn load_from(
        &mut self,
        bridge: &mut dyn FileBridge,
        engine: &mut BoardEngine,
        path: PathBuf,
        now: DateTime<Utc>,
    ) -> WorkspaceResult<OpenOutcome> {
        let text = bridge.read_file(&path).map_err(|message| WorkspaceError::Read {
            path: path.clone(),
            message,
        })?;
        engine.load(load_or_default(&text, now));
        bridge.set_last_opened_path(&path);
        log::debug!("opened {}", path.display());
        self.path = Some(path.clone());
        Ok(OpenOutcome::Opened(path))
    }
}

fn write_workspace(
    bridge: &mut dyn FileBridge,
    engine: &mut BoardEngine,
    path: &Path,
    now: DateTime<Utc>,
) -> WorkspaceResult<()> {
    let json = engine
        .to_workspace(now)
        .to_json()
        .map_err(WorkspaceError::Serialize)?;
    bridge
        .write_file(path, &json)
        .map_err(|message| WorkspaceError::Write {
            path: path.to_path_buf(),
            message,
        })?;
    engine.mark_saved();
    log::debug!("saved {}", path.display());
    Ok(())
}
