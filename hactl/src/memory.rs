//! Local memory store: free-form notes and synced snapshots kept under an
//! explicit root directory.
//!
//! LAYOUT
//! ======
//! ```text
//! <root>/sensors/notes.json        id -> [{note, timestamp}, ..]
//! <root>/devices/devices.json      written by `memory sync`
//! <root>/services/service_capabilities.csv
//! <root>/context/*.md              hand-edited
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::CliError;
use crate::output::write_csv;

/// Directories shown by `memory list`, in display order.
pub const LISTED_DIRS: [&str; 5] = ["sensors", "devices", "automations", "dashboards", "context"];

const NEW_FILE_HEADER: &str = "# Memory File\n\n";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Category {
    Sensor,
    Device,
    Automation,
    Dashboard,
}

impl Category {
    #[must_use]
    pub fn dir(self) -> &'static str {
        match self {
            Self::Sensor => "sensors",
            Self::Device => "devices",
            Self::Automation => "automations",
            Self::Dashboard => "dashboards",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub note: String,
    pub timestamp: String,
}

pub type Notes = BTreeMap<String, Vec<Note>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirListing {
    pub name: &'static str,
    /// `None` when the directory does not exist.
    pub files: Option<Vec<(String, u64)>>,
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    root: PathBuf,
}

impl MemoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn notes_path(&self, category: Category) -> PathBuf {
        self.root.join(category.dir()).join("notes.json")
    }

    /// Every note in a category; empty when nothing was recorded yet.
    pub fn notes(&self, category: Category) -> Result<Notes, CliError> {
        let path = self.notes_path(category);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Notes::new()),
            Err(error) => Err(CliError::io(format!("read {}", path.display()), error)),
        }
    }

    /// Append a note for `item_id`, stamped with the local time.
    pub fn add_note(&self, category: Category, item_id: &str, note: &str) -> Result<Note, CliError> {
        let mut notes = self.notes(category)?;
        let entry = Note { note: note.to_owned(), timestamp: chrono::Local::now().to_rfc3339() };
        notes.entry(item_id.to_owned()).or_default().push(entry.clone());
        self.write_json(&format!("{}/notes.json", category.dir()), &notes)?;
        Ok(entry)
    }

    /// Resolve a path relative to the root, rejecting absolute paths and `..`.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, CliError> {
        let path = Path::new(relative);
        let inside = path.components().all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if relative.trim().is_empty() || !inside {
            return Err(CliError::InvalidMemoryPath(relative.to_owned()));
        }
        Ok(self.root.join(path))
    }

    /// Resolve `relative`, creating it with a stub header when missing.
    /// Returns the path and whether it was created.
    pub fn ensure_file(&self, relative: &str) -> Result<(PathBuf, bool), CliError> {
        let path = self.resolve(relative)?;
        if path.exists() {
            return Ok((path, false));
        }
        self.write_file(&path, NEW_FILE_HEADER.as_bytes())?;
        Ok((path, true))
    }

    pub fn write_json<T: Serialize + ?Sized>(&self, relative: &str, value: &T) -> Result<PathBuf, CliError> {
        let path = self.resolve(relative)?;
        let mut rendered = serde_json::to_vec_pretty(value)?;
        rendered.push(b'\n');
        self.write_file(&path, &rendered)?;
        Ok(path)
    }

    pub fn write_csv<R, I>(&self, relative: &str, header: &[&str], rows: R) -> Result<PathBuf, CliError>
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let path = self.resolve(relative)?;
        let mut buffer = Vec::new();
        write_csv(&mut buffer, header, rows)?;
        self.write_file(&path, &buffer)?;
        Ok(path)
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), CliError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|error| CliError::io(format!("create {}", parent.display()), error))?;
        }
        fs::write(path, contents).map_err(|error| CliError::io(format!("write {}", path.display()), error))?;
        tracing::debug!(path = %path.display(), bytes = contents.len(), "memory file written");
        Ok(())
    }

    /// Files and sizes of each listed directory, sorted by name.
    pub fn listing(&self) -> Result<Vec<DirListing>, CliError> {
        LISTED_DIRS
            .iter()
            .map(|&name| {
                let dir = self.root.join(name);
                if !dir.is_dir() {
                    return Ok(DirListing { name, files: None });
                }
                let read_err = |error| CliError::io(format!("list {}", dir.display()), error);
                let mut files = Vec::new();
                for entry in fs::read_dir(&dir).map_err(read_err)? {
                    let entry = entry.map_err(read_err)?;
                    let size = entry.metadata().map_err(read_err)?.len();
                    files.push((entry.file_name().to_string_lossy().into_owned(), size));
                }
                files.sort();
                Ok(DirListing { name, files: Some(files) })
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
