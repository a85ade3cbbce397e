//! Download items and their lifecycle status.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Longest sanitized path component, in characters.
const COMPONENT_MAX: usize = 200;

/// One unit of work: a lesson's video or material file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadItem {
    /// Stable identity used by the ledger (e.g. `course|module|lesson`).
    pub key: String,
    /// Source URL.
    pub url: String,
    /// Destination relative to the base directory.
    pub destination: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemError {
    #[error("item key is empty")]
    EmptyKey,
    #[error("item {key}: destination is empty")]
    EmptyDestination { key: String },
    #[error("item {key}: destination {path} must be relative and stay under the base directory")]
    EscapingDestination { key: String, path: String },
}

impl DownloadItem {
    pub fn new(key: impl Into<String>, url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
            destination: destination.into(),
        }
    }

    /// Item for a lesson file laid out as
    /// `Course/NN - Module/NN - Lesson/NN - Lesson.ext`, keyed `course|module|NN - Lesson`.
    ///
    /// Indices are 1-based positions within the course outline.
    pub fn lesson(
        course: &str,
        module_index: usize,
        module: &str,
        lesson_index: usize,
        lesson: &str,
        extension: &str,
        url: impl Into<String>,
    ) -> Self {
        let module_dir = safe_component(&format!("{:02} - {}", module_index, module));
        let lesson_base = safe_component(&format!("{:02} - {}", lesson_index, lesson));
        let extension = extension.trim_start_matches('.');
        let file_name = if extension.is_empty() {
            lesson_base.clone()
        } else {
            format!("{}.{}", lesson_base, extension)
        };
        let destination = PathBuf::from(safe_component(course))
            .join(module_dir)
            .join(&lesson_base)
            .join(file_name);
        Self {
            key: format!("{}|{}|{}", course, module, lesson_base),
            url: url.into(),
            destination,
        }
    }

    /// Rejects empty keys and destinations that would escape the base directory.
    pub fn validate(&self) -> Result<(), ItemError> {
        if self.key.trim().is_empty() {
            return Err(ItemError::EmptyKey);
        }
        if self.destination.as_os_str().is_empty() {
            return Err(ItemError::EmptyDestination {
                key: self.key.clone(),
            });
        }
        if !is_contained(&self.destination) {
            return Err(ItemError::EscapingDestination {
                key: self.key.clone(),
                path: self.destination.display().to_string(),
            });
        }
        Ok(())
    }

    /// Destination with `.` components dropped, so `a/./b` and `a/b` compare equal.
    pub fn normalized_destination(&self) -> PathBuf {
        self.destination
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    }

    /// Absolute (or base-relative) path the file is written to.
    pub fn resolve(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.destination)
    }
}

fn is_contained(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Sanitizes one path component: keeps alphanumerics, space, `_`, `-` and `–`,
/// replaces everything else with `_`, trims surrounding whitespace and caps
/// the length at 200 characters.
pub fn safe_component(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '_' | '-' | '–') {
                c
            } else {
                '_'
            }
        })
        .take(COMPONENT_MAX)
        .collect();
    replaced.trim().to_string()
}

/// Lifecycle of one item as recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Pending,
    InProgress,
    Succeeded,
    Failed(String),
    Skipped,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::InProgress => "in_progress",
            ItemStatus::Succeeded => "succeeded",
            ItemStatus::Failed(_) => "failed",
            ItemStatus::Skipped => "skipped",
        }
    }

    /// Rebuild a status from its ledger columns. Unknown names yield `None`.
    pub fn from_parts(status: &str, detail: &str) -> Option<Self> {
        Some(match status {
            "pending" => ItemStatus::Pending,
            "in_progress" => ItemStatus::InProgress,
            "succeeded" => ItemStatus::Succeeded,
            "failed" => ItemStatus::Failed(detail.to_string()),
            "skipped" => ItemStatus::Skipped,
            _ => return None,
        })
    }

    /// The item's file is expected on disk.
    pub fn is_done(&self) -> bool {
        matches!(self, ItemStatus::Succeeded | ItemStatus::Skipped)
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
