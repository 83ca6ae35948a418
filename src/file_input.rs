//! Cosmetic state of the CSV file picker.

use crate::model::{Locale, Message};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FileSelection {
    #[default]
    Empty,
    Selected(PathBuf),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileControl {
    selection: FileSelection,
}

/// How the picker is drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileControlView {
    /// File name when selected, placeholder text otherwise.
    pub text: String,
    pub placeholder_visible: bool,
    pub clear_visible: bool,
    pub has_selection: bool,
}

impl FileControl {
    pub fn select(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if path.as_os_str().is_empty() {
            self.clear();
        } else {
            self.selection = FileSelection::Selected(path);
        }
    }

    /// Reset to empty. Never opens the picker.
    pub fn clear(&mut self) {
        self.selection = FileSelection::Empty;
    }

    pub fn selected(&self) -> Option<&Path> {
        match &self.selection {
            FileSelection::Empty => None,
            FileSelection::Selected(p) => Some(p.as_path()),
        }
    }

    pub fn view(&self, locale: Locale) -> FileControlView {
        match self.selected() {
            Some(path) => FileControlView {
                text: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
                placeholder_visible: false,
                clear_visible: true,
                has_selection: true,
            },
            None => FileControlView {
                text: locale.message(Message::FilePlaceholder).to_string(),
                placeholder_visible: true,
                clear_visible: false,
                has_selection: false,
            },
        }
    }
}
