//! Progress reporting and persistence.
//!
//! The engine reports completions through [`LessonListener`]. Storage itself
//! belongs to the host; [`StoreListener`] adapts any [`ProgressStore`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::LessonError;

/// Resumable position in a lesson.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonProgress {
    pub lesson_id: String,
    pub current_step_index: usize,
    /// Completed step ids in lesson order.
    pub completed_steps: Vec<String>,
}

/// Callbacks raised by the lesson engine.
pub trait LessonListener {
    /// A step passed validation and was marked complete.
    fn on_step_complete(&mut self, _step_id: &str, _progress: &LessonProgress) {}

    /// Every step of the lesson is complete.
    fn on_lesson_complete(&mut self, _progress: &LessonProgress) {}
}

/// Narrow key-value store for serialized progress.
pub trait ProgressStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
}

/// In-memory store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl ProgressStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries.borrow_mut().insert(key.to_string(), value);
    }
}

/// Store keeping one JSON file per key in a directory.
///
/// Characters outside `[A-Za-z0-9_-]` in keys are replaced so every key maps
/// to a plain file name.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl ProgressStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: String) {
        let path = self.path_for(key);
        if let Err(e) = fs::create_dir_all(&self.dir).and_then(|_| fs::write(&path, value)) {
            log::warn!("Failed to write progress to {}: {}", path.display(), e);
        }
    }
}

/// Storage key for a user's progress in one lesson.
pub fn progress_key(user_id: Option<&str>, lesson_id: &str) -> String {
    format!("tutor-progress-{}-{}", user_id.unwrap_or("anonymous"), lesson_id)
}

/// Writes progress as JSON to a store after every completion.
#[derive(Debug, Clone)]
pub struct StoreListener<S: ProgressStore> {
    store: S,
    key: String,
}

impl<S: ProgressStore> StoreListener<S> {
    pub fn new(store: S, user_id: Option<&str>, lesson_id: &str) -> Self {
        Self {
            store,
            key: progress_key(user_id, lesson_id),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read previously saved progress, if any.
    pub fn load(&self) -> Result<Option<LessonProgress>, LessonError> {
        match self.store.get(&self.key) {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, progress: &LessonProgress) {
        match serde_json::to_string(progress) {
            Ok(json) => self.store.set(&self.key, json),
            Err(e) => log::warn!("Failed to serialize progress for {}: {}", self.key, e),
        }
    }
}

impl<S: ProgressStore> LessonListener for StoreListener<S> {
    fn on_step_complete(&mut self, step_id: &str, progress: &LessonProgress) {
        log::debug!("Saving progress after step '{}' under {}", step_id, self.key);
        self.save(progress);
    }

    fn on_lesson_complete(&mut self, progress: &LessonProgress) {
        self.save(progress);
    }
}
