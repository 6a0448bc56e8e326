//! JSON file persistence for the form store

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fieldsurvey_core::{Form, MemoryFormStore, StoreError};

/// A [`MemoryFormStore`] loaded from, and saved back to, one JSON file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    pub forms: MemoryFormStore,
}

impl JsonFileStore {
    /// Load the store; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let forms = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => Vec::new(),
            Ok(text) => serde_json::from_str::<Vec<Form>>(&text)
                .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), forms = forms.len(), "store loaded");
        Ok(Self {
            path,
            forms: MemoryFormStore::from_forms(forms),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write all forms back to disk
    pub fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(self.forms.forms())
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), "store saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldsurvey_core::{EntryDraft, FormStore, NewForm};

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("forms.json")).unwrap();
        assert!(store.forms.forms().is_empty());
    }

    #[test]
    fn save_then_open_keeps_forms() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("forms.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        let form = store.forms.create_form(NewForm {
            name: "早班".into(),
            ..NewForm::default()
        });
        store
            .forms
            .add_entry(&form.metadata.id, EntryDraft::new("1234").notes("z"))
            .unwrap();
        store.save().unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.forms.forms(), store.forms.forms());
    }

    #[test]
    fn garbage_is_reported_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forms.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(StoreError::Corrupt(_))
        ));
    }
}
