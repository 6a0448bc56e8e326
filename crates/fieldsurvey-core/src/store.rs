//! Form store contract and in-memory implementation
//!
//! The export engine only reads `Form` snapshots. This module provides the
//! collaborator that produces them: CRUD over forms and their entries with
//! the timestamp rules the rest of the system relies on.
//!
//! - `createdAt` is set once and never changes
//! - `updatedAt` strictly advances on every metadata or entry mutation
//! - ids are unique (forms globally, entries within their form)
//! - entries keep insertion order

use chrono::{DateTime, Duration, Utc};

use crate::{EntryDraft, EntryPatch, Form, FormEntry, FormPatch, NewForm, StoreError};

/// CRUD operations over forms and entries
pub trait FormStore {
    /// All forms in creation order
    fn list_forms(&self) -> Vec<Form>;

    /// Get a form by ID
    fn get_form(&self, id: &str) -> Option<Form>;

    /// Create an empty form and return it
    fn create_form(&mut self, draft: NewForm) -> Form;

    /// Overlay metadata changes and return the updated form
    fn update_form_metadata(&mut self, id: &str, patch: FormPatch) -> Result<Form, StoreError>;

    /// Remove a form and all its entries
    fn delete_form(&mut self, id: &str) -> Result<(), StoreError>;

    /// Append an entry and return it
    fn add_entry(&mut self, form_id: &str, draft: EntryDraft) -> Result<FormEntry, StoreError>;

    /// Overlay entry changes and return the updated entry
    fn update_entry(
        &mut self,
        form_id: &str,
        entry_id: &str,
        patch: EntryPatch,
    ) -> Result<FormEntry, StoreError>;

    /// Remove one entry
    fn delete_entry(&mut self, form_id: &str, entry_id: &str) -> Result<(), StoreError>;
}

/// Vec-backed store
#[derive(Clone, Debug, Default)]
pub struct MemoryFormStore {
    forms: Vec<Form>,
}

impl MemoryFormStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap previously persisted forms
    pub fn from_forms(forms: Vec<Form>) -> Self {
        Self { forms }
    }

    /// Borrow the forms for persistence
    pub fn forms(&self) -> &[Form] {
        &self.forms
    }

    pub fn into_forms(self) -> Vec<Form> {
        self.forms
    }

    fn form_mut(&mut self, id: &str) -> Result<&mut Form, StoreError> {
        self.forms
            .iter_mut()
            .find(|f| f.metadata.id == id)
            .ok_or_else(|| StoreError::FormNotFound(id.to_string()))
    }

    fn next_form_id(&self, now: DateTime<Utc>) -> String {
        unique_id("form", now, |candidate| {
            self.forms.iter().any(|f| f.metadata.id == candidate)
        })
    }
}

impl FormStore for MemoryFormStore {
    fn list_forms(&self) -> Vec<Form> {
        self.forms.clone()
    }

    fn get_form(&self, id: &str) -> Option<Form> {
        self.forms.iter().find(|f| f.metadata.id == id).cloned()
    }

    fn create_form(&mut self, draft: NewForm) -> Form {
        let now = Utc::now();
        let id = self.next_form_id(now);
        let form = Form::from_draft(id, draft, now);
        self.forms.push(form.clone());
        form
    }

    fn update_form_metadata(&mut self, id: &str, patch: FormPatch) -> Result<Form, StoreError> {
        let form = self.form_mut(id)?;
        patch.apply_to(&mut form.metadata);
        touch(form);
        Ok(form.clone())
    }

    fn delete_form(&mut self, id: &str) -> Result<(), StoreError> {
        let before = self.forms.len();
        self.forms.retain(|f| f.metadata.id != id);
        if self.forms.len() == before {
            return Err(StoreError::FormNotFound(id.to_string()));
        }
        Ok(())
    }

    fn add_entry(&mut self, form_id: &str, draft: EntryDraft) -> Result<FormEntry, StoreError> {
        let form = self.form_mut(form_id)?;
        let now = Utc::now();
        let id = unique_id("entry", now, |candidate| {
            form.entries.iter().any(|e| e.id == candidate)
        });
        let entry = FormEntry::from_draft(id, draft, now);
        form.entries.push(entry.clone());
        touch(form);
        Ok(entry)
    }

    fn update_entry(
        &mut self,
        form_id: &str,
        entry_id: &str,
        patch: EntryPatch,
    ) -> Result<FormEntry, StoreError> {
        let form = self.form_mut(form_id)?;
        let entry = form
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or_else(|| StoreError::EntryNotFound {
                form_id: form_id.to_string(),
                entry_id: entry_id.to_string(),
            })?;
        patch.apply_to(entry);
        let updated = entry.clone();
        touch(form);
        Ok(updated)
    }

    fn delete_entry(&mut self, form_id: &str, entry_id: &str) -> Result<(), StoreError> {
        let form = self.form_mut(form_id)?;
        let before = form.entries.len();
        form.entries.retain(|e| e.id != entry_id);
        if form.entries.len() == before {
            return Err(StoreError::EntryNotFound {
                form_id: form_id.to_string(),
                entry_id: entry_id.to_string(),
            });
        }
        touch(form);
        Ok(())
    }
}

/// Advance `updatedAt`, even when the clock has not moved since the last write
fn touch(form: &mut Form) {
    let now = Utc::now();
    let previous = form.metadata.updated_at;
    form.metadata.updated_at = if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    };
}

/// `{prefix}-{millis}`, bumped until `taken` rejects it
fn unique_id(prefix: &str, now: DateTime<Utc>, taken: impl Fn(&str) -> bool) -> String {
    let mut stamp = now.timestamp_millis();
    loop {
        let candidate = format!("{prefix}-{stamp}");
        if !taken(&candidate) {
            return candidate;
        }
        stamp += 1;
    }
}
