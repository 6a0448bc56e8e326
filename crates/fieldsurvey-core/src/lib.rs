//! # fieldsurvey-core
//!
//! Core domain model and traits for the fieldsurvey export engine.
//!
//! This crate provides:
//! - Domain types: `Form`, `FormMetadata`, `FormEntry`, `Observation`
//! - Store input types: `NewForm`, `FormPatch`, `EntryDraft`, `EntryPatch`
//! - Core traits: `Exporter`, `FormStore`
//! - Error types
//!
//! ## Example
//!
//! ```rust
//! use fieldsurvey_core::{EntryDraft, FormStore, MemoryFormStore, NewForm, Observation};
//!
//! let mut store = MemoryFormStore::new();
//! let form = store.create_form(NewForm {
//!     name: "Morning round".into(),
//!     city_name: "Shenzhen".into(),
//!     survey_date: "2024-05-20".into(),
//!     branch_code: "755A".into(),
//!     area_type: "residential".into(),
//!     courier_code: "C0192".into(),
//! });
//!
//! let entry = store
//!     .add_entry(
//!         &form.metadata.id,
//!         EntryDraft::new("8X21").observe(Observation::AddressDelivered, true),
//!     )
//!     .unwrap();
//! assert!(entry.observation(Observation::AddressDelivered));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub mod store;

pub use store::{FormStore, MemoryFormStore};

// ============================================================================
// Type Aliases
// ============================================================================

/// Unique identifier for a form
pub type FormId = String;

/// Identifier for an entry, unique within its owning form
pub type EntryId = String;

// ============================================================================
// Form
// ============================================================================

/// Survey session metadata
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormMetadata {
    /// Unique identifier
    pub id: FormId,
    /// Display name, may be empty
    pub name: String,
    /// City where the survey took place
    pub city_name: String,
    /// Survey date as an ISO date string (kept verbatim)
    pub survey_date: String,
    /// Branch (outlet) code
    pub branch_code: String,
    /// Area type, e.g. industrial or residential
    pub area_type: String,
    /// Courier staff code
    pub courier_code: String,
    /// Set once at creation; the Unix epoch when absent from input
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    /// Advances on every metadata or entry mutation
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

/// A survey session with its ordered entries
///
/// Entry order is insertion order and is the export row order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    #[serde(flatten)]
    pub metadata: FormMetadata,
    #[serde(default)]
    pub entries: Vec<FormEntry>,
}

impl Form {
    /// Create an empty form from a draft
    pub fn from_draft(id: impl Into<FormId>, draft: NewForm, now: DateTime<Utc>) -> Self {
        Self {
            metadata: FormMetadata {
                id: id.into(),
                name: draft.name,
                city_name: draft.city_name,
                survey_date: draft.survey_date,
                branch_code: draft.branch_code,
                area_type: draft.area_type,
                courier_code: draft.courier_code,
                created_at: now,
                updated_at: now,
            },
            entries: Vec::new(),
        }
    }

    /// Get an entry by ID
    pub fn get_entry(&self, id: &str) -> Option<&FormEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Whether the form has no entries yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Entry
// ============================================================================

/// One inspected package within a form
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormEntry {
    /// Identifier, unique within the owning form
    pub id: EntryId,
    /// Last four characters of the tracking number
    pub tracking_number_last_four: String,
    pub address_delivered: bool,
    pub third_party_delivery: bool,
    pub customer_interaction: bool,
    pub customer_interaction_sending: bool,
    pub customer_interaction_return: bool,
    /// Free-text notes; `null` reads as empty
    #[serde(default, deserialize_with = "null_as_empty")]
    pub notes: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl FormEntry {
    /// Create an entry with every observation false and no notes
    pub fn new(id: impl Into<EntryId>, tracking_number_last_four: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tracking_number_last_four: tracking_number_last_four.into(),
            address_delivered: false,
            third_party_delivery: false,
            customer_interaction: false,
            customer_interaction_sending: false,
            customer_interaction_return: false,
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Create an entry from a draft
    pub fn from_draft(id: impl Into<EntryId>, draft: EntryDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            tracking_number_last_four: draft.tracking_number_last_four,
            address_delivered: draft.address_delivered,
            third_party_delivery: draft.third_party_delivery,
            customer_interaction: draft.customer_interaction,
            customer_interaction_sending: draft.customer_interaction_sending,
            customer_interaction_return: draft.customer_interaction_return,
            notes: draft.notes,
            created_at: now,
        }
    }

    /// Set one observation
    pub fn observe(mut self, observation: Observation, value: bool) -> Self {
        self.set_observation(observation, value);
        self
    }

    /// Set the notes
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Read one observation
    pub fn observation(&self, observation: Observation) -> bool {
        match observation {
            Observation::AddressDelivered => self.address_delivered,
            Observation::ThirdPartyDelivery => self.third_party_delivery,
            Observation::CustomerInteraction => self.customer_interaction,
            Observation::CustomerInteractionSending => self.customer_interaction_sending,
            Observation::CustomerInteractionReturn => self.customer_interaction_return,
        }
    }

    pub fn set_observation(&mut self, observation: Observation, value: bool) {
        let slot = match observation {
            Observation::AddressDelivered => &mut self.address_delivered,
            Observation::ThirdPartyDelivery => &mut self.third_party_delivery,
            Observation::CustomerInteraction => &mut self.customer_interaction,
            Observation::CustomerInteractionSending => &mut self.customer_interaction_sending,
            Observation::CustomerInteractionReturn => &mut self.customer_interaction_return,
        };
        *slot = value;
    }
}

/// The five yes/no questions recorded per entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Observation {
    /// Delivered to the order address
    AddressDelivered,
    /// Delivery address is a third party (locker, shop, pickup point)
    ThirdPartyDelivery,
    /// The courier met the customer in person
    CustomerInteraction,
    /// The customer handed over a package to send
    CustomerInteractionSending,
    /// Customer interaction on a phone-requested return
    CustomerInteractionReturn,
}

impl Observation {
    /// All observations in export column order
    pub const ALL: [Observation; 5] = [
        Observation::AddressDelivered,
        Observation::ThirdPartyDelivery,
        Observation::CustomerInteraction,
        Observation::CustomerInteractionSending,
        Observation::CustomerInteractionReturn,
    ];

    /// JSON field name on `FormEntry`
    pub const fn field_name(self) -> &'static str {
        match self {
            Observation::AddressDelivered => "addressDelivered",
            Observation::ThirdPartyDelivery => "thirdPartyDelivery",
            Observation::CustomerInteraction => "customerInteraction",
            Observation::CustomerInteractionSending => "customerInteractionSending",
            Observation::CustomerInteractionReturn => "customerInteractionReturn",
        }
    }
}

impl std::fmt::Display for Observation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

// ============================================================================
// Store Inputs
// ============================================================================

/// Metadata for a form that does not exist yet
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewForm {
    pub name: String,
    pub city_name: String,
    pub survey_date: String,
    pub branch_code: String,
    pub area_type: String,
    pub courier_code: String,
}

/// Partial metadata update; `None` leaves a field unchanged
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormPatch {
    pub name: Option<String>,
    pub city_name: Option<String>,
    pub survey_date: Option<String>,
    pub branch_code: Option<String>,
    pub area_type: Option<String>,
    pub courier_code: Option<String>,
}

impl FormPatch {
    /// Whether the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.city_name.is_none()
            && self.survey_date.is_none()
            && self.branch_code.is_none()
            && self.area_type.is_none()
            && self.courier_code.is_none()
    }

    /// Overlay the patch onto existing metadata
    pub fn apply_to(self, metadata: &mut FormMetadata) {
        if let Some(v) = self.name {
            metadata.name = v;
        }
        if let Some(v) = self.city_name {
            metadata.city_name = v;
        }
        if let Some(v) = self.survey_date {
            metadata.survey_date = v;
        }
        if let Some(v) = self.branch_code {
            metadata.branch_code = v;
        }
        if let Some(v) = self.area_type {
            metadata.area_type = v;
        }
        if let Some(v) = self.courier_code {
            metadata.courier_code = v;
        }
    }
}

/// Entry content without store-assigned fields
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDraft {
    pub tracking_number_last_four: String,
    pub address_delivered: bool,
    pub third_party_delivery: bool,
    pub customer_interaction: bool,
    pub customer_interaction_sending: bool,
    pub customer_interaction_return: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub notes: String,
}

impl EntryDraft {
    pub fn new(tracking_number_last_four: impl Into<String>) -> Self {
        Self {
            tracking_number_last_four: tracking_number_last_four.into(),
            ..Self::default()
        }
    }

    /// Set one observation
    pub fn observe(mut self, observation: Observation, value: bool) -> Self {
        let slot = match observation {
            Observation::AddressDelivered => &mut self.address_delivered,
            Observation::ThirdPartyDelivery => &mut self.third_party_delivery,
            Observation::CustomerInteraction => &mut self.customer_interaction,
            Observation::CustomerInteractionSending => &mut self.customer_interaction_sending,
            Observation::CustomerInteractionReturn => &mut self.customer_interaction_return,
        };
        *slot = value;
        self
    }

    /// Set the notes
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// Partial entry update; `None` leaves a field unchanged
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    pub tracking_number_last_four: Option<String>,
    pub observations: Vec<(Observation, bool)>,
    pub notes: Option<String>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.tracking_number_last_four.is_none()
            && self.observations.is_empty()
            && self.notes.is_none()
    }

    /// Overlay the patch onto an existing entry
    pub fn apply_to(self, entry: &mut FormEntry) {
        if let Some(v) = self.tracking_number_last_four {
            entry.tracking_number_last_four = v;
        }
        for (observation, value) in self.observations {
            entry.set_observation(observation, value);
        }
        if let Some(v) = self.notes {
            entry.notes = v;
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Traits
// ============================================================================

/// Turn a form into an exported document
pub trait Exporter {
    type Output;

    /// Export a form snapshot to the output format
    fn export(&self, form: &Form) -> Result<Self::Output, ExportError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Export errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Format error: {0}")]
    Format(String),
}

/// Form store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Form not found: {0}")]
    FormNotFound(FormId),

    #[error("Entry not found: {entry_id} (form {form_id})")]
    EntryNotFound { form_id: FormId, entry_id: EntryId },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt store: {0}")]
    Corrupt(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_json() -> &'static str {
        r#"{
            "id": "form-1716190000000",
            "name": "早班",
            "cityName": "深圳",
            "surveyDate": "2024-05-20",
            "branchCode": "755A",
            "areaType": "住宅区",
            "courierCode": "C0192",
            "createdAt": "2024-05-20T01:00:00.000Z",
            "updatedAt": "2024-05-20T02:30:00.000Z",
            "entries": [
                {
                    "id": "entry-1716190100000",
                    "trackingNumberLastFour": "8X21",
                    "addressDelivered": true,
                    "thirdPartyDelivery": false,
                    "customerInteraction": true,
                    "customerInteractionSending": false,
                    "customerInteractionReturn": false,
                    "notes": "z",
                    "createdAt": "2024-05-20T01:05:00.000Z"
                }
            ]
        }"#
    }

    #[test]
    fn form_deserializes_from_camel_case_json() {
        let form: Form = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(form.metadata.city_name, "深圳");
        assert_eq!(form.metadata.survey_date, "2024-05-20");
        assert_eq!(form.entries.len(), 1);
        assert_eq!(form.entries[0].tracking_number_last_four, "8X21");
        assert!(form.entries[0].address_delivered);
        assert_eq!(form.entries[0].notes, "z");
    }

    #[test]
    fn form_json_roundtrip_keeps_flattened_metadata() {
        let form: Form = serde_json::from_str(sample_json()).unwrap();
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["branchCode"], "755A");
        assert!(json.get("metadata").is_none());
        let back: Form = serde_json::from_value(json).unwrap();
        assert_eq!(back, form);
    }

    #[test]
    fn missing_notes_default_to_empty() {
        let json = r#"{
            "id": "e1",
            "trackingNumberLastFour": "1234",
            "addressDelivered": false,
            "thirdPartyDelivery": false,
            "customerInteraction": false,
            "customerInteractionSending": false,
            "customerInteractionReturn": false,
            "createdAt": "2024-05-20T01:05:00Z"
        }"#;
        let entry: FormEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.notes, "");
    }

    #[test]
    fn null_notes_and_missing_timestamps_are_tolerated() {
        let json = r#"{
            "id": "e1",
            "trackingNumberLastFour": "1234",
            "addressDelivered": true,
            "thirdPartyDelivery": false,
            "customerInteraction": false,
            "customerInteractionSending": false,
            "customerInteractionReturn": false,
            "notes": null
        }"#;
        let entry: FormEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.notes, "");
        assert_eq!(entry.created_at, DateTime::<Utc>::default());

        let draft: EntryDraft = serde_json::from_str(
            r#"{"trackingNumberLastFour": "1234", "addressDelivered": false,
                "thirdPartyDelivery": false, "customerInteraction": false,
                "customerInteractionSending": false, "customerInteractionReturn": false,
                "notes": null}"#,
        )
        .unwrap();
        assert_eq!(draft.notes, "");
    }

    #[test]
    fn form_without_timestamps_deserializes() {
        let form: Form = serde_json::from_str(
            r#"{"id": "f1", "name": "", "cityName": "深圳", "surveyDate": "2024-05-20",
                "branchCode": "755A", "areaType": "住宅区", "courierCode": "C0192"}"#,
        )
        .unwrap();
        assert_eq!(form.metadata.created_at, DateTime::<Utc>::default());
        assert_eq!(form.metadata.updated_at, DateTime::<Utc>::default());
        assert!(form.is_empty());
    }

    #[test]
    fn observation_accessors_cover_every_field() {
        let mut entry = FormEntry::new("e1", "1234");
        for observation in Observation::ALL {
            assert!(!entry.observation(observation));
            entry.set_observation(observation, true);
            assert!(entry.observation(observation));
        }
        assert!(entry.address_delivered);
        assert!(entry.third_party_delivery);
        assert!(entry.customer_interaction);
        assert!(entry.customer_interaction_sending);
        assert!(entry.customer_interaction_return);
    }

    #[test]
    fn observation_order_matches_field_names() {
        let names: Vec<_> = Observation::ALL.iter().map(|o| o.field_name()).collect();
        assert_eq!(
            names,
            vec![
                "addressDelivered",
                "thirdPartyDelivery",
                "customerInteraction",
                "customerInteractionSending",
                "customerInteractionReturn",
            ]
        );
    }

    #[test]
    fn form_patch_overlays_only_set_fields() {
        let mut form: Form = serde_json::from_str(sample_json()).unwrap();
        let patch = FormPatch {
            courier_code: Some("C0200".into()),
            ..FormPatch::default()
        };
        assert!(!patch.is_empty());
        patch.apply_to(&mut form.metadata);
        assert_eq!(form.metadata.courier_code, "C0200");
        assert_eq!(form.metadata.branch_code, "755A");
    }

    #[test]
    fn entry_patch_sets_observations_and_notes() {
        let mut entry = FormEntry::new("e1", "1234").observe(Observation::CustomerInteraction, true);
        let patch = EntryPatch {
            tracking_number_last_four: None,
            observations: vec![
                (Observation::CustomerInteraction, false),
                (Observation::ThirdPartyDelivery, true),
            ],
            notes: Some("locker".into()),
        };
        patch.apply_to(&mut entry);
        assert!(!entry.customer_interaction);
        assert!(entry.third_party_delivery);
        assert_eq!(entry.notes, "locker");
        assert_eq!(entry.tracking_number_last_four, "1234");
    }

    #[test]
    fn entry_draft_builder() {
        let draft = EntryDraft::new("0042")
            .observe(Observation::CustomerInteractionReturn, true)
            .notes("return");
        let entry = FormEntry::from_draft("e9", draft, Utc::now());
        assert_eq!(entry.id, "e9");
        assert!(entry.customer_interaction_return);
        assert!(!entry.address_delivered);
        assert_eq!(entry.notes, "return");
    }
}
