//! Typed contract document negotiated on a booking.
//!
//! The document is split into fixed sections. A patch replaces, per section,
//! only the fields it sets (`{...old, ...patch}`); fields of untouched
//! sections and unset fields are kept. Nested values are not merged further.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Declare a contract section: every field optional, camelCase on the wire,
/// with a field-wise `merge`.
macro_rules! define_contract_section {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase", default)]
        pub struct $name {
            $(
                $(#[$fmeta])*
                #[serde(skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )+
        }

        impl $name {
            /// Overwrite every field `patch` sets.
            pub fn merge(&mut self, patch: Self) {
                $(
                    if patch.$field.is_some() {
                        self.$field = patch.$field;
                    }
                )+
            }

            /// True when no field is set.
            pub fn is_empty(&self) -> bool {
                true $( && self.$field.is_none() )+
            }
        }
    };
}

define_contract_section! {
    /// The booking party.
    OrganizerSection {
        name: String,
        company: String,
        email: String,
        phone: String,
        address: String,
        tax_id: String,
    }
}

define_contract_section! {
    /// The performing artist and representation.
    ArtistSection {
        name: String,
        legal_name: String,
        representative: String,
        email: String,
    }
}

define_contract_section! {
    /// What, when and where.
    PerformanceSection {
        event_date: NaiveDate,
        event_type: String,
        venue: String,
        city: String,
        country: String,
        start_time: String,
        set_duration_minutes: i32,
        expected_attendance: i64,
    }
}

define_contract_section! {
    /// Fee and payment terms.
    FinancialSection {
        fee: i64,
        currency: String,
        deposit_percent: i32,
        deposit_due_date: NaiveDate,
        balance_due_date: NaiveDate,
        payment_terms: String,
    }
}

define_contract_section! {
    /// Travel, accommodation and technical requirements.
    LogisticsSection {
        travel: String,
        accommodation: String,
        ground_transport: String,
        hospitality: String,
        technical_rider: String,
    }
}

define_contract_section! {
    LegalSection {
        cancellation_policy: String,
        governing_law: String,
        force_majeure: String,
        additional_terms: String,
    }
}

define_contract_section! {
    /// Derived from the booking's signature fields; never patched directly.
    SignaturesSection {
        organizer_signature: String,
        organizer_signed_at: Timestamp,
    }
}

define_contract_section! {
    /// Edit stamps, written by the system per editing role.
    WorkflowSection {
        admin_edited_at: Timestamp,
        organizer_edited_at: Timestamp,
        last_edited_by: String,
        sent_for_signature_at: Timestamp,
    }
}

/// The full contract document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContractDocument {
    pub organizer: OrganizerSection,
    pub artist: ArtistSection,
    pub performance: PerformanceSection,
    pub financial: FinancialSection,
    pub logistics: LogisticsSection,
    pub legal: LegalSection,
    pub signatures: SignaturesSection,
    pub workflow: WorkflowSection,
}

/// An edit to the negotiable sections. Absent sections are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContractPatch {
    pub organizer: Option<OrganizerSection>,
    pub artist: Option<ArtistSection>,
    pub performance: Option<PerformanceSection>,
    pub financial: Option<FinancialSection>,
    pub logistics: Option<LogisticsSection>,
    pub legal: Option<LegalSection>,
}

impl ContractPatch {
    pub fn is_empty(&self) -> bool {
        self.organizer.is_none()
            && self.artist.is_none()
            && self.performance.is_none()
            && self.financial.is_none()
            && self.logistics.is_none()
            && self.legal.is_none()
    }
}

/// Who is editing, which decides the workflow stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractEditor {
    /// Admin or manager.
    Agency,
    /// Organizer or promoter who requested the booking.
    Organizer,
}

impl ContractEditor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Agency => "agency",
            Self::Organizer => "organizer",
        }
    }
}

impl ContractDocument {
    /// Apply an edit and stamp the workflow section for `editor`.
    pub fn apply(&mut self, patch: ContractPatch, editor: ContractEditor, at: Timestamp) {
        if let Some(section) = patch.organizer {
            self.organizer.merge(section);
        }
        if let Some(section) = patch.artist {
            self.artist.merge(section);
        }
        if let Some(section) = patch.performance {
            self.performance.merge(section);
        }
        if let Some(section) = patch.financial {
            self.financial.merge(section);
        }
        if let Some(section) = patch.logistics {
            self.logistics.merge(section);
        }
        if let Some(section) = patch.legal {
            self.legal.merge(section);
        }

        match editor {
            ContractEditor::Agency => self.workflow.admin_edited_at = Some(at),
            ContractEditor::Organizer => self.workflow.organizer_edited_at = Some(at),
        }
        self.workflow.last_edited_by = Some(editor.as_str().to_string());
    }

    /// Lay `stored` edits over `self` (usually defaults derived from the booking).
    ///
    /// Signatures are taken from `self` only.
    pub fn overlay(mut self, stored: ContractDocument) -> Self {
        self.organizer.merge(stored.organizer);
        self.artist.merge(stored.artist);
        self.performance.merge(stored.performance);
        self.financial.merge(stored.financial);
        self.logistics.merge(stored.logistics);
        self.legal.merge(stored.legal);
        self.workflow.merge(stored.workflow);
        self
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn at() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn merge_overwrites_only_set_fields() {
        let mut section = OrganizerSection {
            name: Some("Club Nova".into()),
            email: Some("booking@nova.club".into()),
            ..Default::default()
        };
        section.merge(OrganizerSection {
            phone: Some("+61 2 5550 1234".into()),
            name: Some("Nova Events".into()),
            ..Default::default()
        });
        assert_eq!(section.name.as_deref(), Some("Nova Events"));
        assert_eq!(section.email.as_deref(), Some("booking@nova.club"));
        assert_eq!(section.phone.as_deref(), Some("+61 2 5550 1234"));
    }

    #[test]
    fn apply_leaves_untouched_sections_alone() {
        let mut doc = ContractDocument::default();
        doc.legal.governing_law = Some("NSW".into());
        doc.apply(
            ContractPatch {
                financial: Some(FinancialSection {
                    fee: Some(12_000),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ContractEditor::Agency,
            at(),
        );
        assert_eq!(doc.financial.fee, Some(12_000));
        assert_eq!(doc.legal.governing_law.as_deref(), Some("NSW"));
    }

    #[test]
    fn apply_stamps_per_editor() {
        let mut doc = ContractDocument::default();
        doc.apply(ContractPatch::default(), ContractEditor::Organizer, at());
        assert_eq!(doc.workflow.organizer_edited_at, Some(at()));
        assert_eq!(doc.workflow.admin_edited_at, None);
        assert_eq!(doc.workflow.last_edited_by.as_deref(), Some("organizer"));

        doc.apply(ContractPatch::default(), ContractEditor::Agency, at());
        assert_eq!(doc.workflow.admin_edited_at, Some(at()));
        assert_eq!(doc.workflow.last_edited_by.as_deref(), Some("agency"));
    }

    #[test]
    fn overlay_prefers_stored_edits_but_keeps_signatures() {
        let mut defaults = ContractDocument::default();
        defaults.financial.fee = Some(5_000);
        defaults.financial.currency = Some("AUD".into());
        defaults.signatures.organizer_signature = Some("Jane".into());

        let mut stored = ContractDocument::default();
        stored.financial.fee = Some(6_500);
        stored.signatures.organizer_signature = Some("forged".into());

        let doc = defaults.overlay(stored);
        assert_eq!(doc.financial.fee, Some(6_500));
        assert_eq!(doc.financial.currency.as_deref(), Some("AUD"));
        assert_eq!(doc.signatures.organizer_signature.as_deref(), Some("Jane"));
    }

    #[test]
    fn sections_serialize_camel_case_and_skip_unset() {
        let section = PerformanceSection {
            set_duration_minutes: Some(90),
            ..Default::default()
        };
        let json = serde_json::to_value(&section).unwrap();
        assert_eq!(json, serde_json::json!({ "setDurationMinutes": 90 }));
        assert!(PerformanceSection::default().is_empty());
        assert!(!section.is_empty());
    }

    #[test]
    fn patch_deserializes_partial_sections() {
        let patch: ContractPatch = serde_json::from_value(serde_json::json!({
            "logistics": { "hospitality": "Rider B" }
        }))
        .unwrap();
        assert!(!patch.is_empty());
        assert_eq!(
            patch.logistics.unwrap().hospitality.as_deref(),
            Some("Rider B")
        );
        assert!(ContractPatch::default().is_empty());
    }
}
