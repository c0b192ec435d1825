//! Consent signing workflow.
//!
//! A consent form is an ordered list of items, each signed independently. The form can only be
//! completed once every item flagged `required` carries a signature. Optional items (for example
//! research participation) never block completion.

use crate::error::{RecordKind, WardError, WardResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use wardops_types::NonEmptyText;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentCategory {
    Treatment,
    Privacy,
    Research,
    Financial,
    Emergency,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentStatus {
    Draft,
    Pending,
    Completed,
    Expired,
}

impl ConsentStatus {
    pub const ALL: [ConsentStatus; 4] = [
        ConsentStatus::Draft,
        ConsentStatus::Pending,
        ConsentStatus::Completed,
        ConsentStatus::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentStatus::Draft => "draft",
            ConsentStatus::Pending => "pending",
            ConsentStatus::Completed => "completed",
            ConsentStatus::Expired => "expired",
        }
    }

    /// Whether items on a form in this status may still be signed.
    pub fn is_open(&self) -> bool {
        matches!(self, ConsentStatus::Draft | ConsentStatus::Pending)
    }
}

impl fmt::Display for ConsentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Signature {
    pub signer: NonEmptyText,
    pub signed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsentItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub required: bool,
    pub category: ConsentCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
}

impl ConsentItem {
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsentRecord {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub procedure: String,
    pub status: ConsentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub items: Vec<ConsentItem>,
}

impl ConsentRecord {
    /// Titles of required items that are still unsigned, in form order.
    pub fn missing_required(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.required && !item.is_signed())
            .map(|item| item.title.clone())
            .collect()
    }

    pub fn is_ready_to_complete(&self) -> bool {
        self.items
            .iter()
            .all(|item| !item.required || item.is_signed())
    }
}

/// Result of signing an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignOutcome {
    /// The item was unsigned and now carries the new signature.
    Signed,
    /// The item was already signed; the original signature is kept.
    AlreadySigned,
}

/// Owns every consent form and gates completion on the required items.
#[derive(Clone, Debug, Default)]
pub struct ConsentWorkflow {
    forms: Vec<ConsentRecord>,
}

impl ConsentWorkflow {
    /// Build the workflow from existing forms.
    ///
    /// # Errors
    ///
    /// Returns `WardError::Validation` on duplicate form or item ids, blank patient details, a
    /// form marked completed while a required item is unsigned, a `completed_at` that disagrees
    /// with the status, or a draft that already carries signatures.
    pub fn new(forms: Vec<ConsentRecord>) -> WardResult<Self> {
        for (i, form) in forms.iter().enumerate() {
            if forms[..i].iter().any(|f| f.id == form.id) {
                return Err(WardError::Validation(format!(
                    "duplicate consent form id: {}",
                    form.id
                )));
            }
            for (j, item) in form.items.iter().enumerate() {
                if form.items[..j].iter().any(|other| other.id == item.id) {
                    return Err(WardError::Validation(format!(
                        "duplicate consent item id {} on {}",
                        item.id, form.id
                    )));
                }
            }
            if form.status == ConsentStatus::Completed && !form.is_ready_to_complete() {
                return Err(WardError::Validation(format!(
                    "consent form {} is completed with unsigned required items",
                    form.id
                )));
            }
            if form.patient_id.trim().is_empty() || form.patient_name.trim().is_empty() {
                return Err(WardError::Validation(format!(
                    "consent form {} is missing patient details",
                    form.id
                )));
            }
            if (form.status == ConsentStatus::Completed) != form.completed_at.is_some() {
                return Err(WardError::Validation(format!(
                    "consent form {} ({}) has completed_at that disagrees with its status",
                    form.id, form.status
                )));
            }
            if form.status == ConsentStatus::Draft && form.items.iter().any(ConsentItem::is_signed) {
                return Err(WardError::Validation(format!(
                    "consent form {} is a draft but already has signatures",
                    form.id
                )));
            }
        }
        Ok(Self { forms })
    }

    pub fn get(&self, id: &str) -> WardResult<&ConsentRecord> {
        self.forms
            .iter()
            .find(|f| f.id == id)
            .ok_or_else(|| WardError::not_found(RecordKind::ConsentForm, id))
    }

    pub fn list(&self) -> impl Iterator<Item = &ConsentRecord> {
        self.forms.iter()
    }

    /// Sign one item on a form.
    ///
    /// Signing an already signed item is a no-op reported as [`SignOutcome::AlreadySigned`].
    /// The first signature on a draft form moves it to pending.
    ///
    /// # Errors
    ///
    /// - `Validation` if `signer` is blank
    /// - `NotFound` for an unknown form or item
    /// - `InvalidTransition` if the form is completed or expired
    pub fn sign_item(
        &mut self,
        form_id: &str,
        item_id: &str,
        signer: &str,
    ) -> WardResult<SignOutcome> {
        let signer = NonEmptyText::new(signer)?;
        let form = self.form_mut(form_id)?;

        if !form.status.is_open() {
            tracing::warn!("rejected signing on {} (status: {})", form_id, form.status);
            return Err(WardError::invalid_transition(
                RecordKind::ConsentForm,
                form_id,
                form.status,
                "sign",
            ));
        }

        let item = form
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(|| WardError::not_found(RecordKind::ConsentItem, item_id))?;

        if item.is_signed() {
            tracing::info!("{}/{} already signed", form_id, item_id);
            return Ok(SignOutcome::AlreadySigned);
        }

        tracing::info!("{}/{} signed by {}", form_id, item_id, signer);
        item.signature = Some(Signature {
            signer,
            signed_at: Utc::now(),
        });
        if form.status == ConsentStatus::Draft {
            form.status = ConsentStatus::Pending;
        }
        Ok(SignOutcome::Signed)
    }

    /// Complete a form once all required items are signed.
    pub fn complete_form(&mut self, form_id: &str) -> WardResult<&ConsentRecord> {
        let form = self.form_mut(form_id)?;

        if !form.status.is_open() {
            return Err(WardError::invalid_transition(
                RecordKind::ConsentForm,
                form_id,
                form.status,
                "complete",
            ));
        }

        let missing = form.missing_required();
        if !missing.is_empty() {
            tracing::warn!(
                "cannot complete {}: {} required item(s) unsigned",
                form_id,
                missing.len()
            );
            return Err(WardError::IncompleteConsents {
                form_id: form_id.to_owned(),
                missing,
            });
        }

        form.status = ConsentStatus::Completed;
        form.completed_at = Some(Utc::now());
        tracing::info!("{} completed", form_id);
        Ok(form)
    }

    /// Expire a form that was never completed.
    pub fn expire(&mut self, form_id: &str) -> WardResult<&ConsentRecord> {
        let form = self.form_mut(form_id)?;
        if !form.status.is_open() {
            return Err(WardError::invalid_transition(
                RecordKind::ConsentForm,
                form_id,
                form.status,
                "expire",
            ));
        }
        form.status = ConsentStatus::Expired;
        tracing::info!("{} expired", form_id);
        Ok(form)
    }

    fn form_mut(&mut self, form_id: &str) -> WardResult<&mut ConsentRecord> {
        self.forms
            .iter_mut()
            .find(|f| f.id == form_id)
            .ok_or_else(|| WardError::not_found(RecordKind::ConsentForm, form_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(id: &str, title: &str, required: bool, signed: bool) -> ConsentItem {
        ConsentItem {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            required,
            category: ConsentCategory::Treatment,
            signature: signed.then(|| Signature {
                signer: NonEmptyText::new("John Smith").expect("signer"),
                signed_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
            }),
        }
    }

    fn form(status: ConsentStatus, items: Vec<ConsentItem>) -> ConsentRecord {
        ConsentRecord {
            id: "CF001".into(),
            patient_id: "P001".into(),
            patient_name: "John Smith".into(),
            procedure: "Cardiac Catheterization".into(),
            status,
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
            completed_at: None,
            items,
        }
    }

    fn three_required_two_signed() -> ConsentWorkflow {
        ConsentWorkflow::new(vec![form(
            ConsentStatus::Pending,
            vec![
                item("CI001", "Treatment Consent", true, true),
                item("CI002", "Anesthesia Consent", true, true),
                item("CI003", "Financial Responsibility", true, false),
                item("CI004", "Research Participation", false, false),
            ],
        )])
        .expect("workflow")
    }

    #[test]
    fn completion_waits_for_last_required_item() {
        let mut workflow = three_required_two_signed();

        let err = workflow.complete_form("CF001").expect_err("incomplete");
        match err {
            WardError::IncompleteConsents { form_id, missing } => {
                assert_eq!(form_id, "CF001");
                assert_eq!(missing, vec!["Financial Responsibility".to_string()]);
            }
            other => panic!("expected IncompleteConsents, got {other:?}"),
        }
        assert_eq!(
            workflow.get("CF001").expect("form").status,
            ConsentStatus::Pending
        );

        let outcome = workflow
            .sign_item("CF001", "CI003", "John Smith")
            .expect("sign");
        assert_eq!(outcome, SignOutcome::Signed);

        let done = workflow.complete_form("CF001").expect("complete");
        assert_eq!(done.status, ConsentStatus::Completed);
        assert!(done.completed_at.is_some());
        // The optional item stays unsigned.
        assert!(!done.items[3].is_signed());
    }

    #[test]
    fn resigning_keeps_original_signature() {
        let mut workflow = three_required_two_signed();
        let original = workflow.get("CF001").expect("form").items[0].signature.clone();

        let outcome = workflow
            .sign_item("CF001", "CI001", "Someone Else")
            .expect("sign");
        assert_eq!(outcome, SignOutcome::AlreadySigned);
        assert_eq!(workflow.get("CF001").expect("form").items[0].signature, original);
    }

    #[test]
    fn blank_signer_is_rejected_without_change() {
        let mut workflow = three_required_two_signed();
        let err = workflow.sign_item("CF001", "CI003", "   ").expect_err("blank");
        assert!(matches!(err, WardError::Validation(_)));
        assert!(!workflow.get("CF001").expect("form").items[2].is_signed());
    }

    #[test]
    fn unknown_form_and_item_are_not_found() {
        let mut workflow = three_required_two_signed();
        assert!(matches!(
            workflow.sign_item("CF404", "CI001", "John").expect_err("form"),
            WardError::NotFound { kind: RecordKind::ConsentForm, .. }
        ));
        assert!(matches!(
            workflow.sign_item("CF001", "CI404", "John").expect_err("item"),
            WardError::NotFound { kind: RecordKind::ConsentItem, .. }
        ));
    }

    #[test]
    fn closed_forms_reject_signing_completion_and_expiry() {
        let mut workflow = three_required_two_signed();
        workflow.expire("CF001").expect("expire");

        assert!(matches!(
            workflow.sign_item("CF001", "CI003", "John").expect_err("expired"),
            WardError::InvalidTransition { .. }
        ));
        assert!(matches!(
            workflow.complete_form("CF001").expect_err("expired"),
            WardError::InvalidTransition { .. }
        ));
        assert!(workflow.expire("CF001").is_err());
    }

    #[test]
    fn first_signature_moves_draft_to_pending() {
        let mut workflow = ConsentWorkflow::new(vec![form(
            ConsentStatus::Draft,
            vec![item("CI001", "Treatment Consent", true, false)],
        )])
        .expect("workflow");
        workflow.sign_item("CF001", "CI001", "Jane Doe").expect("sign");
        let form = workflow.get("CF001").expect("form");
        assert_eq!(form.status, ConsentStatus::Pending);
        let signature = form.items[0].signature.as_ref().expect("signature");
        assert_eq!(signature.signer.as_str(), "Jane Doe");
    }

    #[test]
    fn form_without_required_items_completes_immediately() {
        let mut workflow = ConsentWorkflow::new(vec![form(
            ConsentStatus::Pending,
            vec![item("CI001", "Research Participation", false, false)],
        )])
        .expect("workflow");
        assert!(workflow.complete_form("CF001").is_ok());
    }

    #[test]
    fn seeded_forms_must_match_their_status() {
        let mut undated = form(
            ConsentStatus::Completed,
            vec![item("CI001", "Treatment Consent", true, true)],
        );
        let err = ConsentWorkflow::new(vec![undated.clone()]).expect_err("no completed_at");
        assert!(matches!(err, WardError::Validation(msg) if msg.contains("completed_at")));

        undated.completed_at = Some(undated.created_at);
        assert!(ConsentWorkflow::new(vec![undated]).is_ok());

        let signed_draft = form(
            ConsentStatus::Draft,
            vec![item("CI001", "Treatment Consent", true, true)],
        );
        let err = ConsentWorkflow::new(vec![signed_draft]).expect_err("signed draft");
        assert!(matches!(err, WardError::Validation(msg) if msg.contains("draft")));

        let mut anonymous = form(ConsentStatus::Pending, Vec::new());
        anonymous.patient_name = "  ".into();
        let err = ConsentWorkflow::new(vec![anonymous]).expect_err("blank patient");
        assert!(matches!(err, WardError::Validation(msg) if msg.contains("patient details")));
    }

    #[test]
    fn rejects_completed_form_with_unsigned_required_items() {
        let err = ConsentWorkflow::new(vec![form(
            ConsentStatus::Completed,
            vec![item("CI001", "Treatment Consent", true, false)],
        )])
        .expect_err("inconsistent");
        assert!(matches!(err, WardError::Validation(msg) if msg.contains("CF001")));
    }
}
