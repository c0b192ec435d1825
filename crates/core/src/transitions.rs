//! Transition approval workflow.
//!
//! Care-level change requests (for example OPD to IPD) move along a fixed path:
//!
//! ```text
//! pending -> approved -> in_progress -> completed
//!        \-> rejected
//! ```
//!
//! `rejected` and `completed` are terminal. Every step is one reviewer action and an action from
//! the wrong state is an error, never a silent no-op. A rejected request cannot be reopened; the
//! subject needs a fresh submission.

use crate::constants::{TRANSITION_ID_PREFIX, TRANSITION_ID_WIDTH};
use crate::error::{RecordKind, WardError, WardResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use wardops_types::NonEmptyText;

/// Care setting a patient is in or is moving to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareSetting {
    Opd,
    Ipd,
    DayCare,
    Icu,
}

impl fmt::Display for CareSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CareSetting::Opd => "opd",
            CareSetting::Ipd => "ipd",
            CareSetting::DayCare => "day_care",
            CareSetting::Icu => "icu",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionState {
    Pending,
    Approved,
    Rejected,
    InProgress,
    Completed,
}

impl TransitionState {
    pub const ALL: [TransitionState; 5] = [
        TransitionState::Pending,
        TransitionState::Approved,
        TransitionState::Rejected,
        TransitionState::InProgress,
        TransitionState::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionState::Pending => "pending",
            TransitionState::Approved => "approved",
            TransitionState::Rejected => "rejected",
            TransitionState::InProgress => "in_progress",
            TransitionState::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TransitionState::Rejected | TransitionState::Completed)
    }
}

impl fmt::Display for TransitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransitionState {
    type Err = WardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| WardError::Validation(format!("unknown transition state: {s}")))
    }
}

/// A request to move a patient between care settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionRequest {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub current: CareSetting,
    pub requested: CareSetting,
    pub priority: Priority,
    #[serde(default)]
    pub reason: String,
    pub state: TransitionState,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Input for [`TransitionWorkflow::submit`].
#[derive(Clone, Debug)]
pub struct NewTransition {
    pub patient_id: String,
    pub patient_name: String,
    pub current: CareSetting,
    pub requested: CareSetting,
    pub priority: Priority,
    pub reason: String,
}

/// Owns every transition request and enforces the approval path.
#[derive(Clone, Debug, Default)]
pub struct TransitionWorkflow {
    requests: Vec<TransitionRequest>,
    next_seq: u32,
}

impl TransitionWorkflow {
    /// Build the workflow from existing requests.
    ///
    /// # Errors
    ///
    /// Returns `WardError::Validation` on duplicate ids, a request whose current and requested
    /// settings are equal, or a request whose review and completion fields disagree with its
    /// state.
    pub fn new(requests: Vec<TransitionRequest>) -> WardResult<Self> {
        let mut next_seq = 0;
        for (i, request) in requests.iter().enumerate() {
            if requests[..i].iter().any(|r| r.id == request.id) {
                return Err(WardError::Validation(format!(
                    "duplicate transition id: {}",
                    request.id
                )));
            }
            if request.current == request.requested {
                return Err(WardError::Validation(format!(
                    "transition {} requests its current setting ({})",
                    request.id, request.current
                )));
            }
            check_lifecycle(request)?;
            if let Some(seq) = parse_seq(&request.id) {
                next_seq = next_seq.max(seq);
            }
        }
        Ok(Self { requests, next_seq })
    }

    pub fn get(&self, id: &str) -> WardResult<&TransitionRequest> {
        self.requests
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| WardError::not_found(RecordKind::Transition, id))
    }

    pub fn list(&self, state: Option<TransitionState>) -> impl Iterator<Item = &TransitionRequest> {
        self.requests
            .iter()
            .filter(move |r| state.map_or(true, |s| r.state == s))
    }

    /// Create a new pending request.
    pub fn submit(&mut self, new: NewTransition) -> WardResult<&TransitionRequest> {
        let patient_id = NonEmptyText::new(&new.patient_id)?;
        let patient_name = NonEmptyText::new(&new.patient_name)?;
        if new.current == new.requested {
            return Err(WardError::Validation(format!(
                "requested setting must differ from current setting ({})",
                new.current
            )));
        }

        let seq = self.next_seq.checked_add(1).ok_or_else(|| {
            WardError::Validation(format!(
                "transition id sequence exhausted after {TRANSITION_ID_PREFIX}{}",
                self.next_seq
            ))
        })?;
        self.next_seq = seq;
        let id = format!(
            "{TRANSITION_ID_PREFIX}{:0width$}",
            seq,
            width = TRANSITION_ID_WIDTH
        );
        tracing::info!(
            "submitted {} for {}: {} -> {} ({})",
            id,
            patient_id,
            new.current,
            new.requested,
            new.priority
        );

        self.requests.push(TransitionRequest {
            id,
            patient_id: patient_id.into_inner(),
            patient_name: patient_name.into_inner(),
            current: new.current,
            requested: new.requested,
            priority: new.priority,
            reason: new.reason.trim().to_owned(),
            state: TransitionState::Pending,
            submitted_at: Utc::now(),
            reviewed_by: None,
            reviewed_at: None,
            completed_at: None,
        });
        let last = self.requests.len() - 1;
        Ok(&self.requests[last])
    }

    pub fn approve(&mut self, id: &str, reviewer: &str) -> WardResult<&TransitionRequest> {
        let reviewer = NonEmptyText::new(reviewer)?;
        self.review(id, reviewer, TransitionState::Approved, "approve")
    }

    pub fn reject(&mut self, id: &str, reviewer: &str) -> WardResult<&TransitionRequest> {
        let reviewer = NonEmptyText::new(reviewer)?;
        self.review(id, reviewer, TransitionState::Rejected, "reject")
    }

    /// Start an approved transition.
    pub fn execute(&mut self, id: &str) -> WardResult<&TransitionRequest> {
        let request = self.advance(id, TransitionState::Approved, "execute")?;
        request.state = TransitionState::InProgress;
        tracing::info!("{} in progress", id);
        Ok(request)
    }

    /// Finish an in-progress transition.
    pub fn complete(&mut self, id: &str) -> WardResult<&TransitionRequest> {
        let request = self.advance(id, TransitionState::InProgress, "complete")?;
        request.state = TransitionState::Completed;
        request.completed_at = Some(Utc::now());
        tracing::info!("{} completed", id);
        Ok(request)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransitionRequest> {
        self.requests.iter()
    }

    fn review(
        &mut self,
        id: &str,
        reviewer: NonEmptyText,
        outcome: TransitionState,
        action: &'static str,
    ) -> WardResult<&TransitionRequest> {
        let request = self.advance(id, TransitionState::Pending, action)?;
        request.state = outcome;
        request.reviewed_at = Some(Utc::now());
        tracing::info!("{} {} by {}", id, outcome, reviewer);
        request.reviewed_by = Some(reviewer.into_inner());
        Ok(request)
    }

    /// Find a request and check it is in `expected` before the caller mutates it.
    fn advance(
        &mut self,
        id: &str,
        expected: TransitionState,
        action: &'static str,
    ) -> WardResult<&mut TransitionRequest> {
        let request = self
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| WardError::not_found(RecordKind::Transition, id))?;

        if request.state != expected {
            tracing::warn!("rejected {} on {} (state: {})", action, id, request.state);
            return Err(WardError::invalid_transition(
                RecordKind::Transition,
                id,
                request.state,
                action,
            ));
        }
        Ok(request)
    }
}

/// Reject a seeded request whose fields could not have come out of the workflow.
fn check_lifecycle(request: &TransitionRequest) -> WardResult<()> {
    let problem = if request.patient_id.trim().is_empty() || request.patient_name.trim().is_empty()
    {
        Some("is missing patient details")
    } else if request.state == TransitionState::Pending && request.reviewed_by.is_some() {
        Some("is pending but has a reviewer")
    } else if request.state != TransitionState::Pending
        && (request.reviewed_by.as_deref().map_or(true, |r| r.trim().is_empty())
            || request.reviewed_at.is_none())
    {
        Some("has been reviewed but has no reviewer or review time")
    } else if (request.state == TransitionState::Completed) != request.completed_at.is_some() {
        Some("has completed_at that disagrees with its state")
    } else {
        None
    };

    match problem {
        Some(problem) => Err(WardError::Validation(format!(
            "transition {} ({}) {problem}",
            request.id, request.state
        ))),
        None => Ok(()),
    }
}

/// Extract the numeric suffix of a `TR###` identifier.
fn parse_seq(id: &str) -> Option<u32> {
    id.strip_prefix(TRANSITION_ID_PREFIX)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_transition() -> NewTransition {
        NewTransition {
            patient_id: "P010".into(),
            patient_name: "Maria Garcia".into(),
            current: CareSetting::Opd,
            requested: CareSetting::Ipd,
            priority: Priority::High,
            reason: "Worsening shortness of breath".into(),
        }
    }

    fn workflow_with_pending() -> (TransitionWorkflow, String) {
        let mut workflow = TransitionWorkflow::default();
        let id = workflow.submit(new_transition()).expect("submit").id.clone();
        (workflow, id)
    }

    #[test]
    fn submit_creates_pending_request_with_sequential_id() {
        let (mut workflow, id) = workflow_with_pending();
        assert_eq!(id, "TR001");
        let second = workflow.submit(new_transition()).expect("submit");
        assert_eq!(second.id, "TR002");
        assert_eq!(second.state, TransitionState::Pending);
        assert!(second.reviewed_by.is_none());
    }

    #[test]
    fn submit_continues_after_seeded_ids() {
        let (seeded, _) = workflow_with_pending();
        let mut existing: Vec<_> = seeded.iter().cloned().collect();
        existing[0].id = "TR007".into();
        let mut workflow = TransitionWorkflow::new(existing).expect("workflow");
        assert_eq!(workflow.submit(new_transition()).expect("submit").id, "TR008");
    }

    #[test]
    fn submit_reports_exhausted_id_sequence() {
        let (seeded, _) = workflow_with_pending();
        let mut existing: Vec<_> = seeded.iter().cloned().collect();
        existing[0].id = format!("TR{}", u32::MAX);
        let mut workflow = TransitionWorkflow::new(existing).expect("workflow");

        let err = workflow.submit(new_transition()).expect_err("no ids left");
        assert!(matches!(err, WardError::Validation(msg) if msg.contains("exhausted")));
        assert_eq!(workflow.iter().count(), 1);
    }

    #[test]
    fn seeded_requests_must_match_their_state() {
        let (seeded, _) = workflow_with_pending();
        let pending = seeded.iter().next().expect("request").clone();

        let mut unreviewed = pending.clone();
        unreviewed.state = TransitionState::Rejected;
        let err = TransitionWorkflow::new(vec![unreviewed]).expect_err("no reviewer");
        assert!(matches!(err, WardError::Validation(msg) if msg.contains("no reviewer")));

        let mut unfinished = pending.clone();
        unfinished.state = TransitionState::Completed;
        unfinished.reviewed_by = Some("Dr. Lee".into());
        unfinished.reviewed_at = Some(pending.submitted_at);
        let err = TransitionWorkflow::new(vec![unfinished]).expect_err("no completed_at");
        assert!(matches!(err, WardError::Validation(msg) if msg.contains("completed_at")));

        let mut anonymous = pending;
        anonymous.patient_id = " ".into();
        let err = TransitionWorkflow::new(vec![anonymous]).expect_err("blank patient");
        assert!(matches!(err, WardError::Validation(msg) if msg.contains("patient details")));
    }

    #[test]
    fn submit_validates_input() {
        let mut workflow = TransitionWorkflow::default();
        let mut same = new_transition();
        same.requested = CareSetting::Opd;
        assert!(matches!(
            workflow.submit(same).expect_err("same setting"),
            WardError::Validation(_)
        ));

        let mut blank = new_transition();
        blank.patient_name = "   ".into();
        assert!(matches!(
            workflow.submit(blank).expect_err("blank name"),
            WardError::Validation(_)
        ));
        assert_eq!(workflow.iter().count(), 0);
    }

    #[test]
    fn approve_then_reject_is_invalid() {
        let (mut workflow, id) = workflow_with_pending();
        let approved = workflow.approve(&id, "Dr. Lee").expect("approve");
        assert_eq!(approved.state, TransitionState::Approved);
        assert_eq!(approved.reviewed_by.as_deref(), Some("Dr. Lee"));
        assert!(approved.reviewed_at.is_some());

        let err = workflow.reject(&id, "Dr. Lee").expect_err("already approved");
        match err {
            WardError::InvalidTransition { from, action, .. } => {
                assert_eq!(from, "approved");
                assert_eq!(action, "reject");
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }
        assert_eq!(workflow.get(&id).expect("get").state, TransitionState::Approved);
    }

    #[test]
    fn full_path_reaches_completed() {
        let (mut workflow, id) = workflow_with_pending();
        assert!(workflow.execute(&id).is_err());
        workflow.approve(&id, "Dr. Lee").expect("approve");
        assert!(workflow.complete(&id).is_err());
        assert_eq!(
            workflow.execute(&id).expect("execute").state,
            TransitionState::InProgress
        );
        let done = workflow.complete(&id).expect("complete");
        assert_eq!(done.state, TransitionState::Completed);
        assert!(done.completed_at.is_some());
    }

    #[test]
    fn terminal_states_never_change() {
        let (mut workflow, rejected) = workflow_with_pending();
        workflow.reject(&rejected, "Dr. Lee").expect("reject");

        let completed = workflow.submit(new_transition()).expect("submit").id.clone();
        workflow.approve(&completed, "Dr. Lee").expect("approve");
        workflow.execute(&completed).expect("execute");
        workflow.complete(&completed).expect("complete");

        for id in [&rejected, &completed] {
            let before = workflow.get(id).expect("get").clone();
            assert!(before.state.is_terminal());
            assert!(workflow.approve(id, "Dr. Lee").is_err());
            assert!(workflow.reject(id, "Dr. Lee").is_err());
            assert!(workflow.execute(id).is_err());
            assert!(workflow.complete(id).is_err());
            assert_eq!(workflow.get(id).expect("get"), &before);
        }
    }

    #[test]
    fn blank_reviewer_and_unknown_id_are_rejected() {
        let (mut workflow, id) = workflow_with_pending();
        assert!(matches!(
            workflow.approve(&id, " ").expect_err("blank reviewer"),
            WardError::Validation(_)
        ));
        assert!(matches!(
            workflow.approve("TR999", "Dr. Lee").expect_err("unknown"),
            WardError::NotFound { kind: RecordKind::Transition, .. }
        ));
        assert_eq!(workflow.get(&id).expect("get").state, TransitionState::Pending);
    }

    #[test]
    fn list_filters_by_state() {
        let (mut workflow, id) = workflow_with_pending();
        workflow.submit(new_transition()).expect("submit");
        workflow.approve(&id, "Dr. Lee").expect("approve");
        assert_eq!(workflow.list(Some(TransitionState::Pending)).count(), 1);
        assert_eq!(workflow.list(Some(TransitionState::Approved)).count(), 1);
        assert_eq!(workflow.list(None).count(), 2);
    }
}
