//! Request and response types for the WardOps APIs.
//!
//! Responses flatten domain types into plain strings and numbers: enums become their snake_case
//! names, timestamps become RFC 3339 text and every status carries its display badge. Requests
//! that name an enum use the small `*Dto` enums below so the OpenAPI schema lists the allowed
//! values.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use wardops_core::{
    Badge, CareSetting, ConsentItem, ConsentProgress, ConsentRecord, ConsentSummary,
    OccupancySummary, Priority, Resource, SignOutcome, StatusBadge, TransitionRequest,
    TransitionSummary,
};

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BadgeDto {
    pub label: String,
    pub tone: String,
}

impl From<StatusBadge> for BadgeDto {
    fn from(badge: StatusBadge) -> Self {
        Self {
            label: badge.label.to_owned(),
            tone: badge.tone.as_str().to_owned(),
        }
    }
}

// ============================================================================
// Resources
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OccupantDto {
    pub patient_id: String,
    pub patient_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ResourceDto {
    pub id: String,
    pub ward: String,
    pub room: String,
    pub floor: u8,
    pub category: String,
    pub state: String,
    pub badge: BadgeDto,
    pub occupant: Option<OccupantDto>,
}

impl From<&Resource> for ResourceDto {
    fn from(resource: &Resource) -> Self {
        Self {
            id: resource.id.clone(),
            ward: resource.location.ward.clone(),
            room: resource.location.room.clone(),
            floor: resource.location.floor,
            category: resource.category.to_string(),
            state: resource.state.to_string(),
            badge: resource.state.badge().into(),
            occupant: resource.state.occupant().map(|o| OccupantDto {
                patient_id: o.patient_id.clone(),
                patient_name: o.patient_name.clone(),
            }),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListResourcesRes {
    pub resources: Vec<ResourceDto>,
}

#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResourceQuery {
    /// Ward name, matched case-insensitively
    pub ward: Option<String>,
    /// One of general, private, icu, emergency
    pub category: Option<String>,
    /// One of available, occupied, reserved, maintenance
    pub state: Option<String>,
}

/// Body for `POST /resources/{id}/admit`.
pub type AdmitReq = OccupantDto;

// ============================================================================
// Transitions
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CareSettingDto {
    Opd,
    Ipd,
    DayCare,
    Icu,
}

impl From<CareSettingDto> for CareSetting {
    fn from(dto: CareSettingDto) -> Self {
        match dto {
            CareSettingDto::Opd => CareSetting::Opd,
            CareSettingDto::Ipd => CareSetting::Ipd,
            CareSettingDto::DayCare => CareSetting::DayCare,
            CareSettingDto::Icu => CareSetting::Icu,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PriorityDto {
    Low,
    Medium,
    High,
    Urgent,
}

impl From<PriorityDto> for Priority {
    fn from(dto: PriorityDto) -> Self {
        match dto {
            PriorityDto::Low => Priority::Low,
            PriorityDto::Medium => Priority::Medium,
            PriorityDto::High => Priority::High,
            PriorityDto::Urgent => Priority::Urgent,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitTransitionReq {
    pub patient_id: String,
    pub patient_name: String,
    pub current: CareSettingDto,
    pub requested: CareSettingDto,
    pub priority: PriorityDto,
    #[serde(default)]
    pub reason: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ReviewReq {
    pub reviewer: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TransitionDto {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub current: String,
    pub requested: String,
    pub priority: String,
    pub priority_badge: BadgeDto,
    pub reason: String,
    pub state: String,
    pub badge: BadgeDto,
    pub submitted_at: String,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<String>,
    pub completed_at: Option<String>,
}

impl From<&TransitionRequest> for TransitionDto {
    fn from(request: &TransitionRequest) -> Self {
        Self {
            id: request.id.clone(),
            patient_id: request.patient_id.clone(),
            patient_name: request.patient_name.clone(),
            current: request.current.to_string(),
            requested: request.requested.to_string(),
            priority: request.priority.to_string(),
            priority_badge: request.priority.badge().into(),
            reason: request.reason.clone(),
            state: request.state.to_string(),
            badge: request.state.badge().into(),
            submitted_at: request.submitted_at.to_rfc3339(),
            reviewed_by: request.reviewed_by.clone(),
            reviewed_at: request.reviewed_at.map(|t| t.to_rfc3339()),
            completed_at: request.completed_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListTransitionsRes {
    pub transitions: Vec<TransitionDto>,
}

#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransitionQuery {
    /// One of pending, approved, rejected, in_progress, completed
    pub state: Option<String>,
}

// ============================================================================
// Consent
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ConsentItemDto {
    pub id: String,
    pub title: String,
    pub description: String,
    pub required: bool,
    pub category: BadgeDto,
    pub signed: bool,
    pub signed_by: Option<String>,
    pub signed_at: Option<String>,
}

impl From<&ConsentItem> for ConsentItemDto {
    fn from(item: &ConsentItem) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            description: item.description.clone(),
            required: item.required,
            category: item.category.badge().into(),
            signed: item.is_signed(),
            signed_by: item.signature.as_ref().map(|s| s.signer.to_string()),
            signed_at: item.signature.as_ref().map(|s| s.signed_at.to_rfc3339()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConsentProgressDto {
    pub signed: usize,
    pub total: usize,
    pub required_signed: usize,
    pub required_total: usize,
    pub percent_signed: u8,
    pub ready_to_complete: bool,
}

impl From<&ConsentProgress> for ConsentProgressDto {
    fn from(progress: &ConsentProgress) -> Self {
        Self {
            signed: progress.signed,
            total: progress.total,
            required_signed: progress.required_signed,
            required_total: progress.required_total,
            percent_signed: progress.percent_signed(),
            ready_to_complete: progress.ready_to_complete(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ConsentFormDto {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub procedure: String,
    pub status: String,
    pub badge: BadgeDto,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub progress: ConsentProgressDto,
    pub items: Vec<ConsentItemDto>,
}

impl From<&ConsentRecord> for ConsentFormDto {
    fn from(form: &ConsentRecord) -> Self {
        Self {
            id: form.id.clone(),
            patient_id: form.patient_id.clone(),
            patient_name: form.patient_name.clone(),
            procedure: form.procedure.clone(),
            status: form.status.to_string(),
            badge: form.status.badge().into(),
            created_at: form.created_at.to_rfc3339(),
            completed_at: form.completed_at.map(|t| t.to_rfc3339()),
            progress: (&ConsentProgress::compute(form)).into(),
            items: form.items.iter().map(ConsentItemDto::from).collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListConsentsRes {
    pub consents: Vec<ConsentFormDto>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SignItemReq {
    pub signer: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SignItemRes {
    /// `signed` for a new signature, `already_signed` when the item was signed before
    pub outcome: String,
    pub form: ConsentFormDto,
}

impl SignItemRes {
    pub fn new(outcome: SignOutcome, form: &ConsentRecord) -> Self {
        let outcome = match outcome {
            SignOutcome::Signed => "signed",
            SignOutcome::AlreadySigned => "already_signed",
        };
        Self {
            outcome: outcome.to_owned(),
            form: form.into(),
        }
    }
}

// ============================================================================
// Dashboard summary
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct WardOccupancyDto {
    pub ward: String,
    pub total: usize,
    pub occupied: usize,
    pub available: usize,
    pub utilization_percent: u8,
    pub level: BadgeDto,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryCountDto {
    pub category: String,
    pub count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct OccupancyDto {
    pub total: usize,
    pub available: usize,
    pub occupied: usize,
    pub reserved: usize,
    pub maintenance: usize,
    pub utilization_percent: u8,
    pub level: BadgeDto,
    pub by_ward: Vec<WardOccupancyDto>,
    pub by_category: Vec<CategoryCountDto>,
}

impl From<&OccupancySummary> for OccupancyDto {
    fn from(summary: &OccupancySummary) -> Self {
        let counts = &summary.counts;
        Self {
            total: counts.total(),
            available: counts.available,
            occupied: counts.occupied,
            reserved: counts.reserved,
            maintenance: counts.maintenance,
            utilization_percent: counts.utilization_percent(),
            level: summary.level().badge().into(),
            by_ward: summary
                .by_ward
                .iter()
                .map(|w| WardOccupancyDto {
                    ward: w.ward.clone(),
                    total: w.counts.total(),
                    occupied: w.counts.occupied,
                    available: w.counts.available,
                    utilization_percent: w.counts.utilization_percent(),
                    level: w.level().badge().into(),
                })
                .collect(),
            by_category: summary
                .by_category
                .iter()
                .map(|(category, count)| CategoryCountDto {
                    category: category.to_string(),
                    count: *count,
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransitionSummaryDto {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub urgent_pending: usize,
}

impl From<&TransitionSummary> for TransitionSummaryDto {
    fn from(summary: &TransitionSummary) -> Self {
        Self {
            pending: summary.pending,
            approved: summary.approved,
            rejected: summary.rejected,
            in_progress: summary.in_progress,
            completed: summary.completed,
            urgent_pending: summary.urgent_pending,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConsentSummaryDto {
    pub draft: usize,
    pub pending: usize,
    pub completed: usize,
    pub expired: usize,
}

impl From<&ConsentSummary> for ConsentSummaryDto {
    fn from(summary: &ConsentSummary) -> Self {
        Self {
            draft: summary.draft,
            pending: summary.pending,
            completed: summary.completed,
            expired: summary.expired,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardSummaryRes {
    pub facility: String,
    pub occupancy: OccupancyDto,
    pub transitions: TransitionSummaryDto,
    pub consents: ConsentSummaryDto,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wardops_core::{FixtureSet, HospitalStore};

    fn store() -> HospitalStore {
        HospitalStore::from_fixtures("Test", FixtureSet::builtin().expect("builtin"))
            .expect("store")
    }

    #[test]
    fn occupied_resource_carries_occupant_and_badge() {
        let store = store();
        let dto = ResourceDto::from(store.resources().get("B001").expect("bed"));
        assert_eq!(dto.state, "occupied");
        assert_eq!(dto.badge.label, "Occupied");
        assert_eq!(
            dto.occupant.map(|o| o.patient_name),
            Some("John Smith".to_string())
        );

        let dto = ResourceDto::from(store.resources().get("B002").expect("bed"));
        assert!(dto.occupant.is_none());
    }

    #[test]
    fn consent_form_flattens_signatures() {
        let store = store();
        let dto = ConsentFormDto::from(store.consents().get("CF001").expect("form"));
        let privacy = dto.items.iter().find(|i| i.id == "CI003").expect("item");
        assert!(privacy.signed);
        assert_eq!(privacy.signed_by.as_deref(), Some("John Smith"));
        assert!(!dto.progress.ready_to_complete);
        assert_eq!(dto.badge.tone, "warning");
    }

    #[test]
    fn submit_request_parses_snake_case_enums() {
        let req: SubmitTransitionReq = serde_json::from_str(
            r#"{"patient_id":"P1","patient_name":"A","current":"day_care","requested":"ipd","priority":"urgent"}"#,
        )
        .expect("parse");
        assert_eq!(CareSetting::from(req.current), CareSetting::DayCare);
        assert_eq!(Priority::from(req.priority), Priority::Urgent);
        assert!(req.reason.is_empty());
    }

    #[test]
    fn transition_dto_uses_wire_names() {
        let store = store();
        let dto = TransitionDto::from(store.transitions().get("TR003").expect("request"));
        assert_eq!(dto.state, "in_progress");
        assert_eq!(dto.badge.label, "In Progress");
        assert_eq!(dto.requested, "icu");
        assert!(dto.reviewed_at.is_some());
    }
}
