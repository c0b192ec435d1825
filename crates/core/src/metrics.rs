//! Derived metrics for the dashboard summary cards.
//!
//! Everything here is a pure function over the store. Each bed is counted once, under its
//! current state.

use crate::consent::{ConsentRecord, ConsentStatus, ConsentWorkflow};
use crate::resources::{ResourceCategory, ResourceStateKind, ResourceStore};
use crate::transitions::{Priority, TransitionState, TransitionWorkflow};
use std::collections::BTreeMap;

/// Integer percentage rounded half up. Zero when `total` is zero.
pub fn percent(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let value = (part.min(total) * 100 + total / 2) / total;
    value as u8
}

/// Coarse load band for a ward or the whole facility.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UtilizationLevel {
    Low,
    Normal,
    High,
    Critical,
}

impl UtilizationLevel {
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            90.. => UtilizationLevel::Critical,
            85..=89 => UtilizationLevel::High,
            65..=84 => UtilizationLevel::Normal,
            _ => UtilizationLevel::Low,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateCounts {
    pub available: usize,
    pub occupied: usize,
    pub reserved: usize,
    pub maintenance: usize,
}

impl StateCounts {
    fn add(&mut self, kind: ResourceStateKind) {
        match kind {
            ResourceStateKind::Available => self.available += 1,
            ResourceStateKind::Occupied => self.occupied += 1,
            ResourceStateKind::Reserved => self.reserved += 1,
            ResourceStateKind::Maintenance => self.maintenance += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.available + self.occupied + self.reserved + self.maintenance
    }

    pub fn utilization_percent(&self) -> u8 {
        percent(self.occupied, self.total())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WardOccupancy {
    pub ward: String,
    pub counts: StateCounts,
}

impl WardOccupancy {
    pub fn level(&self) -> UtilizationLevel {
        UtilizationLevel::from_percent(self.counts.utilization_percent())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccupancySummary {
    pub counts: StateCounts,
    pub by_ward: Vec<WardOccupancy>,
    pub by_category: Vec<(ResourceCategory, usize)>,
}

impl OccupancySummary {
    pub fn compute(store: &ResourceStore) -> Self {
        let mut counts = StateCounts::default();
        let mut wards: BTreeMap<&str, StateCounts> = BTreeMap::new();
        let mut categories: BTreeMap<ResourceCategory, usize> = BTreeMap::new();

        for resource in store.iter() {
            let kind = resource.state.kind();
            counts.add(kind);
            wards
                .entry(resource.location.ward.as_str())
                .or_default()
                .add(kind);
            *categories.entry(resource.category).or_default() += 1;
        }

        Self {
            counts,
            by_ward: wards
                .into_iter()
                .map(|(ward, counts)| WardOccupancy {
                    ward: ward.to_owned(),
                    counts,
                })
                .collect(),
            by_category: categories.into_iter().collect(),
        }
    }

    pub fn level(&self) -> UtilizationLevel {
        UtilizationLevel::from_percent(self.counts.utilization_percent())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitionSummary {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub urgent_pending: usize,
}

impl TransitionSummary {
    pub fn compute(workflow: &TransitionWorkflow) -> Self {
        let mut summary = Self::default();
        for request in workflow.iter() {
            match request.state {
                TransitionState::Pending => {
                    summary.pending += 1;
                    if request.priority == Priority::Urgent {
                        summary.urgent_pending += 1;
                    }
                }
                TransitionState::Approved => summary.approved += 1,
                TransitionState::Rejected => summary.rejected += 1,
                TransitionState::InProgress => summary.in_progress += 1,
                TransitionState::Completed => summary.completed += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.pending + self.approved + self.rejected + self.in_progress + self.completed
    }
}

/// Signing progress on one consent form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsentProgress {
    pub form_id: String,
    pub signed: usize,
    pub total: usize,
    pub required_signed: usize,
    pub required_total: usize,
}

impl ConsentProgress {
    pub fn compute(form: &ConsentRecord) -> Self {
        let mut progress = Self {
            form_id: form.id.clone(),
            signed: 0,
            total: form.items.len(),
            required_signed: 0,
            required_total: 0,
        };
        for item in &form.items {
            let signed = item.is_signed();
            progress.signed += usize::from(signed);
            if item.required {
                progress.required_total += 1;
                progress.required_signed += usize::from(signed);
            }
        }
        progress
    }

    pub fn percent_signed(&self) -> u8 {
        percent(self.signed, self.total)
    }

    pub fn ready_to_complete(&self) -> bool {
        self.required_signed == self.required_total
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConsentSummary {
    pub draft: usize,
    pub pending: usize,
    pub completed: usize,
    pub expired: usize,
}

impl ConsentSummary {
    pub fn compute(workflow: &ConsentWorkflow) -> Self {
        let mut summary = Self::default();
        for form in workflow.list() {
            match form.status {
                ConsentStatus::Draft => summary.draft += 1,
                ConsentStatus::Pending => summary.pending += 1,
                ConsentStatus::Completed => summary.completed += 1,
                ConsentStatus::Expired => summary.expired += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::FixtureSet;
    use crate::HospitalStore;

    fn builtin_store() -> HospitalStore {
        HospitalStore::from_fixtures("Test", FixtureSet::builtin().expect("builtin"))
            .expect("store")
    }

    #[test]
    fn percent_rounds_and_handles_empty_totals() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(28, 30), 93);
        assert_eq!(percent(5, 5), 100);
    }

    #[test]
    fn utilization_levels_follow_bands() {
        assert_eq!(UtilizationLevel::from_percent(93), UtilizationLevel::Critical);
        assert_eq!(UtilizationLevel::from_percent(88), UtilizationLevel::High);
        assert_eq!(UtilizationLevel::from_percent(84), UtilizationLevel::Normal);
        assert_eq!(UtilizationLevel::from_percent(63), UtilizationLevel::Low);
    }

    #[test]
    fn occupancy_counts_each_bed_once() {
        let store = builtin_store();
        let summary = OccupancySummary::compute(store.resources());
        assert_eq!(summary.counts.total(), store.resources().len());
        assert_eq!(summary.counts.occupied, 5);
        assert_eq!(summary.counts.available, 4);
        assert_eq!(summary.counts.reserved, 1);
        assert_eq!(summary.counts.maintenance, 1);
        assert_eq!(summary.counts.utilization_percent(), 45);

        let ward_total: usize = summary.by_ward.iter().map(|w| w.counts.total()).sum();
        assert_eq!(ward_total, summary.counts.total());
        let category_total: usize = summary.by_category.iter().map(|(_, n)| n).sum();
        assert_eq!(category_total, summary.counts.total());

        let icu = summary
            .by_ward
            .iter()
            .find(|w| w.ward == "ICU")
            .expect("icu ward");
        assert_eq!(icu.counts.utilization_percent(), 50);
    }

    #[test]
    fn occupancy_tracks_allocation() {
        let mut store = builtin_store();
        let before = OccupancySummary::compute(store.resources());
        store.resources_mut().allocate("B002").expect("allocate");
        let after = OccupancySummary::compute(store.resources());
        assert_eq!(after.counts.available, before.counts.available - 1);
        assert_eq!(after.counts.reserved, before.counts.reserved + 1);
        assert_eq!(after.counts.total(), before.counts.total());
    }

    #[test]
    fn transition_summary_counts_states_and_urgent_pending() {
        let store = builtin_store();
        let summary = TransitionSummary::compute(store.transitions());
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.urgent_pending, 1);
        assert_eq!(summary.approved, 1);
        assert_eq!(summary.in_progress, 1);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.total(), 4);
    }

    #[test]
    fn consent_progress_reflects_required_items() {
        let store = builtin_store();
        let cf001 = ConsentProgress::compute(store.consents().get("CF001").expect("form"));
        assert_eq!(cf001.signed, 1);
        assert_eq!(cf001.total, 5);
        assert_eq!(cf001.required_signed, 1);
        assert_eq!(cf001.required_total, 4);
        assert_eq!(cf001.percent_signed(), 20);
        assert!(!cf001.ready_to_complete());

        let cf002 = ConsentProgress::compute(store.consents().get("CF002").expect("form"));
        assert!(cf002.ready_to_complete());
        assert_eq!(cf002.percent_signed(), 100);

        let summary = ConsentSummary::compute(store.consents());
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.completed, 1);
    }
}
