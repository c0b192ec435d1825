//! Status-to-badge mapping shared by every dashboard.
//!
//! One table per enum, defined here once. Front ends map [`Tone`] onto their own colours.

use crate::consent::{ConsentCategory, ConsentStatus};
use crate::metrics::UtilizationLevel;
use crate::resources::{ResourceState, ResourceStateKind};
use crate::transitions::{Priority, TransitionState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Success,
    Warning,
    Danger,
    Info,
    Accent,
    Neutral,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusBadge {
    pub label: &'static str,
    pub tone: Tone,
}

const fn badge(label: &'static str, tone: Tone) -> StatusBadge {
    StatusBadge { label, tone }
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Success => "success",
            Tone::Warning => "warning",
            Tone::Danger => "danger",
            Tone::Info => "info",
            Tone::Accent => "accent",
            Tone::Neutral => "neutral",
        }
    }
}

pub trait Badge {
    fn badge(&self) -> StatusBadge;
}

impl Badge for ResourceStateKind {
    fn badge(&self) -> StatusBadge {
        match self {
            ResourceStateKind::Available => badge("Available", Tone::Success),
            ResourceStateKind::Occupied => badge("Occupied", Tone::Info),
            ResourceStateKind::Reserved => badge("Reserved", Tone::Warning),
            ResourceStateKind::Maintenance => badge("Maintenance", Tone::Neutral),
        }
    }
}

impl Badge for ResourceState {
    fn badge(&self) -> StatusBadge {
        self.kind().badge()
    }
}

impl Badge for TransitionState {
    fn badge(&self) -> StatusBadge {
        match self {
            TransitionState::Pending => badge("Pending", Tone::Warning),
            TransitionState::Approved => badge("Approved", Tone::Info),
            TransitionState::Rejected => badge("Rejected", Tone::Danger),
            TransitionState::InProgress => badge("In Progress", Tone::Accent),
            TransitionState::Completed => badge("Completed", Tone::Success),
        }
    }
}

impl Badge for Priority {
    fn badge(&self) -> StatusBadge {
        match self {
            Priority::Low => badge("Low", Tone::Neutral),
            Priority::Medium => badge("Medium", Tone::Info),
            Priority::High => badge("High", Tone::Warning),
            Priority::Urgent => badge("Urgent", Tone::Danger),
        }
    }
}

impl Badge for ConsentStatus {
    fn badge(&self) -> StatusBadge {
        match self {
            ConsentStatus::Draft => badge("DRAFT", Tone::Neutral),
            ConsentStatus::Pending => badge("PENDING", Tone::Warning),
            ConsentStatus::Completed => badge("COMPLETED", Tone::Success),
            ConsentStatus::Expired => badge("EXPIRED", Tone::Danger),
        }
    }
}

impl Badge for ConsentCategory {
    fn badge(&self) -> StatusBadge {
        match self {
            ConsentCategory::Treatment => badge("Treatment", Tone::Info),
            ConsentCategory::Privacy => badge("Privacy", Tone::Accent),
            ConsentCategory::Research => badge("Research", Tone::Success),
            ConsentCategory::Financial => badge("Financial", Tone::Warning),
            ConsentCategory::Emergency => badge("Emergency", Tone::Danger),
        }
    }
}

impl Badge for UtilizationLevel {
    fn badge(&self) -> StatusBadge {
        match self {
            UtilizationLevel::Low => badge("Low", Tone::Info),
            UtilizationLevel::Normal => badge("Normal", Tone::Success),
            UtilizationLevel::High => badge("High", Tone::Warning),
            UtilizationLevel::Critical => badge("Critical", Tone::Danger),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::Occupant;

    #[test]
    fn occupied_state_uses_kind_badge() {
        let state = ResourceState::Occupied(Occupant {
            patient_id: "P001".into(),
            patient_name: "John Smith".into(),
        });
        assert_eq!(state.badge(), ResourceStateKind::Occupied.badge());
    }

    #[test]
    fn terminal_transition_states_are_distinguishable() {
        assert_eq!(TransitionState::Rejected.badge().tone, Tone::Danger);
        assert_eq!(TransitionState::Completed.badge().tone, Tone::Success);
        assert_eq!(TransitionState::InProgress.badge().label, "In Progress");
    }

    #[test]
    fn every_transition_state_has_a_unique_label() {
        let labels: Vec<_> = TransitionState::ALL.iter().map(|s| s.badge().label).collect();
        for (i, label) in labels.iter().enumerate() {
            assert!(!labels[i + 1..].contains(label), "duplicate label {label}");
        }
    }

    #[test]
    fn consent_status_labels_are_uppercase() {
        let badge = ConsentStatus::Expired.badge();
        assert_eq!(badge.label, "EXPIRED");
        assert_eq!(badge.tone, Tone::Danger);
    }
}
