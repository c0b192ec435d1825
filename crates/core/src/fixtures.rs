//! Fixture set: the seed dataset behind the store, and its YAML wire form.
//!
//! Responsibilities:
//! - Define the on-disk YAML shape for beds, transition requests and consent forms
//! - Parse strictly (`deny_unknown_fields`) and report the failing field path
//! - Translate between the wire shape and domain types
//!
//! Notes:
//! - Beds carry `state` and `occupant` as separate wire fields; the domain folds the occupant
//!   into [`ResourceState::Occupied`]. Translation rejects records that disagree.
//! - Cross-record rules (unique ids and so on) are checked when the store is built, see
//!   [`crate::HospitalStore::from_fixtures`].

use crate::consent::ConsentRecord;
use crate::error::{WardError, WardResult};
use crate::resources::{
    Location, Occupant, Resource, ResourceCategory, ResourceState, ResourceStateKind,
};
use crate::transitions::TransitionRequest;
use serde::{Deserialize, Serialize};
use std::path::Path;

const BUILTIN_FIXTURES: &str = include_str!("../fixtures/builtin.yaml");

// ============================================================================
// Public domain-level types
// ============================================================================

/// Every record the store starts from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixtureSet {
    pub resources: Vec<Resource>,
    pub transitions: Vec<TransitionRequest>,
    pub consents: Vec<ConsentRecord>,
}

impl FixtureSet {
    /// The dataset shipped with the crate.
    pub fn builtin() -> WardResult<Self> {
        Self::parse(BUILTIN_FIXTURES)
    }

    /// Parse a fixture set from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `WardError::Translation` if:
    /// - the YAML does not match the wire schema (the message names the field path),
    /// - unknown keys are present,
    /// - a bed's `occupant` disagrees with its `state`.
    pub fn parse(yaml_text: &str) -> WardResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        let wire = match serde_path_to_error::deserialize::<_, FixtureWire>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(WardError::Translation(format!(
                    "fixture schema mismatch at {path}: {source}"
                )));
            }
        };

        wire_to_domain(wire)
    }

    /// Render a fixture set as YAML text.
    pub fn render(&self) -> WardResult<String> {
        serde_yaml::to_string(&domain_to_wire(self)).map_err(WardError::YamlSerialization)
    }

    /// Read and parse a fixture file.
    pub fn load(path: &Path) -> WardResult<Self> {
        let text = std::fs::read_to_string(path).map_err(WardError::FileRead)?;
        let set = Self::parse(&text)?;
        tracing::info!(
            "loaded fixtures from {}: {} resources, {} transitions, {} consent forms",
            path.display(),
            set.resources.len(),
            set.transitions.len(),
            set.consents.len()
        );
        Ok(set)
    }

    /// Render and write a fixture file, replacing any existing content.
    pub fn save(&self, path: &Path) -> WardResult<()> {
        let text = self.render()?;
        std::fs::write(path, text).map_err(WardError::FileWrite)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct FixtureWire {
    #[serde(default)]
    resources: Vec<ResourceWire>,
    #[serde(default)]
    transitions: Vec<TransitionRequest>,
    #[serde(default)]
    consents: Vec<ConsentRecord>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct ResourceWire {
    id: String,
    location: Location,
    category: ResourceCategory,
    state: ResourceStateKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    occupant: Option<Occupant>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn wire_to_domain(wire: FixtureWire) -> WardResult<FixtureSet> {
    let resources = wire
        .resources
        .into_iter()
        .map(resource_from_wire)
        .collect::<WardResult<Vec<_>>>()?;

    Ok(FixtureSet {
        resources,
        transitions: wire.transitions,
        consents: wire.consents,
    })
}

fn resource_from_wire(wire: ResourceWire) -> WardResult<Resource> {
    let state = match (wire.state, wire.occupant) {
        (ResourceStateKind::Occupied, Some(occupant)) => ResourceState::Occupied(occupant),
        (ResourceStateKind::Occupied, None) => {
            return Err(WardError::Translation(format!(
                "resource {} is occupied but has no occupant",
                wire.id
            )));
        }
        (kind, Some(_)) => {
            return Err(WardError::Translation(format!(
                "resource {} has an occupant but is {kind}",
                wire.id
            )));
        }
        (ResourceStateKind::Available, None) => ResourceState::Available,
        (ResourceStateKind::Reserved, None) => ResourceState::Reserved,
        (ResourceStateKind::Maintenance, None) => ResourceState::Maintenance,
    };

    Ok(Resource {
        id: wire.id,
        location: wire.location,
        category: wire.category,
        state,
    })
}

fn domain_to_wire(set: &FixtureSet) -> FixtureWire {
    FixtureWire {
        resources: set
            .resources
            .iter()
            .map(|r| ResourceWire {
                id: r.id.clone(),
                location: r.location.clone(),
                category: r.category,
                state: r.state.kind(),
                occupant: r.state.occupant().cloned(),
            })
            .collect(),
        transitions: set.transitions.clone(),
        consents: set.consents.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transitions::TransitionState;

    const SAMPLE: &str = r#"resources:
  - id: B001
    location: { ward: ICU, room: "201", floor: 2 }
    category: icu
    state: occupied
    occupant: { patient_id: P001, patient_name: John Smith }
  - id: B002
    location: { ward: ICU, room: "202", floor: 2 }
    category: icu
    state: available
transitions:
  - id: TR001
    patient_id: P003
    patient_name: Robert Brown
    current: opd
    requested: ipd
    priority: urgent
    state: pending
    submitted_at: 2024-01-15T08:00:00Z
"#;

    #[test]
    fn builtin_fixtures_parse() {
        let set = FixtureSet::builtin().expect("builtin");
        assert!(!set.resources.is_empty());
        assert!(!set.transitions.is_empty());
        assert!(set.consents.iter().any(|f| f.id == "CF001"));
        assert!(set.consents.iter().any(|f| f.id == "CF002"));
    }

    #[test]
    fn parses_sample_and_folds_occupant_into_state() {
        let set = FixtureSet::parse(SAMPLE).expect("parse");
        assert_eq!(set.resources.len(), 2);
        assert_eq!(
            set.resources[0].state.occupant().map(|o| o.patient_name.as_str()),
            Some("John Smith")
        );
        assert_eq!(set.resources[1].state, ResourceState::Available);
        assert_eq!(set.transitions[0].state, TransitionState::Pending);
        assert!(set.consents.is_empty());
    }

    #[test]
    fn render_then_parse_preserves_set() {
        let set = FixtureSet::builtin().expect("builtin");
        let text = set.render().expect("render");
        assert_eq!(FixtureSet::parse(&text).expect("reparse"), set);
    }

    #[test]
    fn rejects_occupied_bed_without_occupant() {
        let input = SAMPLE.replace(
            "    occupant: { patient_id: P001, patient_name: John Smith }\n",
            "",
        );
        let err = FixtureSet::parse(&input).expect_err("missing occupant");
        match err {
            WardError::Translation(msg) => assert!(msg.contains("B001")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_occupant_on_available_bed() {
        let input = SAMPLE.replace("state: occupied", "state: available");
        let err = FixtureSet::parse(&input).expect_err("stray occupant");
        match err {
            WardError::Translation(msg) => assert!(msg.contains("available")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn strict_validation_rejects_unknown_keys() {
        let input = format!("{SAMPLE}unexpected_key: true\n");
        let err = FixtureSet::parse(&input).expect_err("unknown key");
        match err {
            WardError::Translation(msg) => assert!(msg.contains("unexpected_key")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn reports_path_of_bad_enum_value() {
        let input = SAMPLE.replace("priority: urgent", "priority: whenever");
        let err = FixtureSet::parse(&input).expect_err("bad priority");
        match err {
            WardError::Translation(msg) => assert!(msg.contains("priority")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn save_and_load_round_trip_through_file() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("fixtures.yaml");
        let set = FixtureSet::parse(SAMPLE).expect("parse");
        set.save(&path).expect("save");
        assert_eq!(FixtureSet::load(&path).expect("load"), set);

        let err = FixtureSet::load(&dir.path().join("missing.yaml")).expect_err("missing");
        assert!(matches!(err, WardError::FileRead(_)));
    }
}
