//! The hospital store: one explicit owner for all bed, transition and consent state.
//!
//! Built once at startup from a [`FixtureSet`] and handed to whichever component needs it.

use crate::config::CoreConfig;
use crate::consent::ConsentWorkflow;
use crate::error::WardResult;
use crate::fixtures::FixtureSet;
use crate::resources::ResourceStore;
use crate::transitions::TransitionWorkflow;

#[derive(Clone, Debug)]
pub struct HospitalStore {
    facility_name: String,
    resources: ResourceStore,
    transitions: TransitionWorkflow,
    consents: ConsentWorkflow,
}

impl HospitalStore {
    /// Build a store from a fixture set, validating cross-record rules.
    ///
    /// # Errors
    ///
    /// Returns `WardError::Validation` on duplicate ids, a transition whose current and requested
    /// settings match, or a completed consent form with unsigned required items.
    pub fn from_fixtures(facility_name: impl Into<String>, set: FixtureSet) -> WardResult<Self> {
        Ok(Self {
            facility_name: facility_name.into(),
            resources: ResourceStore::new(set.resources)?,
            transitions: TransitionWorkflow::new(set.transitions)?,
            consents: ConsentWorkflow::new(set.consents)?,
        })
    }

    /// Open the store described by `cfg`: the configured fixture file, or the built-in set.
    pub fn open(cfg: &CoreConfig) -> WardResult<Self> {
        let set = match cfg.fixture_path() {
            Some(path) => FixtureSet::load(path)?,
            None => {
                tracing::info!("using built-in fixtures");
                FixtureSet::builtin()?
            }
        };
        Self::from_fixtures(cfg.facility_name(), set)
    }

    /// Copy the current state back out as a fixture set.
    pub fn snapshot(&self) -> FixtureSet {
        FixtureSet {
            resources: self.resources.iter().cloned().collect(),
            transitions: self.transitions.iter().cloned().collect(),
            consents: self.consents.list().cloned().collect(),
        }
    }

    pub fn facility_name(&self) -> &str {
        &self.facility_name
    }

    pub fn resources(&self) -> &ResourceStore {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceStore {
        &mut self.resources
    }

    pub fn transitions(&self) -> &TransitionWorkflow {
        &self.transitions
    }

    pub fn transitions_mut(&mut self) -> &mut TransitionWorkflow {
        &mut self.transitions
    }

    pub fn consents(&self) -> &ConsentWorkflow {
        &self.consents
    }

    pub fn consents_mut(&mut self) -> &mut ConsentWorkflow {
        &mut self.consents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResourceState;
    use crate::WardError;

    #[test]
    fn builtin_store_opens_with_default_config() {
        let cfg = CoreConfig::from_values(None, None).expect("config");
        let store = HospitalStore::open(&cfg).expect("open");
        assert_eq!(store.facility_name(), crate::DEFAULT_FACILITY_NAME);
        assert!(store.resources().get("B002").is_ok());
        assert!(store.transitions().get("TR001").is_ok());
        assert!(store.consents().get("CF001").is_ok());
    }

    #[test]
    fn snapshot_reflects_mutations() {
        let mut store =
            HospitalStore::from_fixtures("Test", FixtureSet::builtin().expect("builtin"))
                .expect("store");
        store.resources_mut().allocate("B002").expect("allocate");

        let snapshot = store.snapshot();
        let bed = snapshot
            .resources
            .iter()
            .find(|r| r.id == "B002")
            .expect("bed");
        assert_eq!(bed.state, ResourceState::Reserved);
    }

    #[test]
    fn opens_fixture_file_from_config() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("fixtures.yaml");
        let mut set = FixtureSet::builtin().expect("builtin");
        set.resources.truncate(2);
        set.save(&path).expect("save");

        let cfg = CoreConfig::new(Some(path), "Riverside".into()).expect("config");
        let store = HospitalStore::open(&cfg).expect("open");
        assert_eq!(store.resources().len(), 2);
    }

    #[test]
    fn duplicate_ids_fail_store_construction() {
        let mut set = FixtureSet::builtin().expect("builtin");
        let duplicate = set.transitions[0].clone();
        set.transitions.push(duplicate);
        let err = HospitalStore::from_fixtures("Test", set).expect_err("duplicate");
        assert!(matches!(err, WardError::Validation(msg) if msg.contains("TR001")));
    }
}
