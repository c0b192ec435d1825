//! Resource allocation store.
//!
//! Holds every allocatable bed and the operations that move a bed between states. The occupant
//! lives inside [`ResourceState::Occupied`], so "occupant present if and only if occupied" holds
//! by construction; wire records are checked for the same rule when fixtures are parsed.
//!
//! Lifecycle:
//! - `available` -> `reserved` via [`ResourceStore::allocate`]
//! - `available | reserved` -> `occupied` via [`ResourceStore::admit`]
//! - `occupied | reserved` -> `available` via [`ResourceStore::release`]
//! - any -> `maintenance` via [`ResourceStore::mark_maintenance`]
//! - `maintenance` -> `available` via [`ResourceStore::return_to_service`]
//!
//! Resources are never deleted at runtime.

use crate::error::{RecordKind, WardError, WardResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Physical location of a bed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Location {
    pub ward: String,
    pub room: String,
    pub floor: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    General,
    Private,
    Icu,
    Emergency,
}

impl ResourceCategory {
    pub const ALL: [ResourceCategory; 4] = [
        ResourceCategory::General,
        ResourceCategory::Private,
        ResourceCategory::Icu,
        ResourceCategory::Emergency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceCategory::General => "general",
            ResourceCategory::Private => "private",
            ResourceCategory::Icu => "icu",
            ResourceCategory::Emergency => "emergency",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceCategory {
    type Err = WardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| WardError::Validation(format!("unknown resource category: {s}")))
    }
}

/// The patient currently assigned to an occupied bed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Occupant {
    pub patient_id: String,
    pub patient_name: String,
}

/// Lifecycle state of a bed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceState {
    Available,
    Occupied(Occupant),
    Reserved,
    Maintenance,
}

/// Field-less view of [`ResourceState`], used for filtering, counting and the wire form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStateKind {
    Available,
    Occupied,
    Reserved,
    Maintenance,
}

impl ResourceStateKind {
    pub const ALL: [ResourceStateKind; 4] = [
        ResourceStateKind::Available,
        ResourceStateKind::Occupied,
        ResourceStateKind::Reserved,
        ResourceStateKind::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceStateKind::Available => "available",
            ResourceStateKind::Occupied => "occupied",
            ResourceStateKind::Reserved => "reserved",
            ResourceStateKind::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for ResourceStateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceStateKind {
    type Err = WardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| WardError::Validation(format!("unknown resource state: {s}")))
    }
}

impl ResourceState {
    pub fn kind(&self) -> ResourceStateKind {
        match self {
            ResourceState::Available => ResourceStateKind::Available,
            ResourceState::Occupied(_) => ResourceStateKind::Occupied,
            ResourceState::Reserved => ResourceStateKind::Reserved,
            ResourceState::Maintenance => ResourceStateKind::Maintenance,
        }
    }

    pub fn occupant(&self) -> Option<&Occupant> {
        match self {
            ResourceState::Occupied(occupant) => Some(occupant),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind().fmt(f)
    }
}

/// An allocatable bed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resource {
    pub id: String,
    pub location: Location,
    pub category: ResourceCategory,
    pub state: ResourceState,
}

impl Resource {
    pub fn new(id: impl Into<String>, location: Location, category: ResourceCategory) -> Self {
        Self {
            id: id.into(),
            location,
            category,
            state: ResourceState::Available,
        }
    }
}

/// Optional filters applied when listing beds. Unset fields match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceFilter {
    pub ward: Option<String>,
    pub category: Option<ResourceCategory>,
    pub state: Option<ResourceStateKind>,
}

impl ResourceFilter {
    pub fn matches(&self, resource: &Resource) -> bool {
        self.ward
            .as_deref()
            .map_or(true, |w| resource.location.ward.eq_ignore_ascii_case(w))
            && self.category.map_or(true, |c| resource.category == c)
            && self.state.map_or(true, |s| resource.state.kind() == s)
    }
}

/// Keyed store of beds.
#[derive(Clone, Debug, Default)]
pub struct ResourceStore {
    resources: BTreeMap<String, Resource>,
}

impl ResourceStore {
    /// Build a store from an initial set of beds.
    ///
    /// # Errors
    ///
    /// Returns `WardError::Validation` if two beds share an identifier or one patient occupies
    /// two beds.
    pub fn new(resources: impl IntoIterator<Item = Resource>) -> WardResult<Self> {
        let mut map: BTreeMap<String, Resource> = BTreeMap::new();
        for resource in resources {
            if map.contains_key(&resource.id) {
                return Err(WardError::Validation(format!(
                    "duplicate resource id: {}",
                    resource.id
                )));
            }
            if let Some(occupant) = resource.state.occupant() {
                let clash = map.values().find(|r| {
                    r.state
                        .occupant()
                        .is_some_and(|o| o.patient_id == occupant.patient_id)
                });
                if let Some(other) = clash {
                    return Err(WardError::Validation(format!(
                        "patient {} occupies both {} and {}",
                        occupant.patient_id, other.id, resource.id
                    )));
                }
            }
            map.insert(resource.id.clone(), resource);
        }
        Ok(Self { resources: map })
    }

    pub fn get(&self, id: &str) -> WardResult<&Resource> {
        self.resources
            .get(id)
            .ok_or_else(|| WardError::not_found(RecordKind::Resource, id))
    }

    pub fn list<'a>(&'a self, filter: &'a ResourceFilter) -> impl Iterator<Item = &'a Resource> {
        self.resources.values().filter(move |r| filter.matches(r))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Reserve an available bed. The bed has no occupant until [`Self::admit`] is called.
    pub fn allocate(&mut self, id: &str) -> WardResult<&Resource> {
        self.apply(id, "allocate", |state| match state {
            ResourceState::Available => Some(ResourceState::Reserved),
            _ => None,
        })
    }

    /// Place a patient in an available or reserved bed.
    ///
    /// A patient occupies at most one bed; admitting someone who already has a bed is a
    /// validation error.
    pub fn admit(&mut self, id: &str, occupant: Occupant) -> WardResult<&Resource> {
        if occupant.patient_id.trim().is_empty() || occupant.patient_name.trim().is_empty() {
            return Err(WardError::Validation(
                "occupant patient_id and patient_name are required".into(),
            ));
        }
        if let Some(current) = self.bed_of(&occupant.patient_id) {
            tracing::warn!(
                "rejected admit on {}: {} is already in {}",
                id,
                occupant.patient_id,
                current.id
            );
            return Err(WardError::Validation(format!(
                "patient {} already occupies {}",
                occupant.patient_id, current.id
            )));
        }
        self.apply(id, "admit", move |state| match state {
            ResourceState::Available | ResourceState::Reserved => {
                Some(ResourceState::Occupied(occupant))
            }
            _ => None,
        })
    }

    /// Free an occupied or reserved bed, clearing any occupant.
    pub fn release(&mut self, id: &str) -> WardResult<&Resource> {
        self.apply(id, "release", |state| match state {
            ResourceState::Occupied(_) | ResourceState::Reserved => Some(ResourceState::Available),
            _ => None,
        })
    }

    /// Take a bed out of service from any state, clearing any occupant.
    pub fn mark_maintenance(&mut self, id: &str) -> WardResult<&Resource> {
        self.apply(id, "mark for maintenance", |_| Some(ResourceState::Maintenance))
    }

    /// Put a bed under maintenance back into service.
    pub fn return_to_service(&mut self, id: &str) -> WardResult<&Resource> {
        self.apply(id, "return to service", |state| match state {
            ResourceState::Maintenance => Some(ResourceState::Available),
            _ => None,
        })
    }

    fn bed_of(&self, patient_id: &str) -> Option<&Resource> {
        self.resources
            .values()
            .find(|r| r.state.occupant().is_some_and(|o| o.patient_id == patient_id))
    }

    /// Look up a bed and compute its next state. `next` returning `None` rejects the action and
    /// leaves the bed untouched.
    fn apply(
        &mut self,
        id: &str,
        action: &'static str,
        next: impl FnOnce(&ResourceState) -> Option<ResourceState>,
    ) -> WardResult<&Resource> {
        let resource = self
            .resources
            .get_mut(id)
            .ok_or_else(|| WardError::not_found(RecordKind::Resource, id))?;

        let Some(new_state) = next(&resource.state) else {
            tracing::warn!("rejected {} on {} (state: {})", action, id, resource.state);
            return Err(WardError::invalid_transition(
                RecordKind::Resource,
                id,
                &resource.state,
                action,
            ));
        };

        let previous = std::mem::replace(&mut resource.state, new_state);
        tracing::info!(
            "{}: {} -> {} ({})",
            id,
            previous,
            resource.state,
            action
        );
        Ok(resource)
    }
}
