//! # WardOps Core
//!
//! Core business logic for hospital ward operations.
//!
//! This crate contains pure, synchronous, in-memory state:
//! - Bed allocation ([`resources`])
//! - Care-setting transition approval ([`transitions`])
//! - Consent form signing ([`consent`])
//! - Seed data and its YAML form ([`fixtures`]), owned at runtime by [`HospitalStore`]
//! - Summary metrics and the shared status badge table ([`metrics`], [`presentation`])
//!
//! **No API concerns**: HTTP servers, request parsing and OpenAPI belong in `api-rest` and
//! `api-shared`. Callers that share a store across tasks wrap it in their own lock.

pub mod config;
pub mod consent;
pub mod constants;
pub mod error;
pub mod fixtures;
pub mod metrics;
pub mod presentation;
pub mod resources;
pub mod store;
pub mod transitions;

pub use config::CoreConfig;
pub use constants::DEFAULT_FACILITY_NAME;
pub use error::{RecordKind, WardError, WardResult};
pub use fixtures::FixtureSet;
pub use presentation::{Badge, StatusBadge, Tone};
pub use store::HospitalStore;

pub use consent::{
    ConsentCategory, ConsentItem, ConsentRecord, ConsentStatus, ConsentWorkflow, Signature,
    SignOutcome,
};
pub use metrics::{
    ConsentProgress, ConsentSummary, OccupancySummary, TransitionSummary, UtilizationLevel,
};
pub use resources::{
    Location, Occupant, Resource, ResourceCategory, ResourceFilter, ResourceState,
    ResourceStateKind, ResourceStore,
};
pub use transitions::{
    CareSetting, NewTransition, Priority, TransitionRequest, TransitionState, TransitionWorkflow,
};
