//! Constants used throughout the WardOps core crate.

/// Facility name used when none is configured.
pub const DEFAULT_FACILITY_NAME: &str = "General Hospital";

/// Prefix for identifiers assigned to newly submitted transition requests.
pub const TRANSITION_ID_PREFIX: &str = "TR";

/// Minimum digit width of generated transition identifiers (`TR001`).
pub const TRANSITION_ID_WIDTH: usize = 3;
