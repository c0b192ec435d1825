//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the store. Core code
//! never reads environment variables while handling a request.

use crate::constants::DEFAULT_FACILITY_NAME;
use crate::{WardError, WardResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    fixture_path: Option<PathBuf>,
    facility_name: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `WardError::Validation` if `facility_name` is blank, or if `fixture_path` is set
    /// but does not point at a file.
    pub fn new(fixture_path: Option<PathBuf>, facility_name: String) -> WardResult<Self> {
        if facility_name.trim().is_empty() {
            return Err(WardError::Validation(
                "facility_name cannot be empty".into(),
            ));
        }

        if let Some(path) = &fixture_path {
            if !path.is_file() {
                return Err(WardError::Validation(format!(
                    "fixture file does not exist: {}",
                    path.display()
                )));
            }
        }

        Ok(Self {
            fixture_path,
            facility_name: facility_name.trim().to_owned(),
        })
    }

    /// Build a config from optional raw values, as read from the environment by a binary.
    ///
    /// Empty or whitespace-only values are treated as unset.
    pub fn from_values(
        fixture_path: Option<String>,
        facility_name: Option<String>,
    ) -> WardResult<Self> {
        let fixture_path = fixture_path
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let facility_name = facility_name
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_FACILITY_NAME.into());

        Self::new(fixture_path, facility_name)
    }

    pub fn fixture_path(&self) -> Option<&Path> {
        self.fixture_path.as_deref()
    }

    pub fn facility_name(&self) -> &str {
        &self.facility_name
    }
}
