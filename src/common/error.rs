//! Error types for survey_planner
//!
//! The planning core never fails: unreachable legs, battery exhaustion and
//! failed replans are reported as values. This error type covers the
//! surrounding surfaces (configuration, map construction, export).

use thiserror::Error;

/// Main error type for the survey planner
#[derive(Error, Debug)]
pub enum SurveyError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Map description does not fit the grid
    #[error("Invalid map: {0}")]
    InvalidMap(String),

    /// Report or memory (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for SurveyError {
    fn from(e: toml::de::Error) -> Self {
        SurveyError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for SurveyError {
    fn from(e: serde_json::Error) -> Self {
        SurveyError::Serialization(e.to_string())
    }
}

/// Result type alias for survey operations
pub type SurveyResult<T> = Result<T, SurveyError>;
