//! Runtime configuration of a dashboard instance.

use serde::{Deserialize, Serialize};

/// Default capacity of the bounded command queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Default number of events buffered per subscriber before it lags.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Configuration for a dashboard instance.
///
/// All fields have defaults, so a partial JSON document is valid.
///
/// # Examples
///
/// ```
/// use dashfold::DashboardConfig;
///
/// let config = DashboardConfig::from_json_str(r#"{ "editModeEnabled": false }"#).unwrap();
/// assert!(!config.edit_mode_enabled);
/// assert_eq!(config.queue_capacity, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardConfig {
    /// Global switch for edit mode. When off, requests to enter edit mode
    /// are reported as view mode.
    pub edit_mode_enabled: bool,
    /// Commands that may wait in the queue before `submit` blocks.
    pub queue_capacity: usize,
    /// Events buffered per subscriber before a slow one starts lagging.
    pub event_capacity: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            edit_mode_enabled: true,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl DashboardConfig {
    /// Parse a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if the document is not valid JSON or a
    /// field has the wrong type.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = DashboardConfig::from_json_str("{}").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert!(config.edit_mode_enabled);
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(DashboardConfig::from_json_str(r#"{ "queueCapacity": "lots" }"#).is_err());
    }
}
