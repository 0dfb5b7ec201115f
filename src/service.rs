//! Service records and the actions that can be applied to them.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Action passed to a service control script as its only argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Bring the service up
    Start,
    /// Bring the service down
    Stop,
}

impl Action {
    /// The argument string handed to the script.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discovered service: its ordering key and the control script path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRecord {
    /// Numeric prefix of the file name
    pub order: u32,
    /// Full path to the control script
    pub path: PathBuf,
}

impl ServiceRecord {
    /// Create a new service record.
    pub fn new(order: u32, path: impl Into<PathBuf>) -> Self {
        Self {
            order,
            path: path.into(),
        }
    }

    /// Path to the control script.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of the control script, e.g. `10-network`.
    pub fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

impl fmt::Display for ServiceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_strings() {
        assert_eq!(Action::Start.as_str(), "start");
        assert_eq!(Action::Stop.to_string(), "stop");
    }

    #[test]
    fn test_record_name() {
        let record = ServiceRecord::new(10, "/etc/dendro/init.d/10-network");
        assert_eq!(record.name(), "10-network");
        assert_eq!(record.to_string(), "/etc/dendro/init.d/10-network");
    }

    #[test]
    fn test_action_serializes_lowercase() {
        let json = serde_json::to_string(&Action::Stop).unwrap();
        assert_eq!(json, "\"stop\"");
    }

    #[test]
    fn test_record_serializes_for_listing() {
        let record = ServiceRecord::new(5, "/etc/dendro/init.d/05-logging");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["order"], 5);
        assert_eq!(json["path"], "/etc/dendro/init.d/05-logging");
    }
}
