//! Service discovery.
//!
//! Services live in a single directory as executable control scripts named
//! `<order>-<name>`, e.g. `05-logging` or `20-app`. The numeric prefix is the
//! boot order; everything after the first dash is free-form. Entries without
//! a dash are not services and are ignored. Entries with a dash but a
//! non-numeric prefix are reported and skipped.
//!
//! The catalog is built once and never re-scanned: teardown walks the same
//! sequence backwards.

use crate::service::ServiceRecord;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, error, warn};

/// Result of interpreting a directory entry name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedName {
    /// A well-formed service name with its ordering key
    Service(u32),
    /// No dash in the name, so not a service by convention
    NotAService,
    /// A dash is present but the prefix is not a valid order
    Invalid(String),
}

/// Interpret a file name according to the `<order>-<name>` convention.
///
/// The prefix must be nothing but ASCII digits. Signs, leading whitespace and
/// trailing garbage (`+3-x`, `12a-x`) are rejected rather than read as a
/// partial number.
pub fn parse_service_name(name: &str) -> ParsedName {
    let Some((prefix, _)) = name.split_once('-') else {
        return ParsedName::NotAService;
    };

    if prefix.is_empty() {
        return ParsedName::Invalid("missing order prefix".to_string());
    }

    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return ParsedName::Invalid(format!("order prefix {:?} is not a number", prefix));
    }

    match prefix.parse::<u32>() {
        Ok(order) => ParsedName::Service(order),
        Err(e) => ParsedName::Invalid(format!("order prefix {:?}: {}", prefix, e)),
    }
}

/// A directory entry that looked like a service but could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidEntry {
    /// File name as found on disk (lossily decoded)
    pub name: String,
    /// Why it was rejected
    pub reason: String,
}

/// The ordered set of services for one process lifetime.
///
/// Every entry in [`Catalog::invalid`] was also logged as a warning during
/// the scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    services: Vec<ServiceRecord>,
    invalid: Vec<InvalidEntry>,
}

impl Catalog {
    /// Scan a directory and build the catalog.
    ///
    /// An unreadable directory is logged and yields an empty catalog.
    pub fn scan(dir: &Path) -> Self {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "Failed to open service directory");
                return Self::default();
            }
        };

        let mut services = Vec::new();
        let mut invalid = Vec::new();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Failed to read directory entry");
                    continue;
                }
            };

            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                let name = file_name.to_string_lossy().into_owned();
                warn!(file = %name, "invalid service file: name is not valid UTF-8");
                invalid.push(InvalidEntry {
                    name,
                    reason: "name is not valid UTF-8".to_string(),
                });
                continue;
            };

            match parse_service_name(name) {
                ParsedName::Service(order) => {
                    debug!(file = %name, order = order, "Discovered service");
                    services.push(ServiceRecord::new(order, dir.join(name)));
                }
                ParsedName::NotAService => {}
                ParsedName::Invalid(reason) => {
                    warn!(file = %name, reason = %reason, "invalid service file");
                    invalid.push(InvalidEntry {
                        name: name.to_string(),
                        reason,
                    });
                }
            }
        }

        invalid.sort_by(|a, b| a.name.cmp(&b.name));
        Self::from_parts(services, invalid)
    }

    /// Build a catalog from already-discovered records.
    pub fn from_records(services: Vec<ServiceRecord>) -> Self {
        Self::from_parts(services, Vec::new())
    }

    fn from_parts(mut services: Vec<ServiceRecord>, invalid: Vec<InvalidEntry>) -> Self {
        // Equal orders fall back to file name so boot order never depends on
        // the directory listing.
        services.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name().cmp(b.name())));
        Self { services, invalid }
    }

    /// Services in boot order.
    pub fn services(&self) -> &[ServiceRecord] {
        &self.services
    }

    /// Services in boot order (ascending).
    pub fn boot_order(&self) -> impl Iterator<Item = &ServiceRecord> {
        self.services.iter()
    }

    /// Services in teardown order, the exact reverse of boot order.
    pub fn teardown_order(&self) -> impl Iterator<Item = &ServiceRecord> {
        self.services.iter().rev()
    }

    /// Entries that were rejected during the scan.
    pub fn invalid(&self) -> &[InvalidEntry] {
        &self.invalid
    }

    /// Number of services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether the catalog has no services.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
