//! Device mode normalization
//!
//! Gateway firmware does not always report its mode with an identifier from
//! its own published table. Normalization is total: whatever comes back,
//! including a failed read, ends up as a canonical mode or
//! [`NormalizedMode::Unknown`].

use crate::device::ModeReport;
use crate::error::Result;
use crate::mode::Mode;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// Canonical view of what the device reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "mode")]
pub enum NormalizedMode {
    Known(Mode),
    Unknown,
}

impl NormalizedMode {
    pub fn known(&self) -> Option<Mode> {
        match self {
            NormalizedMode::Known(mode) => Some(*mode),
            NormalizedMode::Unknown => None,
        }
    }
}

impl fmt::Display for NormalizedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedMode::Known(mode) => write!(f, "{}", mode),
            NormalizedMode::Unknown => f.write_str("unknown"),
        }
    }
}

/// Lookup tables from device identifiers to canonical modes
#[derive(Debug, Clone)]
pub struct ModeNormalizer {
    codes: BTreeMap<i64, Mode>,
    names: BTreeMap<String, Mode>,
}

impl Default for ModeNormalizer {
    fn default() -> Self {
        let mut names: BTreeMap<String, Mode> = Mode::ALL
            .into_iter()
            .map(|m| (m.as_str().to_string(), m))
            .collect();
        names.insert("backup".to_string(), Mode::EmergencyBackup);
        names.insert("tou".to_string(), Mode::TimeOfUse);
        names.insert("self_use".to_string(), Mode::SelfConsumption);

        // 18513 is reported for time-of-use by some firmware even though the
        // published table only lists 9322
        let codes = BTreeMap::from([(9322, Mode::TimeOfUse), (18513, Mode::TimeOfUse)]);

        Self { codes, names }
    }
}

impl ModeNormalizer {
    /// Normalizer with no identifiers at all besides the canonical names
    pub fn canonical_only() -> Self {
        Self {
            codes: BTreeMap::new(),
            names: Mode::ALL
                .into_iter()
                .map(|m| (m.as_str().to_string(), m))
                .collect(),
        }
    }

    /// Add or replace numeric code mappings
    pub fn with_codes<I: IntoIterator<Item = (i64, Mode)>>(mut self, codes: I) -> Self {
        self.codes.extend(codes);
        self
    }

    /// Add or replace name aliases; matching is case-insensitive.
    ///
    /// Canonical names always normalize to themselves, so aliases that fold
    /// onto one are ignored.
    pub fn with_names<I: IntoIterator<Item = (String, Mode)>>(mut self, names: I) -> Self {
        for (name, mode) in names {
            let folded = fold_name(&name);
            if Mode::from_canonical(&folded).is_some() {
                warn!(alias = %name, "Ignoring alias that shadows a canonical mode name");
                continue;
            }
            self.names.insert(folded, mode);
        }
        self
    }

    /// Normalize the result of a `get_mode` call, absorbing read failures
    pub fn normalize(&self, report: Result<ModeReport>) -> NormalizedMode {
        match report {
            Ok(report) => self.normalize_report(&report),
            Err(e) => {
                warn!(error = %e, "Could not read the current mode, treating it as unknown");
                NormalizedMode::Unknown
            }
        }
    }

    /// Normalize a single report
    pub fn normalize_report(&self, report: &ModeReport) -> NormalizedMode {
        let resolved = match report {
            ModeReport::Code(code) => self.codes.get(code).copied(),
            ModeReport::Name(name) => {
                let folded = fold_name(name);
                match folded.parse::<i64>() {
                    Ok(code) => self.codes.get(&code).copied(),
                    Err(_) => self.names.get(&folded).copied(),
                }
            }
        };

        match resolved {
            Some(mode) => {
                debug!(%report, %mode, "Normalized device mode");
                NormalizedMode::Known(mode)
            }
            None => {
                warn!(%report, "Device reported an unmapped mode identifier");
                NormalizedMode::Unknown
            }
        }
    }
}

/// Case- and separator-insensitive form of a mode name
pub fn fold_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}
