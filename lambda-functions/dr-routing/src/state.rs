use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RoutingError;

/// Where a weighted record sends traffic.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteTarget {
    Records { values: Vec<String>, ttl: i64 },
    Alias {
        dns_name: String,
        hosted_zone_id: String,
        evaluate_target_health: bool,
    },
}

/// One weighted DNS entry for the public API hostname.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RoutingRecord {
    pub name: String,
    pub record_type: String,
    pub set_identifier: String,
    pub weight: u32,
    pub target: RouteTarget,
    pub health_check_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRole {
    Primary,
    Dr,
}

impl RoutingRecord {
    /// A set identifier mentioning `primary` wins over one that merely
    /// contains `dr`, so `primary-address` stays primary.
    pub fn role(&self) -> Option<RecordRole> {
        let tag = self.set_identifier.to_ascii_lowercase();
        if tag.contains("primary") {
            Some(RecordRole::Primary)
        } else if tag.contains("dr") {
            Some(RecordRole::Dr)
        } else {
            None
        }
    }

    pub fn matches(&self, hostname: &str, record_type: &str) -> bool {
        normalize_name(&self.name) == normalize_name(hostname)
            && self.record_type.eq_ignore_ascii_case(record_type)
    }
}

fn normalize_name(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

/// Derived from the two weights at the start of every invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingState {
    PrimaryActive,
    DrActive,
    Inconsistent,
}

impl RoutingState {
    pub fn classify(primary_weight: u32, dr_weight: u32) -> Self {
        match (primary_weight, dr_weight) {
            (p, 0) if p > 0 => Self::PrimaryActive,
            (0, d) if d > 0 => Self::DrActive,
            _ => Self::Inconsistent,
        }
    }
}

impl fmt::Display for RoutingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrimaryActive => write!(f, "PRIMARY_ACTIVE"),
            Self::DrActive => write!(f, "DR_ACTIVE"),
            Self::Inconsistent => write!(f, "INCONSISTENT"),
        }
    }
}

/// The primary and dr variants of the monitored hostname.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingPair {
    pub primary: RoutingRecord,
    pub dr: RoutingRecord,
}

impl RoutingPair {
    /// Picks exactly one primary-tagged and one dr-tagged record for
    /// `hostname`/`record_type` out of a zone listing.
    pub fn from_records(
        records: Vec<RoutingRecord>,
        hostname: &str,
        record_type: &str,
    ) -> Result<Self, RoutingError> {
        let mut primary: Option<RoutingRecord> = None;
        let mut dr: Option<RoutingRecord> = None;

        for record in records
            .into_iter()
            .filter(|record| record.matches(hostname, record_type))
        {
            let (slot, label) = match record.role() {
                Some(RecordRole::Primary) => (&mut primary, "primary"),
                Some(RecordRole::Dr) => (&mut dr, "dr"),
                None => continue,
            };
            if let Some(existing) = slot.as_ref() {
                return Err(RoutingError::Lookup(format!(
                    "duplicate {} records for {}: {} and {}",
                    label,
                    hostname,
                    existing.set_identifier,
                    record.set_identifier
                )));
            }
            *slot = Some(record);
        }

        match (primary, dr) {
            (Some(primary), Some(dr)) => Ok(Self { primary, dr }),
            (None, _) => Err(RoutingError::Lookup(format!(
                "no primary {} record found for {}",
                record_type, hostname
            ))),
            (_, None) => Err(RoutingError::Lookup(format!(
                "no dr {} record found for {}",
                record_type, hostname
            ))),
        }
    }

    pub fn state(&self) -> RoutingState {
        RoutingState::classify(self.primary.weight, self.dr.weight)
    }

    pub fn inconsistent(&self) -> RoutingError {
        RoutingError::InconsistentState {
            primary_weight: self.primary.weight,
            dr_weight: self.dr.weight,
        }
    }

    /// Both sides always travel together; a single-sided update cannot be built.
    pub fn reweigh(&self, weights: TargetWeights, comment: impl Into<String>) -> WeightBatch {
        WeightBatch {
            primary: WeightChange {
                record: self.primary.clone(),
                new_weight: weights.primary,
            },
            dr: WeightChange {
                record: self.dr.clone(),
                new_weight: weights.dr,
            },
            comment: comment.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetWeights {
    pub primary: u32,
    pub dr: u32,
}

impl TargetWeights {
    pub fn dr_active(active_weight: u32) -> Self {
        Self {
            primary: 0,
            dr: active_weight,
        }
    }

    pub fn primary_active(active_weight: u32) -> Self {
        Self {
            primary: active_weight,
            dr: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightChange {
    pub record: RoutingRecord,
    pub new_weight: u32,
}

impl WeightChange {
    pub fn set_identifier(&self) -> &str {
        &self.record.set_identifier
    }
}

/// An atomic primary + dr weight update.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightBatch {
    primary: WeightChange,
    dr: WeightChange,
    comment: String,
}

impl WeightBatch {
    pub fn primary(&self) -> &WeightChange {
        &self.primary
    }

    pub fn dr(&self) -> &WeightChange {
        &self.dr
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn changes(&self) -> [&WeightChange; 2] {
        [&self.primary, &self.dr]
    }

    /// `(set identifier, new weight)` pairs in submission order.
    pub fn weights(&self) -> Vec<(String, u32)> {
        self.changes()
            .iter()
            .map(|change| (change.set_identifier().to_string(), change.new_weight))
            .collect()
    }
}

/// What a controller decided to do with the observed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Shift(TargetWeights),
    Stay,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn record(set_identifier: &str, weight: u32) -> RoutingRecord {
        RoutingRecord {
            name: "api.example.com.".to_string(),
            record_type: "A".to_string(),
            set_identifier: set_identifier.to_string(),
            weight,
            target: RouteTarget::Records {
                values: vec!["203.0.113.10".to_string()],
                ttl: 60,
            },
            health_check_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::record;
    use super::*;

    #[test]
    fn test_classify_states() {
        assert_eq!(RoutingState::classify(100, 0), RoutingState::PrimaryActive);
        assert_eq!(RoutingState::classify(1, 0), RoutingState::PrimaryActive);
        assert_eq!(RoutingState::classify(0, 100), RoutingState::DrActive);
        assert_eq!(RoutingState::classify(0, 0), RoutingState::Inconsistent);
        assert_eq!(RoutingState::classify(50, 50), RoutingState::Inconsistent);
        assert_eq!(RoutingState::classify(100, 100), RoutingState::Inconsistent);
    }

    #[test]
    fn test_role_from_set_identifier() {
        assert_eq!(record("api-primary", 100).role(), Some(RecordRole::Primary));
        assert_eq!(record("api-dr", 0).role(), Some(RecordRole::Dr));
        assert_eq!(
            record("primary-address", 0).role(),
            Some(RecordRole::Primary)
        );
        assert_eq!(record("canary", 0).role(), None);
    }

    #[test]
    fn test_pair_ignores_other_names_and_types() {
        let mut other_name = record("www-primary", 100);
        other_name.name = "www.example.com.".to_string();
        let mut other_type = record("api-dr-v6", 0);
        other_type.record_type = "AAAA".to_string();

        let pair = RoutingPair::from_records(
            vec![
                other_name,
                record("api-primary", 100),
                other_type,
                record("api-dr", 0),
            ],
            "api.example.com",
            "A",
        )
        .unwrap();

        assert_eq!(pair.primary.set_identifier, "api-primary");
        assert_eq!(pair.dr.set_identifier, "api-dr");
        assert_eq!(pair.state(), RoutingState::PrimaryActive);
    }

    #[test]
    fn test_pair_missing_record() {
        let err = RoutingPair::from_records(
            vec![record("api-primary", 100)],
            "api.example.com",
            "A",
        )
        .unwrap_err();

        assert!(matches!(err, RoutingError::Lookup(msg) if msg.contains("no dr")));
    }

    #[test]
    fn test_pair_duplicate_record() {
        let err = RoutingPair::from_records(
            vec![
                record("api-primary", 100),
                record("api-primary-2", 0),
                record("api-dr", 0),
            ],
            "api.example.com",
            "A",
        )
        .unwrap_err();

        assert!(matches!(err, RoutingError::Lookup(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn test_reweigh_carries_both_sides() {
        let pair = RoutingPair {
            primary: record("api-primary", 100),
            dr: record("api-dr", 0),
        };

        let batch = pair.reweigh(TargetWeights::dr_active(100), "Failing over to DR region");

        assert_eq!(
            batch.weights(),
            vec![("api-primary".to_string(), 0), ("api-dr".to_string(), 100)]
        );
        assert_eq!(batch.comment(), "Failing over to DR region");
        // The original record is untouched apart from the weight.
        assert_eq!(batch.primary().record.target, pair.primary.target);
    }
}
