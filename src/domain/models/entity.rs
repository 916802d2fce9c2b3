//! Entity domain model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    RegulationReference,
    StandardReference,
    Organization,
    Location,
    Date,
    Monetary,
    Percentage,
    TimePeriod,
    MiningEquipment,
    SafetyEquipment,
    EnvironmentalTerm,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegulationReference => "regulation_reference",
            Self::StandardReference => "standard_reference",
            Self::Organization => "organization",
            Self::Location => "location",
            Self::Date => "date",
            Self::Monetary => "monetary",
            Self::Percentage => "percentage",
            Self::TimePeriod => "time_period",
            Self::MiningEquipment => "mining_equipment",
            Self::SafetyEquipment => "safety_equipment",
            Self::EnvironmentalTerm => "environmental_term",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "regulation_reference" => Some(Self::RegulationReference),
            "standard_reference" => Some(Self::StandardReference),
            "organization" => Some(Self::Organization),
            "location" => Some(Self::Location),
            "date" => Some(Self::Date),
            "monetary" => Some(Self::Monetary),
            "percentage" => Some(Self::Percentage),
            "time_period" => Some(Self::TimePeriod),
            "mining_equipment" => Some(Self::MiningEquipment),
            "safety_equipment" => Some(Self::SafetyEquipment),
            "environmental_term" => Some(Self::EnvironmentalTerm),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed span extracted from a clause.
///
/// Offsets are clause-local char offsets: `0 <= start < end <= text.chars().count()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub entity_type: EntityType,
    pub value: String,
    pub normalized_value: String,
    pub confidence: f64,
    pub start: usize,
    pub end: usize,
    pub context: String,
    pub extraction_method: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Entity {
    pub fn overlaps(&self, other: &Self) -> bool {
        other.start <= self.end && other.end >= self.start
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityStatistics {
    pub total_entities: usize,
    pub by_type: BTreeMap<EntityType, usize>,
    pub by_method: BTreeMap<String, usize>,
    pub average_confidence: f64,
    pub high_confidence_count: usize,
}
