//! Typed regex library for entity extraction.
//!
//! Every pattern captures the entity value in group 1 and is compiled
//! case-insensitively.

use crate::domain::models::EntityType;

pub struct EntityPatternSet {
    pub entity_type: EntityType,
    pub patterns: &'static [&'static str],
}

pub const REGULATION_REFERENCE_PATTERNS: &[&str] = &[
    r"\b([A-Z][a-zA-Z\s]+Act\s+\d{4})\b",
    r"\b(Regulation\s+\d+[A-Za-z]?(?:\(\d+\))?)\b",
    r"\b(Section\s+\d+[A-Za-z]?(?:\(\d+\))?)\b",
    r"\b(Part\s+[IVX]+[A-Za-z]?)\b",
    r"\b(Schedule\s+\d+[A-Za-z]?)\b",
    r"\b(Clause\s+\d+[A-Za-z]?(?:\(\d+\))?)\b",
];

pub const STANDARD_REFERENCE_PATTERNS: &[&str] = &[
    r"\b(AS\s+\d+(?:\.\d+)?(?::\d{4})?)\b",
    r"\b(ISO\s+\d+(?::\d{4})?)\b",
    r"\b(ANSI\s+[A-Z]+\d+)\b",
    r"\b(BS\s+\d+(?::\d{4})?)\b",
    r"\b(EN\s+\d+(?::\d{4})?)\b",
];

pub const ORGANIZATION_PATTERNS: &[&str] = &[
    r"\b([A-Z][a-zA-Z\s&]+(?:Pty|Ltd|Inc|Corp|Company|Corporation|Group|Holdings)\.?)\b",
    r"\b([A-Z][a-zA-Z\s]+(?:Department|Ministry|Authority|Commission|Board|Agency))\b",
    r"\b([A-Z][a-zA-Z\s]+(?:Council|Government|Administration))\b",
];

pub const LOCATION_PATTERNS: &[&str] = &[
    r"\b(New South Wales|NSW|Queensland|QLD|Western Australia|WA|South Australia|SA|Victoria|VIC|Tasmania|TAS|Northern Territory|NT|Australian Capital Territory|ACT)\b",
    r"\b([A-Z][a-zA-Z\s]+(?:City|Town|Shire|Municipality|Region))\b",
    r"\b([A-Z][a-zA-Z\s]+(?:Mine|Quarry|Site|Facility|Plant))\b",
];

pub const DATE_PATTERNS: &[&str] = &[
    r"\b(\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4})\b",
    r"\b(\d{1,2}\s+(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+\d{2,4})\b",
    r"\b((?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+\d{1,2},?\s+\d{2,4})\b",
    r"\b(\d{2,4}[/\-.]\d{1,2}[/\-.]\d{1,2})\b",
];

pub const MONETARY_PATTERNS: &[&str] = &[
    r"(\$\s*\d{1,3}(?:,\d{3})*(?:\.\d{2})?)",
    r"\b(\d{1,3}(?:,\d{3})*(?:\.\d{2})?\s*dollars?)\b",
    r"\b(\d{1,3}(?:,\d{3})*(?:\.\d{2})?\s*AUD)\b",
];

pub const PERCENTAGE_PATTERNS: &[&str] = &[r"\b(\d+(?:\.\d+)?%)", r"\b(\d+(?:\.\d+)?\s*per\s*cent)\b"];

pub const TIME_PERIOD_PATTERNS: &[&str] = &[
    r"\b(\d+\s*(?:day|week|month|year|hour)s?)\b",
    r"\b(within\s+\d+\s*(?:day|week|month|year|hour)s?)\b",
    r"\b(not\s+less\s+than\s+\d+\s*(?:day|week|month|year)s?)\b",
];

pub const MINING_EQUIPMENT_PATTERNS: &[&str] = &[
    r"\b(excavator|bulldozer|dump\s+truck|loader|drill|crusher|conveyor|processing\s+plant)\b",
    r"\b(haul\s+truck|grader|compactor|dragline|shovel|scraper)\b",
];

pub const SAFETY_EQUIPMENT_PATTERNS: &[&str] = &[
    r"\b(hard\s+hat|safety\s+helmet|high\s+vis|safety\s+vest|safety\s+boots)\b",
    r"\b(respirator|breathing\s+apparatus|gas\s+detector|safety\s+harness)\b",
    r"\b(first\s+aid\s+kit|emergency\s+equipment|fire\s+extinguisher)\b",
];

pub const ENVIRONMENTAL_TERM_PATTERNS: &[&str] = &[
    r"\b(groundwater|surface\s+water|water\s+table|aquifer|watershed)\b",
    r"\b(flora|fauna|ecosystem|habitat|biodiversity|endangered\s+species)\b",
    r"\b(air\s+quality|noise\s+level|dust\s+emission|water\s+quality)\b",
];

/// The full library, one set per entity type.
pub const ENTITY_PATTERNS: &[EntityPatternSet] = &[
    EntityPatternSet {
        entity_type: EntityType::RegulationReference,
        patterns: REGULATION_REFERENCE_PATTERNS,
    },
    EntityPatternSet {
        entity_type: EntityType::StandardReference,
        patterns: STANDARD_REFERENCE_PATTERNS,
    },
    EntityPatternSet {
        entity_type: EntityType::Organization,
        patterns: ORGANIZATION_PATTERNS,
    },
    EntityPatternSet {
        entity_type: EntityType::Location,
        patterns: LOCATION_PATTERNS,
    },
    EntityPatternSet {
        entity_type: EntityType::Date,
        patterns: DATE_PATTERNS,
    },
    EntityPatternSet {
        entity_type: EntityType::Monetary,
        patterns: MONETARY_PATTERNS,
    },
    EntityPatternSet {
        entity_type: EntityType::Percentage,
        patterns: PERCENTAGE_PATTERNS,
    },
    EntityPatternSet {
        entity_type: EntityType::TimePeriod,
        patterns: TIME_PERIOD_PATTERNS,
    },
    EntityPatternSet {
        entity_type: EntityType::MiningEquipment,
        patterns: MINING_EQUIPMENT_PATTERNS,
    },
    EntityPatternSet {
        entity_type: EntityType::SafetyEquipment,
        patterns: SAFETY_EQUIPMENT_PATTERNS,
    },
    EntityPatternSet {
        entity_type: EntityType::EnvironmentalTerm,
        patterns: ENVIRONMENTAL_TERM_PATTERNS,
    },
];

/// Mining-specific Acts recognised by the specialised extractor.
pub const MINING_ACT_PATTERNS: &[&str] = &[
    r"\b(Mining\s+Act\s+\d{4})\b",
    r"\b(Petroleum\s+and\s+Gas\s+\(Production\s+and\s+Safety\)\s+Act\s+\d{4})\b",
    r"\b(Environmental\s+Protection\s+Act\s+\d{4})\b",
    r"\b(Work\s+Health\s+and\s+Safety\s+Act\s+\d{4})\b",
    r"\b(Native\s+Title\s+Act\s+\d{4})\b",
    r"\b(Aboriginal\s+Cultural\s+Heritage\s+Act\s+\d{4})\b",
    r"\b(Environment\s+Protection\s+and\s+Biodiversity\s+Conservation\s+Act\s+\d{4})\b",
];

/// Markers that make an Act federal rather than state legislation.
pub const FEDERAL_MARKERS: &[&str] = &[
    "commonwealth",
    "epbc",
    "environment protection and biodiversity conservation",
];

/// State and territory names and their abbreviations.
pub const JURISDICTION_ABBREVIATIONS: &[(&str, &str)] = &[
    ("new south wales", "NSW"),
    ("queensland", "QLD"),
    ("western australia", "WA"),
    ("south australia", "SA"),
    ("victoria", "VIC"),
    ("tasmania", "TAS"),
    ("northern territory", "NT"),
    ("australian capital territory", "ACT"),
];

/// Jurisdiction names that are already canonical once uppercased.
pub const JURISDICTION_CODES: &[&str] = &[
    "nsw",
    "qld",
    "wa",
    "sa",
    "vic",
    "tas",
    "nt",
    "act",
    "commonwealth",
    "federal",
    "australia",
];
