//! Fixed rule tables for clause classification.
//!
//! Each compliance category carries a keyword list, regulatory-reference
//! regexes, a weight and a subtype keyword map. Table order matters: on a
//! score tie the earlier category wins.

use crate::domain::models::ComplianceCategory;

/// A subtype and the keywords that vote for it.
pub struct SubtypeRule {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

/// Scoring rule for one compliance category.
pub struct CategoryRule {
    pub category: ComplianceCategory,
    pub keywords: &'static [&'static str],
    pub patterns: &'static [&'static str],
    pub weight: f64,
    pub subtypes: &'static [SubtypeRule],
}

pub const SAFETY_KEYWORDS: &[&str] = &[
    "safety",
    "health",
    "whs",
    "work health and safety",
    "occupational health",
    "hazard",
    "risk assessment",
    "safety management system",
    "sms",
    "safety procedures",
    "personal protective equipment",
    "ppe",
    "safety training",
    "incident",
    "accident",
    "injury",
    "fatality",
    "emergency",
    "evacuation",
    "first aid",
    "safety officer",
    "safety inspection",
    "safety audit",
    "safety compliance",
    "hazard identification",
    "risk control",
    "safety plan",
];

pub const SAFETY_PATTERNS: &[&str] = &[
    r"whs\s+act\s+\d{4}",
    r"work\s+health\s+and\s+safety\s+act",
    r"occupational\s+health\s+and\s+safety",
    r"safety\s+management\s+system",
    r"as\s+\d+\.\d+.*safety",
];

pub const SAFETY_SUBTYPES: &[SubtypeRule] = &[
    SubtypeRule {
        name: "safety_management_system",
        keywords: &["sms", "safety management system", "safety management"],
    },
    SubtypeRule {
        name: "hazard_management",
        keywords: &["hazard", "risk assessment", "hazard identification"],
    },
    SubtypeRule {
        name: "emergency_procedures",
        keywords: &["emergency", "evacuation", "emergency response"],
    },
    SubtypeRule {
        name: "safety_training",
        keywords: &["safety training", "competency", "safety education"],
    },
    SubtypeRule {
        name: "contractor_safety",
        keywords: &["contractor safety", "subcontractor safety"],
    },
];

pub const ENVIRONMENTAL_KEYWORDS: &[&str] = &[
    "environmental",
    "environment",
    "epbc",
    "environmental protection",
    "biodiversity",
    "cultural heritage",
    "native title",
    "rehabilitation",
    "restoration",
    "remediation",
    "water",
    "air quality",
    "noise",
    "dust",
    "emissions",
    "waste",
    "contamination",
    "pollution",
    "discharge",
    "impact assessment",
    "environmental impact",
    "flora",
    "fauna",
    "ecosystem",
    "habitat",
    "groundwater",
    "surface water",
    "water management",
];

pub const ENVIRONMENTAL_PATTERNS: &[&str] = &[
    r"epbc\s+act",
    r"environment\s+protection\s+and\s+biodiversity\s+conservation",
    r"environmental\s+protection\s+act",
    r"native\s+title\s+act",
    r"cultural\s+heritage\s+act",
];

pub const ENVIRONMENTAL_SUBTYPES: &[SubtypeRule] = &[
    SubtypeRule {
        name: "environmental_impact_assessment",
        keywords: &["eia", "impact assessment", "environmental assessment"],
    },
    SubtypeRule {
        name: "water_management",
        keywords: &["water", "groundwater", "surface water", "water quality"],
    },
    SubtypeRule {
        name: "rehabilitation_obligations",
        keywords: &["rehabilitation", "restoration", "remediation"],
    },
    SubtypeRule {
        name: "waste_management",
        keywords: &["waste", "disposal", "waste management"],
    },
    SubtypeRule {
        name: "cultural_heritage",
        keywords: &["cultural heritage", "aboriginal heritage", "indigenous"],
    },
];

pub const OPERATIONAL_KEYWORDS: &[&str] = &[
    "tenement",
    "mining lease",
    "exploration licence",
    "production",
    "extraction",
    "mining operations",
    "reporting",
    "audit",
    "inspection",
    "monitoring",
    "compliance",
    "record keeping",
    "documentation",
    "annual report",
    "quarterly report",
    "notification",
    "approval",
    "permit",
    "licence",
    "authorization",
    "variation",
    "amendment",
    "renewal",
    "transfer",
];

pub const OPERATIONAL_PATTERNS: &[&str] = &[
    r"mining\s+act\s+\d{4}",
    r"petroleum\s+and\s+gas\s+act",
    r"mineral\s+resources\s+act",
    r"exploration\s+licence",
    r"mining\s+lease",
];

pub const OPERATIONAL_SUBTYPES: &[SubtypeRule] = &[
    SubtypeRule {
        name: "tenement_conditions",
        keywords: &["tenement", "lease conditions", "licence conditions"],
    },
    SubtypeRule {
        name: "reporting_obligations",
        keywords: &["reporting", "report", "notification"],
    },
    SubtypeRule {
        name: "audit_access",
        keywords: &["audit", "inspection", "access"],
    },
    SubtypeRule {
        name: "documentation_requirements",
        keywords: &["documentation", "record keeping", "records"],
    },
    SubtypeRule {
        name: "change_management",
        keywords: &["variation", "amendment", "change"],
    },
];

pub const COMMERCIAL_KEYWORDS: &[&str] = &[
    "payment",
    "price",
    "cost",
    "fee",
    "charge",
    "invoice",
    "billing",
    "remuneration",
    "compensation",
    "delivery",
    "supply",
    "provision",
    "service",
    "warranty",
    "guarantee",
    "representation",
    "indemnity",
    "liability",
    "insurance",
    "termination",
    "expiry",
    "renewal",
    "extension",
];

pub const COMMERCIAL_PATTERNS: &[&str] = &[r"gst", r"tax", r"duty", r"levy"];

pub const COMMERCIAL_SUBTYPES: &[SubtypeRule] = &[
    SubtypeRule {
        name: "payment_terms",
        keywords: &["payment", "invoice", "billing", "remuneration"],
    },
    SubtypeRule {
        name: "delivery_conditions",
        keywords: &["delivery", "supply", "provision"],
    },
    SubtypeRule {
        name: "warranties",
        keywords: &["warranty", "guarantee", "representation"],
    },
    SubtypeRule {
        name: "indemnities",
        keywords: &["indemnity", "liability", "insurance"],
    },
    SubtypeRule {
        name: "termination_clauses",
        keywords: &["termination", "expiry", "breach"],
    },
];

pub const LEGAL_KEYWORDS: &[&str] = &[
    "governing law",
    "jurisdiction",
    "dispute resolution",
    "arbitration",
    "mediation",
    "court",
    "tribunal",
    "breach",
    "default",
    "remedy",
    "damages",
    "force majeure",
    "act of god",
    "unforeseen circumstances",
    "confidentiality",
    "non-disclosure",
    "proprietary",
    "intellectual property",
    "copyright",
    "patent",
];

pub const LEGAL_PATTERNS: &[&str] = &[
    r"corporations\s+act",
    r"competition\s+and\s+consumer\s+act",
    r"australian\s+consumer\s+law",
];

pub const LEGAL_SUBTYPES: &[SubtypeRule] = &[
    SubtypeRule {
        name: "dispute_resolution",
        keywords: &["dispute", "arbitration", "mediation"],
    },
    SubtypeRule {
        name: "governing_law",
        keywords: &["governing law", "jurisdiction"],
    },
    SubtypeRule {
        name: "confidentiality",
        keywords: &["confidential", "non-disclosure", "proprietary"],
    },
    SubtypeRule {
        name: "intellectual_property",
        keywords: &["intellectual property", "copyright", "patent"],
    },
    SubtypeRule {
        name: "force_majeure",
        keywords: &["force majeure", "act of god"],
    },
];

/// Rule table in tie-break order.
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: ComplianceCategory::SafetyCompliance,
        keywords: SAFETY_KEYWORDS,
        patterns: SAFETY_PATTERNS,
        weight: 1.0,
        subtypes: SAFETY_SUBTYPES,
    },
    CategoryRule {
        category: ComplianceCategory::EnvironmentalCompliance,
        keywords: ENVIRONMENTAL_KEYWORDS,
        patterns: ENVIRONMENTAL_PATTERNS,
        weight: 1.0,
        subtypes: ENVIRONMENTAL_SUBTYPES,
    },
    CategoryRule {
        category: ComplianceCategory::OperationalCompliance,
        keywords: OPERATIONAL_KEYWORDS,
        patterns: OPERATIONAL_PATTERNS,
        weight: 1.0,
        subtypes: OPERATIONAL_SUBTYPES,
    },
    CategoryRule {
        category: ComplianceCategory::CommercialTerms,
        keywords: COMMERCIAL_KEYWORDS,
        patterns: COMMERCIAL_PATTERNS,
        weight: 0.8,
        subtypes: COMMERCIAL_SUBTYPES,
    },
    CategoryRule {
        category: ComplianceCategory::LegalProvisions,
        keywords: LEGAL_KEYWORDS,
        patterns: LEGAL_PATTERNS,
        weight: 0.7,
        subtypes: LEGAL_SUBTYPES,
    },
];

pub const MANDATORY_INDICATORS: &[&str] = &[
    "shall",
    "must",
    "required",
    "mandatory",
    "obligated",
    "duty to",
    "responsible for",
    "ensure that",
    "comply with",
];

pub const PENALTY_INDICATORS: &[&str] = &[
    "penalty",
    "fine",
    "breach",
    "violation",
    "default",
    "termination",
    "damages",
    "liability",
    "forfeit",
];

/// Citation patterns collected into `regulatory_references`.
pub const REFERENCE_PATTERNS: &[&str] = &[
    r"([a-z\s]+act\s+\d{4})",
    r"(regulation\s+\d+)",
    r"(section\s+\d+[a-z]?)",
    r"(as\s+\d+(?:\.\d+)?)",
    r"(iso\s+\d+)",
];

/// Rule for a category; `None` for `administrative` and `unknown`.
pub fn category_rule(category: ComplianceCategory) -> Option<&'static CategoryRule> {
    CATEGORY_RULES.iter().find(|rule| rule.category == category)
}
