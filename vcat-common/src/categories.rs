//! Vendor category set
//!
//! The allowed categories are a closed enumeration. Labels returned by a
//! language model are parsed strictly: surrounding whitespace is trimmed,
//! everything else must match a label exactly.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Label stored when a vendor could not be classified
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Allowed spend category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Office Supplies")]
    OfficeSupplies,
    #[serde(rename = "Software as a Service (SaaS)")]
    Saas,
    #[serde(rename = "Professional Services")]
    ProfessionalServices,
    #[serde(rename = "Marketing")]
    Marketing,
    #[serde(rename = "Travel & Entertainment")]
    TravelEntertainment,
    #[serde(rename = "Hardware & Equipment")]
    HardwareEquipment,
    #[serde(rename = "Utilities")]
    Utilities,
    #[serde(rename = "Rent & Facilities")]
    RentFacilities,
    #[serde(rename = "Insurance")]
    Insurance,
    #[serde(rename = "Financial Services")]
    FinancialServices,
}

impl Category {
    /// All categories in presentation order
    pub const ALL: [Category; 10] = [
        Category::OfficeSupplies,
        Category::Saas,
        Category::ProfessionalServices,
        Category::Marketing,
        Category::TravelEntertainment,
        Category::HardwareEquipment,
        Category::Utilities,
        Category::RentFacilities,
        Category::Insurance,
        Category::FinancialServices,
    ];

    /// Human-readable label, also the exact text a model must answer with
    pub fn label(self) -> &'static str {
        match self {
            Category::OfficeSupplies => "Office Supplies",
            Category::Saas => "Software as a Service (SaaS)",
            Category::ProfessionalServices => "Professional Services",
            Category::Marketing => "Marketing",
            Category::TravelEntertainment => "Travel & Entertainment",
            Category::HardwareEquipment => "Hardware & Equipment",
            Category::Utilities => "Utilities",
            Category::RentFacilities => "Rent & Facilities",
            Category::Insurance => "Insurance",
            Category::FinancialServices => "Financial Services",
        }
    }

    /// Parse a label. Only surrounding whitespace is forgiven.
    pub fn from_label(text: &str) -> Option<Category> {
        let trimmed = text.trim();
        Category::ALL.into_iter().find(|c| c.label() == trimmed)
    }

    /// Labels of every category, in presentation order
    pub fn labels() -> Vec<&'static str> {
        Category::ALL.iter().map(|c| c.label()).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned by [`Category::from_str`] for text outside the category set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category: {:?}", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::from_label(s).ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Category assigned to a vendor result: a real category or the sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiCategory {
    Assigned(Category),
    Uncategorized,
}

impl AiCategory {
    pub fn label(self) -> &'static str {
        match self {
            AiCategory::Assigned(category) => category.label(),
            AiCategory::Uncategorized => UNCATEGORIZED,
        }
    }

    pub fn is_uncategorized(self) -> bool {
        matches!(self, AiCategory::Uncategorized)
    }

    /// Parse a stored label (a category label or the sentinel)
    pub fn from_label(text: &str) -> Option<AiCategory> {
        if text.trim() == UNCATEGORIZED {
            return Some(AiCategory::Uncategorized);
        }
        Category::from_label(text).map(AiCategory::Assigned)
    }
}

impl From<Category> for AiCategory {
    fn from(category: Category) -> Self {
        AiCategory::Assigned(category)
    }
}

impl fmt::Display for AiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for AiCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for AiCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        AiCategory::from_label(&text)
            .ok_or_else(|| serde::de::Error::custom(UnknownCategory(text)))
    }
}
