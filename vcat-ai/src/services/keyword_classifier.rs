//! Offline keyword classifier
//!
//! Scores every category by how many of its keywords occur as whole words
//! in the lowercased vendor name and description. The highest score wins,
//! ties go to the category listed first. No hit is an error, never a default.

use crate::error::ClassificationError;
use crate::services::classifier::Classifier;
use async_trait::async_trait;
use vcat_common::Category;

const PROVIDER: &str = "keywords";

fn keywords(category: Category) -> &'static [&'static str] {
    match category {
        Category::OfficeSupplies => &["office", "supplies", "paper", "staples", "pens", "stationery", "stationary"],
        Category::Saas => &["software", "saas", "cloud", "subscription", "license", "microsoft", "adobe", "salesforce"],
        Category::ProfessionalServices => &["consulting", "advisor", "service", "professional", "legal", "accounting", "deloitte", "pwc", "kpmg", "ey"],
        Category::Marketing => &["marketing", "advertising", "media", "facebook", "google ads", "promotion", "campaign"],
        Category::TravelEntertainment => &["travel", "airline", "hotel", "flight", "booking", "transportation", "delta", "airbnb"],
        Category::HardwareEquipment => &["hardware", "computer", "laptop", "server", "equipment", "device", "dell", "hp", "apple"],
        Category::Utilities => &["utility", "electric", "water", "gas", "power", "telecom", "internet", "phone", "at&t", "verizon"],
        Category::RentFacilities => &["rent", "lease", "facility", "office space", "building", "property", "wework", "regus"],
        Category::Insurance => &["insurance", "policy", "coverage", "risk", "allstate", "geico", "prudential"],
        Category::FinancialServices => &["financial", "banking", "investment", "loan", "credit", "chase", "bank", "capital"],
    }
}

/// Lowercase and pad with spaces; punctuation other than `&` becomes a space
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    for c in text.chars() {
        if c.is_alphanumeric() || c == '&' {
            out.extend(c.to_lowercase());
        } else {
            out.push(' ');
        }
    }
    out.push(' ');
    out
}

fn score(haystack: &str, category: Category) -> usize {
    keywords(category)
        .iter()
        .filter(|kw| haystack.contains(&format!(" {} ", kw)))
        .count()
}

/// Rule-based classifier, usable without network access
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Best-scoring category, or `None` when no keyword matches
    pub fn best_match(&self, vendor_name: &str, description: &str) -> Option<Category> {
        let haystack = normalize(&format!("{} {}", vendor_name, description));
        let mut best: Option<(Category, usize)> = None;
        for category in Category::ALL {
            let hits = score(&haystack, category);
            if hits > best.map_or(0, |(_, h)| h) {
                best = Some((category, hits));
            }
        }
        best.map(|(category, _)| category)
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn classify(
        &self,
        vendor_name: &str,
        description: &str,
    ) -> Result<Category, ClassificationError> {
        let category = self
            .best_match(vendor_name, description)
            .ok_or(ClassificationError::NoMatch)?;
        tracing::debug!(provider = PROVIDER, vendor = %vendor_name, %category, "Keyword match");
        Ok(category)
    }

    fn is_remote(&self) -> bool {
        false
    }
}
