//! Classification prompt

use vcat_common::Category;

/// System message for chat-style providers
pub const SYSTEM_PROMPT: &str =
    "You are a professional business analyst specializing in vendor categorization.";

/// Build the classification prompt for one vendor
///
/// Deterministic: the same inputs always produce the same text. An absent
/// description is rendered as an empty string.
pub fn build_prompt(vendor_name: &str, description: &str) -> String {
    let categories = Category::labels().join(", ");
    format!(
        "You are a professional business analyst specializing in vendor and spend categorization.\n\
         Your task is to analyze a vendor and assign a single category from the provided list.\n\
         \n\
         Vendor Name: {vendor_name}\n\
         Vendor Description: {description}\n\
         \n\
         Allowed Categories:\n\
         {categories}\n\
         \n\
         Output only the single, best-fit category name. \
         Do not include any other text, explanations, or formatting."
    )
}
