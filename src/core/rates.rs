use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{ProjectionError, Result};
use super::types::{Category, Side};

pub const MAX_ABS_RATE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthRate {
    pub category: Category,
    pub annual_rate: f64,
    pub label: String,
    pub description: String,
    // 0 means revolving.
    pub default_term_years: u32,
}

impl GrowthRate {
    fn new(category: Category, annual_rate: f64, label: &str, default_term_years: u32) -> Self {
        Self {
            category,
            annual_rate,
            label: label.to_string(),
            description: describe_rate(category, annual_rate),
            default_term_years,
        }
    }
}

fn describe_rate(category: Category, annual_rate: f64) -> String {
    match category.side() {
        Side::Asset => format!("{:.1}% annual return", annual_rate * 100.0),
        Side::Liability => format!("{:.1}% APR", annual_rate * 100.0),
    }
}

// No wildcard arm: a new category must be given a rate here.
fn default_growth_rate(category: Category) -> GrowthRate {
    match category {
        Category::Cash => GrowthRate::new(category, 0.02, "Cash", 0),
        Category::Investment => GrowthRate::new(category, 0.07, "Investment", 0),
        Category::Crypto => GrowthRate::new(category, 0.15, "Crypto", 0),
        Category::RealEstate => GrowthRate::new(category, 0.05, "Real Estate", 0),
        Category::OtherAsset => GrowthRate::new(category, 0.05, "Other Asset", 0),
        Category::Mortgage => GrowthRate::new(category, 0.06, "Mortgage", 30),
        Category::PersonalLoan => GrowthRate::new(category, 0.10, "Personal Loan", 5),
        Category::BusinessDebt => GrowthRate::new(category, 0.08, "Business Debt", 10),
        Category::CreditDebt => GrowthRate::new(category, 0.18, "Credit Debt", 0),
        Category::OtherLiability => GrowthRate::new(category, 0.08, "Other Liability", 0),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrowthRateConfig {
    rates: BTreeMap<Category, GrowthRate>,
}

impl Default for GrowthRateConfig {
    fn default() -> Self {
        Self::from_entries(Category::ALL.into_iter().map(default_growth_rate))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
struct GrowthRateOverride {
    annual_rate: Option<f64>,
    default_term_years: Option<u32>,
    label: Option<String>,
}

impl GrowthRateConfig {
    pub fn from_entries(entries: impl IntoIterator<Item = GrowthRate>) -> Self {
        Self {
            rates: entries
                .into_iter()
                .map(|entry| (entry.category, entry))
                .collect(),
        }
    }

    pub fn from_json_overrides(json: &str) -> Result<Self> {
        let overrides: BTreeMap<String, GrowthRateOverride> = serde_json::from_str(json)
            .map_err(|e| ProjectionError::Config(format!("invalid growth rate JSON: {e}")))?;

        let mut config = Self::default();
        for (key, patch) in overrides {
            let category: Category = key.parse()?;
            let entry = config
                .rates
                .entry(category)
                .or_insert_with(|| default_growth_rate(category));

            if let Some(rate) = patch.annual_rate {
                if !rate.is_finite() || rate.abs() > MAX_ABS_RATE {
                    return Err(ProjectionError::InvalidRate {
                        context: format!("growth rate config entry '{key}'"),
                        rate,
                    });
                }
                entry.annual_rate = rate;
                entry.description = describe_rate(category, rate);
            }
            if let Some(term) = patch.default_term_years {
                if category.side() == Side::Asset && term > 0 {
                    return Err(ProjectionError::Config(format!(
                        "'{key}' is an asset category and cannot carry a loan term"
                    )));
                }
                entry.default_term_years = term;
            }
            if let Some(label) = patch.label {
                entry.label = label;
            }
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ProjectionError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_json_overrides(&raw)?;
        tracing::info!(path = %path.display(), "loaded growth rate overrides");
        Ok(config)
    }

    pub fn rate_for(&self, category: Category) -> Result<&GrowthRate> {
        self.rates
            .get(&category)
            .ok_or_else(|| ProjectionError::UnknownCategory(category.to_string()))
    }

    pub fn entries(&self) -> impl Iterator<Item = &GrowthRate> {
        self.rates.values()
    }
}
