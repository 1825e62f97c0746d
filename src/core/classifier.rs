use std::str::FromStr;

use serde::Serialize;

use super::error::{ProjectionError, Result};
use super::rates::{GrowthRateConfig, MAX_ABS_RATE};
use super::types::{Account, AccountSource, Category, RawAccount, Side};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    Default,
    Override,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Classification {
    pub side: Side,
    pub rate: f64,
    pub rate_source: RateSource,
}

/// Lowercases and folds runs of non-alphanumerics into single underscores,
/// so "Credit Card" and "401(k)" become "credit_card" and "401_k".
fn normalize_label(label: &str) -> String {
    let mapped: String = label
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    mapped
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

impl FromStr for Category {
    type Err = ProjectionError;

    fn from_str(label: &str) -> Result<Self> {
        let key = normalize_label(label);
        let category = match key.as_str() {
            "cash" | "checking" | "savings" | "cd" | "money_market" | "depository" => {
                Category::Cash
            }
            "investment" | "brokerage" | "401k" | "401_k" | "403b" | "403_b" | "457b" | "ira"
            | "roth" | "roth_ira" | "529" | "hsa" | "pension" | "retirement" | "mutual_fund"
            | "stock" | "stocks" | "etf" => Category::Investment,
            "crypto" | "bitcoin" | "btc" | "ethereum" | "eth" | "polygon" | "base"
            | "arbitrum" | "optimism" | "solana" => Category::Crypto,
            k if k.starts_with("crypto_") => Category::Crypto,
            "real_estate" | "property" | "home" | "house" | "rental_property" => {
                Category::RealEstate
            }
            "other_asset" | "other" | "asset" | "manual_asset" | "commodity" | "art"
            | "collectible" | "business" | "vehicle" | "other_investment" => Category::OtherAsset,
            "mortgage" | "home_equity" | "heloc" => Category::Mortgage,
            "personal_loan" | "auto_loan" | "auto" | "student_loan" | "student" | "loan"
            | "consumer_loan" => Category::PersonalLoan,
            "business_debt" | "business_loan" | "commercial" => Category::BusinessDebt,
            "credit_debt" | "credit_card" | "credit" | "line_of_credit" => Category::CreditDebt,
            "other_liability" | "other_debt" | "liability" | "debt" => Category::OtherLiability,
            _ => return Err(ProjectionError::UnknownCategory(label.to_string())),
        };
        Ok(category)
    }
}

impl Category {
    pub fn from_label(label: &str) -> Result<Self> {
        label.parse()
    }
}

/// Resolves the category of a raw label and checks it against the side the
/// source system implies.
pub fn classify(source: AccountSource, label: &str) -> Result<Category> {
    let category = Category::from_label(label)?;
    if let Some(source_side) = source.implied_side() {
        if source_side != category.side() {
            return Err(ProjectionError::SideMismatch {
                category,
                category_side: category.side(),
                source_side,
            });
        }
    }
    Ok(category)
}

impl TryFrom<RawAccount> for Account {
    type Error = ProjectionError;

    fn try_from(raw: RawAccount) -> Result<Self> {
        let category = classify(raw.source, &raw.category)?;
        Ok(Account::new(raw.id, raw.name, category, raw.balance).with_overrides(raw.overrides))
    }
}

pub fn resolve_rate(account: &Account, config: &GrowthRateConfig) -> Result<Classification> {
    let side = account.side();
    if let Some(rate) = account.overrides.custom_growth_rate {
        if rate.is_finite() && rate.abs() <= MAX_ABS_RATE {
            return Ok(Classification {
                side,
                rate,
                rate_source: RateSource::Override,
            });
        }
        tracing::warn!(
            account_id = %account.id,
            rate,
            "ignoring out-of-range growth rate override"
        );
    }

    let entry = config.rate_for(account.category())?;
    Ok(Classification {
        side,
        rate: entry.annual_rate,
        rate_source: RateSource::Default,
    })
}

pub fn resolve_term(account: &Account, config: &GrowthRateConfig) -> Result<u32> {
    if account.side() == Side::Asset {
        return Ok(0);
    }
    match account.overrides.custom_loan_term_years {
        Some(term) => Ok(term),
        None => Ok(config.rate_for(account.category())?.default_term_years),
    }
}
