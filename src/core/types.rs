use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed projection horizons, in years.
pub const HORIZONS: [u32; 5] = [1, 5, 10, 20, 30];

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Asset,
    Liability,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Asset => f.write_str("asset"),
            Side::Liability => f.write_str("liability"),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Cash,
    Investment,
    Crypto,
    RealEstate,
    OtherAsset,
    Mortgage,
    PersonalLoan,
    BusinessDebt,
    CreditDebt,
    OtherLiability,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Cash,
        Category::Investment,
        Category::Crypto,
        Category::RealEstate,
        Category::OtherAsset,
        Category::Mortgage,
        Category::PersonalLoan,
        Category::BusinessDebt,
        Category::CreditDebt,
        Category::OtherLiability,
    ];

    pub fn side(self) -> Side {
        match self {
            Category::Cash
            | Category::Investment
            | Category::Crypto
            | Category::RealEstate
            | Category::OtherAsset => Side::Asset,
            Category::Mortgage
            | Category::PersonalLoan
            | Category::BusinessDebt
            | Category::CreditDebt
            | Category::OtherLiability => Side::Liability,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Cash => "cash",
            Category::Investment => "investment",
            Category::Crypto => "crypto",
            Category::RealEstate => "real_estate",
            Category::OtherAsset => "other_asset",
            Category::Mortgage => "mortgage",
            Category::PersonalLoan => "personal_loan",
            Category::BusinessDebt => "business_debt",
            Category::CreditDebt => "credit_debt",
            Category::OtherLiability => "other_liability",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// System an account was synced or entered from.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountSource {
    Bank,
    Credit,
    Investment,
    Loan,
    Manual,
    Crypto,
}

impl AccountSource {
    pub fn implied_side(self) -> Option<Side> {
        match self {
            AccountSource::Bank | AccountSource::Investment | AccountSource::Crypto => {
                Some(Side::Asset)
            }
            AccountSource::Credit | AccountSource::Loan => Some(Side::Liability),
            AccountSource::Manual => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccountOverrides {
    pub custom_growth_rate: Option<f64>,
    pub custom_loan_term_years: Option<u32>,
    /// Contribution for assets, payment override for liabilities.
    pub monthly_contribution: Option<f64>,
}

/// Account record as delivered by the data layer, before classification.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAccount {
    pub id: String,
    pub name: String,
    pub source: AccountSource,
    pub category: String,
    pub balance: f64,
    #[serde(flatten)]
    pub overrides: AccountOverrides,
}

/// A classified account. Its side follows from the category and never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: String,
    pub name: String,
    category: Category,
    pub balance: f64,
    pub overrides: AccountOverrides,
}

impl Account {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: Category,
        balance: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            balance,
            overrides: AccountOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: AccountOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn side(&self) -> Side {
        self.category.side()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HorizonValues {
    pub one_year: f64,
    pub five_years: f64,
    pub ten_years: f64,
    pub twenty_years: f64,
    pub thirty_years: f64,
}

impl HorizonValues {
    pub fn from_fn(mut f: impl FnMut(f64) -> f64) -> Self {
        let [one, five, ten, twenty, thirty] = HORIZONS.map(|years| f(years as f64));
        Self {
            one_year: one,
            five_years: five,
            ten_years: ten,
            twenty_years: twenty,
            thirty_years: thirty,
        }
    }

    pub fn values(&self) -> [f64; 5] {
        [
            self.one_year,
            self.five_years,
            self.ten_years,
            self.twenty_years,
            self.thirty_years,
        ]
    }

    pub fn zip_with(self, other: Self, f: impl Fn(f64, f64) -> f64) -> Self {
        Self {
            one_year: f(self.one_year, other.one_year),
            five_years: f(self.five_years, other.five_years),
            ten_years: f(self.ten_years, other.ten_years),
            twenty_years: f(self.twenty_years, other.twenty_years),
            thirty_years: f(self.thirty_years, other.thirty_years),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_side_follows_its_category() {
        let account = Account::new("m", "Home", Category::Mortgage, 250_000.0);
        assert_eq!(account.category(), Category::Mortgage);
        assert_eq!(account.side(), Side::Liability);

        let updated = account.with_overrides(AccountOverrides {
            monthly_contribution: Some(2_000.0),
            ..AccountOverrides::default()
        });
        assert_eq!(updated.category(), Category::Mortgage);
        assert_eq!(updated.side(), Side::Liability);
    }

    #[test]
    fn every_category_has_exactly_one_side() {
        let assets = Category::ALL
            .iter()
            .filter(|c| c.side() == Side::Asset)
            .count();
        assert_eq!(assets, 5);
        assert_eq!(Category::ALL.len() - assets, 5);
    }

    #[test]
    fn horizon_values_follow_horizons() {
        let values = HorizonValues::from_fn(|years| years * 2.0);
        assert_eq!(values.values(), [2.0, 10.0, 20.0, 40.0, 60.0]);
    }
}
