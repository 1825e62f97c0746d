use serde::Serialize;

use super::classifier::{RateSource, resolve_rate, resolve_term};
use super::error::{ProjectionError, Result};
use super::rates::GrowthRateConfig;
use super::types::{Account, Category, HorizonValues, Side};

pub const MONTHS_PER_YEAR: f64 = 12.0;

pub const REVOLVING_MIN_PAYMENT_RATE: f64 = 0.03;

const RATE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProjectionCurve {
    #[serde(rename_all = "camelCase")]
    Asset {
        present_value: f64,
        annual_rate: f64,
        monthly_contribution: f64,
    },
    #[serde(rename_all = "camelCase")]
    AmortizingLiability {
        present_value: f64,
        annual_rate: f64,
        term_years: u32,
        scheduled_payment: f64,
        effective_payment: f64,
    },
    #[serde(rename_all = "camelCase")]
    RevolvingLiability {
        present_value: f64,
        monthly_payment: f64,
    },
}

impl ProjectionCurve {
    pub fn value_at(&self, years: f64) -> f64 {
        match *self {
            ProjectionCurve::Asset {
                present_value,
                annual_rate,
                monthly_contribution,
            } => asset_future_value(present_value, annual_rate, monthly_contribution, years),
            ProjectionCurve::AmortizingLiability {
                present_value,
                annual_rate,
                term_years,
                effective_payment,
                ..
            } => amortized_balance(
                present_value,
                annual_rate,
                term_years,
                effective_payment,
                years,
            ),
            ProjectionCurve::RevolvingLiability {
                present_value,
                monthly_payment,
            } => (present_value - monthly_payment * MONTHS_PER_YEAR * years).max(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProjection {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub side: Side,
    pub current_balance: f64,
    pub growth_rate: f64,
    pub rate_source: RateSource,
    pub loan_term_years: Option<u32>,
    pub monthly_contribution: Option<f64>,
    pub curve: ProjectionCurve,
    pub projected_values: HorizonValues,
}

impl AccountProjection {
    pub fn value_at(&self, years: f64) -> f64 {
        self.curve.value_at(years)
    }
}

pub fn asset_future_value(
    present_value: f64,
    annual_rate: f64,
    monthly_contribution: f64,
    years: f64,
) -> f64 {
    let annual_contribution = monthly_contribution * MONTHS_PER_YEAR;
    if annual_rate.abs() < RATE_EPSILON {
        return present_value + annual_contribution * years;
    }
    let growth = (1.0 + annual_rate).powf(years);
    present_value * growth + annual_contribution * (growth - 1.0) / annual_rate
}

pub fn scheduled_payment(principal: f64, annual_rate: f64, term_years: u32) -> f64 {
    if term_years == 0 || principal <= 0.0 {
        return 0.0;
    }
    let months = term_years as f64 * MONTHS_PER_YEAR;
    let monthly_rate = annual_rate / MONTHS_PER_YEAR;
    if monthly_rate.abs() < RATE_EPSILON {
        return principal / months;
    }
    let growth = (1.0 + monthly_rate).powf(months);
    principal * monthly_rate * growth / (growth - 1.0)
}

/// Remaining balance after `years` of paying `monthly_payment`; 0 once the
/// term has elapsed or the balance is paid off early.
pub fn amortized_balance(
    principal: f64,
    annual_rate: f64,
    term_years: u32,
    monthly_payment: f64,
    years: f64,
) -> f64 {
    if years >= term_years as f64 {
        return 0.0;
    }
    let months = years.max(0.0) * MONTHS_PER_YEAR;
    let monthly_rate = annual_rate / MONTHS_PER_YEAR;
    let balance = if monthly_rate.abs() < RATE_EPSILON {
        principal - monthly_payment * months
    } else {
        let growth = (1.0 + monthly_rate).powf(months);
        principal * growth - monthly_payment * (growth - 1.0) / monthly_rate
    };
    balance.max(0.0)
}

fn monthly_amount(account: &Account) -> Result<Option<f64>> {
    match account.overrides.monthly_contribution {
        Some(amount) if !amount.is_finite() || amount < 0.0 => {
            Err(ProjectionError::InvalidInput(format!(
                "account '{}' has invalid monthly contribution {amount}",
                account.id
            )))
        }
        other => Ok(other),
    }
}

fn present_value(account: &Account) -> Result<f64> {
    let invalid = || ProjectionError::InvalidBalance {
        account_id: account.id.clone(),
        balance: account.balance,
    };
    if !account.balance.is_finite() {
        return Err(invalid());
    }
    match account.side() {
        Side::Asset if account.balance < 0.0 => Err(invalid()),
        Side::Asset => Ok(account.balance),
        Side::Liability => Ok(account.balance.abs()),
    }
}

fn build_curve(
    present_value: f64,
    rate: f64,
    term: u32,
    side: Side,
    monthly: Option<f64>,
) -> ProjectionCurve {
    match side {
        Side::Asset => ProjectionCurve::Asset {
            present_value,
            annual_rate: rate,
            monthly_contribution: monthly.unwrap_or(0.0),
        },
        Side::Liability if term > 0 => {
            let scheduled = scheduled_payment(present_value, rate, term);
            ProjectionCurve::AmortizingLiability {
                present_value,
                annual_rate: rate,
                term_years: term,
                scheduled_payment: scheduled,
                // A payment override can only shorten the schedule.
                effective_payment: monthly.map_or(scheduled, |payment| payment.max(scheduled)),
            }
        }
        Side::Liability => ProjectionCurve::RevolvingLiability {
            present_value,
            monthly_payment: monthly.unwrap_or(0.0),
        },
    }
}

pub fn project_account(account: &Account, config: &GrowthRateConfig) -> Result<AccountProjection> {
    let present_value = present_value(account)?;
    let monthly = monthly_amount(account)?;
    let classification = resolve_rate(account, config)?;
    let term = resolve_term(account, config)?;

    let curve = build_curve(
        present_value,
        classification.rate,
        term,
        classification.side,
        monthly,
    );
    let projected_values = HorizonValues::from_fn(|years| curve.value_at(years));

    Ok(AccountProjection {
        id: account.id.clone(),
        name: account.name.clone(),
        category: account.category(),
        side: classification.side,
        current_balance: present_value,
        growth_rate: classification.rate,
        rate_source: classification.rate_source,
        loan_term_years: (classification.side == Side::Liability).then_some(term),
        monthly_contribution: monthly,
        curve,
        projected_values,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtService {
    pub monthly_payment: f64,
    pub monthly_interest: f64,
    pub monthly_principal: f64,
}

// Revolving debt is charged its minimum payment.
pub fn monthly_debt_service(accounts: &[Account], config: &GrowthRateConfig) -> DebtService {
    let mut total = DebtService::default();
    for account in accounts.iter().filter(|a| a.side() == Side::Liability) {
        let projection = match project_account(account, config) {
            Ok(projection) => projection,
            Err(err) => {
                tracing::warn!(
                    account_id = %account.id,
                    error = %err,
                    "skipping liability in debt service"
                );
                continue;
            }
        };

        let balance = projection.current_balance;
        let interest = balance * projection.growth_rate.abs() / MONTHS_PER_YEAR;
        let payment = match projection.curve {
            ProjectionCurve::AmortizingLiability {
                effective_payment, ..
            } => effective_payment,
            ProjectionCurve::RevolvingLiability {
                monthly_payment, ..
            } => monthly_payment.max(balance * REVOLVING_MIN_PAYMENT_RATE),
            ProjectionCurve::Asset { .. } => continue,
        };

        total.monthly_payment += payment;
        total.monthly_interest += interest;
        total.monthly_principal += (payment - interest).max(0.0);
    }
    total
}
