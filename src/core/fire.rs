use chrono::{Months, NaiveDate};
use serde::Serialize;

use super::error::{ProjectionError, Result};
use super::projector::{DebtService, MONTHS_PER_YEAR};
use super::rates::MAX_ABS_RATE;

pub const FIRE_MULTIPLE: f64 = 25.0;
pub const LEAN_FIRE_MULTIPLE: f64 = 20.0;
pub const FAT_FIRE_MULTIPLE: f64 = 37.5;
pub const RETIREMENT_AGE: u32 = 65;
pub const MAX_YEARS_TO_FIRE: f64 = 100.0;
pub const MAX_EXPECTED_RETURN: f64 = 0.20;

const SCENARIO_SPREAD: f64 = 0.02;
const RATE_EPSILON: f64 = 1e-12;
const ON_TRACK_SAVINGS_RATE: f64 = 30.0;
const LOW_SAVINGS_RATE: f64 = 20.0;
const TARGET_FIRE_AGE: u32 = 50;
const DEFAULT_YEARS_TO_TARGET: u32 = 20;
const DEFAULT_RECOMMENDED_SAVINGS_RATE: f64 = 50.0;
const MAX_RECOMMENDED_SAVINGS_RATE: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenarios<T> {
    pub conservative: T,
    pub base_case: T,
    pub aggressive: T,
}

impl<T> Scenarios<T> {
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Scenarios<U> {
        Scenarios {
            conservative: f(&self.conservative),
            base_case: f(&self.base_case),
            aggressive: f(&self.aggressive),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        [&self.conservative, &self.base_case, &self.aggressive].into_iter()
    }
}

impl Default for Scenarios<f64> {
    fn default() -> Self {
        Self {
            conservative: 0.05,
            base_case: 0.07,
            aggressive: 0.09,
        }
    }
}

impl Scenarios<f64> {
    pub fn around(expected_return: f64) -> Result<Self> {
        if !expected_return.is_finite() || !(0.0..=MAX_EXPECTED_RETURN).contains(&expected_return)
        {
            return Err(ProjectionError::InvalidRate {
                context: "expected return (must be between 0% and 20%)".to_string(),
                rate: expected_return,
            });
        }
        Ok(Self {
            conservative: (expected_return - SCENARIO_SPREAD).max(0.0),
            base_case: expected_return,
            aggressive: (expected_return + SCENARIO_SPREAD).min(MAX_EXPECTED_RETURN),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FireInputs {
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub current_net_worth: f64,
    pub age: Option<u32>,
    pub debt_service: DebtService,
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoryStatus {
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub monthly_savings: f64,
    pub savings_rate: f64,
    pub savings_rate_meaningful: bool,
    pub current_net_worth: f64,
}

impl TrajectoryStatus {
    pub fn from_inputs(inputs: &FireInputs) -> Self {
        let monthly_expenses = inputs.monthly_expenses + inputs.debt_service.monthly_interest;
        let monthly_savings =
            inputs.monthly_income - monthly_expenses - inputs.debt_service.monthly_principal;
        let (savings_rate, savings_rate_meaningful) = if inputs.monthly_income > 0.0 {
            (round2(monthly_savings / inputs.monthly_income * 100.0), true)
        } else {
            (0.0, false)
        };
        Self {
            monthly_income: inputs.monthly_income,
            monthly_expenses,
            monthly_savings,
            savings_rate,
            savings_rate_meaningful,
            current_net_worth: inputs.current_net_worth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireCalculation {
    pub annual_expenses: f64,
    pub fire_number: f64,
    pub gap: f64,
    pub progress_percentage: f64,
}

impl FireCalculation {
    pub fn from_status(status: &TrajectoryStatus) -> Self {
        let annual_expenses = status.monthly_expenses * MONTHS_PER_YEAR;
        let fire_number = annual_expenses * FIRE_MULTIPLE;
        let progress = if fire_number > 0.0 {
            status.current_net_worth / fire_number * 100.0
        } else {
            0.0
        };
        Self {
            annual_expenses,
            fire_number,
            gap: (fire_number - status.current_net_worth).max(0.0),
            progress_percentage: round2(progress.min(100.0)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioProjection {
    pub annual_return: f64,
    pub years_to_fire: Option<f64>,
    pub months_to_fire: Option<u32>,
    pub projected_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireMilestone {
    pub achieved: bool,
    pub amount: f64,
    pub label: String,
    pub description: String,
}

impl FireMilestone {
    fn new(net_worth: f64, amount: f64, label: &str, description: &str) -> Self {
        Self {
            achieved: net_worth >= amount,
            amount,
            label: label.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireMilestones {
    pub coast_fire: FireMilestone,
    pub lean_fire: FireMilestone,
    pub fire: FireMilestone,
    pub fat_fire: FireMilestone,
}

impl FireMilestones {
    fn in_order(&self) -> [&FireMilestone; 4] {
        [&self.coast_fire, &self.lean_fire, &self.fire, &self.fat_fire]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoryInsights {
    pub is_on_track: bool,
    pub recommended_savings_rate: f64,
    pub next_milestone: String,
    pub optimization_suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireTrajectory {
    pub current_status: TrajectoryStatus,
    pub fire_calculation: FireCalculation,
    pub projections: Scenarios<ScenarioProjection>,
    pub milestones: FireMilestones,
    pub insights: TrajectoryInsights,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Closed-form inverse of `asset_future_value`. `None` when the target is
/// never reached or lies beyond `MAX_YEARS_TO_FIRE`.
pub fn years_to_fire(
    net_worth: f64,
    monthly_savings: f64,
    annual_rate: f64,
    fire_number: f64,
) -> Option<f64> {
    if !(net_worth.is_finite()
        && monthly_savings.is_finite()
        && annual_rate.is_finite()
        && fire_number.is_finite())
    {
        return None;
    }
    if net_worth >= fire_number {
        return Some(0.0);
    }
    if monthly_savings <= 0.0 || annual_rate <= -1.0 {
        return None;
    }

    let annual_savings = monthly_savings * MONTHS_PER_YEAR;
    let years = if annual_rate.abs() < RATE_EPSILON {
        (fire_number - net_worth) / annual_savings
    } else {
        // FV(t) = (P + A/r)(1 + r)^t - A/r
        let offset = annual_savings / annual_rate;
        let ratio = (fire_number + offset) / (net_worth + offset);
        if !ratio.is_finite() || ratio <= 0.0 {
            return None;
        }
        ratio.ln() / (1.0 + annual_rate).ln()
    };

    (years.is_finite() && (0.0..=MAX_YEARS_TO_FIRE).contains(&years)).then_some(years)
}

fn project_scenario(
    status: &TrajectoryStatus,
    fire_number: f64,
    annual_return: f64,
    as_of: Option<NaiveDate>,
) -> ScenarioProjection {
    let years = years_to_fire(
        status.current_net_worth,
        status.monthly_savings,
        annual_return,
        fire_number,
    );
    let months = years.map(|y| (y * MONTHS_PER_YEAR).round() as u32);
    let projected_date = match (as_of, months) {
        (Some(date), Some(m)) => date.checked_add_months(Months::new(m)),
        _ => None,
    };
    ScenarioProjection {
        annual_return,
        years_to_fire: years,
        months_to_fire: months,
        projected_date,
    }
}

fn compute_milestones(
    net_worth: f64,
    annual_expenses: f64,
    age: Option<u32>,
    base_rate: f64,
) -> FireMilestones {
    let fire_number = annual_expenses * FIRE_MULTIPLE;
    let years_to_retirement = age.map_or(0, |a| RETIREMENT_AGE.saturating_sub(a));
    let coast_amount = fire_number / (1.0 + base_rate).powi(years_to_retirement as i32);

    FireMilestones {
        coast_fire: FireMilestone::new(
            net_worth,
            coast_amount,
            "Coast FIRE",
            "Can coast to retirement by 65",
        ),
        lean_fire: FireMilestone::new(
            net_worth,
            annual_expenses * LEAN_FIRE_MULTIPLE,
            "Lean FIRE",
            "20x annual expenses (5% withdrawal)",
        ),
        fire: FireMilestone::new(
            net_worth,
            fire_number,
            "FIRE",
            "25x annual expenses (4% withdrawal)",
        ),
        fat_fire: FireMilestone::new(
            net_worth,
            annual_expenses * FAT_FIRE_MULTIPLE,
            "Fat FIRE",
            "37.5x annual expenses (2.67% withdrawal)",
        ),
    }
}

fn derive_insights(
    status: &TrajectoryStatus,
    fire: &FireCalculation,
    base_case: &ScenarioProjection,
    milestones: &FireMilestones,
    age: Option<u32>,
) -> TrajectoryInsights {
    let is_on_track =
        status.savings_rate >= ON_TRACK_SAVINGS_RATE && base_case.years_to_fire.is_some();

    let years_to_target = age.map_or(DEFAULT_YEARS_TO_TARGET, |a| {
        TARGET_FIRE_AGE.saturating_sub(a)
    });
    let recommended_savings_rate = if years_to_target > 0
        && fire.fire_number > status.current_net_worth
        && status.monthly_income > 0.0
    {
        let required_monthly = (fire.fire_number - status.current_net_worth)
            / (years_to_target as f64 * MONTHS_PER_YEAR);
        (required_monthly / status.monthly_income * 100.0)
            .round()
            .min(MAX_RECOMMENDED_SAVINGS_RATE)
    } else {
        DEFAULT_RECOMMENDED_SAVINGS_RATE
    };

    let next_milestone = milestones
        .in_order()
        .into_iter()
        .find(|m| !m.achieved)
        .map_or_else(
            || "Already financially independent!".to_string(),
            |m| m.label.clone(),
        );

    let mut optimization_suggestions = Vec::new();
    if status.savings_rate < LOW_SAVINGS_RATE {
        optimization_suggestions
            .push("Increase savings rate to accelerate FIRE timeline".to_string());
    }

    TrajectoryInsights {
        is_on_track,
        recommended_savings_rate,
        next_milestone,
        optimization_suggestions,
    }
}

fn validate(inputs: &FireInputs, scenarios: &Scenarios<f64>) -> Result<()> {
    for (name, value) in [
        ("monthly expenses", inputs.monthly_expenses),
        ("debt payment", inputs.debt_service.monthly_payment),
        ("debt interest", inputs.debt_service.monthly_interest),
        ("debt principal", inputs.debt_service.monthly_principal),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ProjectionError::InvalidInput(format!(
                "{name} must be a non-negative number, got {value}"
            )));
        }
    }
    // Zero or negative income is allowed; the savings rate is then flagged.
    for (name, value) in [
        ("monthly income", inputs.monthly_income),
        ("current net worth", inputs.current_net_worth),
    ] {
        if !value.is_finite() {
            return Err(ProjectionError::InvalidInput(format!(
                "{name} must be finite, got {value}"
            )));
        }
    }
    for &rate in scenarios.iter() {
        if !rate.is_finite() || rate <= -1.0 || rate > MAX_ABS_RATE {
            return Err(ProjectionError::InvalidRate {
                context: "scenario return".to_string(),
                rate,
            });
        }
    }
    Ok(())
}

pub fn compute_fire_trajectory(
    inputs: &FireInputs,
    scenarios: &Scenarios<f64>,
) -> Result<FireTrajectory> {
    validate(inputs, scenarios)?;

    let current_status = TrajectoryStatus::from_inputs(inputs);
    let fire_calculation = FireCalculation::from_status(&current_status);
    let projections = scenarios.map(|&rate| {
        project_scenario(
            &current_status,
            fire_calculation.fire_number,
            rate,
            inputs.as_of,
        )
    });
    let milestones = compute_milestones(
        current_status.current_net_worth,
        fire_calculation.annual_expenses,
        inputs.age,
        scenarios.base_case,
    );
    let insights = derive_insights(
        &current_status,
        &fire_calculation,
        &projections.base_case,
        &milestones,
        inputs.age,
    );

    tracing::debug!(
        savings_rate = current_status.savings_rate,
        fire_number = fire_calculation.fire_number,
        years_to_fire = ?projections.base_case.years_to_fire,
        "computed fire trajectory"
    );

    Ok(FireTrajectory {
        current_status,
        fire_calculation,
        projections,
        milestones,
        insights,
    })
}
