use serde::Serialize;

use super::error::ProjectionError;
use super::projector::{AccountProjection, project_account};
use super::rates::GrowthRateConfig;
use super::solver::{CrossingSearchConfig, first_crossing};
use super::types::{Account, Category, HorizonValues, RawAccount, Side};

pub const MILLIONAIRE_TARGET: f64 = 1_000_000.0;

const LOW_YIELD_THRESHOLD: f64 = 0.05;
const CONCENTRATION_THRESHOLD: f64 = 0.30;
const DIVERSIFICATION_MIN_ASSETS: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectionOptions {
    pub target_net_worth: Option<f64>,
    pub search: CrossingSearchConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentStatus {
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub net_worth: f64,
    pub account_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Breakdown {
    pub assets: Vec<AccountProjection>,
    pub liabilities: Vec<AccountProjection>,
}

impl Breakdown {
    pub fn net_worth_at(&self, years: f64) -> f64 {
        let assets: f64 = self.assets.iter().map(|a| a.value_at(years)).sum();
        let liabilities: f64 = self.liabilities.iter().map(|l| l.value_at(years)).sum();
        assets - liabilities
    }

    fn horizon_totals(projections: &[AccountProjection]) -> HorizonValues {
        projections
            .iter()
            .fold(HorizonValues::default(), |acc, p| {
                acc.zip_with(p.projected_values, |a, b| a + b)
            })
    }
}

/// Years until each target is first met; `None` when unreached within the
/// search horizon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetWorthMilestones {
    pub reach_millionaire: Option<f64>,
    pub double: Option<f64>,
    pub reach_target: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioInsights {
    pub average_growth_rate: f64,
    pub best_performer: Option<String>,
    pub worst_performer: Option<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcludedAccount {
    pub id: String,
    pub name: String,
    pub reason: String,
}

impl ExcludedAccount {
    fn new(id: &str, name: &str, err: &ProjectionError) -> Self {
        tracing::warn!(account_id = id, error = %err, "excluding account from projection");
        Self {
            id: id.to_string(),
            name: name.to_string(),
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetWorthProjection {
    pub current_status: CurrentStatus,
    pub current_net_worth: f64,
    pub projections: HorizonValues,
    pub breakdown: Breakdown,
    pub milestones: NetWorthMilestones,
    pub insights: PortfolioInsights,
    pub excluded: Vec<ExcludedAccount>,
}

pub fn compute_net_worth_projection(
    accounts: &[Account],
    config: &GrowthRateConfig,
) -> NetWorthProjection {
    compute_net_worth_projection_with(accounts, config, ProjectionOptions::default())
}

/// Classifies raw records first; records that fail classification are
/// reported alongside accounts that fail projection.
pub fn compute_net_worth_projection_from_raw(
    raw_accounts: Vec<RawAccount>,
    config: &GrowthRateConfig,
    options: ProjectionOptions,
) -> NetWorthProjection {
    let mut accounts = Vec::with_capacity(raw_accounts.len());
    let mut excluded = Vec::new();
    for raw in raw_accounts {
        let (id, name) = (raw.id.clone(), raw.name.clone());
        match Account::try_from(raw) {
            Ok(account) => accounts.push(account),
            Err(err) => excluded.push(ExcludedAccount::new(&id, &name, &err)),
        }
    }

    let mut projection = compute_net_worth_projection_with(&accounts, config, options);
    excluded.append(&mut projection.excluded);
    projection.excluded = excluded;
    projection
}

pub fn compute_net_worth_projection_with(
    accounts: &[Account],
    config: &GrowthRateConfig,
    options: ProjectionOptions,
) -> NetWorthProjection {
    let mut breakdown = Breakdown::default();
    let mut excluded = Vec::new();

    for account in accounts {
        match project_account(account, config) {
            Ok(projection) => match projection.side {
                Side::Asset => breakdown.assets.push(projection),
                Side::Liability => breakdown.liabilities.push(projection),
            },
            Err(err) => excluded.push(ExcludedAccount::new(&account.id, &account.name, &err)),
        }
    }

    let total_assets: f64 = breakdown.assets.iter().map(|a| a.current_balance).sum();
    let total_liabilities: f64 = breakdown.liabilities.iter().map(|l| l.current_balance).sum();
    let net_worth = total_assets - total_liabilities;

    let projections = Breakdown::horizon_totals(&breakdown.assets).zip_with(
        Breakdown::horizon_totals(&breakdown.liabilities),
        |assets, liabilities| assets - liabilities,
    );

    let milestones = solve_milestones(&breakdown, net_worth, options);
    let insights = derive_insights(&breakdown, total_assets);

    tracing::debug!(
        assets = breakdown.assets.len(),
        liabilities = breakdown.liabilities.len(),
        excluded = excluded.len(),
        net_worth,
        "computed net worth projection"
    );

    NetWorthProjection {
        current_status: CurrentStatus {
            total_assets,
            total_liabilities,
            net_worth,
            account_count: breakdown.assets.len() + breakdown.liabilities.len(),
        },
        current_net_worth: net_worth,
        projections,
        breakdown,
        milestones,
        insights,
        excluded,
    }
}

fn solve_milestones(
    breakdown: &Breakdown,
    net_worth: f64,
    options: ProjectionOptions,
) -> NetWorthMilestones {
    let search =
        |target: f64| first_crossing(|t| breakdown.net_worth_at(t), target, options.search);

    NetWorthMilestones {
        reach_millionaire: search(MILLIONAIRE_TARGET),
        double: if net_worth > 0.0 {
            search(2.0 * net_worth)
        } else {
            None
        },
        reach_target: options.target_net_worth.and_then(search),
    }
}

fn share_of(assets: &[AccountProjection], category: Category, total_assets: f64) -> f64 {
    if total_assets <= 0.0 {
        return 0.0;
    }
    let held: f64 = assets
        .iter()
        .filter(|a| a.category == category)
        .map(|a| a.current_balance)
        .sum();
    held / total_assets
}

fn derive_insights(breakdown: &Breakdown, total_assets: f64) -> PortfolioInsights {
    let assets = &breakdown.assets;
    let Some(first) = assets.first() else {
        return PortfolioInsights::default();
    };

    let average_growth_rate =
        assets.iter().map(|a| a.growth_rate).sum::<f64>() / assets.len() as f64;
    let best = assets.iter().fold(first, |best, a| {
        if a.growth_rate > best.growth_rate { a } else { best }
    });
    let worst = assets.iter().fold(first, |worst, a| {
        if a.growth_rate < worst.growth_rate { a } else { worst }
    });

    let mut recommendations = Vec::new();
    if average_growth_rate < LOW_YIELD_THRESHOLD {
        recommendations.push(
            "Consider moving funds from low-yield accounts to higher-growth investments"
                .to_string(),
        );
    }

    let crypto_share = share_of(assets, Category::Crypto, total_assets);
    if crypto_share > CONCENTRATION_THRESHOLD {
        recommendations.push(
            "Your crypto allocation exceeds 30% - consider diversifying for risk management"
                .to_string(),
        );
    } else if crypto_share == 0.0 && total_assets > DIVERSIFICATION_MIN_ASSETS {
        recommendations.push(
            "Consider a small allocation (5-10%) to crypto for portfolio diversification"
                .to_string(),
        );
    }

    if share_of(assets, Category::Cash, total_assets) > CONCENTRATION_THRESHOLD {
        recommendations.push(
            "High cash allocation detected - consider investing excess cash for better returns"
                .to_string(),
        );
    }

    PortfolioInsights {
        average_growth_rate,
        best_performer: Some(best.name.clone()),
        worst_performer: Some(worst.name.clone()),
        recommendations,
    }
}
