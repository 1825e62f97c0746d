mod aggregator;
mod classifier;
mod error;
mod fire;
mod projector;
mod rates;
mod solver;
mod types;

pub use aggregator::{
    Breakdown, CurrentStatus, ExcludedAccount, MILLIONAIRE_TARGET, NetWorthMilestones,
    NetWorthProjection, PortfolioInsights, ProjectionOptions, compute_net_worth_projection,
    compute_net_worth_projection_from_raw, compute_net_worth_projection_with,
};
pub use classifier::{Classification, RateSource, classify, resolve_rate, resolve_term};
pub use error::{ProjectionError, Result};
pub use fire::{
    FireCalculation, FireInputs, FireMilestone, FireMilestones, FireTrajectory,
    ScenarioProjection, Scenarios, TrajectoryInsights, TrajectoryStatus, compute_fire_trajectory,
    years_to_fire,
};
pub use projector::{
    AccountProjection, DebtService, ProjectionCurve, amortized_balance, asset_future_value,
    monthly_debt_service, project_account, scheduled_payment,
};
pub use rates::{GrowthRate, GrowthRateConfig, MAX_ABS_RATE};
pub use solver::{CrossingSearchConfig, first_crossing};
pub use types::{
    Account, AccountOverrides, AccountSource, Category, HORIZONS, HorizonValues, RawAccount, Side,
};
