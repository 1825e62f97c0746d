use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::core::{
    Account, FireInputs, FireTrajectory, GrowthRate, GrowthRateConfig, NetWorthProjection,
    ProjectionOptions, RawAccount, Scenarios, compute_fire_trajectory,
    compute_net_worth_projection, compute_net_worth_projection_from_raw, monthly_debt_service,
};

const DEFAULT_EXPECTED_RETURN: f64 = 0.07;

/// Listener address and the rate table the server answers with.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub growth_rates: GrowthRateConfig,
}

#[derive(Clone)]
struct AppState {
    growth_rates: Arc<GrowthRateConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectionPayload {
    accounts: Vec<RawAccount>,
    target_net_worth: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TrajectoryPayload {
    monthly_income: Option<f64>,
    monthly_expenses: Option<f64>,
    current_net_worth: Option<f64>,
    age: Option<u32>,
    as_of: Option<NaiveDate>,
    expected_return: Option<f64>,
    accounts: Option<Vec<RawAccount>>,
}

#[derive(Debug)]
struct TrajectoryRequest {
    inputs: FireInputs,
    scenarios: Scenarios<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GrowthRatesResponse<'a> {
    growth_rates: Vec<&'a GrowthRate>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(growth_rates: GrowthRateConfig) -> Router {
    let state = AppState {
        growth_rates: Arc::new(growth_rates),
    };
    Router::new()
        .route("/api/growth-rates", get(growth_rates_handler))
        .route("/api/projection", post(projection_handler))
        .route(
            "/api/trajectory",
            get(trajectory_get_handler).post(trajectory_post_handler),
        )
        .route("/api/trajectory/simulate", post(simulate_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(config: ServerConfig) -> std::io::Result<()> {
    let addr = SocketAddr::new(config.host, config.port);
    let app = router(config.growth_rates);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "trajectory HTTP API listening");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn growth_rates_handler(State(state): State<AppState>) -> Response {
    let response = GrowthRatesResponse {
        growth_rates: state.growth_rates.entries().collect(),
    };
    json_response(StatusCode::OK, response)
}

async fn projection_handler(
    State(state): State<AppState>,
    Json(payload): Json<ProjectionPayload>,
) -> Response {
    match build_projection(payload, &state.growth_rates) {
        Ok(projection) => json_response(StatusCode::OK, projection),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn trajectory_get_handler(
    State(state): State<AppState>,
    Query(payload): Query<TrajectoryPayload>,
) -> Response {
    trajectory_handler_impl(&state, payload, false)
}

async fn trajectory_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<TrajectoryPayload>,
) -> Response {
    trajectory_handler_impl(&state, payload, false)
}

async fn simulate_handler(
    State(state): State<AppState>,
    Json(payload): Json<TrajectoryPayload>,
) -> Response {
    trajectory_handler_impl(&state, payload, true)
}

fn trajectory_handler_impl(state: &AppState, payload: TrajectoryPayload, simulate: bool) -> Response {
    let mut request = match trajectory_request_from_payload(payload, &state.growth_rates, simulate)
    {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    request
        .inputs
        .as_of
        .get_or_insert_with(|| Utc::now().date_naive());

    match build_trajectory(&request) {
        Ok(trajectory) => json_response(StatusCode::OK, trajectory),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    tracing::debug!(%status, error = msg, "request rejected");
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn build_projection(
    payload: ProjectionPayload,
    growth_rates: &GrowthRateConfig,
) -> Result<NetWorthProjection, String> {
    if let Some(target) = payload.target_net_worth {
        if !target.is_finite() {
            return Err(format!("targetNetWorth must be a finite number, got {target}"));
        }
    }
    let options = ProjectionOptions {
        target_net_worth: payload.target_net_worth,
        ..ProjectionOptions::default()
    };

    let account_count = payload.accounts.len();
    let projection = compute_net_worth_projection_from_raw(payload.accounts, growth_rates, options);
    tracing::info!(
        accounts = account_count,
        excluded = projection.excluded.len(),
        net_worth = projection.current_net_worth,
        "projected net worth"
    );
    Ok(projection)
}

fn build_trajectory(request: &TrajectoryRequest) -> Result<FireTrajectory, String> {
    let trajectory =
        compute_fire_trajectory(&request.inputs, &request.scenarios).map_err(|e| e.to_string())?;
    tracing::info!(
        savings_rate = trajectory.current_status.savings_rate,
        years_to_fire = ?trajectory.projections.base_case.years_to_fire,
        "computed trajectory"
    );
    Ok(trajectory)
}

#[cfg(test)]
fn trajectory_request_from_json(
    json: &str,
    growth_rates: &GrowthRateConfig,
    simulate: bool,
) -> Result<TrajectoryRequest, String> {
    let payload = serde_json::from_str::<TrajectoryPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    trajectory_request_from_payload(payload, growth_rates, simulate)
}

fn trajectory_request_from_payload(
    payload: TrajectoryPayload,
    growth_rates: &GrowthRateConfig,
    simulate: bool,
) -> Result<TrajectoryRequest, String> {
    let monthly_income = payload
        .monthly_income
        .ok_or_else(|| "monthlyIncome is required".to_string())?;
    let monthly_expenses = payload
        .monthly_expenses
        .ok_or_else(|| "monthlyExpenses is required".to_string())?;

    let accounts = match payload.accounts {
        Some(raw_accounts) => raw_accounts
            .into_iter()
            .map(|raw| {
                let id = raw.id.clone();
                Account::try_from(raw).map_err(|e| format!("account '{id}': {e}"))
            })
            .collect::<Result<Vec<_>, String>>()?,
        None => Vec::new(),
    };

    let accounts_net_worth = if accounts.is_empty() {
        0.0
    } else {
        let projection = compute_net_worth_projection(&accounts, growth_rates);
        if let Some(excluded) = projection.excluded.first() {
            return Err(format!("account '{}': {}", excluded.id, excluded.reason));
        }
        projection.current_net_worth
    };
    let current_net_worth = payload.current_net_worth.unwrap_or(accounts_net_worth);

    let scenarios = match (simulate, payload.expected_return) {
        (true, expected) => Scenarios::around(expected.unwrap_or(DEFAULT_EXPECTED_RETURN))
            .map_err(|e| e.to_string())?,
        (false, Some(expected)) => Scenarios::around(expected).map_err(|e| e.to_string())?,
        (false, None) => Scenarios::default(),
    };

    Ok(TrajectoryRequest {
        inputs: FireInputs {
            monthly_income,
            monthly_expenses,
            current_net_worth,
            age: payload.age,
            debt_service: monthly_debt_service(&accounts, growth_rates),
            as_of: payload.as_of,
        },
        scenarios,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scheduled_payment;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn test_state() -> AppState {
        AppState {
            growth_rates: Arc::new(GrowthRateConfig::default()),
        }
    }

    #[test]
    fn trajectory_request_from_json_parses_web_keys() {
        let json = r#"{
          "monthlyIncome": 8000,
          "monthlyExpenses": 5000,
          "currentNetWorth": 50000,
          "age": 30,
          "asOf": "2026-03-01"
        }"#;
        let request = trajectory_request_from_json(json, &GrowthRateConfig::default(), false)
            .expect("json should parse");
        let inputs = request.inputs;

        assert_approx(inputs.monthly_income, 8_000.0);
        assert_approx(inputs.monthly_expenses, 5_000.0);
        assert_approx(inputs.current_net_worth, 50_000.0);
        assert_eq!(inputs.age, Some(30));
        assert_eq!(inputs.as_of, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert_approx(inputs.debt_service.monthly_payment, 0.0);
        assert_approx(request.scenarios.base_case, 0.07);
        assert_approx(request.scenarios.conservative, 0.05);
    }

    #[test]
    fn trajectory_request_requires_income_and_expenses() {
        let config = GrowthRateConfig::default();
        let err = trajectory_request_from_json(r#"{"monthlyExpenses": 10}"#, &config, false)
            .expect_err("missing income");
        assert!(err.contains("monthlyIncome"));

        let err = trajectory_request_from_json(r#"{"monthlyIncome": 10}"#, &config, false)
            .expect_err("missing expenses");
        assert!(err.contains("monthlyExpenses"));
    }

    #[test]
    fn accounts_supply_net_worth_and_debt_service() {
        let json = r#"{
          "monthlyIncome": 10000,
          "monthlyExpenses": 4000,
          "accounts": [
            {"id": "b1", "name": "Brokerage", "source": "investment", "category": "brokerage", "balance": 400000},
            {"id": "m1", "name": "Home", "source": "loan", "category": "mortgage", "balance": 300000}
          ]
        }"#;
        let request = trajectory_request_from_json(json, &GrowthRateConfig::default(), false)
            .expect("json should parse");
        let inputs = request.inputs;

        assert_approx(inputs.current_net_worth, 100_000.0);
        let payment = scheduled_payment(300_000.0, 0.06, 30);
        assert_approx(inputs.debt_service.monthly_payment, payment);
        assert_approx(inputs.debt_service.monthly_interest, 1_500.0);
        assert_approx(inputs.debt_service.monthly_principal, payment - 1_500.0);
    }

    #[test]
    fn explicit_net_worth_wins_over_accounts() {
        let json = r#"{
          "monthlyIncome": 10000,
          "monthlyExpenses": 4000,
          "currentNetWorth": 12345,
          "accounts": [
            {"id": "c1", "name": "Checking", "source": "bank", "category": "checking", "balance": 5000}
          ]
        }"#;
        let request = trajectory_request_from_json(json, &GrowthRateConfig::default(), false)
            .expect("json should parse");
        assert_approx(request.inputs.current_net_worth, 12_345.0);
    }

    #[test]
    fn misclassified_account_is_rejected() {
        let json = r#"{
          "monthlyIncome": 10000,
          "monthlyExpenses": 4000,
          "accounts": [
            {"id": "x1", "name": "Card", "source": "credit", "category": "savings", "balance": 100}
          ]
        }"#;
        let err = trajectory_request_from_json(json, &GrowthRateConfig::default(), false)
            .expect_err("side mismatch");
        assert!(err.contains("x1"));
    }

    #[test]
    fn unprojectable_account_is_rejected_instead_of_dropped() {
        let json = r#"{
          "monthlyIncome": 10000,
          "monthlyExpenses": 4000,
          "accounts": [
            {"id": "b1", "name": "Brokerage", "source": "investment", "category": "brokerage", "balance": 400000},
            {"id": "c1", "name": "Checking", "source": "bank", "category": "checking", "balance": -50000}
          ]
        }"#;
        let config = GrowthRateConfig::default();
        let err = trajectory_request_from_json(json, &config, false)
            .expect_err("negative asset balance");
        assert!(err.contains("c1"));
        assert!(err.contains("invalid balance"));

        let with_net_worth = json.replacen(
            "\"monthlyExpenses\": 4000,",
            "\"monthlyExpenses\": 4000, \"currentNetWorth\": 350000,",
            1,
        );
        let err = trajectory_request_from_json(&with_net_worth, &config, false)
            .expect_err("still rejected with explicit net worth");
        assert!(err.contains("c1"));
    }

    #[test]
    fn simulate_defaults_and_bounds_expected_return() {
        let config = GrowthRateConfig::default();
        let base = r#"{"monthlyIncome": 8000, "monthlyExpenses": 5000}"#;
        let request = trajectory_request_from_json(base, &config, true).expect("defaults");
        assert_approx(request.scenarios.base_case, 0.07);
        assert_approx(request.scenarios.aggressive, 0.09);

        let json = r#"{"monthlyIncome": 8000, "monthlyExpenses": 5000, "expectedReturn": 0.12}"#;
        let request = trajectory_request_from_json(json, &config, true).expect("in range");
        assert_approx(request.scenarios.conservative, 0.10);
        assert_approx(request.scenarios.aggressive, 0.14);

        let json = r#"{"monthlyIncome": 8000, "monthlyExpenses": 5000, "expectedReturn": 0.25}"#;
        let err = trajectory_request_from_json(json, &config, true).expect_err("out of range");
        assert!(err.contains("expected return"));
    }

    #[test]
    fn projection_rejects_non_finite_target() {
        let payload = ProjectionPayload {
            accounts: Vec::new(),
            target_net_worth: Some(f64::INFINITY),
        };
        let err = build_projection(payload, &GrowthRateConfig::default()).expect_err("bad target");
        assert!(err.contains("targetNetWorth"));
    }

    #[test]
    fn projection_payload_reports_excluded_accounts() {
        let json = r#"{
          "targetNetWorth": 250000,
          "accounts": [
            {"id": "i1", "name": "401k", "source": "investment", "category": "401k", "balance": 100000, "monthlyContribution": 500},
            {"id": "y1", "name": "Boat", "source": "manual", "category": "yacht", "balance": 90000}
          ]
        }"#;
        let payload: ProjectionPayload = serde_json::from_str(json).expect("json should parse");
        let projection =
            build_projection(payload, &GrowthRateConfig::default()).expect("valid projection");

        assert_eq!(projection.current_status.account_count, 1);
        assert_eq!(projection.excluded.len(), 1);
        assert_eq!(projection.excluded[0].id, "y1");
        assert!(projection.milestones.reach_target.is_some());

        let json = serde_json::to_string(&projection).expect("response should serialize");
        assert!(json.contains("\"currentNetWorth\""));
        assert!(json.contains("\"reachMillionaire\""));
        assert!(json.contains("\"reachTarget\""));
        assert!(json.contains("\"oneYear\""));
        assert!(json.contains("\"excluded\""));
        assert!(json.contains("\"monthlyContribution\""));
    }

    #[test]
    fn trajectory_response_serialization_contains_expected_fields() {
        let json = r#"{"monthlyIncome": 8000, "monthlyExpenses": 5000, "currentNetWorth": 50000, "asOf": "2026-01-01"}"#;
        let request = trajectory_request_from_json(json, &GrowthRateConfig::default(), false)
            .expect("json should parse");
        let trajectory = build_trajectory(&request).expect("valid trajectory");
        let json = serde_json::to_string(&trajectory).expect("response should serialize");

        assert!(json.contains("\"currentStatus\""));
        assert!(json.contains("\"savingsRate\":37.5"));
        assert!(json.contains("\"fireNumber\":1500000.0"));
        assert!(json.contains("\"baseCase\""));
        assert!(json.contains("\"yearsToFire\""));
        assert!(json.contains("\"projectedDate\":\"20"));
        assert!(json.contains("\"coastFire\""));
        assert!(json.contains("\"nextMilestone\""));
    }

    #[test]
    fn growth_rates_serialize_camel_case() {
        let config = GrowthRateConfig::default();
        let response = GrowthRatesResponse {
            growth_rates: config.entries().collect(),
        };
        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"growthRates\""));
        assert!(json.contains("\"annualRate\":0.07"));
        assert!(json.contains("\"defaultTermYears\":30"));
        assert!(json.contains("\"category\":\"real_estate\""));
    }

    #[tokio::test]
    async fn handlers_set_status_and_no_store_header() {
        let ok = growth_rates_handler(State(test_state())).await;
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(ok.headers()[header::CACHE_CONTROL], "no-store");

        let missing = trajectory_get_handler(
            State(test_state()),
            Query(TrajectoryPayload::default()),
        )
        .await;
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(missing.headers()[header::CACHE_CONTROL], "no-store");

        let bad_input = trajectory_post_handler(
            State(test_state()),
            Json(TrajectoryPayload {
                monthly_income: Some(1_000.0),
                monthly_expenses: Some(-5.0),
                ..TrajectoryPayload::default()
            }),
        )
        .await;
        assert_eq!(bad_input.status(), StatusCode::BAD_REQUEST);

        let not_found = not_found_handler().await;
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn simulate_handler_accepts_valid_payload() {
        let response = simulate_handler(
            State(test_state()),
            Json(TrajectoryPayload {
                monthly_income: Some(8_000.0),
                monthly_expenses: Some(5_000.0),
                current_net_worth: Some(50_000.0),
                expected_return: Some(0.08),
                ..TrajectoryPayload::default()
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn projection_handler_returns_ok_for_empty_portfolio() {
        let response =
            projection_handler(State(test_state()), Json(ProjectionPayload::default())).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
