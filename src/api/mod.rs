use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Query, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::task;
use tracing::info;

use crate::core::{
    CalcError, FilingStatus, Household, RuleData, SplitMethod, TaxCalculationEngine,
    TaxCalculationInput, UsState, split,
};
use crate::rules::{DataFreshness, DataTier, RefreshOutcome, RuleDataProvider};

type AppState = Arc<RuleDataProvider>;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComparePayload {
    base: TaxCalculationInput,
    scenario: TaxCalculationInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SplitPayload {
    primary_net: Decimal,
    partner_net: Decimal,
    shared_amount: Decimal,
    #[serde(default)]
    method: SplitMethod,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HouseholdPayload {
    primary_net: Decimal,
    partner_net: Decimal,
    household: Household,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetirementPayload {
    age: u32,
    #[serde(default)]
    contributed: Decimal,
    #[serde(default)]
    family_coverage: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StateSummary {
    code: UsState,
    name: &'static str,
    tax_type: &'static str,
    has_sdi: bool,
    has_local_tax: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StateRanking {
    state: UsState,
    name: &'static str,
    net: Decimal,
    monthly_net: Decimal,
    state_tax: Decimal,
    total_taxes: Decimal,
    effective_rate: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RulesStatus {
    tier: DataTier,
    version: String,
    tax_year: u32,
    sequence: u64,
    freshness: DataFreshness,
    filing_statuses: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    rules: RulesStatus,
}

pub fn router(provider: AppState) -> Router {
    Router::new()
        .route("/api/calculate", get(calculate_get_handler).post(calculate_post_handler))
        .route("/api/compare", post(compare_handler))
        .route("/api/compare/states", post(compare_states_handler))
        .route("/api/split", post(split_handler))
        .route("/api/household", post(household_handler))
        .route("/api/retirement", post(retirement_handler))
        .route("/api/states", get(states_handler))
        .route("/api/rules", get(rules_handler))
        .route("/api/rules/refresh", post(refresh_handler))
        .fallback(not_found_handler)
        .with_state(provider)
}

pub async fn run_http_server(port: u16, provider: AppState) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(provider);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "takehome HTTP API listening");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calculate_get_handler(
    State(provider): State<AppState>,
    Query(input): Query<TaxCalculationInput>,
) -> Response {
    calculate_handler_impl(&provider, &input)
}

async fn calculate_post_handler(
    State(provider): State<AppState>,
    payload: Result<Json<TaxCalculationInput>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(input)) => calculate_handler_impl(&provider, &input),
        Err(rejection) => rejection_response(rejection),
    }
}

fn calculate_handler_impl(provider: &RuleDataProvider, input: &TaxCalculationInput) -> Response {
    let rules = provider.rules();
    match TaxCalculationEngine::new(rules.as_ref()).calculate(input) {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(e) => calc_error_response(&e),
    }
}

async fn compare_handler(
    State(provider): State<AppState>,
    payload: Result<Json<ComparePayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    let rules = provider.rules();
    let engine = TaxCalculationEngine::new(rules.as_ref());
    match engine.compare_scenarios(&payload.base, &payload.scenario) {
        Ok(comparison) => json_response(StatusCode::OK, comparison),
        Err(e) => calc_error_response(&e),
    }
}

async fn compare_states_handler(
    State(provider): State<AppState>,
    payload: Result<Json<TaxCalculationInput>, JsonRejection>,
) -> Response {
    let Json(input) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    let rules = provider.rules();
    let ranked = task::spawn_blocking(move || {
        TaxCalculationEngine::new(rules.as_ref()).compare_all_states(&input)
    })
    .await;
    let results = match ranked {
        Ok(Ok(results)) => results,
        Ok(Err(e)) => return calc_error_response(&e),
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("state comparison failed: {e}"),
            );
        }
    };

    let rankings: Vec<StateRanking> = results
        .into_iter()
        .map(|result| StateRanking {
            state: result.state.state,
            name: result.state.state.name(),
            net: result.net,
            monthly_net: result.timeframes.monthly,
            state_tax: result.state.total_tax,
            total_taxes: result.total_taxes,
            effective_rate: result.effective_rates.total,
        })
        .collect();
    json_response(StatusCode::OK, rankings)
}

async fn split_handler(payload: Result<Json<SplitPayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(p)) => json_response(
            StatusCode::OK,
            split(p.primary_net, p.partner_net, p.shared_amount, p.method),
        ),
        Err(rejection) => rejection_response(rejection),
    }
}

async fn household_handler(payload: Result<Json<HouseholdPayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(p)) => json_response(
            StatusCode::OK,
            p.household.split_expenses(p.primary_net, p.partner_net),
        ),
        Err(rejection) => rejection_response(rejection),
    }
}

async fn retirement_handler(
    State(provider): State<AppState>,
    payload: Result<Json<RetirementPayload>, JsonRejection>,
) -> Response {
    let Json(p) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    let rules = provider.rules();
    let engine = TaxCalculationEngine::new(rules.as_ref());
    match engine.retirement_limits(p.contributed, p.age, p.family_coverage) {
        Ok(limits) => json_response(StatusCode::OK, limits),
        Err(e) => calc_error_response(&e),
    }
}

async fn states_handler(State(provider): State<AppState>) -> Response {
    let rules = provider.rules();
    let year = rules.tax_year();
    let states: Vec<StateSummary> = UsState::all()
        .iter()
        .filter_map(|state| {
            let config = rules.state(*state, year).ok()?;
            Some(StateSummary {
                code: *state,
                name: state.name(),
                tax_type: config.type_label(),
                has_sdi: config.sdi.is_some(),
                has_local_tax: config.local_tax.is_some(),
            })
        })
        .collect();
    json_response(StatusCode::OK, states)
}

async fn rules_handler(State(provider): State<AppState>) -> Response {
    json_response(StatusCode::OK, rules_status(&provider))
}

async fn refresh_handler(State(provider): State<AppState>) -> Response {
    let (outcome, detail) = match provider.refresh().await {
        RefreshOutcome::Updated { version } => ("updated", Some(version)),
        RefreshOutcome::UpToDate => ("upToDate", None),
        RefreshOutcome::AlreadyInFlight => ("alreadyInFlight", None),
        RefreshOutcome::Disabled => ("disabled", None),
        RefreshOutcome::Failed(e) => ("failed", Some(e.to_string())),
    };
    json_response(
        StatusCode::OK,
        RefreshResponse {
            outcome,
            detail,
            rules: rules_status(&provider),
        },
    )
}

fn rules_status(provider: &RuleDataProvider) -> RulesStatus {
    let active = provider.current();
    RulesStatus {
        tier: active.tier,
        version: active.version.clone(),
        tax_year: active.rules.tax_year,
        sequence: active.sequence,
        freshness: provider.freshness(),
        filing_statuses: FilingStatus::ALL.iter().map(|s| s.as_str()).collect(),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn rejection_response(rejection: JsonRejection) -> Response {
    error_response(
        rejection.status(),
        &format!("Invalid JSON payload: {}", rejection.body_text()),
    )
}

fn calc_error_response(error: &CalcError) -> Response {
    error_response(StatusCode::UNPROCESSABLE_ENTITY, &error.to_string())
}
