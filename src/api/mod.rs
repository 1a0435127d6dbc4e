use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    Outcome, SimulationConfig, SimulationError, SimulationResult, amount_from_pence, run,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Parser, Debug)]
#[command(
    name = "wagersim",
    about = "Single-run wagering requirement simulator over a fixed-odds slot payout table"
)]
struct Cli {
    #[arg(long, default_value_t = 0.50, help = "Starting bonus balance in pounds")]
    starting_balance: f64,
    #[arg(
        long,
        default_value_t = 3.0,
        help = "Wagering requirement as a multiple of the starting balance"
    )]
    wagering_multiplier: f64,
    #[arg(
        long,
        default_value_t = 0.10,
        help = "Average stake per spin in pounds"
    )]
    average_stake: f64,
    #[arg(long, help = "Random seed; omit for a fresh seed per run")]
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    #[serde(alias = "balance")]
    starting_balance: Option<f64>,
    #[serde(alias = "wageringRequirement", alias = "wr")]
    wagering_multiplier: Option<f64>,
    #[serde(alias = "stake")]
    average_stake: Option<f64>,
    seed: Option<u64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
enum ApiOutcome {
    Won,
    Lost,
    Incomplete,
}

impl From<Outcome> for ApiOutcome {
    fn from(value: Outcome) -> Self {
        match value {
            Outcome::Won => ApiOutcome::Won,
            Outcome::Lost => ApiOutcome::Lost,
            Outcome::Incomplete => ApiOutcome::Incomplete,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiStepRecord {
    step: u32,
    balance: f64,
    total_staked: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    starting_balance: f64,
    wagering_multiplier: f64,
    average_stake: f64,
    target: f64,
    seed: u64,
    outcome: ApiOutcome,
    final_balance: f64,
    total_staked: f64,
    remaining_to_wager: f64,
    steps: Vec<ApiStepRecord>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_config(cli: &Cli) -> Result<SimulationConfig, String> {
    if !cli.starting_balance.is_finite() || cli.starting_balance <= 0.0 {
        return Err("--starting-balance must be > 0".to_string());
    }
    if !cli.wagering_multiplier.is_finite() || cli.wagering_multiplier < 1.0 {
        return Err("--wagering-multiplier must be >= 1".to_string());
    }
    if !cli.average_stake.is_finite() || cli.average_stake <= 0.0 {
        return Err("--average-stake must be > 0".to_string());
    }

    SimulationConfig::from_amounts(
        cli.starting_balance,
        cli.wagering_multiplier,
        cli.average_stake,
        cli.seed,
    )
    .map_err(|e| e.to_string())
}

fn cli_from_payload(payload: SimulatePayload) -> Cli {
    let mut cli = default_cli_for_api();
    if let Some(v) = payload.starting_balance {
        cli.starting_balance = v;
    }
    if let Some(v) = payload.wagering_multiplier {
        cli.wagering_multiplier = v;
    }
    if let Some(v) = payload.average_stake {
        cli.average_stake = v;
    }
    if let Some(v) = payload.seed {
        cli.seed = Some(v);
    }
    cli
}

fn default_cli_for_api() -> Cli {
    Cli {
        starting_balance: 0.50,
        wagering_multiplier: 3.0,
        average_stake: 0.10,
        seed: None,
    }
}

fn run_simulation(payload: SimulatePayload) -> Result<SimulateResponse, (StatusCode, String)> {
    let cli = cli_from_payload(payload);
    let config = build_config(&cli).map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    let result = run(&config).map_err(|err| {
        let status = match err {
            SimulationError::InvalidConfiguration(_) => StatusCode::BAD_REQUEST,
            SimulationError::NonProgressingSimulation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };
        (status, err.to_string())
    })?;

    Ok(build_simulate_response(&config, &result))
}

fn build_simulate_response(config: &SimulationConfig, result: &SimulationResult) -> SimulateResponse {
    SimulateResponse {
        starting_balance: amount_from_pence(config.starting_balance_pence),
        wagering_multiplier: config.wagering_multiplier,
        average_stake: amount_from_pence(config.average_stake_pence),
        target: amount_from_pence(result.target_pence),
        seed: result.seed,
        outcome: result.outcome().into(),
        final_balance: amount_from_pence(result.final_balance_pence()),
        total_staked: amount_from_pence(result.total_staked_pence()),
        remaining_to_wager: amount_from_pence(result.remaining_to_wager_pence()),
        steps: result
            .records
            .iter()
            .map(|r| ApiStepRecord {
                step: r.step,
                balance: amount_from_pence(r.balance_pence),
                total_staked: amount_from_pence(r.total_staked_pence),
            })
            .collect(),
    }
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("wagersim HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    match run_simulation(payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err((status, msg)) => error_response(status, &msg),
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
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
