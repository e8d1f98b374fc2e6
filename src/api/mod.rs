use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    AmortizationStep, CostBenefitRow, DisplayScale, FutureValueRow, Leader, LoanTerms,
    Projection, ProjectionError, ScenarioParameters, Summary, YearRecord, amortization_schedule,
    cost_benefit_table, future_value_table, run_projection, summarize,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliDisplayScale {
    Units,
    Thousands,
    Millions,
}

impl From<CliDisplayScale> for DisplayScale {
    fn from(value: CliDisplayScale) -> Self {
        match value {
            CliDisplayScale::Units => DisplayScale::Units,
            CliDisplayScale::Thousands => DisplayScale::Thousands,
            CliDisplayScale::Millions => DisplayScale::Millions,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiDisplayScale {
    #[serde(alias = "unit", alias = "none")]
    Units,
    #[serde(alias = "thousand", alias = "k")]
    Thousands,
    #[serde(alias = "million", alias = "m")]
    Millions,
}

impl From<ApiDisplayScale> for CliDisplayScale {
    fn from(value: ApiDisplayScale) -> Self {
        match value {
            ApiDisplayScale::Units => CliDisplayScale::Units,
            ApiDisplayScale::Thousands => CliDisplayScale::Thousands,
            ApiDisplayScale::Millions => CliDisplayScale::Millions,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    house_price: Option<f64>,
    down_payment: Option<f64>,
    interest_rate: Option<f64>,
    term_years: Option<u32>,
    rental_yield: Option<f64>,
    rent_increase: Option<f64>,
    investment_return: Option<f64>,
    house_appreciation: Option<f64>,
    scale: Option<ApiDisplayScale>,
}

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(
    name = "rentbuy",
    about = "Rent vs buy: compare home equity against investing the cash-flow difference"
)]
struct Cli {
    #[arg(long, default_value_t = 500_000.0, help = "House price")]
    house_price: f64,
    #[arg(long, default_value_t = 100_000.0, help = "Down payment")]
    down_payment: f64,
    #[arg(
        long,
        default_value_t = 6.0,
        help = "Annual loan interest rate in percent"
    )]
    interest_rate: f64,
    #[arg(long, default_value_t = 10, help = "Loan term in years (1-30)")]
    term_years: u32,
    #[arg(
        long,
        default_value_t = 4.0,
        help = "Year-one rent as a percent of the house price"
    )]
    rental_yield: f64,
    #[arg(
        long,
        default_value_t = 3.0,
        help = "Expected annual rent increase in percent"
    )]
    rent_increase: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Annual investment return in percent"
    )]
    investment_return: f64,
    #[arg(
        long,
        default_value_t = 6.0,
        help = "Annual house price appreciation in percent"
    )]
    house_appreciation: f64,
    #[arg(
        long,
        value_enum,
        default_value_t = CliDisplayScale::Millions,
        help = "Scale applied to the future value table"
    )]
    scale: CliDisplayScale,
}

#[derive(Debug)]
struct ApiRequest {
    params: ScenarioParameters,
    scale: DisplayScale,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    monthly_payment: f64,
    total_paid: f64,
    loan_amount: f64,
    scale: DisplayScale,
    summary: Option<Summary>,
    years: Vec<YearRecord>,
    cost_benefit: Vec<CostBenefitRow>,
    future_values: Vec<FutureValueRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleResponse {
    monthly_payment: f64,
    loan_amount: f64,
    total_months: u32,
    steps: Vec<AmortizationStep>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn flag_for_parameter(parameter: &str) -> Option<&'static str> {
    match parameter {
        "house price" => Some("--house-price"),
        "down payment" => Some("--down-payment"),
        "interest rate" => Some("--interest-rate"),
        "term years" => Some("--term-years"),
        "rental yield" => Some("--rental-yield"),
        "rent increase rate" => Some("--rent-increase"),
        "investment return rate" => Some("--investment-return"),
        "house appreciation rate" => Some("--house-appreciation"),
        _ => None,
    }
}

fn flag_error(err: ProjectionError) -> String {
    match flag_for_parameter(err.parameter()) {
        Some(flag) => format!("{flag} {}", err.reason()),
        None => err.to_string(),
    }
}

fn build_inputs(cli: &Cli) -> Result<ScenarioParameters, String> {
    let params = ScenarioParameters {
        house_price: cli.house_price,
        down_payment: cli.down_payment,
        annual_interest_rate: cli.interest_rate / 100.0,
        term_years: cli.term_years,
        rental_yield: cli.rental_yield / 100.0,
        rent_increase_rate: cli.rent_increase / 100.0,
        investment_return_rate: cli.investment_return / 100.0,
        house_appreciation_rate: cli.house_appreciation / 100.0,
    };
    params.validate().map_err(flag_error)?;
    Ok(params)
}

pub fn run_report_cli() -> Result<(), String> {
    let cli = Cli::parse();
    let scale = cli.scale.into();
    let params = build_inputs(&cli)?;
    let projection = run_projection(&params).map_err(|e| e.to_string())?;
    print!("{}", render_report(&projection, scale));
    Ok(())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route(
            "/api/schedule",
            get(schedule_get_handler).post(schedule_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("Rent-vs-buy HTTP API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/api/project");

    axum::serve(listener, app).await
}

async fn health_handler() -> impl IntoResponse {
    with_cache_control("ok")
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_handler_impl(payload: ProjectPayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => {
            warn!("rejected projection request: {msg}");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    match run_projection(&request.params) {
        Ok(projection) => json_response(
            StatusCode::OK,
            build_project_response(&projection, request.scale),
        ),
        Err(e) => {
            warn!("rejected projection request: {e}");
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}

async fn schedule_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    schedule_handler_impl(payload).await
}

async fn schedule_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    schedule_handler_impl(payload).await
}

async fn schedule_handler_impl(payload: ProjectPayload) -> Response {
    let schedule = api_request_from_payload(payload).and_then(|request| {
        LoanTerms::from_scenario(&request.params)
            .map(|terms| build_schedule_response(&terms))
            .map_err(|e| e.to_string())
    });
    match schedule {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => {
            warn!("rejected schedule request: {msg}");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
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
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: ProjectPayload) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.house_price {
        cli.house_price = v;
    }
    if let Some(v) = payload.down_payment {
        cli.down_payment = v;
    }
    if let Some(v) = payload.interest_rate {
        cli.interest_rate = v;
    }
    if let Some(v) = payload.term_years {
        cli.term_years = v;
    }
    if let Some(v) = payload.rental_yield {
        cli.rental_yield = v;
    }
    if let Some(v) = payload.rent_increase {
        cli.rent_increase = v;
    }
    if let Some(v) = payload.investment_return {
        cli.investment_return = v;
    }
    if let Some(v) = payload.house_appreciation {
        cli.house_appreciation = v;
    }
    if let Some(v) = payload.scale {
        cli.scale = v.into();
    }

    let params = build_inputs(&cli)?;
    Ok(ApiRequest {
        params,
        scale: cli.scale.into(),
    })
}

fn default_cli_for_api() -> Cli {
    Cli {
        house_price: 500_000.0,
        down_payment: 100_000.0,
        interest_rate: 6.0,
        term_years: 10,
        rental_yield: 4.0,
        rent_increase: 3.0,
        investment_return: 7.0,
        house_appreciation: 6.0,
        scale: CliDisplayScale::Millions,
    }
}

fn build_project_response(projection: &Projection, scale: DisplayScale) -> ProjectResponse {
    ProjectResponse {
        monthly_payment: projection.monthly_payment,
        total_paid: projection.total_paid,
        loan_amount: projection.loan_terms.principal(),
        scale,
        summary: summarize(projection),
        years: projection.years.clone(),
        cost_benefit: cost_benefit_table(projection),
        future_values: future_value_table(projection, scale),
    }
}

fn build_schedule_response(terms: &LoanTerms) -> ScheduleResponse {
    ScheduleResponse {
        monthly_payment: terms.monthly_payment(),
        loan_amount: terms.principal(),
        total_months: terms.total_months(),
        steps: amortization_schedule(terms),
    }
}

fn format_money(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let digits = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && digits.chars().any(|c| matches!(c, '1'..='9')) {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{sign}${grouped}.{frac}"),
        None => format!("{sign}${grouped}"),
    }
}

fn render_report(projection: &Projection, scale: DisplayScale) -> String {
    let mut out = String::new();
    let term_years = projection.loan_terms.term_years();

    let _ = writeln!(
        out,
        "Monthly payment: {}",
        format_money(projection.monthly_payment, 2)
    );
    let _ = writeln!(
        out,
        "Total paid over {term_years} years: {}",
        format_money(projection.total_paid, 2)
    );

    if let Some(summary) = summarize(projection) {
        let _ = writeln!(out);
        let _ = writeln!(out, "After {} years:", summary.term_years);
        let _ = writeln!(
            out,
            "  Buyer's house is worth {} (equity {})",
            format_money(summary.final_house_value, 0),
            format_money(summary.final_house_equity, 0)
        );
        let _ = writeln!(
            out,
            "  Renter's investment is worth {}",
            format_money(summary.final_investment_balance, 0)
        );
        let _ = writeln!(
            out,
            "  Renter's monthly rent is {}",
            format_money(summary.final_monthly_rent, 0)
        );
        let gap = format_money(summary.equity_minus_investment.abs(), 0);
        let _ = match summary.leader {
            Leader::Buy => writeln!(out, "  Buying leads by {gap}"),
            Leader::Rent => writeln!(out, "  Renting leads by {gap}"),
        };
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Cost-benefit analysis");
    let _ = writeln!(
        out,
        "{:>4}  {:>16}  {:>16}  {:>16}  {:>18}",
        "Year", "Annual Rent", "Annual Payment", "Difference", "Investment"
    );
    for row in cost_benefit_table(projection) {
        let _ = writeln!(
            out,
            "{:>4}  {:>16}  {:>16}  {:>16}  {:>18}",
            row.year,
            format_money(row.annual_rent, 2),
            format_money(row.annual_payment, 2),
            format_money(row.difference, 2),
            format_money(row.investment_balance, 2)
        );
    }

    let _ = writeln!(out);
    let heading = match scale.label() {
        "" => "Future value comparison".to_string(),
        label => format!("Future value comparison ({label})"),
    };
    let _ = writeln!(out, "{heading}");
    let _ = writeln!(
        out,
        "{:>4}  {:>14}  {:>14}  {:>14}  {:>14}",
        "Year", "House Value", "Investment", "Principal Left", "House Equity"
    );
    for row in future_value_table(projection, scale) {
        let _ = writeln!(
            out,
            "{:>4}  {:>14.4}  {:>14.4}  {:>14.4}  {:>14.4}",
            row.year,
            row.house_value,
            row.investment_balance,
            row.remaining_principal,
            row.house_equity
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MAX_TERM_YEARS;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    #[test]
    fn api_defaults_match_cli_defaults() {
        let parsed = Cli::try_parse_from(["rentbuy"]).expect("defaults parse");
        assert_eq!(parsed, default_cli_for_api());
    }

    #[test]
    fn build_inputs_converts_percentages_to_fractions() {
        let params = build_inputs(&sample_cli()).expect("valid inputs");
        assert_approx(params.house_price, 500_000.0);
        assert_approx(params.down_payment, 100_000.0);
        assert_approx(params.annual_interest_rate, 0.06);
        assert_eq!(params.term_years, 10);
        assert_approx(params.rental_yield, 0.04);
        assert_approx(params.rent_increase_rate, 0.03);
        assert_approx(params.investment_return_rate, 0.07);
        assert_approx(params.house_appreciation_rate, 0.06);
    }

    #[test]
    fn build_inputs_rejects_down_payment_above_price() {
        let mut cli = sample_cli();
        cli.down_payment = 600_000.0;
        let err = build_inputs(&cli).expect_err("must reject down payment above price");
        assert!(err.contains("--down-payment"));
    }

    #[test]
    fn build_inputs_rejects_term_outside_range() {
        for term_years in [0, MAX_TERM_YEARS + 1] {
            let mut cli = sample_cli();
            cli.term_years = term_years;
            let err = build_inputs(&cli).expect_err("must reject term");
            assert!(err.contains("--term-years"));
        }
    }

    #[test]
    fn build_inputs_rejects_negative_interest_rate() {
        let mut cli = sample_cli();
        cli.interest_rate = -0.5;
        let err = build_inputs(&cli).expect_err("must reject negative rate");
        assert!(err.contains("--interest-rate"));
    }

    #[test]
    fn build_inputs_rejects_total_loss_growth_rate() {
        let mut cli = sample_cli();
        cli.investment_return = -100.0;
        let err = build_inputs(&cli).expect_err("must reject -100% return");
        assert!(err.contains("--investment-return"));
    }

    #[test]
    fn build_inputs_names_the_flag_in_core_errors() {
        let mut cli = sample_cli();
        cli.rental_yield = -1.0;
        let err = build_inputs(&cli).expect_err("must reject negative yield");
        assert_eq!(err, "--rental-yield must be >= 0");

        let mut cli = sample_cli();
        cli.house_appreciation = f64::NAN;
        let err = build_inputs(&cli).expect_err("must reject non-finite rate");
        assert_eq!(err, "--house-appreciation must be > -100%");
    }

    #[test]
    fn build_inputs_rejects_non_finite_price() {
        let mut cli = sample_cli();
        cli.house_price = f64::INFINITY;
        let err = build_inputs(&cli).expect_err("must reject infinite price");
        assert!(err.contains("--house-price"));
    }

    #[test]
    fn api_request_from_json_parses_web_keys() {
        let json = r#"{
          "housePrice": 750000,
          "downPayment": 150000,
          "interestRate": 5.5,
          "termYears": 25,
          "rentalYield": 3.5,
          "rentIncrease": 2.5,
          "investmentReturn": 8,
          "houseAppreciation": 4,
          "scale": "thousands"
        }"#;
        let request = api_request_from_json(json).expect("json should parse");
        let params = request.params;

        assert_approx(params.house_price, 750_000.0);
        assert_approx(params.down_payment, 150_000.0);
        assert_approx(params.annual_interest_rate, 0.055);
        assert_eq!(params.term_years, 25);
        assert_approx(params.rental_yield, 0.035);
        assert_approx(params.rent_increase_rate, 0.025);
        assert_approx(params.investment_return_rate, 0.08);
        assert_approx(params.house_appreciation_rate, 0.04);
        assert_eq!(request.scale, DisplayScale::Thousands);
    }

    #[test]
    fn api_request_from_json_fills_missing_fields_with_defaults() {
        let request = api_request_from_json(r#"{ "termYears": 30 }"#).expect("json should parse");
        assert_eq!(request.params.term_years, 30);
        assert_approx(request.params.house_price, 500_000.0);
        assert_eq!(request.scale, DisplayScale::Millions);
    }

    #[test]
    fn api_request_from_json_rejects_fractional_term() {
        let err = api_request_from_json(r#"{ "termYears": 10.5 }"#)
            .expect_err("must reject non-integer term");
        assert!(err.contains("Invalid API JSON payload"));
    }

    #[test]
    fn api_request_from_json_rejects_invalid_values() {
        let err = api_request_from_json(r#"{ "housePrice": 100000, "downPayment": 200000 }"#)
            .expect_err("must reject down payment above price");
        assert!(err.contains("--down-payment"));
    }

    #[test]
    fn project_response_serialization_contains_expected_fields() {
        let params = build_inputs(&sample_cli()).expect("valid inputs");
        let projection = run_projection(&params).expect("valid scenario");
        let response = build_project_response(&projection, DisplayScale::Millions);
        let json = serde_json::to_string(&response).expect("response should serialize");

        for key in [
            "\"monthlyPayment\"",
            "\"totalPaid\"",
            "\"loanAmount\"",
            "\"scale\":\"millions\"",
            "\"summary\"",
            "\"leader\"",
            "\"years\"",
            "\"cashFlowDifference\"",
            "\"houseEquity\"",
            "\"costBenefit\"",
            "\"futureValues\"",
            "\"remainingPrincipal\"",
        ] {
            assert!(json.contains(key), "missing {key} in {json}");
        }
        assert_eq!(response.years.len(), 10);
        assert_approx(response.loan_amount, 400_000.0);
    }

    #[test]
    fn schedule_response_covers_every_month() {
        let mut cli = sample_cli();
        cli.term_years = 2;
        let params = build_inputs(&cli).expect("valid inputs");
        let terms = LoanTerms::from_scenario(&params).expect("valid terms");
        let response = build_schedule_response(&terms);

        assert_eq!(response.total_months, 24);
        assert_eq!(response.steps.len(), 24);
        assert_eq!(response.steps[0].month, 1);
        assert_approx(response.steps[0].interest_portion, 400_000.0 * 0.005);
        assert!(response.steps[23].remaining_principal <= 1e-6 * 400_000.0);

        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"interestPortion\""));
        assert!(json.contains("\"totalMonths\":24"));
    }

    #[test]
    fn format_money_groups_thousands() {
        assert_eq!(format_money(4_440.820_077, 2), "$4,440.82");
        assert_eq!(format_money(1_234_567.0, 0), "$1,234,567");
        assert_eq!(format_money(999.0, 0), "$999");
        assert_eq!(format_money(-33_289.84, 2), "-$33,289.84");
        assert_eq!(format_money(-0.001, 0), "$0");
    }

    #[test]
    fn render_report_includes_payment_summary_and_tables() {
        let params = build_inputs(&sample_cli()).expect("valid inputs");
        let projection = run_projection(&params).expect("valid scenario");
        let report = render_report(&projection, DisplayScale::Millions);

        assert!(report.contains("Monthly payment: $4,440.82"));
        assert!(report.contains("Total paid over 10 years: $532,898.41"));
        assert!(report.contains("After 10 years:"));
        assert!(report.contains("Cost-benefit analysis"));
        assert!(report.contains("Future value comparison (in Millions)"));
        assert!(report.contains("$20,000.00"));
        assert_eq!(report.lines().filter(|l| l.starts_with("  10 ")).count(), 2);
    }
}
