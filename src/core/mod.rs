mod amortization;
mod engine;
mod error;
mod report;
mod types;

pub use amortization::{
    amortization_schedule, amortize_one_month, compute_monthly_payment, installment,
};
pub use engine::{project, run_projection};
pub use error::ProjectionError;
pub use report::{
    CostBenefitRow, DisplayScale, FutureValueRow, Leader, Summary, cost_benefit_table,
    future_value_table, summarize,
};
pub use types::{
    AmortizationStep, LoanState, LoanTerms, MAX_TERM_YEARS, MONTHS_PER_YEAR, Projection,
    ScenarioParameters, YearAmortization, YearRecord,
};
