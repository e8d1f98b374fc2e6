use log::debug;

use super::error::ProjectionError;
use super::types::{LoanState, LoanTerms, Projection, ScenarioParameters, YearRecord};

#[derive(Debug, Clone, Copy)]
struct RunningBalances {
    rent: f64,
    investment: f64,
    house_value: f64,
}

impl RunningBalances {
    fn opening(params: &ScenarioParameters) -> Self {
        Self {
            rent: params.house_price * params.rental_yield,
            investment: params.down_payment,
            house_value: params.house_price,
        }
    }
}

pub fn run_projection(params: &ScenarioParameters) -> Result<Projection, ProjectionError> {
    params.validate()?;
    let loan_terms = LoanTerms::from_scenario(params)?;
    let years = project_years(&loan_terms, params);
    let monthly_payment = loan_terms.monthly_payment();
    let total_paid = loan_terms.annual_payment() * loan_terms.term_years() as f64;

    debug!(
        "projected {} years: monthly payment {monthly_payment:.2}, total paid {total_paid:.2}",
        years.len()
    );

    Ok(Projection {
        loan_terms,
        monthly_payment,
        total_paid,
        years,
    })
}

pub fn project(
    loan_terms: &LoanTerms,
    params: &ScenarioParameters,
) -> Result<Vec<YearRecord>, ProjectionError> {
    params.validate()?;
    check_terms_match(loan_terms, params)?;
    Ok(project_years(loan_terms, params))
}

fn check_terms_match(
    loan_terms: &LoanTerms,
    params: &ScenarioParameters,
) -> Result<(), ProjectionError> {
    if loan_terms.term_years() != params.term_years {
        return Err(ProjectionError::invalid(
            "loan terms",
            format!(
                "term of {} years does not match the scenario's {} years",
                loan_terms.term_years(),
                params.term_years
            ),
        ));
    }
    if loan_terms.principal() != params.loan_amount() {
        return Err(ProjectionError::invalid(
            "loan terms",
            "principal must equal house price minus down payment",
        ));
    }
    if loan_terms.annual_interest_rate() != params.annual_interest_rate {
        return Err(ProjectionError::invalid(
            "loan terms",
            "interest rate does not match the scenario",
        ));
    }
    Ok(())
}

// Rent is recorded before its end-of-year increase; investment and house
// value are compounded before being recorded.
fn project_years(loan_terms: &LoanTerms, params: &ScenarioParameters) -> Vec<YearRecord> {
    let annual_payment = loan_terms.annual_payment();
    let mut balances = RunningBalances::opening(params);
    let mut loan = LoanState::new(loan_terms);
    let mut years = Vec::with_capacity(loan_terms.term_years() as usize);

    for year in 1..=loan_terms.term_years() {
        let difference = annual_payment - balances.rent;
        balances.investment =
            (balances.investment + difference) * (1.0 + params.investment_return_rate);
        balances.house_value *= 1.0 + params.house_appreciation_rate;

        let amortized = loan.amortize_year(loan_terms);

        years.push(YearRecord {
            year,
            annual_rent: balances.rent,
            annual_payment,
            cash_flow_difference: difference,
            investment_balance: balances.investment,
            house_value: balances.house_value,
            remaining_principal: loan.remaining_principal,
            house_equity: balances.house_value - loan.remaining_principal,
            interest_paid: amortized.interest_paid,
            principal_paid: amortized.principal_paid,
        });

        balances.rent *= 1.0 + params.rent_increase_rate;
    }

    years
}
