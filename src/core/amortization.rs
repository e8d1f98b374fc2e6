use super::error::ProjectionError;
use super::types::{
    AmortizationStep, LoanState, LoanTerms, MONTHS_PER_YEAR, YearAmortization,
};

pub fn compute_monthly_payment(
    principal: f64,
    monthly_rate: f64,
    total_months: u32,
) -> Result<f64, ProjectionError> {
    if total_months == 0 {
        return Err(ProjectionError::invalid("total months", "must be >= 1"));
    }
    if !principal.is_finite() || principal < 0.0 {
        return Err(ProjectionError::invalid("principal", "must be >= 0"));
    }
    if !monthly_rate.is_finite() || monthly_rate < 0.0 {
        return Err(ProjectionError::invalid("monthly rate", "must be >= 0"));
    }

    let n = total_months as f64;
    if monthly_rate == 0.0 {
        return Ok(principal / n);
    }

    let factor = (1.0 + monthly_rate).powf(n);
    Ok(principal * monthly_rate * factor / (factor - 1.0))
}

pub fn amortize_one_month(
    remaining_principal: f64,
    monthly_payment: f64,
    monthly_rate: f64,
) -> (f64, f64, f64) {
    let remaining_principal = remaining_principal.max(0.0);
    if remaining_principal == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let interest_portion = remaining_principal * monthly_rate;
    let principal_portion = monthly_payment - interest_portion;
    let new_remaining = (remaining_principal - principal_portion).max(0.0);
    (new_remaining, interest_portion, principal_portion)
}

impl LoanState {
    pub fn amortize_year(&mut self, terms: &LoanTerms) -> YearAmortization {
        let mut year = YearAmortization::default();
        for _ in 0..MONTHS_PER_YEAR {
            let (remaining, interest, _) = amortize_one_month(
                self.remaining_principal,
                terms.monthly_payment(),
                terms.monthly_rate(),
            );
            year.interest_paid += interest;
            // the final month may overpay, so count what actually left the balance
            year.principal_paid += self.remaining_principal - remaining;
            self.remaining_principal = remaining;
        }
        self.remaining_principal = self.remaining_principal.max(0.0);
        year
    }
}

pub fn amortization_schedule(terms: &LoanTerms) -> Vec<AmortizationStep> {
    let mut remaining = terms.principal();
    (1..=terms.total_months())
        .map(|month| {
            let (next, interest_portion, principal_portion) =
                amortize_one_month(remaining, terms.monthly_payment(), terms.monthly_rate());
            remaining = next;
            AmortizationStep {
                month,
                payment: interest_portion + principal_portion,
                interest_portion,
                principal_portion,
                remaining_principal: next,
            }
        })
        .collect()
}

pub fn installment(terms: &LoanTerms, month: u32) -> Option<AmortizationStep> {
    if month == 0 || month > terms.total_months() {
        return None;
    }
    amortization_schedule(terms)
        .into_iter()
        .nth(month as usize - 1)
}
