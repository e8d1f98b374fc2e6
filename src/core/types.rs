use serde::Serialize;

use super::amortization::compute_monthly_payment;
use super::error::ProjectionError;

pub const MONTHS_PER_YEAR: u32 = 12;
pub const MAX_TERM_YEARS: u32 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioParameters {
    pub house_price: f64,
    pub down_payment: f64,
    pub annual_interest_rate: f64,
    pub term_years: u32,
    pub rental_yield: f64,
    pub rent_increase_rate: f64,
    pub investment_return_rate: f64,
    pub house_appreciation_rate: f64,
}

impl ScenarioParameters {
    pub fn loan_amount(&self) -> f64 {
        self.house_price - self.down_payment
    }

    pub fn validate(&self) -> Result<(), ProjectionError> {
        if !self.house_price.is_finite() || self.house_price <= 0.0 {
            return Err(ProjectionError::invalid("house price", "must be > 0"));
        }
        if !self.down_payment.is_finite() || self.down_payment < 0.0 {
            return Err(ProjectionError::invalid("down payment", "must be >= 0"));
        }
        if self.down_payment > self.house_price {
            return Err(ProjectionError::invalid(
                "down payment",
                "cannot exceed the house price",
            ));
        }
        if !self.annual_interest_rate.is_finite() || self.annual_interest_rate < 0.0 {
            return Err(ProjectionError::invalid("interest rate", "must be >= 0"));
        }
        if !(1..=MAX_TERM_YEARS).contains(&self.term_years) {
            return Err(ProjectionError::invalid(
                "term years",
                format!("must be between 1 and {MAX_TERM_YEARS}"),
            ));
        }
        if !self.rental_yield.is_finite() || self.rental_yield < 0.0 {
            return Err(ProjectionError::invalid("rental yield", "must be >= 0"));
        }
        for (name, rate) in [
            ("rent increase rate", self.rent_increase_rate),
            ("investment return rate", self.investment_return_rate),
            ("house appreciation rate", self.house_appreciation_rate),
        ] {
            if !rate.is_finite() || rate <= -1.0 {
                return Err(ProjectionError::invalid(name, "must be > -100%"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanTerms {
    principal: f64,
    annual_interest_rate: f64,
    term_years: u32,
    monthly_payment: f64,
}

impl LoanTerms {
    pub fn new(
        principal: f64,
        annual_interest_rate: f64,
        term_years: u32,
    ) -> Result<Self, ProjectionError> {
        if term_years == 0 {
            return Err(ProjectionError::invalid("term years", "must be >= 1"));
        }
        let total_months = term_years
            .checked_mul(MONTHS_PER_YEAR)
            .ok_or_else(|| ProjectionError::invalid("term years", "too large"))?;
        let monthly_payment = compute_monthly_payment(
            principal,
            annual_interest_rate / MONTHS_PER_YEAR as f64,
            total_months,
        )?;
        Ok(Self {
            principal,
            annual_interest_rate,
            term_years,
            monthly_payment,
        })
    }

    pub fn from_scenario(params: &ScenarioParameters) -> Result<Self, ProjectionError> {
        Self::new(
            params.loan_amount(),
            params.annual_interest_rate,
            params.term_years,
        )
    }

    pub fn principal(&self) -> f64 {
        self.principal
    }

    pub fn annual_interest_rate(&self) -> f64 {
        self.annual_interest_rate
    }

    pub fn term_years(&self) -> u32 {
        self.term_years
    }

    pub fn monthly_rate(&self) -> f64 {
        self.annual_interest_rate / MONTHS_PER_YEAR as f64
    }

    pub fn total_months(&self) -> u32 {
        self.term_years * MONTHS_PER_YEAR
    }

    pub fn monthly_payment(&self) -> f64 {
        self.monthly_payment
    }

    pub fn annual_payment(&self) -> f64 {
        self.monthly_payment * MONTHS_PER_YEAR as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanState {
    pub remaining_principal: f64,
}

impl LoanState {
    pub fn new(terms: &LoanTerms) -> Self {
        Self {
            remaining_principal: terms.principal(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct YearAmortization {
    pub interest_paid: f64,
    pub principal_paid: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationStep {
    pub month: u32,
    pub payment: f64,
    pub interest_portion: f64,
    pub principal_portion: f64,
    pub remaining_principal: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRecord {
    pub year: u32,
    pub annual_rent: f64,
    pub annual_payment: f64,
    pub cash_flow_difference: f64,
    pub investment_balance: f64,
    pub house_value: f64,
    pub remaining_principal: f64,
    pub house_equity: f64,
    pub interest_paid: f64,
    pub principal_paid: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub loan_terms: LoanTerms,
    pub monthly_payment: f64,
    pub total_paid: f64,
    pub years: Vec<YearRecord>,
}
