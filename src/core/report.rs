use serde::Serialize;

use super::types::{MONTHS_PER_YEAR, Projection};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayScale {
    Units,
    Thousands,
    #[default]
    Millions,
}

impl DisplayScale {
    pub fn divisor(self) -> f64 {
        match self {
            DisplayScale::Units => 1.0,
            DisplayScale::Thousands => 1_000.0,
            DisplayScale::Millions => 1_000_000.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayScale::Units => "",
            DisplayScale::Thousands => "in Thousands",
            DisplayScale::Millions => "in Millions",
        }
    }

    pub fn apply(self, value: f64) -> f64 {
        value / self.divisor()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Leader {
    Buy,
    Rent,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBenefitRow {
    pub year: u32,
    pub annual_rent: f64,
    pub annual_payment: f64,
    pub difference: f64,
    pub investment_balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FutureValueRow {
    pub year: u32,
    pub house_value: f64,
    pub investment_balance: f64,
    pub remaining_principal: f64,
    pub house_equity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub term_years: u32,
    pub monthly_payment: f64,
    pub total_paid: f64,
    pub final_house_value: f64,
    pub final_investment_balance: f64,
    pub final_monthly_rent: f64,
    pub final_house_equity: f64,
    pub equity_minus_investment: f64,
    pub leader: Leader,
}

pub fn cost_benefit_table(projection: &Projection) -> Vec<CostBenefitRow> {
    projection
        .years
        .iter()
        .map(|y| CostBenefitRow {
            year: y.year,
            annual_rent: y.annual_rent,
            annual_payment: y.annual_payment,
            difference: y.cash_flow_difference,
            investment_balance: y.investment_balance,
        })
        .collect()
}

pub fn future_value_table(projection: &Projection, scale: DisplayScale) -> Vec<FutureValueRow> {
    projection
        .years
        .iter()
        .map(|y| FutureValueRow {
            year: y.year,
            house_value: scale.apply(y.house_value),
            investment_balance: scale.apply(y.investment_balance),
            remaining_principal: scale.apply(y.remaining_principal),
            house_equity: scale.apply(y.house_equity),
        })
        .collect()
}

pub fn summarize(projection: &Projection) -> Option<Summary> {
    let last = projection.years.last()?;
    let equity_minus_investment = last.house_equity - last.investment_balance;
    Some(Summary {
        term_years: projection.loan_terms.term_years(),
        monthly_payment: projection.monthly_payment,
        total_paid: projection.total_paid,
        final_house_value: last.house_value,
        final_investment_balance: last.investment_balance,
        final_monthly_rent: last.annual_rent / MONTHS_PER_YEAR as f64,
        final_house_equity: last.house_equity,
        equity_minus_investment,
        leader: if equity_minus_investment >= 0.0 {
            Leader::Buy
        } else {
            Leader::Rent
        },
    })
}
