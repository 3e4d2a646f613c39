use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use thiserror::Error;

use crate::config::PayrollConfig;

#[derive(Debug, Error, PartialEq)]
pub enum PayrollError {
    #[error("Salary structure must sum to 100%, got {0}%")]
    InvalidStructure(Decimal),

    #[error("Gross salary cannot be negative")]
    NegativeGross,

    #[error("Provident fund rate must be between 0 and 100, got {0}")]
    InvalidRate(Decimal),
}

/// Percent split of a gross salary
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SalaryStructure {
    pub basic_percent: Decimal,
    pub house_rent_percent: Decimal,
    pub allowance_percent: Decimal,
}

impl SalaryStructure {
    pub fn new(basic: Decimal, house_rent: Decimal, allowance: Decimal) -> Result<Self, PayrollError> {
        let sum = basic + house_rent + allowance;
        if sum != Decimal::ONE_HUNDRED || basic.is_sign_negative() || house_rent.is_sign_negative() || allowance.is_sign_negative() {
            return Err(PayrollError::InvalidStructure(sum));
        }
        Ok(Self { basic_percent: basic, house_rent_percent: house_rent, allowance_percent: allowance })
    }

    pub fn from_config(config: &PayrollConfig) -> Result<Self, PayrollError> {
        Self::new(config.basic_percent, config.house_rent_percent, config.allowance_percent)
    }
}

impl Default for SalaryStructure {
    fn default() -> Self {
        Self {
            basic_percent: Decimal::from(60),
            house_rent_percent: Decimal::from(30),
            allowance_percent: Decimal::from(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryBreakdown {
    pub gross: Decimal,
    pub basic: Decimal,
    pub house_rent: Decimal,
    pub allowance: Decimal,
}

impl SalaryBreakdown {
    /// Split `gross` by `structure`. Parts are rounded to cents and the
    /// allowance takes the remainder, so the parts always sum to gross.
    pub fn from_gross(gross: Decimal, structure: &SalaryStructure) -> Result<Self, PayrollError> {
        if gross.is_sign_negative() && !gross.is_zero() {
            return Err(PayrollError::NegativeGross);
        }
        let gross = money(gross);
        let basic = money(gross * structure.basic_percent / Decimal::ONE_HUNDRED);
        let house_rent = money(gross * structure.house_rent_percent / Decimal::ONE_HUNDRED);
        Ok(Self {
            gross,
            basic,
            house_rent,
            allowance: gross - basic - house_rent,
        })
    }
}

/// Whole months between `start` and `as_of`.
///
/// A month counts once its day-of-month is reached; a start on the 31st is
/// reached on the last day of shorter months.
pub fn elapsed_months(start: NaiveDate, as_of: NaiveDate) -> u32 {
    if as_of < start {
        return 0;
    }
    let mut months = (as_of.year() - start.year()) * 12 + as_of.month() as i32 - start.month() as i32;
    let day_reached = as_of.day() >= start.day() || is_last_day_of_month(as_of);
    if !day_reached {
        months -= 1;
    }
    months.max(0) as u32
}

fn is_last_day_of_month(date: NaiveDate) -> bool {
    date.succ_opt().map_or(true, |next| next.month() != date.month())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvidentFund {
    pub start_date: Option<NaiveDate>,
    pub as_of: NaiveDate,
    pub months: u32,
    pub rate_percent: Decimal,
    pub monthly_employee: Decimal,
    pub monthly_employer: Decimal,
    pub employee_total: Decimal,
    pub employer_total: Decimal,
    pub total: Decimal,
}

impl ProvidentFund {
    /// Accrued fund: employee contributes `rate_percent` of basic each month,
    /// employer matches. No start date means nothing has accrued.
    pub fn accrual(
        basic: Decimal,
        rate_percent: Decimal,
        start: Option<NaiveDate>,
        as_of: NaiveDate,
    ) -> Result<Self, PayrollError> {
        if rate_percent.is_sign_negative() || rate_percent > Decimal::ONE_HUNDRED {
            return Err(PayrollError::InvalidRate(rate_percent));
        }
        let months = start.map_or(0, |start| elapsed_months(start, as_of));
        let monthly = if start.is_some() {
            money(basic * rate_percent / Decimal::ONE_HUNDRED)
        } else {
            Decimal::ZERO
        };
        let employee_total = monthly * Decimal::from(months);
        Ok(Self {
            start_date: start,
            as_of,
            months,
            rate_percent,
            monthly_employee: monthly,
            monthly_employer: monthly,
            employee_total,
            employer_total: employee_total,
            total: employee_total + employee_total,
        })
    }
}

fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn default_split() {
        let b = SalaryBreakdown::from_gross(dec("50000"), &SalaryStructure::default()).unwrap();
        assert_eq!(b.basic, dec("30000"));
        assert_eq!(b.house_rent, dec("15000"));
        assert_eq!(b.allowance, dec("5000"));
    }

    #[test]
    fn parts_always_sum_to_gross() {
        let structure = SalaryStructure::new(dec("33.33"), dec("33.33"), dec("33.34")).unwrap();
        for gross in ["0", "0.01", "1", "999.99", "12345.67", "100000.005"] {
            let b = SalaryBreakdown::from_gross(dec(gross), &structure).unwrap();
            assert_eq!(b.basic + b.house_rent + b.allowance, b.gross, "gross {}", gross);
        }
    }

    #[test]
    fn structure_must_sum_to_hundred() {
        assert!(matches!(
            SalaryStructure::new(dec("60"), dec("30"), dec("20")),
            Err(PayrollError::InvalidStructure(_))
        ));
        assert!(SalaryStructure::from_config(&PayrollConfig::default()).is_ok());
    }

    #[test]
    fn negative_gross_is_rejected() {
        assert_eq!(
            SalaryBreakdown::from_gross(dec("-1"), &SalaryStructure::default()),
            Err(PayrollError::NegativeGross)
        );
    }

    #[test]
    fn elapsed_month_edges() {
        assert_eq!(elapsed_months(date(2024, 1, 15), date(2024, 1, 15)), 0);
        assert_eq!(elapsed_months(date(2024, 1, 15), date(2024, 2, 14)), 0);
        assert_eq!(elapsed_months(date(2024, 1, 15), date(2024, 2, 15)), 1);
        assert_eq!(elapsed_months(date(2023, 11, 1), date(2024, 2, 1)), 3);
        assert_eq!(elapsed_months(date(2024, 1, 31), date(2024, 2, 28)), 0);
        assert_eq!(elapsed_months(date(2024, 1, 31), date(2024, 2, 29)), 1);
        assert_eq!(elapsed_months(date(2024, 3, 1), date(2024, 2, 1)), 0);
    }

    #[test]
    fn pf_accrual() {
        let pf = ProvidentFund::accrual(dec("30000"), dec("10"), Some(date(2024, 1, 1)), date(2024, 7, 1)).unwrap();
        assert_eq!(pf.months, 6);
        assert_eq!(pf.monthly_employee, dec("3000"));
        assert_eq!(pf.employee_total, dec("18000"));
        assert_eq!(pf.employer_total, dec("18000"));
        assert_eq!(pf.total, dec("36000"));
    }

    #[test]
    fn no_start_date_accrues_nothing() {
        let pf = ProvidentFund::accrual(dec("30000"), dec("10"), None, date(2024, 7, 1)).unwrap();
        assert_eq!(pf.months, 0);
        assert_eq!(pf.total, Decimal::ZERO);
    }

    #[test]
    fn rate_is_bounded() {
        assert!(ProvidentFund::accrual(dec("1"), dec("101"), None, date(2024, 1, 1)).is_err());
    }
}
