use chrono::{NaiveDate, Utc};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::cli::utils::{field, output_data};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::services::{ProvidentFund, SalaryBreakdown, SalaryStructure};

#[derive(Debug, Args)]
pub struct PayrollArgs {
    #[arg(long, help = "Gross monthly salary")]
    pub gross: Decimal,

    #[arg(long = "pf-start", help = "Provident fund start date (YYYY-MM-DD)")]
    pub pf_start: Option<NaiveDate>,

    #[arg(long = "as-of", help = "Accrue the fund up to this date (defaults to today)")]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct PayrollReport {
    structure: SalaryStructure,
    salary: SalaryBreakdown,
    provident_fund: ProvidentFund,
}

pub fn handle(args: PayrollArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let payroll = &config().payroll;
    let structure = SalaryStructure::from_config(payroll)?;
    let salary = SalaryBreakdown::from_gross(args.gross, &structure)?;
    let as_of = args.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let provident_fund = ProvidentFund::accrual(salary.basic, payroll.pf_rate_percent, args.pf_start, as_of)?;

    let report = PayrollReport { structure, salary, provident_fund };
    output_data(output_format, &report, |r| {
        println!("Salary");
        field("gross", r.salary.gross);
        field("basic", r.salary.basic);
        field("house rent", r.salary.house_rent);
        field("allowance", r.salary.allowance);
        println!("Provident fund (as of {})", r.provident_fund.as_of);
        match r.provident_fund.start_date {
            Some(start) => field("start", start),
            None => field("start", "not enrolled"),
        }
        field("months", r.provident_fund.months);
        field("monthly (each side)", r.provident_fund.monthly_employee);
        field("employee total", r.provident_fund.employee_total);
        field("employer total", r.provident_fund.employer_total);
        field("total", r.provident_fund.total);
    })
}
