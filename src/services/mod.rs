pub mod account_service;
pub mod approval_service;
pub mod invoice_service;
pub mod payroll;

pub use account_service::{AccountService, IssuedSession};
pub use approval_service::{ApprovalError, ApprovalService};
pub use invoice_service::{delete_unbilled_order, InvoiceError, InvoiceService};
pub use payroll::{PayrollError, ProvidentFund, SalaryBreakdown, SalaryStructure};
