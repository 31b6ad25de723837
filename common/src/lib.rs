//! HRMS Payroll Common Library
//!
//! 給与バッチ送信で共有される型とユーティリティ（I/Oなし）

pub mod error;
pub mod parser;
pub mod period;
pub mod types;

pub use error::{Error, Result};
pub use parser::{
    locate_header_row, locate_header_start, merge_header_rows, records_from_rows, records_to_json,
    single_header_row, EMPLOYEE_ID_COLUMNS,
};
pub use period::Period;
pub use types::{
    normalize_column, CellValue, ComparisonResult, Discrepancy, DiscrepancyKind, ParsedRecord,
    SummaryCounts,
};
