//! 個別処理: 社員ID検証・レコード検索・送信データ作成

use crate::api::IndividualPayload;
use hrms_payroll_common::{ParsedRecord, Period, EMPLOYEE_ID_COLUMNS};
use regex::Regex;

const NAME_COLUMNS: &[&str] = &["Name", "Employee Name", "Full Name"];
const BASIC_SALARY_COLUMNS: &[&str] = &["Basic Salary", "Basic", "Basic Pay"];
const ALLOWANCE_COLUMNS: &[&str] = &["Allowances", "Allowance", "Total Allowances"];
const BONUS_COLUMNS: &[&str] = &["Bonus", "Bonuses"];
const GROSS_SALARY_COLUMNS: &[&str] = &["Gross Salary", "Gross", "Gross Pay"];
const TAX_COLUMNS: &[&str] = &["Tax", "Income Tax", "Tax Deduction"];
const PAYABLE_COLUMNS: &[&str] = &["Payable", "Net Payable", "Net Salary", "Net Pay"];
const TRIP_INSURANCE_COLUMNS: &[&str] = &[
    "Trip/Insurance Deduction",
    "Trip / Insurance Deduction",
    "Insurance Deduction",
    "Trip Deduction",
];
const ADVANCE_SALARY_COLUMNS: &[&str] = &[
    "Advance Salary Deduction",
    "Advance Salary",
    "Advance Deduction",
];

/// 社員ID（`NNNNN-NNNNNNN-N`）の形式チェック
pub fn validate_employee_id(id: &str) -> bool {
    lazy_static::lazy_static! {
        static ref EMPLOYEE_ID: Regex = Regex::new(r"^\d{5}-\d{7}-\d$").unwrap();
    }
    EMPLOYEE_ID.is_match(id.trim())
}

fn digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

/// 社員IDでレコードを検索
///
/// 列名の表記ゆれを許容し、シート側がハイフンなしで保存されていても一致させる。
pub fn find_employee<'a>(records: &'a [ParsedRecord], employee_id: &str) -> Option<&'a ParsedRecord> {
    let wanted = employee_id.trim();
    let wanted_digits = digits(wanted);

    records.iter().find(|record| {
        record
            .first_of(EMPLOYEE_ID_COLUMNS)
            .and_then(|v| v.as_text())
            .map(|found| found == wanted || (!wanted_digits.is_empty() && digits(&found) == wanted_digits))
            .unwrap_or(false)
    })
}

fn amount(record: &ParsedRecord, aliases: &[&str]) -> Option<f64> {
    record.first_of(aliases).and_then(|v| v.as_number())
}

/// レコードから個別処理APIの送信データを作る
///
/// 総支給額・差引支給額の列がない場合は他の列から計算する。
pub fn build_payload(record: &ParsedRecord, period: Period) -> IndividualPayload {
    let basic_salary = amount(record, BASIC_SALARY_COLUMNS).unwrap_or(0.0);
    let allowances = amount(record, ALLOWANCE_COLUMNS).unwrap_or(0.0);
    let bonus = amount(record, BONUS_COLUMNS).unwrap_or(0.0);
    let tax = amount(record, TAX_COLUMNS).unwrap_or(0.0);
    let trip_insurance_deduction = amount(record, TRIP_INSURANCE_COLUMNS).unwrap_or(0.0);
    let advance_salary_deduction = amount(record, ADVANCE_SALARY_COLUMNS).unwrap_or(0.0);

    let gross_salary =
        amount(record, GROSS_SALARY_COLUMNS).unwrap_or(basic_salary + allowances + bonus);
    let payable = amount(record, PAYABLE_COLUMNS)
        .unwrap_or(gross_salary - tax - trip_insurance_deduction - advance_salary_deduction);

    IndividualPayload {
        employee_name: record
            .first_of(NAME_COLUMNS)
            .and_then(|v| v.as_text())
            .unwrap_or_default(),
        basic_salary,
        allowances,
        bonus,
        gross_salary,
        tax,
        payable,
        trip_insurance_deduction,
        advance_salary_deduction,
        month_year: period.lambda_key(),
    }
}
