//! ファイル取り込みの結合テスト
//!
//! rust_xlsxwriter で作成したシートを calamine で読み戻して検証

mod support;

use hrms_payroll::error::PayrollError;
use hrms_payroll::intake::{self, FileKind, SalaryUpload};
use hrms_payroll_common::CellValue;
use rust_xlsxwriter::Workbook;
use support::{EMPLOYEE_A, EMPLOYEE_B};
use tempfile::tempdir;

/// 2行ヘッダーを結合して列名にする
#[test]
fn test_salaries_two_header_rows_merged() {
    let dir = tempdir().unwrap();
    let path = support::write_salaries(dir.path());

    let records = intake::parse(&path, FileKind::Salaries).unwrap();
    assert_eq!(records.len(), 2);

    let columns: Vec<&str> = records[0].columns().collect();
    assert_eq!(
        columns,
        vec![
            "Employee ID",
            "Employee Name",
            "Basic Salary",
            "Allowances",
            "Bonus",
            "Tax",
            "Advance Salary Deduction"
        ]
    );
    assert_eq!(records[0].text("Employee ID").unwrap(), EMPLOYEE_A);
    assert_eq!(records[1].text("Employee ID").unwrap(), EMPLOYEE_B);
    assert_eq!(records[1].number("Advance Salary Deduction"), Some(5000.0));
}

/// タイトル行・空行・空欄の扱い
#[test]
fn test_salaries_title_rows_and_blank_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("march.xlsx");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Payroll March 2025").unwrap();
    sheet.write_string(2, 0, "CNIC").unwrap();
    sheet.write_string(2, 1, "Name").unwrap();
    sheet.write_string(3, 2, "Basic").unwrap();
    sheet.write_string(4, 0, EMPLOYEE_A).unwrap();
    sheet.write_string(4, 1, "Ayesha Khan").unwrap();
    sheet.write_number(4, 2, 80000.0).unwrap();
    // 5行目は空行
    sheet.write_string(6, 0, EMPLOYEE_B).unwrap();
    sheet.write_number(6, 2, 60000.0).unwrap();
    workbook.save(&path).unwrap();

    let records = intake::parse(&path, FileKind::Salaries).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].text("CNIC").unwrap(), EMPLOYEE_A);
    assert_eq!(records[0].number("Basic"), Some(80000.0));
    assert_eq!(records[1].get("Name"), Some(&CellValue::Empty));
}

/// ヘッダー行に満たないシート
#[test]
fn test_salaries_single_row_is_malformed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("short.xlsx");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Employee ID").unwrap();
    workbook.save(&path).unwrap();

    let err = intake::parse(&path, FileKind::Salaries).unwrap_err();
    assert!(matches!(err, PayrollError::MalformedLayout(_)));
}

/// 拡張子だけ .xlsx の壊れたファイル
#[test]
fn test_salaries_corrupt_file_is_read_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.xlsx");
    std::fs::write(&path, "not a workbook").unwrap();

    let err = intake::parse(&path, FileKind::Salaries).unwrap_err();
    assert!(matches!(err, PayrollError::ReadError(_)));
}

#[test]
fn test_salaries_missing_file() {
    let err = SalaryUpload::load(std::path::Path::new("/nonexistent/salaries.xlsx")).unwrap_err();
    assert!(matches!(err, PayrollError::ReadError(_)));
}

/// 社員名簿は .csv のみ
#[test]
fn test_employees_must_be_csv() {
    let dir = tempdir().unwrap();
    let path = support::write_salaries(dir.path());

    let err = intake::parse(&path, FileKind::Employees).unwrap_err();
    assert!(matches!(err, PayrollError::UnsupportedFormat(_)));
}

/// 列数が揃っていない行は空欄で補う
#[test]
fn test_employees_ragged_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("employees.csv");
    std::fs::write(
        &path,
        format!("Employee ID,Name,Department\n{},Ayesha Khan\n {} , Bilal Ahmed ,Operations\n", EMPLOYEE_A, EMPLOYEE_B),
    )
    .unwrap();

    let records = intake::parse(&path, FileKind::Employees).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("Department"), Some(&CellValue::Empty));
    assert_eq!(records[1].text("Employee ID").unwrap(), EMPLOYEE_B);
    assert_eq!(records[1].text("Name").unwrap(), "Bilal Ahmed");
}

#[test]
fn test_salary_upload_keeps_path_and_records() {
    let dir = tempdir().unwrap();
    let path = support::write_salaries(dir.path());

    let upload = SalaryUpload::load(&path).unwrap();
    assert_eq!(upload.path, path);
    assert_eq!(upload.file_name(), "salaries.xlsx");
    assert_eq!(upload.records.len(), 2);
}
