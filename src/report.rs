//! レポート出力（Excel）
//!
//! 給与明細生成の結果と手動入力データの照合結果を `.xlsx` に保存する。

use crate::api::ExcelUploadResponse;
use crate::error::{PayrollError, Result};
use hrms_payroll_common::{ComparisonResult, DiscrepancyKind, Period};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use serde_json::Value;
use std::path::Path;

fn generated_at() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M").to_string()
}

fn xlsx_err(e: XlsxError) -> PayrollError {
    PayrollError::ExcelGeneration(e.to_string())
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xAAAAAA))
}

fn write_header(sheet: &mut Worksheet, row: u32, headers: &[&str], format: &Format) -> Result<()> {
    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_string_with_format(row, col as u16, *header, format)
            .map_err(xlsx_err)?;
        sheet
            .set_column_width(col as u16, (header.len().max(12) + 2) as f64)
            .map_err(xlsx_err)?;
    }
    Ok(())
}

fn write_json_cell(sheet: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<()> {
    match value {
        Value::Null => {}
        Value::Number(n) => {
            sheet
                .write_number(row, col, n.as_f64().unwrap_or_default())
                .map_err(xlsx_err)?;
        }
        Value::String(s) => {
            sheet.write_string(row, col, s).map_err(xlsx_err)?;
        }
        other => {
            sheet.write_string(row, col, other.to_string()).map_err(xlsx_err)?;
        }
    }
    Ok(())
}

/// オブジェクト配列をシートに書き出す（列は出現順のキー）
fn write_objects(sheet: &mut Worksheet, items: &[Value], format: &Format) -> Result<()> {
    let mut columns: Vec<&str> = Vec::new();
    for item in items {
        if let Value::Object(map) = item {
            for key in map.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }
    }

    if columns.is_empty() {
        columns.push("value");
    }
    write_header(sheet, 0, &columns, format)?;

    for (i, item) in items.iter().enumerate() {
        let row = i as u32 + 1;
        match item {
            Value::Object(map) => {
                for (col, key) in columns.iter().enumerate() {
                    if let Some(v) = map.get(*key) {
                        write_json_cell(sheet, row, col as u16, v)?;
                    }
                }
            }
            other => write_json_cell(sheet, row, 0, other)?,
        }
    }
    Ok(())
}

/// 給与明細生成の結果を保存
pub fn write_generation_report(path: &Path, period: Period, response: &ExcelUploadResponse) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = header_format();

    let data = response.data.clone().unwrap_or_default();

    let summary = workbook.add_worksheet();
    summary.set_name("Summary").map_err(xlsx_err)?;
    write_header(summary, 0, &["Item", "Value"], &bold)?;
    let rows: [(&str, String); 8] = [
        ("Generated at", generated_at()),
        ("Period", period.iso_key()),
        ("Payment date", period.payment_date().to_string()),
        ("Total records", data.summary.total_records.to_string()),
        ("Processed successfully", data.summary.processed_successfully.to_string()),
        ("Errors", data.summary.errors.to_string()),
        ("Warnings", data.summary.warnings.to_string()),
        ("Message", response.message.clone().unwrap_or_default()),
    ];
    for (i, (label, value)) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        summary.write_string(row, 0, *label).map_err(xlsx_err)?;
        summary.write_string(row, 1, value).map_err(xlsx_err)?;
    }
    summary.set_column_width(1, 40).map_err(xlsx_err)?;

    for (name, items) in [
        ("Payslips", &data.payslips),
        ("Errors", &data.errors),
        ("Warnings", &data.warnings),
    ] {
        if items.is_empty() {
            continue;
        }
        let sheet = workbook.add_worksheet();
        sheet.set_name(name).map_err(xlsx_err)?;
        write_objects(sheet, items, &bold)?;
    }

    workbook.save(path).map_err(xlsx_err)?;
    Ok(())
}

/// 手動入力データの照合結果を保存
pub fn write_discrepancy_report(path: &Path, period: Period, comparison: &ComparisonResult) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = header_format();

    let summary = workbook.add_worksheet();
    summary.set_name("Summary").map_err(xlsx_err)?;
    write_header(summary, 0, &["Category", "Count"], &bold)?;
    for (i, kind) in DiscrepancyKind::ALL.iter().enumerate() {
        let row = i as u32 + 1;
        summary.write_string(row, 0, kind.to_string()).map_err(xlsx_err)?;
        summary
            .write_number(row, 1, comparison.summary_counts.get(*kind) as f64)
            .map_err(xlsx_err)?;
    }
    let note_row = DiscrepancyKind::ALL.len() as u32 + 2;
    summary
        .write_string(note_row, 0, format!("Period: {}", period.display_name()))
        .map_err(xlsx_err)?;
    summary
        .write_string(note_row, 1, format!("Generated at: {}", generated_at()))
        .map_err(xlsx_err)?;
    if comparison.has_discrepancies {
        summary
            .write_string(note_row + 1, 0, &comparison.warning_text)
            .map_err(xlsx_err)?;
    }

    let details = workbook.add_worksheet();
    details.set_name("Adjustments").map_err(xlsx_err)?;
    write_header(
        details,
        0,
        &["Category", "Employee ID", "Employee Name", "Amount", "Period", "Reason", "Recorded At", "Source"],
        &bold,
    )?;
    for (i, d) in comparison.discrepancies.iter().enumerate() {
        let row = i as u32 + 1;
        details.write_string(row, 0, d.kind.to_string()).map_err(xlsx_err)?;
        details.write_string(row, 1, &d.employee_id).map_err(xlsx_err)?;
        details.write_string(row, 2, &d.employee_name).map_err(xlsx_err)?;
        details.write_number(row, 3, d.amount).map_err(xlsx_err)?;
        details.write_string(row, 4, &d.period).map_err(xlsx_err)?;
        details.write_string(row, 5, &d.reason).map_err(xlsx_err)?;
        details.write_string(row, 6, &d.recorded_at).map_err(xlsx_err)?;
        details.write_string(row, 7, &d.source).map_err(xlsx_err)?;
    }

    workbook.save(path).map_err(xlsx_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrms_payroll_common::Discrepancy;

    #[test]
    fn test_generation_report_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generation.xlsx");
        let response: ExcelUploadResponse = serde_json::from_str(
            r#"{"message":"done","data":{"success":true,"summary":{"totalRecords":2,"processedSuccessfully":2,"errors":0,"warnings":0},"payslips":[{"employeeId":"1","net":100},{"employeeId":"2","extra":true}]}}"#,
        )
        .unwrap();

        write_generation_report(&path, Period::new(2025, 3).unwrap(), &response).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_discrepancy_report_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("discrepancies.xlsx");
        let period = Period::new(2025, 3).unwrap();
        let comparison = ComparisonResult::from_discrepancies(
            period,
            vec![Discrepancy {
                kind: DiscrepancyKind::Deduction,
                employee_id: "37405-1234567-1".into(),
                employee_name: "Ali".into(),
                amount: 2500.0,
                period: "2025-03".into(),
                reason: "Late arrival".into(),
                recorded_at: "2025-03-10".into(),
                source: "manual".into(),
            }],
        );

        write_discrepancy_report(&path, period, &comparison).unwrap();
        assert!(path.exists());
    }
}
