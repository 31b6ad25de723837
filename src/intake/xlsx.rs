//! 給与シート（Excel）読み込み

use crate::error::{PayrollError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use hrms_payroll_common::CellValue;
use std::path::Path;

/// 先頭シートの全セルを読み込む
pub fn read_rows(path: &Path) -> Result<Vec<Vec<CellValue>>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| PayrollError::ReadError(format!("{}: {}", path.display(), e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PayrollError::MalformedLayout(format!("{}: シートがありません", path.display())))?
        .map_err(|e| PayrollError::ReadError(format!("{}: {}", path.display(), e)))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_value).collect())
        .collect())
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.trim().is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(v) => CellValue::Number(*v),
        Data::Int(v) => CellValue::Number(*v as f64),
        Data::Bool(v) => CellValue::Text(v.to_string()),
        Data::DateTime(v) => CellValue::Number(v.as_f64()),
        Data::DateTimeIso(v) | Data::DurationIso(v) => CellValue::Text(v.clone()),
        Data::Error(e) => {
            tracing::debug!("cell error {:?} treated as empty", e);
            CellValue::Empty
        }
    }
}
