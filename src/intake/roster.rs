//! 社員名簿（CSV）読み込み

use crate::error::{PayrollError, Result};
use hrms_payroll_common::CellValue;
use std::path::Path;

/// CSVの全行を読み込む（ヘッダー行も含む）
pub fn read_rows(path: &Path) -> Result<Vec<Vec<CellValue>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| PayrollError::ReadError(format!("{}: {}", path.display(), e)))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| PayrollError::ReadError(format!("{}: {}", path.display(), e)))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(rows)
}
