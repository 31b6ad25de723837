//! シート行パーサー
//!
//! 読み込んだセルの2次元配列からヘッダー行を特定し、
//! 以降の行を列名 → 値のレコードに変換する。
//!
//! 給与シートはヘッダーが2行に分かれており、
//! 1行目が空欄の位置は2行目の値で補う。

use crate::error::{Error, Result};
use crate::types::{normalize_column, CellValue, ParsedRecord};

/// 社員IDを示す列名の表記ゆれ
pub const EMPLOYEE_ID_COLUMNS: &[&str] = &[
    "Employee ID",
    "EmployeeID",
    "Employee Id",
    "Employee_ID",
    "employee_id",
    "Emp ID",
    "CNIC",
];

/// 2行のヘッダーを1つの列名リストにマージ
///
/// 位置ごとに1行目を優先し、空欄なら2行目、両方空なら `Column N`。
/// 同名の列が重なった場合は2つ目以降に ` (2)` などを付ける。
///
/// # Examples
/// ```
/// use hrms_payroll_common::{merge_header_rows, CellValue};
///
/// let first = vec![CellValue::Text("Employee ID".into()), CellValue::Empty];
/// let second = vec![CellValue::Empty, CellValue::Text("Basic Salary".into())];
/// assert_eq!(merge_header_rows(&first, &second), vec!["Employee ID", "Basic Salary"]);
/// ```
pub fn merge_header_rows(first: &[CellValue], second: &[CellValue]) -> Vec<String> {
    let width = first.len().max(second.len());
    let headers = (0..width)
        .map(|i| {
            first
                .get(i)
                .and_then(CellValue::as_text)
                .or_else(|| second.get(i).and_then(CellValue::as_text))
                .unwrap_or_else(|| format!("Column {}", i + 1))
        })
        .collect();
    disambiguate(headers)
}

/// 1行のヘッダーを列名リストに変換
pub fn single_header_row(row: &[CellValue]) -> Vec<String> {
    let headers = row
        .iter()
        .enumerate()
        .map(|(i, c)| c.as_text().unwrap_or_else(|| format!("Column {}", i + 1)))
        .collect();
    disambiguate(headers)
}

fn disambiguate(headers: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(headers.len());
    for header in headers {
        let mut name = header.clone();
        let mut n = 2;
        while unique.contains(&name) {
            name = format!("{} ({})", header, n);
            n += 1;
        }
        unique.push(name);
    }
    unique
}

/// 社員ID列名のセル位置（行, 列）
fn find_id_header(rows: &[Vec<CellValue>]) -> Option<(usize, usize)> {
    let aliases: Vec<String> = EMPLOYEE_ID_COLUMNS.iter().map(|c| normalize_column(c)).collect();
    rows.iter().enumerate().find_map(|(r, row)| {
        row.iter()
            .position(|c| {
                c.as_text()
                    .is_some_and(|t| aliases.contains(&normalize_column(&t)))
            })
            .map(|col| (r, col))
    })
}

/// ヘッダー行の位置を探す
///
/// 社員ID列を含む最初の行。見つからなければ先頭行。
pub fn locate_header_row(rows: &[Vec<CellValue>]) -> usize {
    find_id_header(rows).map(|(row, _)| row).unwrap_or(0)
}

/// ヘッダーの開始行
///
/// 2行ヘッダーでは社員ID列名が2行目にしか無いことがある。
/// 直前の行が社員ID列を空けた見出し行で、直後の行の社員ID列に値がある（データ行）なら、
/// 直前の行から始める。
pub fn locate_header_start(rows: &[Vec<CellValue>], header_rows: usize) -> usize {
    let Some((row, col)) = find_id_header(rows) else {
        return 0;
    };
    if header_rows != 2 || row == 0 {
        return row;
    }

    let filled = |r: usize| {
        rows.get(r)
            .and_then(|cells| cells.get(col))
            .is_some_and(|c| !c.is_empty())
    };
    let previous = &rows[row - 1];
    let previous_is_header = !previous.iter().all(CellValue::is_empty) && !filled(row - 1);

    if previous_is_header && filled(row + 1) {
        row - 1
    } else {
        row
    }
}

/// 行をレコードに変換
///
/// # Arguments
/// * `rows` - シート全体のセル
/// * `header_rows` - ヘッダー行数（1 または 2）
///
/// # Returns
/// * `Ok(Vec<ParsedRecord>)` - 空行を除いたデータ行
/// * `Err(MalformedLayout)` - ヘッダー行に足りない場合
pub fn records_from_rows(rows: &[Vec<CellValue>], header_rows: usize) -> Result<Vec<ParsedRecord>> {
    if header_rows == 0 || header_rows > 2 {
        return Err(Error::MalformedLayout(format!(
            "unsupported header row count: {}",
            header_rows
        )));
    }

    let start = locate_header_start(rows, header_rows);
    let body = &rows[start.min(rows.len())..];

    if body.len() < header_rows {
        return Err(Error::MalformedLayout(format!(
            "expected at least {} header row(s), found {}",
            header_rows,
            body.len()
        )));
    }

    let headers = if header_rows == 2 {
        merge_header_rows(&body[0], &body[1])
    } else {
        single_header_row(&body[0])
    };

    let records = body[header_rows..]
        .iter()
        .filter(|row| !row.iter().all(CellValue::is_empty))
        .map(|row| {
            let mut record = ParsedRecord::new();
            for (i, header) in headers.iter().enumerate() {
                let value = row.get(i).cloned().unwrap_or_default();
                record.insert(header.clone(), value);
            }
            record
        })
        .collect();

    Ok(records)
}

/// レコードを整形済みJSONに変換（プレビュー用）
pub fn records_to_json(records: &[ParsedRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}
