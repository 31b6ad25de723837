//! 給与バッチの型定義
//!
//! CLIとバックエンド照合で共有される型:
//! - CellValue / ParsedRecord: アップロードしたシートの1行
//! - Discrepancy / ComparisonResult: 手動入力データとの照合結果

use crate::period::Period;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// セルの値（文字列・数値・空）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl CellValue {
    /// 空白のみの文字列も空として扱う
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// 文字列表現（整数値の数値は小数点なし）
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) if s.trim().is_empty() => None,
            CellValue::Text(s) => Some(s.trim().to_string()),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            CellValue::Number(n) => Some(n.to_string()),
        }
    }

    /// 数値表現（"12,500" のような桁区切りも許容）
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => {
                let cleaned: String = s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
                cleaned.parse().ok()
            }
            CellValue::Empty => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text().unwrap_or_default())
    }
}

/// シートの1行（列名 → 値）
///
/// 列の順序はヘッダーの並びを保持する。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedRecord {
    fields: Vec<(String, CellValue)>,
}

impl ParsedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同名の列があれば上書き
    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        let column = column.into();
        if let Some(slot) = self.fields.iter_mut().find(|(c, _)| *c == column) {
            slot.1 = value;
        } else {
            self.fields.push((column, value));
        }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).and_then(CellValue::as_text)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(CellValue::as_number)
    }

    /// 別名リストのうち最初に値がある列を返す（大文字小文字・前後空白を無視）
    pub fn first_of(&self, aliases: &[&str]) -> Option<&CellValue> {
        aliases.iter().find_map(|alias| {
            let alias = normalize_column(alias);
            self.fields
                .iter()
                .find(|(c, v)| normalize_column(c) == alias && !v.is_empty())
                .map(|(_, v)| v)
        })
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(c, _)| c.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// 全列が空か
    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.is_empty())
    }
}

impl Serialize for ParsedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (column, value) in &self.fields {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// 列名比較用の正規化
pub fn normalize_column(column: &str) -> String {
    column.trim().to_lowercase()
}

/// 手動入力の区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscrepancyKind {
    Bonus,
    Deduction,
    Increment,
    Loan,
}

impl DiscrepancyKind {
    pub const ALL: [DiscrepancyKind; 4] = [
        DiscrepancyKind::Bonus,
        DiscrepancyKind::Deduction,
        DiscrepancyKind::Increment,
        DiscrepancyKind::Loan,
    ];

    /// 警告文用の名詞（単数・複数）
    pub fn noun(&self, count: usize) -> &'static str {
        match (self, count == 1) {
            (DiscrepancyKind::Bonus, true) => "bonus",
            (DiscrepancyKind::Bonus, false) => "bonuses",
            (DiscrepancyKind::Deduction, true) => "deduction",
            (DiscrepancyKind::Deduction, false) => "deductions",
            (DiscrepancyKind::Increment, true) => "salary increment",
            (DiscrepancyKind::Increment, false) => "salary increments",
            (DiscrepancyKind::Loan, true) => "active loan",
            (DiscrepancyKind::Loan, false) => "active loans",
        }
    }
}

impl fmt::Display for DiscrepancyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscrepancyKind::Bonus => write!(f, "bonus"),
            DiscrepancyKind::Deduction => write!(f, "deduction"),
            DiscrepancyKind::Increment => write!(f, "increment"),
            DiscrepancyKind::Loan => write!(f, "loan"),
        }
    }
}

/// 手動入力されたがアップロードに反映されていない調整
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discrepancy {
    pub kind: DiscrepancyKind,
    pub employee_id: String,
    pub employee_name: String,
    pub amount: f64,
    pub period: String,
    pub reason: String,
    pub recorded_at: String,
    pub source: String,
}

/// 区分ごとの件数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SummaryCounts {
    pub bonus: usize,
    pub deduction: usize,
    pub increment: usize,
    pub loan: usize,
}

impl SummaryCounts {
    pub fn get(&self, kind: DiscrepancyKind) -> usize {
        match kind {
            DiscrepancyKind::Bonus => self.bonus,
            DiscrepancyKind::Deduction => self.deduction,
            DiscrepancyKind::Increment => self.increment,
            DiscrepancyKind::Loan => self.loan,
        }
    }

    fn bump(&mut self, kind: DiscrepancyKind) {
        match kind {
            DiscrepancyKind::Bonus => self.bonus += 1,
            DiscrepancyKind::Deduction => self.deduction += 1,
            DiscrepancyKind::Increment => self.increment += 1,
            DiscrepancyKind::Loan => self.loan += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.bonus + self.deduction + self.increment + self.loan
    }
}

/// 照合結果
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub has_discrepancies: bool,
    pub discrepancies: Vec<Discrepancy>,
    pub summary_counts: SummaryCounts,
    pub warning_text: String,
}

impl ComparisonResult {
    /// 差異なし（照合失敗時のフェイルオープンにも使う）
    pub fn clean() -> Self {
        Self::default()
    }

    /// 差異リストから件数と警告文を組み立てる
    pub fn from_discrepancies(period: Period, discrepancies: Vec<Discrepancy>) -> Self {
        let mut counts = SummaryCounts::default();
        for d in &discrepancies {
            counts.bump(d.kind);
        }

        let total = counts.total();
        let warning_text = if total > 0 {
            build_warning_text(period, &counts)
        } else {
            String::new()
        };

        Self {
            has_discrepancies: total > 0,
            discrepancies,
            summary_counts: counts,
            warning_text,
        }
    }
}

fn build_warning_text(period: Period, counts: &SummaryCounts) -> String {
    let parts: Vec<String> = DiscrepancyKind::ALL
        .iter()
        .filter(|k| counts.get(**k) > 0)
        .map(|k| {
            let n = counts.get(*k);
            format!("{} {}", n, k.noun(n))
        })
        .collect();

    let total = counts.total();
    format!(
        "Found {} manually entered {} for {} ({}) that may not be reflected in the uploaded file. \
         Review them before processing payroll.",
        total,
        if total == 1 { "adjustment" } else { "adjustments" },
        period.display_name(),
        parts.join(", "),
    )
}
