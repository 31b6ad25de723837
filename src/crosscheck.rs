//! 手動入力データとの照合
//!
//! 対象期間に手動で登録されたボーナス・控除・昇給・貸付を取得し、
//! アップロードに反映されていない可能性があるものを警告する。
//! 照合は参考情報なので、取得に失敗しても差異なしとして扱い送信は止めない。

use crate::api::{ManualData, ManualEntry, PayrollApi};
use hrms_payroll_common::{ComparisonResult, Discrepancy, DiscrepancyKind, Period};

/// 過去のシート取り込みで作られた昇給を示す source 値
const IMPORTED_SOURCES: &[&str] = &["excel_import", "excel-import", "spreadsheet_import", "bulk_upload"];

/// 照合を実行（失敗時は差異なし）
pub async fn compare<A: PayrollApi + ?Sized>(api: &A, period: Period) -> ComparisonResult {
    match api.manual_data(&period.iso_key()).await {
        Ok(data) => {
            let result = build_comparison(period, data);
            tracing::debug!(
                period = %period,
                total = result.summary_counts.total(),
                "cross-check finished"
            );
            result
        }
        Err(e) => {
            tracing::warn!(period = %period, "cross-check failed, continuing without it: {}", e);
            ComparisonResult::clean()
        }
    }
}

/// 手動データから照合結果を組み立てる
pub fn build_comparison(period: Period, data: ManualData) -> ComparisonResult {
    let ManualData { bonuses, deductions, increments, loans } = data;

    let discrepancies = bonuses
        .into_iter()
        .map(|e| to_discrepancy(DiscrepancyKind::Bonus, e))
        .chain(deductions.into_iter().map(|e| to_discrepancy(DiscrepancyKind::Deduction, e)))
        .chain(
            increments
                .into_iter()
                .filter(|e| !is_imported(e))
                .map(|e| to_discrepancy(DiscrepancyKind::Increment, e)),
        )
        .chain(
            loans
                .into_iter()
                .filter(is_active_loan)
                .map(|e| to_discrepancy(DiscrepancyKind::Loan, e)),
        )
        .collect();

    ComparisonResult::from_discrepancies(period, discrepancies)
}

fn is_imported(entry: &ManualEntry) -> bool {
    entry
        .source
        .as_deref()
        .map(|s| {
            let s = s.trim().to_lowercase();
            IMPORTED_SOURCES.contains(&s.as_str())
        })
        .unwrap_or(false)
}

fn is_active_loan(entry: &ManualEntry) -> bool {
    entry
        .status
        .as_deref()
        .map(|s| s.trim().eq_ignore_ascii_case("active"))
        .unwrap_or(true)
}

fn to_discrepancy(kind: DiscrepancyKind, entry: ManualEntry) -> Discrepancy {
    Discrepancy {
        kind,
        employee_id: entry.employee_id,
        employee_name: entry.employee_name,
        amount: entry.amount,
        period: entry.period,
        reason: entry.reason,
        recorded_at: entry.created_at,
        source: entry.source.unwrap_or_else(|| "manual".to_string()),
    }
}
