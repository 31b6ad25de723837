//! 手動入力データ照合の結合テスト

mod support;

use hrms_payroll::api::{ManualData, ManualDataEnvelope};
use hrms_payroll::crosscheck;
use hrms_payroll_common::{DiscrepancyKind, Period};
use support::{Call, FakeApi, EMPLOYEE_A, EMPLOYEE_B};

fn march() -> Period {
    Period::new(2025, 3).unwrap()
}

/// 取得に失敗しても差異なしとして続行
#[tokio::test]
async fn test_fail_open_on_api_error() {
    let api = FakeApi { manual: None, ..Default::default() };
    let result = crosscheck::compare(&api, march()).await;

    assert!(!result.has_discrepancies);
    assert!(result.discrepancies.is_empty());
    assert_eq!(result.summary_counts.total(), 0);
    assert!(result.warning_text.is_empty());
    assert_eq!(api.calls(), vec![Call::ManualData("2025-03".into())]);
}

/// 同じデータなら何度実行しても同じ結果
#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let data = ManualData {
        bonuses: vec![support::manual_entry(EMPLOYEE_A, 5000.0)],
        deductions: vec![support::manual_entry(EMPLOYEE_B, 750.0)],
        increments: vec![support::manual_entry(EMPLOYEE_B, 3000.0)],
        loans: vec![],
    };
    let api = FakeApi { manual: Some(data), ..Default::default() };

    let first = crosscheck::compare(&api, march()).await;
    let second = crosscheck::compare(&api, march()).await;
    assert_eq!(first, second);
    assert_eq!(first.summary_counts, second.summary_counts);
    assert_eq!(first.summary_counts.total(), 3);
}

/// バックエンドの応答形式（data で包まれた形）から組み立てる
#[test]
fn test_build_from_backend_payload() {
    let body = r#"{
        "data": {
            "bonuses": [
                {"employeeId": "37405-1234567-1", "employeeName": "Ayesha Khan", "amount": 5000, "reason": "Eid bonus", "createdAt": "2025-03-02"}
            ],
            "deductions": [],
            "salaryIncrements": [
                {"employeeId": "35202-7654321-3", "amount": 4000, "source": "excel_import"},
                {"employeeId": "35202-7654321-3", "amount": 2500, "source": "manual"}
            ],
            "activeLoans": [
                {"employeeId": "37405-1234567-1", "amount": 20000, "status": "active"},
                {"employeeId": "35202-7654321-3", "amount": 10000, "status": "closed"}
            ]
        }
    }"#;
    let data = serde_json::from_str::<ManualDataEnvelope>(body).unwrap().into_inner();
    let result = crosscheck::build_comparison(march(), data);

    assert!(result.has_discrepancies);
    assert_eq!(result.summary_counts.get(DiscrepancyKind::Bonus), 1);
    assert_eq!(result.summary_counts.get(DiscrepancyKind::Deduction), 0);
    assert_eq!(result.summary_counts.get(DiscrepancyKind::Increment), 1);
    assert_eq!(result.summary_counts.get(DiscrepancyKind::Loan), 1);

    let bonus = &result.discrepancies[0];
    assert_eq!(bonus.kind, DiscrepancyKind::Bonus);
    assert_eq!(bonus.employee_name, "Ayesha Khan");
    assert_eq!(bonus.reason, "Eid bonus");
    assert_eq!(bonus.recorded_at, "2025-03-02");

    assert!(result
        .warning_text
        .starts_with("Found 3 manually entered adjustments for March 2025 (1 bonus, 1 salary increment, 1 active loan)"));
}

#[test]
fn test_empty_data_has_no_warning() {
    let result = crosscheck::build_comparison(march(), ManualData::default());
    assert!(!result.has_discrepancies);
    assert!(result.warning_text.is_empty());
}

/// null の項目や文字列の金額があっても手動入力を取りこぼさない
#[test]
fn test_loose_payload_still_reports_adjustments() {
    let body = r#"{
        "data": {
            "bonuses": [
                {"employeeId": "37405-1234567-1", "amount": 5000, "reason": null}
            ],
            "deductions": [
                {"employeeId": "35202-7654321-3", "amount": "5000.00", "employeeName": null, "createdAt": null}
            ]
        }
    }"#;
    let data = serde_json::from_str::<ManualDataEnvelope>(body).unwrap().into_inner();
    let result = crosscheck::build_comparison(march(), data);

    assert!(result.has_discrepancies);
    assert_eq!(result.summary_counts.get(DiscrepancyKind::Bonus), 1);
    assert_eq!(result.summary_counts.get(DiscrepancyKind::Deduction), 1);
    assert_eq!(result.discrepancies[0].reason, "");
    assert_eq!(result.discrepancies[1].amount, 5000.0);
}

/// 読めない応答は空データ扱いにせずエラーとして返す（照合側で警告ログ）
#[test]
fn test_unreadable_payload_is_not_silently_empty() {
    let body = r#"{"data": {"bonuses": [{"employeeId": "37405-1234567-1", "amount": {"value": 5000}}]}}"#;
    assert!(serde_json::from_str::<ManualDataEnvelope>(body).is_err());
}
