//! バックエンドAPIのリクエスト/レスポンス型

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `POST /lambda-payroll/upload/files`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadFilesResponse {
    pub success: bool,
    pub message: String,
}

/// `POST /lambda-payroll/upload/verify`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub file_type: String,
    pub month_year: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifyResponse {
    pub success: bool,
    pub file_exists: bool,
    pub file_size: Option<u64>,
}

/// `POST /lambda-payroll/process/bulk`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkTriggerRequest {
    pub month_year: String,
    pub process_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkTriggerResponse {
    pub triggered: bool,
    pub message: String,
}

/// `POST /lambda-payroll/process/individual/{employeeId}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualPayload {
    pub employee_name: String,
    pub basic_salary: f64,
    pub allowances: f64,
    pub bonus: f64,
    pub gross_salary: f64,
    pub tax: f64,
    pub payable: f64,
    pub trip_insurance_deduction: f64,
    pub advance_salary_deduction: f64,
    pub month_year: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndividualResponse {
    pub success: bool,
    pub payslip_generated: bool,
    #[serde(rename = "s3Key")]
    pub s3_key: Option<String>,
    pub message: String,
    pub employee_id: String,
    pub month_year: String,
}

/// `POST /excel-payroll/upload`（multipart）
#[derive(Debug, Clone, PartialEq)]
pub struct ExcelUploadRequest {
    pub file: PathBuf,
    /// `YYYY-MM`
    pub period: String,
    /// `YYYY-MM-DD`（月末日）
    pub payment_date: String,
    /// 個別処理では対象社員のみ
    pub employee_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExcelUploadResponse {
    pub success: Option<bool>,
    pub message: Option<String>,
    pub data: Option<ExcelUploadData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExcelUploadData {
    pub success: Option<bool>,
    pub summary: ExcelUploadSummary,
    pub payslips: Vec<serde_json::Value>,
    pub errors: Vec<serde_json::Value>,
    pub warnings: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExcelUploadSummary {
    pub total_records: u64,
    pub processed_successfully: u64,
    pub errors: u64,
    pub warnings: u64,
}

impl ExcelUploadResponse {
    /// 給与明細生成が成功したか
    ///
    /// 構造化された `success`（トップレベル → `data.success`）を優先し、
    /// どちらも無い場合のみメッセージの文言で判定する。
    pub fn is_success(&self) -> bool {
        if let Some(flag) = self.success {
            return flag;
        }
        if let Some(flag) = self.data.as_ref().and_then(|d| d.success) {
            return flag;
        }

        self.message
            .as_deref()
            .map(|m| {
                let m = m.to_lowercase();
                m.contains("successfully") || m.contains("completed")
            })
            .unwrap_or(false)
    }

    pub fn summary(&self) -> Option<&ExcelUploadSummary> {
        self.data.as_ref().map(|d| &d.summary)
    }
}

/// `GET /payroll/manual-data/{period}` の1件
///
/// 文字列項目の `null` は空文字、金額は `"5,000.00"` のような文字列も受け付ける。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManualEntry {
    #[serde(alias = "employee_id", alias = "cnic", deserialize_with = "nullable_string")]
    pub employee_id: String,
    #[serde(alias = "employee_name", alias = "name", deserialize_with = "nullable_string")]
    pub employee_name: String,
    #[serde(deserialize_with = "flexible_amount")]
    pub amount: f64,
    #[serde(deserialize_with = "nullable_string")]
    pub period: String,
    #[serde(alias = "description", alias = "notes", deserialize_with = "nullable_string")]
    pub reason: String,
    #[serde(alias = "created_at", alias = "date", deserialize_with = "nullable_string")]
    pub created_at: String,
    pub source: Option<String>,
    pub status: Option<String>,
}

fn nullable_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
}

fn flexible_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Option::<RawAmount>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(RawAmount::Number(n)) => Ok(n),
        Some(RawAmount::Text(text)) => {
            let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
            if cleaned.is_empty() {
                return Ok(0.0);
            }
            cleaned
                .parse()
                .map_err(|_| de::Error::custom(format!("invalid amount: {:?}", text)))
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManualData {
    pub bonuses: Vec<ManualEntry>,
    pub deductions: Vec<ManualEntry>,
    #[serde(alias = "salaryIncrements", alias = "salary_increments")]
    pub increments: Vec<ManualEntry>,
    #[serde(alias = "activeLoans", alias = "active_loans")]
    pub loans: Vec<ManualEntry>,
}

/// バックエンドは `{ data: {...} }` で包む場合と包まない場合がある
///
/// `data` があればその中身だけを読む。中身が壊れていればエラー。
#[derive(Debug, Clone)]
pub struct ManualDataEnvelope(ManualData);

impl ManualDataEnvelope {
    pub fn into_inner(self) -> ManualData {
        self.0
    }
}

impl<'de> Deserialize<'de> for ManualDataEnvelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut body = serde_json::Value::deserialize(deserializer)?;
        let inner = match body.as_object_mut().and_then(|m| m.remove("data")) {
            Some(data) if !data.is_null() => data,
            _ => body,
        };
        ManualData::deserialize(inner)
            .map(ManualDataEnvelope)
            .map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_success_wins_over_message() {
        let res: ExcelUploadResponse = serde_json::from_str(
            r#"{"message": "Upload completed", "data": {"success": false}}"#,
        )
        .unwrap();
        assert!(!res.is_success());
    }

    #[test]
    fn test_message_fallback_when_no_flag() {
        let res: ExcelUploadResponse =
            serde_json::from_str(r#"{"message": "Payslips generated successfully"}"#).unwrap();
        assert!(res.is_success());

        let res: ExcelUploadResponse =
            serde_json::from_str(r#"{"message": "Something went wrong"}"#).unwrap();
        assert!(!res.is_success());
    }

    #[test]
    fn test_excel_summary_parses() {
        let res: ExcelUploadResponse = serde_json::from_str(
            r#"{"message":"ok","data":{"success":true,"summary":{"totalRecords":10,"processedSuccessfully":9,"errors":1,"warnings":0},"payslips":[],"errors":[{"row":4}],"warnings":[]}}"#,
        )
        .unwrap();
        assert!(res.is_success());
        let summary = res.summary().unwrap();
        assert_eq!(summary.total_records, 10);
        assert_eq!(summary.processed_successfully, 9);
    }

    #[test]
    fn test_manual_data_envelope() {
        let wrapped: ManualDataEnvelope = serde_json::from_str(
            r#"{"data": {"bonuses": [{"employeeId": "1", "amount": 100}]}}"#,
        )
        .unwrap();
        assert_eq!(wrapped.into_inner().bonuses.len(), 1);

        let bare: ManualDataEnvelope =
            serde_json::from_str(r#"{"salaryIncrements": [{"employee_id": "2", "source": "excel_import"}]}"#)
                .unwrap();
        let data = bare.into_inner();
        assert_eq!(data.increments.len(), 1);
        assert_eq!(data.increments[0].employee_id, "2");
    }

    #[test]
    fn test_manual_entry_accepts_null_and_text_amount() {
        let data = serde_json::from_str::<ManualDataEnvelope>(
            r#"{"data": {"bonuses": [
                {"employeeId": "37405-1234567-1", "amount": 5000, "reason": null, "createdAt": null},
                {"employeeId": "35202-7654321-3", "amount": "5,000.50", "employeeName": null}
            ]}}"#,
        )
        .unwrap()
        .into_inner();

        assert_eq!(data.bonuses.len(), 2);
        assert_eq!(data.bonuses[0].reason, "");
        assert_eq!(data.bonuses[0].amount, 5000.0);
        assert_eq!(data.bonuses[1].amount, 5000.5);
        assert_eq!(data.bonuses[1].employee_name, "");
    }

    /// 中身が読めない場合は空データにせずエラーにする
    #[test]
    fn test_manual_data_broken_payload_is_error() {
        let broken = [
            r#"{"data": {"bonuses": [{"employeeId": "1", "amount": "five thousand"}]}}"#,
            r#"{"data": {"bonuses": "none"}}"#,
            r#"{"data": [1, 2, 3]}"#,
        ];
        for body in broken {
            assert!(
                serde_json::from_str::<ManualDataEnvelope>(body).is_err(),
                "should fail: {}",
                body
            );
        }
    }

    #[test]
    fn test_request_bodies_are_camel_case() {
        let body = serde_json::to_value(BulkTriggerRequest {
            month_year: "March-2025".into(),
            process_type: "all".into(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"monthYear": "March-2025", "processType": "all"}));

        let body = serde_json::to_value(VerifyRequest {
            file_type: "salaries".into(),
            month_year: "March-2025".into(),
        })
        .unwrap();
        assert_eq!(body["fileType"], "salaries");
    }
}
