//! 結合テスト用の共通部品
//!
//! - `FakeApi`: 呼び出しを記録するメモリ上の `PayrollApi`
//! - フィクスチャ: 給与シート（.xlsx）と社員名簿（.csv）

#![allow(dead_code)]

use async_trait::async_trait;
use hrms_payroll::api::{
    BulkTriggerRequest, BulkTriggerResponse, ExcelUploadRequest, ExcelUploadResponse,
    IndividualPayload, IndividualResponse, ManualData, ManualEntry, PayrollApi,
    UploadFilesResponse, VerifyRequest, VerifyResponse,
};
use hrms_payroll::error::{PayrollError, Result};
use hrms_payroll::notify::RecordingNotifier;
use hrms_payroll::submission::{SubmissionMachine, Timings};
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 記録された呼び出し
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Upload { salaries: PathBuf, employees: PathBuf, month_year: String },
    Verify(VerifyRequest),
    Trigger(BulkTriggerRequest),
    Individual { employee_id: String, payload: IndividualPayload },
    ExcelUpload(ExcelUploadRequest),
    ManualData(String),
}

pub struct FakeApi {
    pub calls: Mutex<Vec<Call>>,
    pub upload_error: Option<String>,
    pub salaries_exists: bool,
    pub employees_exists: bool,
    pub triggered: bool,
    /// None なら照合APIは失敗する
    pub manual: Option<ManualData>,
    pub generation: ExcelUploadResponse,
    /// 一括処理の起動を遅らせる（キャンセル確認用）
    pub trigger_delay: Option<Duration>,
    /// 存在確認の応答を遅らせる（並行実行の確認用）
    pub verify_delay: Option<Duration>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            upload_error: None,
            salaries_exists: true,
            employees_exists: true,
            triggered: true,
            manual: Some(ManualData::default()),
            generation: generation_success(3),
            trigger_delay: None,
            verify_delay: None,
        }
    }
}

impl FakeApi {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    /// 照合以外の呼び出し
    pub fn submission_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::ManualData(_)))
            .collect()
    }
}

#[async_trait]
impl PayrollApi for FakeApi {
    async fn upload_files(
        &self,
        salaries: &Path,
        employees: &Path,
        month_year: &str,
    ) -> Result<UploadFilesResponse> {
        self.record(Call::Upload {
            salaries: salaries.to_path_buf(),
            employees: employees.to_path_buf(),
            month_year: month_year.to_string(),
        });
        match &self.upload_error {
            Some(message) => Err(PayrollError::ApiCall(message.clone())),
            None => Ok(UploadFilesResponse {
                success: true,
                message: "Files uploaded successfully".into(),
            }),
        }
    }

    async fn verify_file(&self, request: &VerifyRequest) -> Result<VerifyResponse> {
        self.record(Call::Verify(request.clone()));
        if let Some(delay) = self.verify_delay {
            tokio::time::sleep(delay).await;
        }
        let exists = match request.file_type.as_str() {
            "salaries" => self.salaries_exists,
            _ => self.employees_exists,
        };
        Ok(VerifyResponse {
            success: true,
            file_exists: exists,
            file_size: exists.then_some(2048),
        })
    }

    async fn trigger_bulk(&self, request: &BulkTriggerRequest) -> Result<BulkTriggerResponse> {
        self.record(Call::Trigger(request.clone()));
        if let Some(delay) = self.trigger_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(BulkTriggerResponse {
            triggered: self.triggered,
            message: if self.triggered {
                "Bulk processing started".into()
            } else {
                "Processing queue is full".into()
            },
        })
    }

    async fn process_individual(
        &self,
        employee_id: &str,
        payload: &IndividualPayload,
    ) -> Result<IndividualResponse> {
        self.record(Call::Individual {
            employee_id: employee_id.to_string(),
            payload: payload.clone(),
        });
        Ok(IndividualResponse {
            success: true,
            payslip_generated: true,
            s3_key: Some(format!("payslips/{}.pdf", employee_id)),
            message: "Payroll processed".into(),
            employee_id: employee_id.to_string(),
            month_year: payload.month_year.clone(),
        })
    }

    async fn upload_excel_payroll(&self, request: &ExcelUploadRequest) -> Result<ExcelUploadResponse> {
        self.record(Call::ExcelUpload(request.clone()));
        Ok(self.generation.clone())
    }

    async fn manual_data(&self, period: &str) -> Result<ManualData> {
        self.record(Call::ManualData(period.to_string()));
        self.manual
            .clone()
            .ok_or_else(|| PayrollError::ApiCall("Internal Server Error".into()))
    }
}

pub fn generation_success(records: u64) -> ExcelUploadResponse {
    serde_json::from_value(serde_json::json!({
        "message": "Payslips generated",
        "data": {
            "success": true,
            "summary": {
                "totalRecords": records,
                "processedSuccessfully": records,
                "errors": 0,
                "warnings": 0
            },
            "payslips": [],
            "errors": [],
            "warnings": []
        }
    }))
    .unwrap()
}

pub fn manual_entry(id: &str, amount: f64) -> ManualEntry {
    ManualEntry {
        employee_id: id.to_string(),
        employee_name: format!("Employee {}", id),
        amount,
        period: "2025-03".to_string(),
        reason: "Manual adjustment".to_string(),
        created_at: "2025-03-05".to_string(),
        ..Default::default()
    }
}

pub fn timings() -> Timings {
    Timings {
        settle_delay: Duration::ZERO,
        auto_reset_delay: Duration::from_secs(5),
    }
}

pub fn machine(api: Arc<FakeApi>, notifier: Arc<RecordingNotifier>) -> SubmissionMachine {
    SubmissionMachine::new(api, notifier, timings())
}

pub const EMPLOYEE_A: &str = "37405-1234567-1";
pub const EMPLOYEE_B: &str = "35202-7654321-3";

/// 2行ヘッダーの給与シートを作成
pub fn write_salaries(dir: &Path) -> PathBuf {
    let path = dir.join("salaries.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    let first = ["Employee ID", "Employee Name", "Basic Salary", "Allowances", "", "Tax", ""];
    let second = ["", "", "", "", "Bonus", "", "Advance Salary Deduction"];
    for (col, (a, b)) in first.iter().zip(second.iter()).enumerate() {
        if !a.is_empty() {
            sheet.write_string(0, col as u16, *a).unwrap();
        }
        if !b.is_empty() {
            sheet.write_string(1, col as u16, *b).unwrap();
        }
    }

    let rows: [(&str, &str, f64, f64, f64, f64, f64); 2] = [
        (EMPLOYEE_A, "Ayesha Khan", 80000.0, 10000.0, 5000.0, 4500.0, 0.0),
        (EMPLOYEE_B, "Bilal Ahmed", 60000.0, 8000.0, 0.0, 3000.0, 5000.0),
    ];
    for (i, (id, name, basic, allowances, bonus, tax, advance)) in rows.iter().enumerate() {
        let row = i as u32 + 2;
        sheet.write_string(row, 0, *id).unwrap();
        sheet.write_string(row, 1, *name).unwrap();
        sheet.write_number(row, 2, *basic).unwrap();
        sheet.write_number(row, 3, *allowances).unwrap();
        sheet.write_number(row, 4, *bonus).unwrap();
        sheet.write_number(row, 5, *tax).unwrap();
        sheet.write_number(row, 6, *advance).unwrap();
    }

    workbook.save(&path).unwrap();
    path
}

/// 社員名簿（.csv）を作成
pub fn write_employees(dir: &Path) -> PathBuf {
    let path = dir.join("employees.csv");
    std::fs::write(
        &path,
        format!(
            "Employee ID,Name,Department\n{},Ayesha Khan,Finance\n{},Bilal Ahmed,Operations\n",
            EMPLOYEE_A, EMPLOYEE_B
        ),
    )
    .unwrap();
    path
}
