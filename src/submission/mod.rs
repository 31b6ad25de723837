//! 給与バッチ送信モジュール
//!
//! ## 一括処理
//! 1. 給与シート・社員名簿をアップロード
//! 2. 待機後、2ファイルの存在を並行して確認
//! 3. 確認ダイアログで対象月を承認
//! 4. 一括処理ジョブを起動し、続けて給与明細を生成
//!
//! ## 個別処理
//! 読み込み済みの給与シートから社員1名の行を取り出して送信し、
//! 続けてその社員の給与明細を生成する（アップロード・確認は行わない）。
//!
//! 各通信はキャンセルトークンと競合させ、キャンセル後の状態更新は行わない。

mod individual;
mod state;

pub use individual::{build_payload, find_employee, validate_employee_id};
pub use state::{ProcessingState, ProcessingStatus};

use crate::api::{
    BulkTriggerRequest, ExcelUploadRequest, ExcelUploadResponse, PayrollApi, VerifyRequest,
    VerifyResponse,
};
use crate::config::Config;
use crate::crosscheck;
use crate::error::{PayrollError, Result};
use crate::intake::{self, FileKind, SalaryUpload};
use crate::notify::{Notifier, ToastLevel};
use hrms_payroll_common::Period;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// 待機時間の設定
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    pub settle_delay: Duration,
    pub auto_reset_delay: Duration,
}

impl Timings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            settle_delay: config.settle_delay(),
            auto_reset_delay: config.auto_reset_delay(),
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// フォームに入力されたデータ
#[derive(Debug, Clone, Default)]
pub struct FormData {
    pub salaries: Option<SalaryUpload>,
    pub employees_file: Option<PathBuf>,
    pub employee_id: String,
    pub period: Option<Period>,
}

impl FormData {
    pub fn has_parsed_records(&self) -> bool {
        self.salaries.as_ref().map(|s| !s.records.is_empty()).unwrap_or(false)
    }
}

/// 失敗した段階
#[derive(Debug, Clone, Copy)]
enum Stage {
    Upload,
    Verification,
    Trigger,
    Individual,
    Document,
}

impl Stage {
    fn error(self, message: String) -> PayrollError {
        match self {
            Stage::Upload => PayrollError::Upload(message),
            Stage::Verification => PayrollError::Verification(message),
            Stage::Trigger => PayrollError::Trigger(message),
            Stage::Individual => PayrollError::IndividualProcessing(message),
            Stage::Document => PayrollError::DocumentGeneration(message),
        }
    }

    fn wrap(self, err: PayrollError) -> PayrollError {
        match err {
            PayrollError::Cancelled => PayrollError::Cancelled,
            other => self.error(other.user_message()),
        }
    }
}

fn non_empty(message: &str, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message.trim().to_string()
    }
}

fn file_exists(response: &VerifyResponse) -> bool {
    response.success && response.file_exists
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "✅"
    } else {
        "❌"
    }
}

fn completion_message(period: Period, response: &ExcelUploadResponse) -> String {
    match response.summary().filter(|s| s.total_records > 0) {
        Some(s) => format!(
            "Payroll for {} completed: {}/{} payslips generated ({} errors, {} warnings).",
            period.display_name(),
            s.processed_successfully,
            s.total_records,
            s.errors,
            s.warnings,
        ),
        None => format!("Payroll for {} completed successfully.", period.display_name()),
    }
}

/// 送信フォーム1つ分の状態機械
pub struct SubmissionMachine {
    api: Arc<dyn PayrollApi>,
    notifier: Arc<dyn Notifier>,
    timings: Timings,
    state: ProcessingState,
    form: FormData,
    cancel: CancellationToken,
    last_generation: Option<ExcelUploadResponse>,
}

impl SubmissionMachine {
    pub fn new(api: Arc<dyn PayrollApi>, notifier: Arc<dyn Notifier>, timings: Timings) -> Self {
        Self {
            api,
            notifier,
            timings,
            state: ProcessingState::new(),
            form: FormData::default(),
            cancel: CancellationToken::new(),
            last_generation: None,
        }
    }

    pub fn state(&self) -> &ProcessingState {
        &self.state
    }

    pub fn form(&self) -> &FormData {
        &self.form
    }

    /// 直近の給与明細生成結果
    pub fn last_generation(&self) -> Option<&ExcelUploadResponse> {
        self.last_generation.as_ref()
    }

    /// 外部（Ctrl-C など）からキャンセルするためのハンドル
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    // ---- 状態更新 ----

    fn notify_status(&self) {
        self.notifier.status(&self.state);
    }

    fn toast(&self, level: ToastLevel, message: &str) {
        self.notifier.toast(level, message);
    }

    fn update(&mut self, f: impl FnOnce(&mut ProcessingState) -> Result<()>) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(PayrollError::Cancelled);
        }
        f(&mut self.state)?;
        self.notify_status();
        Ok(())
    }

    fn transition(&mut self, next: ProcessingStatus, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        self.update(|s| s.transition(next, message))
    }

    fn set_message(&mut self, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        self.update(|s| {
            s.status_message = message;
            Ok(())
        })
    }

    /// Error へ遷移し、状態行とトーストに表示
    fn fail(&mut self, err: PayrollError) -> PayrollError {
        if matches!(err, PayrollError::Cancelled) || self.cancel.is_cancelled() {
            tracing::info!(status = %self.state.status, "submission cancelled");
            return PayrollError::Cancelled;
        }

        let message = err.user_message();
        tracing::error!(status = %self.state.status, "{}", err);
        if self
            .state
            .transition(ProcessingStatus::Error, message.clone())
            .is_err()
        {
            self.state.status_message = message.clone();
        }
        self.notify_status();
        self.toast(ToastLevel::Error, &message);
        err
    }

    async fn guarded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(PayrollError::Cancelled),
            result = fut => result,
        }
    }

    /// キャンセル済みなら新しいトークンに差し替え、途中の状態を Idle に戻す
    ///
    /// # Returns
    /// * `true` - 差し替えた
    pub fn clear_cancelled(&mut self) -> bool {
        if !self.cancel.is_cancelled() {
            return false;
        }
        self.cancel = CancellationToken::new();
        self.state.return_to_idle();
        self.notify_status();
        true
    }

    fn begin_submission(&mut self) -> Result<()> {
        self.clear_cancelled();
        if self.state.status.is_busy() {
            let err = PayrollError::Validation("A submission is already in progress".into());
            self.toast(ToastLevel::Warning, &err.user_message());
            return Err(err);
        }
        if self.state.status != ProcessingStatus::Idle {
            self.state.return_to_idle();
            self.notify_status();
        }
        Ok(())
    }

    // ---- フォーム操作 ----

    /// 給与シートを読み込み、照合を再実行
    pub async fn load_salaries(&mut self, path: &Path) -> Result<usize> {
        let upload = match SalaryUpload::load(path) {
            Ok(upload) => upload,
            Err(e) => {
                self.toast(ToastLevel::Error, &e.user_message());
                return Err(e);
            }
        };

        let count = upload.records.len();
        self.toast(
            ToastLevel::Info,
            &format!("Loaded {} employee rows from {}", count, upload.file_name()),
        );
        self.form.salaries = Some(upload);
        self.refresh_comparison().await;
        Ok(count)
    }

    /// 社員名簿を読み込み（一括処理のみ）
    pub fn load_employees(&mut self, path: &Path) -> Result<usize> {
        match intake::parse(path, FileKind::Employees) {
            Ok(records) => {
                self.form.employees_file = Some(path.to_path_buf());
                Ok(records.len())
            }
            Err(e) => {
                self.toast(ToastLevel::Error, &e.user_message());
                Err(e)
            }
        }
    }

    pub fn set_employee_id(&mut self, employee_id: &str) {
        self.form.employee_id = employee_id.trim().to_string();
    }

    /// 対象月を設定し、変わった場合は照合を再実行
    pub async fn set_period(&mut self, period: Period) {
        if self.form.period != Some(period) {
            self.form.period = Some(period);
            self.refresh_comparison().await;
        }
    }

    /// 対象月と給与シートが揃っていれば照合を実行
    pub async fn refresh_comparison(&mut self) {
        let Some(period) = self.form.period else {
            return;
        };
        if self.form.salaries.is_none() {
            return;
        }

        let api = Arc::clone(&self.api);
        let result = match self
            .guarded(async { Ok(crosscheck::compare(api.as_ref(), period).await) })
            .await
        {
            Ok(result) => result,
            Err(_) => return,
        };

        if result.has_discrepancies {
            self.toast(ToastLevel::Warning, &result.warning_text);
        }
        self.state.set_comparison(result);
        self.notify_status();
    }

    pub fn acknowledge_warning(&mut self) {
        self.state.acknowledge_warning();
        self.notify_status();
    }

    /// 差異の警告が承認されなかったので送信を止める（状態行とトーストに表示）
    pub fn decline_warning(&mut self) -> PayrollError {
        self.clear_cancelled();
        self.fail(PayrollError::Validation(
            "Submission stopped: manual adjustments were not acknowledged".into(),
        ))
    }

    // ---- 入力チェック ----

    fn require_salaries(&self) -> Result<&SalaryUpload> {
        let upload = self.form.salaries.as_ref().ok_or_else(|| {
            PayrollError::Validation("Please select the salaries spreadsheet (.xlsx)".into())
        })?;
        if upload.records.is_empty() {
            return Err(PayrollError::Validation(
                "The salaries spreadsheet contains no employee rows".into(),
            ));
        }
        Ok(upload)
    }

    fn require_period(&self) -> Result<Period> {
        self.form
            .period
            .ok_or_else(|| PayrollError::Validation("Please select the payroll month".into()))
    }

    /// 一括処理の入力チェック
    pub fn validate_bulk(&self) -> Result<(PathBuf, PathBuf, Period)> {
        let salaries = self.require_salaries()?.path.clone();
        let employees = self.form.employees_file.clone().ok_or_else(|| {
            PayrollError::Validation("Please select the employees file (.csv)".into())
        })?;
        let period = self.require_period()?;
        Ok((salaries, employees, period))
    }

    /// 個別処理の入力チェック
    pub fn validate_individual(&self) -> Result<(SalaryUpload, String, Period)> {
        let upload = self.require_salaries()?.clone();
        let employee_id = self.form.employee_id.trim().to_string();
        if employee_id.is_empty() {
            return Err(PayrollError::Validation("Please enter the employee ID".into()));
        }
        if !validate_employee_id(&employee_id) {
            return Err(PayrollError::Validation(format!(
                "Employee ID '{}' must match the format 12345-1234567-1",
                employee_id
            )));
        }
        let period = self.require_period()?;
        Ok((upload, employee_id, period))
    }

    pub fn can_submit_bulk(&self) -> bool {
        !self.state.status.is_busy() && self.validate_bulk().is_ok()
    }

    pub fn can_submit_individual(&self) -> bool {
        !self.state.status.is_busy() && self.validate_individual().is_ok()
    }

    // ---- 一括処理 ----

    /// アップロードと存在確認（Idle → Uploading → Verifying → Ready）
    pub async fn submit_bulk(&mut self) -> Result<()> {
        self.begin_submission()?;
        let (salaries, employees, period) = match self.validate_bulk() {
            Ok(v) => v,
            Err(e) => return Err(self.fail(e)),
        };
        let month_year = period.lambda_key();

        self.transition(ProcessingStatus::Uploading, "Uploading files...")?;
        let uploaded = self
            .guarded(self.api.upload_files(&salaries, &employees, &month_year))
            .await;
        let response = match uploaded {
            Ok(r) => r,
            Err(e) => return Err(self.fail(Stage::Upload.wrap(e))),
        };
        if !response.success {
            return Err(self.fail(PayrollError::Upload(non_empty(
                &response.message,
                "The server rejected the uploaded files",
            ))));
        }
        self.toast(
            ToastLevel::Success,
            &non_empty(&response.message, "Files uploaded successfully"),
        );

        self.transition(ProcessingStatus::Verifying, "Verifying uploaded files...")?;
        let settle = self.timings.settle_delay;
        if let Err(e) = self
            .guarded(async {
                tokio::time::sleep(settle).await;
                Ok(())
            })
            .await
        {
            return Err(self.fail(e));
        }

        let salaries_request = VerifyRequest {
            file_type: FileKind::Salaries.api_name().to_string(),
            month_year: month_year.clone(),
        };
        let employees_request = VerifyRequest {
            file_type: FileKind::Employees.api_name().to_string(),
            month_year: month_year.clone(),
        };
        let api = Arc::clone(&self.api);
        let verified = self
            .guarded(async {
                Ok(tokio::join!(
                    api.verify_file(&salaries_request),
                    api.verify_file(&employees_request)
                ))
            })
            .await;
        let (salaries_result, employees_result) = match verified {
            Ok(v) => v,
            Err(e) => return Err(self.fail(e)),
        };
        let salaries_check = match salaries_result {
            Ok(r) => r,
            Err(e) => return Err(self.fail(Stage::Verification.wrap(e))),
        };
        let employees_check = match employees_result {
            Ok(r) => r,
            Err(e) => return Err(self.fail(Stage::Verification.wrap(e))),
        };

        let salaries_ok = file_exists(&salaries_check);
        let employees_ok = file_exists(&employees_check);
        let summary = format!(
            "{}: {} | {}: {}",
            FileKind::Salaries.label(),
            mark(salaries_ok),
            FileKind::Employees.label(),
            mark(employees_ok),
        );
        tracing::debug!(
            salaries_size = ?salaries_check.file_size,
            employees_size = ?employees_check.file_size,
            "{}",
            summary
        );

        if !(salaries_ok && employees_ok) {
            return Err(self.fail(PayrollError::Verification(format!(
                "Uploaded files could not be verified. {}",
                summary
            ))));
        }

        let message = format!(
            "Files verified ({}). Confirm to process payroll for {}.",
            summary,
            period.display_name()
        );
        self.update(|s| {
            s.transition(ProcessingStatus::Ready, message)?;
            s.show_confirm_dialog = true;
            Ok(())
        })
    }

    /// 確認ダイアログの文言
    pub fn confirmation_prompt(&self) -> Option<String> {
        self.form
            .period
            .map(|p| format!("Process payroll for all employees for {}?", p.display_name()))
    }

    /// 確認後の一括処理（Ready → Processing → Completed）
    pub async fn confirm_bulk(&mut self) -> Result<()> {
        if self.state.status != ProcessingStatus::Ready {
            return Err(PayrollError::InvalidTransition {
                from: self.state.status.to_string(),
                to: ProcessingStatus::Processing.to_string(),
            });
        }
        let (salaries, _, period) = match self.validate_bulk() {
            Ok(v) => v,
            Err(e) => return Err(self.fail(e)),
        };

        self.transition(
            ProcessingStatus::Processing,
            format!("Starting payroll processing for {}...", period.display_name()),
        )?;

        let request = BulkTriggerRequest {
            month_year: period.lambda_key(),
            process_type: "all".to_string(),
        };
        let response = match self.guarded(self.api.trigger_bulk(&request)).await {
            Ok(r) => r,
            Err(e) => return Err(self.fail(Stage::Trigger.wrap(e))),
        };
        if !response.triggered {
            return Err(self.fail(PayrollError::Trigger(non_empty(
                &response.message,
                "Bulk payroll processing did not start",
            ))));
        }
        self.toast(
            ToastLevel::Success,
            &non_empty(&response.message, "Bulk payroll processing started"),
        );

        self.generate_documents(&salaries, period, None).await
    }

    /// 確認ダイアログを閉じる（Ready のまま）
    pub fn decline_confirmation(&mut self) {
        if self.state.status == ProcessingStatus::Ready {
            self.state.show_confirm_dialog = false;
            self.state.status_message = "Processing not confirmed. Files remain uploaded.".into();
            self.notify_status();
        }
    }

    // ---- 個別処理 ----

    /// 社員1名の処理（Idle → Processing → Completed）
    pub async fn submit_individual(&mut self) -> Result<()> {
        self.begin_submission()?;
        let (upload, employee_id, period) = match self.validate_individual() {
            Ok(v) => v,
            Err(e) => return Err(self.fail(e)),
        };

        let Some(record) = find_employee(&upload.records, &employee_id) else {
            return Err(self.fail(PayrollError::IndividualProcessing(format!(
                "Employee {} was not found in {}",
                employee_id,
                upload.file_name()
            ))));
        };
        let payload = build_payload(record, period);

        let who = if payload.employee_name.is_empty() {
            employee_id.clone()
        } else {
            payload.employee_name.clone()
        };
        self.transition(
            ProcessingStatus::Processing,
            format!("Processing payroll for {} ({})...", who, period.display_name()),
        )?;

        let response = match self
            .guarded(self.api.process_individual(&employee_id, &payload))
            .await
        {
            Ok(r) => r,
            Err(e) => return Err(self.fail(Stage::Individual.wrap(e))),
        };
        if !response.success {
            return Err(self.fail(PayrollError::IndividualProcessing(non_empty(
                &response.message,
                "The server rejected the employee payroll",
            ))));
        }
        if let Some(key) = response.s3_key.as_deref().filter(|k| !k.is_empty()) {
            tracing::debug!(employee_id = %employee_id, s3_key = key, "individual payslip stored");
        }
        self.toast(
            ToastLevel::Success,
            &non_empty(&response.message, &format!("Payroll processed for {}", who)),
        );

        self.generate_documents(&upload.path, period, Some(employee_id)).await
    }

    // ---- 給与明細生成 ----

    async fn generate_documents(
        &mut self,
        file: &Path,
        period: Period,
        employee_id: Option<String>,
    ) -> Result<()> {
        let period_key = period.iso_key();
        if !Period::is_iso_key(&period_key) {
            return Err(self.fail(PayrollError::Validation(format!(
                "Invalid period format: {} (expected YYYY-MM)",
                period_key
            ))));
        }

        self.set_message(format!("Generating payslips for {}...", period.display_name()))?;

        let request = ExcelUploadRequest {
            file: file.to_path_buf(),
            period: period_key,
            payment_date: period.payment_date().to_string(),
            employee_id,
        };
        let response = match self.guarded(self.api.upload_excel_payroll(&request)).await {
            Ok(r) => r,
            Err(e) => return Err(self.fail(Stage::Document.wrap(e))),
        };
        if !response.is_success() {
            let message = non_empty(
                response.message.as_deref().unwrap_or_default(),
                "Payslip generation failed",
            );
            return Err(self.fail(PayrollError::DocumentGeneration(message)));
        }

        let message = completion_message(period, &response);
        self.last_generation = Some(response);
        self.transition(ProcessingStatus::Completed, message.clone())?;
        self.toast(ToastLevel::Success, &message);
        Ok(())
    }

    // ---- リセット ----

    /// 完了から一定時間経っていれば Idle に戻す
    pub fn poll_auto_reset(&mut self, now: Instant) -> bool {
        match self.state.completed_at {
            Some(at)
                if self.state.status == ProcessingStatus::Completed
                    && now.saturating_duration_since(at) >= self.timings.auto_reset_delay =>
            {
                self.state.return_to_idle();
                self.notify_status();
                true
            }
            _ => false,
        }
    }

    /// 実行中の通信を破棄し、フォームと状態を初期化（対象月は残す）
    pub fn reset(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        let period = self.form.period;
        self.form = FormData { period, ..Default::default() };
        self.state.reset();
        self.last_generation = None;
        self.notify_status();
    }
}
