//! HRMSバックエンドAPI
//!
//! `PayrollApi` は送信フローが呼ぶ全エンドポイントを表すトレイト。
//! 実装は reqwest による `HttpPayrollApi`（テストではメモリ上の偽実装）。

mod client;
pub mod message;
pub mod types;

pub use client::HttpPayrollApi;
pub use types::*;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait PayrollApi: Send + Sync {
    /// 給与シートと社員名簿をアップロード（`monthYear` は `MonthName-YYYY`）
    async fn upload_files(
        &self,
        salaries: &Path,
        employees: &Path,
        month_year: &str,
    ) -> Result<UploadFilesResponse>;

    /// アップロード済みファイルの存在確認
    async fn verify_file(&self, request: &VerifyRequest) -> Result<VerifyResponse>;

    /// 一括処理ジョブを起動
    async fn trigger_bulk(&self, request: &BulkTriggerRequest) -> Result<BulkTriggerResponse>;

    /// 社員1名分の給与処理
    async fn process_individual(
        &self,
        employee_id: &str,
        payload: &IndividualPayload,
    ) -> Result<IndividualResponse>;

    /// 給与明細の生成（Excel給与アップロード）
    async fn upload_excel_payroll(&self, request: &ExcelUploadRequest) -> Result<ExcelUploadResponse>;

    /// 期間内の手動入力データ（`period` は `YYYY-MM`）
    async fn manual_data(&self, period: &str) -> Result<ManualData>;
}
