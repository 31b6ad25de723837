//! reqwest による PayrollApi 実装

use super::message::{extract_error_message, transport_message};
use super::types::*;
use super::PayrollApi;
use crate::config::Config;
use crate::error::{PayrollError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::path::Path;

const USER_AGENT: &str = concat!("hrms-payroll/", env!("CARGO_PKG_VERSION"));

pub struct HttpPayrollApi {
    http_client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpPayrollApi {
    pub fn new(base_url: impl Into<String>, token: Option<String>, config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()
            .map_err(|e| PayrollError::Config(format!("HTTPクライアント初期化エラー: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.get_api_url()?, config.get_api_token(), config)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, fallback: &str) -> Result<T> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| PayrollError::ApiCall(transport_message(&e, fallback)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PayrollError::ApiCall(transport_message(&e, fallback)))?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "{}", fallback);
            return Err(PayrollError::ApiCall(extract_error_message(
                status.as_u16(),
                &body,
                fallback,
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| PayrollError::ApiCall(format!("{}: invalid response ({})", fallback, e)))
    }
}

async fn file_part(path: &Path) -> Result<Part> {
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());
    Ok(Part::bytes(bytes).file_name(name))
}

#[async_trait]
impl PayrollApi for HttpPayrollApi {
    async fn upload_files(
        &self,
        salaries: &Path,
        employees: &Path,
        month_year: &str,
    ) -> Result<UploadFilesResponse> {
        let form = Form::new()
            .part("salariesFile", file_part(salaries).await?)
            .part("employeesFile", file_part(employees).await?)
            .text("monthYear", month_year.to_string());

        tracing::debug!(month_year, "uploading payroll files");
        let request = self
            .http_client
            .post(self.url("/lambda-payroll/upload/files"))
            .multipart(form);
        self.send(request, "Failed to upload files").await
    }

    async fn verify_file(&self, request: &VerifyRequest) -> Result<VerifyResponse> {
        let builder = self
            .http_client
            .post(self.url("/lambda-payroll/upload/verify"))
            .json(request);
        self.send(builder, "Failed to verify upload").await
    }

    async fn trigger_bulk(&self, request: &BulkTriggerRequest) -> Result<BulkTriggerResponse> {
        let builder = self
            .http_client
            .post(self.url("/lambda-payroll/process/bulk"))
            .json(request);
        self.send(builder, "Failed to start bulk processing").await
    }

    async fn process_individual(
        &self,
        employee_id: &str,
        payload: &IndividualPayload,
    ) -> Result<IndividualResponse> {
        let builder = self
            .http_client
            .post(self.url(&format!("/lambda-payroll/process/individual/{}", employee_id)))
            .json(payload);
        self.send(builder, "Failed to process employee payroll").await
    }

    async fn upload_excel_payroll(&self, request: &ExcelUploadRequest) -> Result<ExcelUploadResponse> {
        let mut form = Form::new()
            .part("file", file_part(&request.file).await?)
            .text("period", request.period.clone())
            .text("paymentDate", request.payment_date.clone());
        if let Some(id) = &request.employee_id {
            form = form.text("employeeId", id.clone());
        }

        tracing::debug!(period = %request.period, payment_date = %request.payment_date, "generating payslips");
        let builder = self
            .http_client
            .post(self.url("/excel-payroll/upload"))
            .multipart(form);
        self.send(builder, "Failed to generate payslips").await
    }

    async fn manual_data(&self, period: &str) -> Result<ManualData> {
        let builder = self
            .http_client
            .get(self.url(&format!("/payroll/manual-data/{}", period)));
        let envelope: ManualDataEnvelope = self.send(builder, "Failed to load manual data").await?;
        Ok(envelope.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let api = HttpPayrollApi::new("https://hr.example.com/api/", None, &Config::default()).unwrap();
        assert_eq!(
            api.url("/lambda-payroll/upload/verify"),
            "https://hr.example.com/api/lambda-payroll/upload/verify"
        );
    }

    #[tokio::test]
    async fn test_file_part_missing_file_is_io_error() {
        let result = file_part(Path::new("/nonexistent/salaries.xlsx")).await;
        assert!(matches!(result, Err(PayrollError::Io(_))));
    }
}
