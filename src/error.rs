use thiserror::Error;

#[derive(Error, Debug)]
pub enum PayrollError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIのURLが設定されていません。`hrms-payroll config --set-api-url URL` で設定してください")]
    MissingApiUrl,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Malformed layout: {0}")]
    MalformedLayout(String),

    #[error("Could not read file: {0}")]
    ReadError(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("Bulk processing failed to start: {0}")]
    Trigger(String),

    #[error("Individual processing failed: {0}")]
    IndividualProcessing(String),

    #[error("Payslip generation failed: {0}")]
    DocumentGeneration(String),

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Submission cancelled")]
    Cancelled,

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("CLI実行エラー: {0}")]
    CliExecution(String),

    #[error(transparent)]
    Common(#[from] hrms_payroll_common::Error),
}

impl PayrollError {
    /// 状態行・トーストに表示する本文
    ///
    /// バックエンドから受け取ったメッセージはそのまま返す。
    pub fn user_message(&self) -> String {
        match self {
            PayrollError::Validation(m)
            | PayrollError::Upload(m)
            | PayrollError::Verification(m)
            | PayrollError::Trigger(m)
            | PayrollError::IndividualProcessing(m)
            | PayrollError::DocumentGeneration(m)
            | PayrollError::ApiCall(m) => m.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PayrollError>;
