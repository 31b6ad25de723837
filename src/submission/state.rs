//! 送信状態
//!
//! Idle → Uploading → Verifying → Ready → Processing → Completed
//! 個別処理のみ Idle → Processing。Error は終端以外のどこからでも遷移できる。

use crate::error::{PayrollError, Result};
use hrms_payroll_common::ComparisonResult;
use std::fmt;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProcessingStatus {
    #[default]
    Idle,
    Uploading,
    Verifying,
    Ready,
    Processing,
    Completed,
    Error,
}

impl ProcessingStatus {
    pub fn can_transition_to(self, next: ProcessingStatus) -> bool {
        use ProcessingStatus::*;
        match (self, next) {
            (Idle, Uploading) => true,
            (Uploading, Verifying) => true,
            (Verifying, Ready) => true,
            (Ready, Processing) => true,
            (Idle, Processing) => true,
            (Processing, Completed) => true,
            (from, Error) => !from.is_terminal(),
            _ => false,
        }
    }

    /// 送信ボタンを無効にする状態
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            ProcessingStatus::Uploading | ProcessingStatus::Verifying | ProcessingStatus::Processing
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessingStatus::Completed | ProcessingStatus::Error)
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessingStatus::Idle => "idle",
            ProcessingStatus::Uploading => "uploading",
            ProcessingStatus::Verifying => "verifying",
            ProcessingStatus::Ready => "ready",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// 送信フォーム1つ分の状態
#[derive(Debug, Clone, Default)]
pub struct ProcessingState {
    pub status: ProcessingStatus,
    pub status_message: String,
    pub show_confirm_dialog: bool,
    pub comparison_result: Option<ComparisonResult>,
    /// 差異があり、まだ確認されていない間だけ true
    pub show_warning: bool,
    pub warning_acknowledged: bool,
    pub completed_at: Option<Instant>,
}

impl ProcessingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 状態を遷移（不正な遷移は拒否）
    pub fn transition(&mut self, next: ProcessingStatus, message: impl Into<String>) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(PayrollError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }

        self.status = next;
        self.status_message = message.into();
        if next != ProcessingStatus::Ready {
            self.show_confirm_dialog = false;
        }
        self.completed_at = if next == ProcessingStatus::Completed {
            Some(Instant::now())
        } else {
            None
        };
        Ok(())
    }

    /// 照合結果を設定（警告は未確認に戻る）
    pub fn set_comparison(&mut self, result: ComparisonResult) {
        self.show_warning = result.has_discrepancies;
        self.warning_acknowledged = false;
        self.comparison_result = Some(result);
    }

    pub fn acknowledge_warning(&mut self) {
        if self.show_warning {
            self.warning_acknowledged = true;
        }
        self.show_warning = false;
    }

    pub fn warning_text(&self) -> Option<&str> {
        self.comparison_result
            .as_ref()
            .filter(|c| c.has_discrepancies)
            .map(|c| c.warning_text.as_str())
    }

    /// 終端状態から次の送信に備える（照合結果は残す）
    pub fn return_to_idle(&mut self) {
        self.status = ProcessingStatus::Idle;
        self.status_message.clear();
        self.show_confirm_dialog = false;
        self.completed_at = None;
    }

    /// 全て初期化
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
