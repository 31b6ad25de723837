//! 状態行とトースト通知

use crate::submission::{ProcessingState, ProcessingStatus};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// 送信状態の通知先
pub trait Notifier: Send + Sync {
    /// 状態が変わるたびに呼ばれる
    fn status(&self, state: &ProcessingState);

    /// 一時的な通知
    fn toast(&self, level: ToastLevel, message: &str);
}

/// コンソール出力
#[derive(Debug, Default)]
pub struct ConsoleNotifier {
    pub verbose: bool,
}

impl ConsoleNotifier {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Notifier for ConsoleNotifier {
    fn status(&self, state: &ProcessingState) {
        let icon = match state.status {
            ProcessingStatus::Idle => "・",
            ProcessingStatus::Uploading => "⬆",
            ProcessingStatus::Verifying => "🔍",
            ProcessingStatus::Ready => "✔",
            ProcessingStatus::Processing => "⚙",
            ProcessingStatus::Completed => "✅",
            ProcessingStatus::Error => "❌",
        };
        if state.status_message.is_empty() {
            if self.verbose {
                println!("{} [{}]", icon, state.status);
            }
        } else {
            println!("{} [{}] {}", icon, state.status, state.status_message);
        }
    }

    fn toast(&self, level: ToastLevel, message: &str) {
        match level {
            ToastLevel::Info => println!("  ℹ {}", message),
            ToastLevel::Success => println!("  ✔ {}", message),
            ToastLevel::Warning => println!("  ⚠ {}", message),
            ToastLevel::Error => eprintln!("  ✖ {}", message),
        }
    }
}

/// 呼び出しを記録する（テスト・スクリプト用）
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    statuses: Mutex<Vec<(ProcessingStatus, String)>>,
    toasts: Mutex<Vec<(ToastLevel, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<(ProcessingStatus, String)> {
        self.statuses.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// 記録された状態の並び（連続する重複は除く）
    pub fn status_path(&self) -> Vec<ProcessingStatus> {
        let mut path: Vec<ProcessingStatus> = Vec::new();
        for (status, _) in self.statuses() {
            if path.last() != Some(&status) {
                path.push(status);
            }
        }
        path
    }

    pub fn toasts(&self) -> Vec<(ToastLevel, String)> {
        self.toasts.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn status(&self, state: &ProcessingState) {
        if let Ok(mut s) = self.statuses.lock() {
            s.push((state.status, state.status_message.clone()));
        }
    }

    fn toast(&self, level: ToastLevel, message: &str) {
        if let Ok(mut t) = self.toasts.lock() {
            t.push((level, message.to_string()));
        }
    }
}
