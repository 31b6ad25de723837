//! HRMS給与バッチ送信
//!
//! 給与シート・社員名簿の読み込み、手動入力データとの照合、
//! 一括/個別の給与処理と給与明細生成までをバックエンドAPI経由で実行する。

pub mod api;
pub mod cli;
pub mod config;
pub mod crosscheck;
pub mod error;
pub mod intake;
pub mod mode;
pub mod notify;
pub mod report;
pub mod session;
pub mod submission;
