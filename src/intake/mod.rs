//! ファイル取り込みモジュール
//!
//! - 給与シート: `.xlsx` / `.xls`、ヘッダー2行
//! - 社員名簿: `.csv`、ヘッダー1行

mod roster;
mod xlsx;

use crate::error::{PayrollError, Result};
use hrms_payroll_common::{records_from_rows, ParsedRecord};
use std::path::{Path, PathBuf};

/// 取り込むファイルの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Salaries,
    Employees,
}

impl FileKind {
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            FileKind::Salaries => &["xlsx", "xls"],
            FileKind::Employees => &["csv"],
        }
    }

    pub fn header_rows(&self) -> usize {
        match self {
            FileKind::Salaries => 2,
            FileKind::Employees => 1,
        }
    }

    /// 検証APIに渡す種別名
    pub fn api_name(&self) -> &'static str {
        match self {
            FileKind::Salaries => "salaries",
            FileKind::Employees => "employees",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Salaries => "Salaries",
            FileKind::Employees => "Employees",
        }
    }

    /// 拡張子から種類を推定
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        [FileKind::Salaries, FileKind::Employees]
            .into_iter()
            .find(|kind| kind.extensions().contains(&ext.as_str()))
    }
}

/// 拡張子が種類に合っているか（大文字小文字を区別しない）
pub fn check_extension(path: &Path, kind: FileKind) -> Result<()> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if kind.extensions().iter().any(|e| *e == ext) {
        Ok(())
    } else {
        Err(PayrollError::UnsupportedFormat(format!(
            "{} ({} file must be {})",
            path.display(),
            kind.label(),
            kind.extensions().iter().map(|e| format!(".{}", e)).collect::<Vec<_>>().join(" / "),
        )))
    }
}

/// ファイルを読み込みレコードに変換
pub fn parse(path: &Path, kind: FileKind) -> Result<Vec<ParsedRecord>> {
    check_extension(path, kind)?;

    if !path.exists() {
        return Err(PayrollError::ReadError(format!(
            "ファイルが見つかりません: {}",
            path.display()
        )));
    }

    let rows = match kind {
        FileKind::Salaries => xlsx::read_rows(path)?,
        FileKind::Employees => roster::read_rows(path)?,
    };

    let records = records_from_rows(&rows, kind.header_rows()).map_err(|e| match e {
        hrms_payroll_common::Error::MalformedLayout(m) => {
            PayrollError::MalformedLayout(format!("{}: {}", path.display(), m))
        }
        other => PayrollError::Common(other),
    })?;

    tracing::debug!(path = %path.display(), records = records.len(), "parsed {}", kind.label());
    Ok(records)
}

/// 選択済みのファイルと解析結果
#[derive(Debug, Clone)]
pub struct SalaryUpload {
    pub path: PathBuf,
    pub records: Vec<ParsedRecord>,
}

impl SalaryUpload {
    pub fn load(path: &Path) -> Result<Self> {
        let records = parse(path, FileKind::Salaries)?;
        Ok(Self { path: path.to_path_buf(), records })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}
