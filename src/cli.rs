use clap::{Parser, Subcommand};
use hrms_payroll_common::Period;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hrms-payroll")]
#[command(about = "HRMS給与バッチ送信ツール（一括・個別）", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 設定ファイル（省略時は ~/.config/hrms-payroll/config.json）
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 全社員の給与を一括処理
    Bulk {
        /// 給与シート（.xlsx/.xls）
        #[arg(short, long, required = true)]
        salaries: PathBuf,

        /// 社員名簿（.csv）
        #[arg(short, long, required = true)]
        employees: PathBuf,

        /// 対象月（2025-03 / March-2025）
        #[arg(short, long, required = true)]
        period: Period,

        /// 確認ダイアログを省略
        #[arg(short, long)]
        yes: bool,

        /// 給与明細生成結果のExcel出力先
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// 社員1名の給与を処理
    Individual {
        /// 給与シート（.xlsx/.xls）
        #[arg(short, long, required = true)]
        salaries: PathBuf,

        /// 社員ID（12345-1234567-1）
        #[arg(short = 'i', long, required = true)]
        employee_id: String,

        /// 対象月（2025-03 / March-2025）
        #[arg(short, long, required = true)]
        period: Period,

        /// 手動入力データの警告を確認済みとして続行
        #[arg(short, long)]
        yes: bool,

        /// 給与明細生成結果のExcel出力先
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// 手動入力データとの照合のみ実行
    Check {
        /// 対象月（2025-03 / March-2025）
        #[arg(short, long, required = true)]
        period: Period,

        /// 照合結果のExcel出力先
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// ファイルを読み込んでJSONで表示
    Parse {
        /// 給与シート（.xlsx/.xls）または社員名簿（.csv）
        #[arg(required = true)]
        file: PathBuf,

        /// 表示する件数（省略時は全件）
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// 対話モード
    Session,

    /// 設定を表示/編集
    Config {
        /// APIのベースURLを設定
        #[arg(long)]
        set_api_url: Option<String>,

        /// APIトークンを設定
        #[arg(long)]
        set_token: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
