use anyhow::Context;
use clap::Parser;
use hrms_payroll::api::HttpPayrollApi;
use hrms_payroll::cli::{Cli, Commands};
use hrms_payroll::config::Config;
use hrms_payroll::error::PayrollError;
use hrms_payroll::intake::{self, FileKind};
use hrms_payroll::mode::{Confirm, FixedAnswer, Mode, ModeController, TerminalConfirm};
use hrms_payroll::notify::ConsoleNotifier;
use hrms_payroll::submission::{ProcessingStatus, SubmissionMachine, Timings};
use hrms_payroll::{crosscheck, report, session};
use hrms_payroll_common::{records_to_json, Period};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose { "hrms_payroll=debug,hrms_payroll_common=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_controller(config: &Config, verbose: bool, mode: Mode) -> anyhow::Result<ModeController> {
    let api = HttpPayrollApi::from_config(config).context("APIクライアントを作成できません")?;
    let machine = SubmissionMachine::new(
        Arc::new(api),
        Arc::new(ConsoleNotifier::new(verbose)),
        Timings::from_config(config),
    );
    Ok(ModeController::with_mode(machine, mode))
}

fn confirmer(yes: bool) -> Box<dyn Confirm> {
    if yes {
        Box::new(FixedAnswer(true))
    } else {
        Box::new(TerminalConfirm)
    }
}

/// 送信結果を表示し、必要なら生成結果を保存
fn finish(controller: &ModeController, period: Period, report_path: Option<&Path>) -> anyhow::Result<()> {
    let machine = controller.machine();
    if machine.state().status != ProcessingStatus::Completed {
        println!("\n⏸ 処理は実行されていません（{}）", machine.state().status_message);
        return Ok(());
    }

    if let (Some(path), Some(response)) = (report_path, machine.last_generation()) {
        report::write_generation_report(path, period, response)?;
        println!("✔ 生成結果を保存: {}", path.display());
    }
    println!("\n✅ 完了");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };
    let config = Config::load_from(&config_path)
        .with_context(|| format!("設定ファイルを読み込めません: {}", config_path.display()))?;

    match cli.command {
        Commands::Bulk { salaries, employees, period, yes, report } => {
            println!("💼 hrms-payroll - 一括処理 ({})\n", period.display_name());
            let mut controller = build_controller(&config, cli.verbose, Mode::Bulk)?;

            println!("[1/3] ファイルを読み込み中...");
            controller.machine_mut().set_period(period).await;
            let rows = controller.machine_mut().load_salaries(&salaries).await?;
            let employees_rows = controller.machine_mut().load_employees(&employees)?;
            println!("✔ 給与シート {}件 / 社員名簿 {}件\n", rows, employees_rows);

            println!("[2/3] 手動入力データを照合...");
            match controller.machine().state().warning_text() {
                Some(text) => println!("⚠ {}\n", text),
                None => println!("✔ 差異なし\n"),
            }

            println!("[3/3] 送信中...");
            let confirm = confirmer(yes);
            session::submit_with_interrupt(&mut controller, confirm.as_ref()).await?;
            finish(&controller, period, report.as_deref())?;
        }

        Commands::Individual { salaries, employee_id, period, yes, report } => {
            println!("👤 hrms-payroll - 個別処理 ({})\n", period.display_name());
            let mut controller = build_controller(&config, cli.verbose, Mode::Individual)?;

            println!("[1/2] 給与シートを読み込み中...");
            controller.machine_mut().set_period(period).await;
            controller.machine_mut().load_salaries(&salaries).await?;
            controller.machine_mut().set_employee_id(&employee_id);
            if let Some(text) = controller.machine().state().warning_text() {
                println!("⚠ {}", text);
            }
            println!();

            println!("[2/2] 送信中...");
            let confirm = confirmer(yes);
            session::submit_with_interrupt(&mut controller, confirm.as_ref()).await?;
            finish(&controller, period, report.as_deref())?;
        }

        Commands::Check { period, report } => {
            println!("🔍 hrms-payroll - 手動入力データ照合 ({})\n", period.display_name());
            let api = HttpPayrollApi::from_config(&config)?;
            let result = crosscheck::compare(&api, period).await;

            if result.has_discrepancies {
                println!("⚠ {}\n", result.warning_text);
                for d in &result.discrepancies {
                    println!(
                        "  - [{}] {} {} {:.2} {}",
                        d.kind, d.employee_id, d.employee_name, d.amount, d.reason
                    );
                }
            } else {
                println!("✔ 差異なし");
            }

            if let Some(path) = report {
                report::write_discrepancy_report(&path, period, &result)?;
                println!("\n✔ 照合結果を保存: {}", path.display());
            }
        }

        Commands::Parse { file, limit } => {
            let kind = FileKind::from_path(&file).ok_or_else(|| {
                PayrollError::UnsupportedFormat(format!("{} (.xlsx / .xls / .csv)", file.display()))
            })?;
            let records = intake::parse(&file, kind)?;
            eprintln!("✔ {}: {}件", kind.label(), records.len());

            let shown = limit.unwrap_or(records.len()).min(records.len());
            println!("{}", records_to_json(&records[..shown])?);
        }

        Commands::Session => {
            println!("💼 hrms-payroll - 対話モード\n");
            let mut controller = build_controller(&config, cli.verbose, Mode::Bulk)?;
            session::run_session(&mut controller, &TerminalConfirm).await?;
        }

        Commands::Config { set_api_url, set_token, show } => {
            let mut config = config;
            let changed = set_api_url.is_some() || set_token.is_some();

            if let Some(url) = set_api_url {
                config.api_base_url = Some(url.trim_end_matches('/').to_string());
                println!("✔ APIのURLを設定しました");
            }
            if let Some(token) = set_token {
                config.api_token = Some(token);
                println!("✔ APIトークンを設定しました");
            }
            if changed {
                config.save_to(&config_path)?;
            }

            if show || !changed {
                print_config(&config, &config_path);
            }
        }
    }

    Ok(())
}

fn print_config(config: &Config, path: &Path) {
    println!("設定: {}", path.display());
    println!(
        "  API URL: {}",
        config.get_api_url().unwrap_or_else(|_| "未設定".to_string())
    );
    println!(
        "  APIトークン: {}",
        if config.get_api_token().is_some() { "設定済み" } else { "未設定" }
    );
    println!("  タイムアウト: {}秒", config.timeout_seconds);
    println!("  確認までの待ち時間: {}ms", config.settle_delay_ms);
    println!("  自動リセット: {}秒", config.auto_reset_seconds);
}
