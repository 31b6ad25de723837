//! 対話モード
//!
//! 画面のフォームの代わりに、メニューからファイル選択・対象月・社員IDの入力、
//! モード切替、送信、リセットを行う。完了表示の自動リセットはメニュー表示ごとに確認する。

use crate::error::{PayrollError, Result};
use crate::mode::{Confirm, Mode, ModeController};
use crate::report;
use crate::submission::ProcessingStatus;
use dialoguer::{Input, Select};
use hrms_payroll_common::Period;
use std::future::Future;
use std::path::PathBuf;
use std::time::Instant;

/// メニュー項目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    LoadSalaries,
    LoadEmployees,
    EnterEmployeeId,
    SetPeriod,
    SwitchMode,
    Submit,
    SaveReport,
    Reset,
    Quit,
}

impl SessionAction {
    pub fn label(&self, mode: Mode) -> String {
        match self {
            SessionAction::LoadSalaries => "給与シートを選択 (.xlsx)".to_string(),
            SessionAction::LoadEmployees => "社員名簿を選択 (.csv)".to_string(),
            SessionAction::EnterEmployeeId => "社員IDを入力".to_string(),
            SessionAction::SetPeriod => "対象月を設定".to_string(),
            SessionAction::SwitchMode => match mode {
                Mode::Bulk => "個別処理に切り替え".to_string(),
                Mode::Individual => "一括処理に切り替え".to_string(),
            },
            SessionAction::Submit => match mode {
                Mode::Bulk => "一括処理を実行".to_string(),
                Mode::Individual => "個別処理を実行".to_string(),
            },
            SessionAction::SaveReport => "給与明細生成結果をExcelに保存".to_string(),
            SessionAction::Reset => "入力をリセット".to_string(),
            SessionAction::Quit => "終了".to_string(),
        }
    }
}

/// 現在のモードと状態で選べる項目
pub fn available_actions(mode: Mode, status: ProcessingStatus, has_report: bool) -> Vec<SessionAction> {
    let mut actions = vec![SessionAction::LoadSalaries];
    match mode {
        Mode::Bulk => actions.push(SessionAction::LoadEmployees),
        Mode::Individual => actions.push(SessionAction::EnterEmployeeId),
    }
    actions.push(SessionAction::SetPeriod);
    actions.push(SessionAction::SwitchMode);
    if !status.is_busy() {
        actions.push(SessionAction::Submit);
    }
    if has_report {
        actions.push(SessionAction::SaveReport);
    }
    actions.push(SessionAction::Reset);
    actions.push(SessionAction::Quit);
    actions
}

fn prompt_text(prompt: &str, initial: &str) -> Result<String> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .with_initial_text(initial)
        .allow_empty(true)
        .interact_text()
        .map_err(|e| PayrollError::CliExecution(e.to_string()))?;
    Ok(input.trim().to_string())
}

fn prompt_path(prompt: &str) -> Result<Option<PathBuf>> {
    let input = prompt_text(prompt, "")?;
    let trimmed = input.trim_matches(|c| c == '"' || c == '\'');
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(PathBuf::from(trimmed)))
    }
}

fn print_form(controller: &ModeController) {
    let machine = controller.machine();
    let form = machine.form();
    let state = machine.state();

    println!("\n--- {} モード [{}] ---", controller.mode(), state.status);
    match &form.salaries {
        Some(s) => println!("  給与シート: {} ({}件)", s.path.display(), s.records.len()),
        None => println!("  給与シート: 未選択"),
    }
    match controller.mode() {
        Mode::Bulk => match &form.employees_file {
            Some(p) => println!("  社員名簿: {}", p.display()),
            None => println!("  社員名簿: 未選択"),
        },
        Mode::Individual => {
            let id = if form.employee_id.is_empty() { "未入力" } else { form.employee_id.as_str() };
            println!("  社員ID: {}", id);
        }
    }
    match form.period {
        Some(p) => println!("  対象月: {}", p.display_name()),
        None => println!("  対象月: 未設定"),
    }
    if let Some(text) = state.warning_text() {
        let mark = if state.warning_acknowledged { "確認済み" } else { "未確認" };
        println!("  ⚠ {} ({})", text, mark);
    }
    if !state.status_message.is_empty() {
        println!("  {}", state.status_message);
    }
}

/// `interrupt` が先に完了したら送信をキャンセルし、状態を Idle に戻す
pub async fn submit_until<F>(controller: &mut ModeController, confirm: &dyn Confirm, interrupt: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    controller.machine_mut().clear_cancelled();
    let cancel = controller.machine().cancel_handle();
    let watcher = tokio::spawn(async move {
        interrupt.await;
        cancel.cancel();
    });
    let result = controller.submit(confirm).await;
    watcher.abort();

    if matches!(result, Err(PayrollError::Cancelled)) {
        controller.machine_mut().clear_cancelled();
    }
    result
}

/// 送信中だけ Ctrl-C をキャンセルに割り当てる
pub async fn submit_with_interrupt(controller: &mut ModeController, confirm: &dyn Confirm) -> Result<()> {
    submit_until(controller, confirm, async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// 対話モードを実行
pub async fn run_session(controller: &mut ModeController, confirm: &dyn Confirm) -> Result<()> {
    println!("操作を選択してください（Esc / q で終了）");

    loop {
        controller.machine_mut().poll_auto_reset(Instant::now());
        print_form(controller);

        let machine = controller.machine();
        let actions = available_actions(
            controller.mode(),
            machine.state().status,
            machine.last_generation().is_some(),
        );
        let labels: Vec<String> = actions.iter().map(|a| a.label(controller.mode())).collect();

        let selection = Select::new()
            .with_prompt("操作")
            .items(&labels)
            .default(0)
            .interact_opt()
            .map_err(|e| PayrollError::CliExecution(e.to_string()))?;
        let Some(index) = selection else {
            break;
        };

        match actions[index] {
            SessionAction::LoadSalaries => {
                if let Some(path) = prompt_path("給与シートのパス")? {
                    // 失敗はトーストで表示済み
                    let _ = controller.machine_mut().load_salaries(&path).await;
                }
            }
            SessionAction::LoadEmployees => {
                if let Some(path) = prompt_path("社員名簿のパス")? {
                    if let Ok(count) = controller.machine_mut().load_employees(&path) {
                        println!("✔ 社員名簿: {}件", count);
                    }
                }
            }
            SessionAction::EnterEmployeeId => {
                let current = controller.machine().form().employee_id.clone();
                let id = prompt_text("社員ID (12345-1234567-1)", &current)?;
                controller.machine_mut().set_employee_id(&id);
            }
            SessionAction::SetPeriod => {
                let current = controller.machine().form().period.map(|p| p.iso_key()).unwrap_or_default();
                let input = prompt_text("対象月 (2025-03 / March-2025)", &current)?;
                match Period::parse(&input) {
                    Ok(period) => controller.machine_mut().set_period(period).await,
                    Err(e) => println!("✖ {}", e),
                }
            }
            SessionAction::SwitchMode => {
                let individual = controller.mode() == Mode::Bulk;
                if !controller.set_mode(individual, confirm) {
                    println!("モードは変更されていません");
                }
            }
            SessionAction::Submit => match submit_with_interrupt(controller, confirm).await {
                Ok(()) | Err(PayrollError::Validation(_)) => {}
                Err(PayrollError::Cancelled) => println!("⏹ 送信をキャンセルしました"),
                Err(e) => tracing::debug!("submission ended with error: {}", e),
            },
            SessionAction::SaveReport => {
                let machine = controller.machine();
                let (Some(response), Some(period)) = (machine.last_generation(), machine.form().period) else {
                    continue;
                };
                let default_name = format!("payslips_{}.xlsx", period.iso_key());
                let input = prompt_text("保存先", &default_name)?;
                let path = PathBuf::from(if input.is_empty() { default_name } else { input });
                match report::write_generation_report(&path, period, response) {
                    Ok(()) => println!("✔ 保存しました: {}", path.display()),
                    Err(e) => println!("✖ {}", e),
                }
            }
            SessionAction::Reset => {
                controller.machine_mut().reset();
                println!("✔ 入力をリセットしました");
            }
            SessionAction::Quit => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_actions() {
        let actions = available_actions(Mode::Bulk, ProcessingStatus::Idle, false);
        assert!(actions.contains(&SessionAction::LoadEmployees));
        assert!(!actions.contains(&SessionAction::EnterEmployeeId));
        assert!(actions.contains(&SessionAction::Submit));
        assert!(!actions.contains(&SessionAction::SaveReport));
        assert_eq!(actions.last(), Some(&SessionAction::Quit));
    }

    #[test]
    fn test_individual_actions_with_report() {
        let actions = available_actions(Mode::Individual, ProcessingStatus::Completed, true);
        assert!(actions.contains(&SessionAction::EnterEmployeeId));
        assert!(!actions.contains(&SessionAction::LoadEmployees));
        assert!(actions.contains(&SessionAction::SaveReport));
    }

    #[test]
    fn test_submit_hidden_while_busy() {
        for status in [ProcessingStatus::Uploading, ProcessingStatus::Verifying, ProcessingStatus::Processing] {
            let actions = available_actions(Mode::Bulk, status, false);
            assert!(!actions.contains(&SessionAction::Submit));
        }
    }

    #[test]
    fn test_labels_follow_mode() {
        assert_eq!(SessionAction::SwitchMode.label(Mode::Bulk), "個別処理に切り替え");
        assert_eq!(SessionAction::Submit.label(Mode::Individual), "個別処理を実行");
    }
}
