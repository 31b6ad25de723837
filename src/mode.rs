//! 一括/個別モード切替
//!
//! 入力途中のデータがある状態で切り替える場合は確認を求め、
//! 承認されたときだけフォームと送信状態を初期化する。

use crate::error::Result;
use crate::submission::SubmissionMachine;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Bulk,
    Individual,
}

impl Mode {
    pub fn from_individual(individual: bool) -> Self {
        if individual {
            Mode::Individual
        } else {
            Mode::Bulk
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Bulk => write!(f, "bulk"),
            Mode::Individual => write!(f, "individual"),
        }
    }
}

/// はい/いいえの確認
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// 端末で確認（dialoguer）
#[derive(Debug, Default)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

/// 常に同じ答えを返す（`--yes` やテスト用）
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirm for FixedAnswer {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

pub struct ModeController {
    mode: Mode,
    machine: SubmissionMachine,
}

impl ModeController {
    pub fn new(machine: SubmissionMachine) -> Self {
        Self { mode: Mode::Bulk, machine }
    }

    pub fn with_mode(machine: SubmissionMachine, mode: Mode) -> Self {
        Self { mode, machine }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn machine(&self) -> &SubmissionMachine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut SubmissionMachine {
        &mut self.machine
    }

    /// 現在のモードに入力済みデータがあるか
    pub fn has_user_data(&self) -> bool {
        let form = self.machine.form();
        let mode_specific = match self.mode {
            Mode::Bulk => form.employees_file.is_some(),
            Mode::Individual => !form.employee_id.trim().is_empty(),
        };
        form.salaries.is_some() || form.has_parsed_records() || mode_specific
    }

    /// モードを切り替える
    ///
    /// # Returns
    /// * `true` - 切り替えた（または既にそのモード）
    /// * `false` - 確認で拒否され、何も変更していない
    pub fn set_mode(&mut self, individual: bool, confirm: &dyn Confirm) -> bool {
        let target = Mode::from_individual(individual);
        if target == self.mode {
            return true;
        }

        if self.has_user_data() {
            let prompt = format!(
                "Switching to {} mode will discard the files and data entered in {} mode. Continue?",
                target, self.mode
            );
            if !confirm.confirm(&prompt) {
                tracing::debug!(mode = %self.mode, "mode switch declined");
                return false;
            }
        }

        self.machine.reset();
        self.mode = target;
        tracing::debug!(mode = %self.mode, "mode switched");
        true
    }

    /// 差異の警告が未確認なら確認を求める
    fn review_warning(&mut self, confirm: &dyn Confirm) -> Result<()> {
        let state = self.machine.state();
        if !state.show_warning {
            return Ok(());
        }
        let text = state.warning_text().unwrap_or_default().to_string();
        if confirm.confirm(&format!("{} Continue anyway?", text)) {
            self.machine.acknowledge_warning();
            Ok(())
        } else {
            Err(self.machine.decline_warning())
        }
    }

    /// 現在のモードで送信する
    ///
    /// 一括処理は Ready になった時点で確認ダイアログを出し、承認されれば処理を続ける。
    pub async fn submit(&mut self, confirm: &dyn Confirm) -> Result<()> {
        self.review_warning(confirm)?;

        match self.mode {
            Mode::Individual => self.machine.submit_individual().await,
            Mode::Bulk => {
                self.machine.submit_bulk().await?;

                let prompt = self
                    .machine
                    .confirmation_prompt()
                    .unwrap_or_else(|| "Process payroll?".to_string());
                if confirm.confirm(&prompt) {
                    self.machine.confirm_bulk().await
                } else {
                    self.machine.decline_confirmation();
                    Ok(())
                }
            }
        }
    }
}
