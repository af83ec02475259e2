use std::fmt::Display;
use std::time::Duration;

use anyhow::Error;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::{anyhow, Result};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Done,
    Pending,
    InProgress,
    Disabled,
    Skipped,
    Failed,
}

/// Tracks and displays the progress of a fixed sequence of steps.
pub struct StepContext {
    step_num: usize,
    steps: Vec<Step>,
}

pub struct Step {
    desc: String,
    status: StepStatus,
    progress_bar: ProgressBar,
    disabled: bool,
}

impl StepContext {
    /// Creates a context from `(description, enabled)` pairs, in execution order.
    pub fn new<S: Into<String>>(steps: impl IntoIterator<Item = (S, bool)>) -> Self {
        println!("Tasks:");

        let mut steps = steps
            .into_iter()
            .map(|(desc, enabled)| Step {
                desc: desc.into(),
                status: StepStatus::Pending,
                progress_bar: ProgressBar::new_spinner(),
                disabled: !enabled,
            })
            .collect::<Vec<_>>();

        let mp = MultiProgress::new();
        let num_steps = steps.iter().filter(|step| !step.disabled).count();
        let mut counter = 0;
        let width = format!("{}", num_steps).len();
        for (i, step) in steps.iter_mut().enumerate() {
            mp.insert(i + 1, step.progress_bar.clone());
            if step.disabled {
                let msg = Some(format!("[-/-] {}", step.desc));
                step.set_status(StepStatus::Disabled, msg);
            } else {
                counter += 1;
                let msg = Some(format!(
                    "[{:width$}/{:width$}] {}",
                    counter, num_steps, step.desc
                ));
                step.set_status(StepStatus::Pending, msg);
            }
        }

        let mut ctx = StepContext { step_num: 0, steps };
        if ctx.steps.first().map(|s| s.disabled).unwrap_or(false) {
            ctx.advance();
        }
        if let Some(current_step) = ctx.current_step() {
            current_step.set_status(StepStatus::InProgress, None);
        }
        ctx
    }

    pub fn advance(&mut self) {
        self.step_num += 1;
        while let Some(current_step) = self.current_step() {
            if !current_step.disabled {
                break;
            }
            self.step_num += 1;
        }
    }

    #[inline]
    pub fn current_step(&mut self) -> Option<&mut Step> {
        self.steps.get_mut(self.step_num)
    }

    /// Marks the current step failed and the remaining steps skipped if
    /// `res` is an error.
    pub fn check<T>(&mut self, res: Result<T>) -> Result<T> {
        if res.is_err() {
            if let Some(current_step) = self.current_step() {
                current_step.set_status(StepStatus::Failed, None);
                self.advance();
                while let Some(current_step) = self.current_step() {
                    current_step.set_status(StepStatus::Skipped, None);
                    self.advance();
                }
            }
            println!("\n");
        }

        res
    }

    pub fn bail(&mut self, e: Error) -> Result<()> {
        self.check(Err(e))
    }

    /// Marks the step described by `desc` as done and starts the next one.
    pub fn finish(&mut self, desc: &str) -> Result<()> {
        let current_step = self
            .current_step()
            .ok_or_else(|| anyhow!("step `{desc}` was completed after all steps were marked completed"))?;
        if current_step.desc != desc {
            return Err(anyhow!(
                "step `{desc}` was completed out of order; expected `{}`",
                current_step.desc
            ));
        }

        current_step.set_status(StepStatus::Done, None);

        self.advance();

        if let Some(current_step) = self.current_step() {
            current_step.set_status(StepStatus::InProgress, None);
        } else {
            self.done();
        }
        Ok(())
    }

    pub fn done(&mut self) {
        println!("\n\nCompleted all tasks");
    }

    /// Status of each step, in order.
    pub fn statuses(&self) -> Vec<StepStatus> {
        self.steps.iter().map(|step| step.status).collect()
    }
}

fn format_template(spinner: bool, status: impl Display) -> String {
    if spinner {
        format!("{{spinner:.green}} {:16} {{msg}}", status)
    } else {
        format!("  {:16} {{msg}}", status)
    }
}

impl Step {
    fn set_status(&mut self, status: StepStatus, msg: Option<String>) {
        let status_template = match status {
            StepStatus::Disabled => {
                format_template(false, "Disabled".truecolor(120, 120, 120).bold())
            }
            StepStatus::Done => format_template(false, "Done".green().bold()),
            StepStatus::Failed => format_template(false, "Failed".bright_white().on_red().bold()),
            StepStatus::InProgress => format_template(true, "In Progress".bright_white().bold()),
            StepStatus::Pending => format_template(true, "Pending".blue().bold()),
            StepStatus::Skipped => format_template(false, "Skipped".yellow().bold()),
        };
        let style = ProgressStyle::with_template(&status_template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        self.progress_bar.set_style(style);
        self.status = status;

        if let Some(msg) = msg {
            self.progress_bar.set_message(msg);
        }

        if status == StepStatus::InProgress {
            self.progress_bar
                .enable_steady_tick(Duration::from_millis(200));
        } else if status != StepStatus::Pending {
            self.progress_bar.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_order() -> Result<()> {
        let mut ctx = StepContext::new([
            ("Run generator", false),
            ("Render inv", true),
            ("Render nand2", true),
        ]);
        assert_eq!(
            ctx.statuses(),
            [
                StepStatus::Disabled,
                StepStatus::InProgress,
                StepStatus::Pending
            ]
        );

        assert!(ctx.finish("Render nand2").is_err());
        ctx.finish("Render inv")?;
        ctx.finish("Render nand2")?;
        assert_eq!(
            ctx.statuses(),
            [StepStatus::Disabled, StepStatus::Done, StepStatus::Done]
        );
        assert!(ctx.finish("Render inv").is_err());
        Ok(())
    }

    #[test]
    fn test_check_failure() {
        let mut ctx = StepContext::new([("Netlist inv", true), ("Netlist nand2", true)]);
        let res: Result<()> = ctx.check(Err(anyhow!("failed to decode circuit")));
        assert!(res.is_err());
        assert_eq!(ctx.statuses(), [StepStatus::Failed, StepStatus::Skipped]);
    }
}
