//! Terminal progress for plan execution

use colored::Colorize;
use declarative::{Error, MutationStep, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};

/// Step bar for one space; prints a line per finished step above the bar.
pub struct StepProgress {
    label: String,
    bar: Option<ProgressBar>,
}

impl StepProgress {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            bar: None,
        }
    }

    /// Clear the bar once the space is done
    pub fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    fn println(&self, line: String) {
        match &self.bar {
            Some(bar) => bar.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }
}

impl ProgressCallback for StepProgress {
    fn on_plan_start(&mut self, steps: usize) {
        let bar = ProgressBar::new(steps as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {prefix:.bold} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        bar.set_prefix(self.label.clone());
        self.bar = Some(bar);
    }

    fn on_step_start(&mut self, _index: usize, step: &MutationStep) {
        if let Some(bar) = &self.bar {
            bar.set_message(step.to_string());
        }
    }

    fn on_step_complete(&mut self, _index: usize, step: &MutationStep, error: Option<&Error>) {
        match error {
            None => self.println(format!("    {} {}", "✓".green(), step)),
            Some(e) => self.println(format!("    {} {} ({})", "✗".red(), step, e)),
        }
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }
}

impl Drop for StepProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::mock::MockClient;
    use declarative::{Reconciler, SpaceSpec};

    #[test]
    fn test_drives_reconciler() {
        let reconciler = Reconciler::new(MockClient::new());
        let mut spec = SpaceSpec::new("demo");
        spec.variables.insert("MODE".into(), "prod".into());

        let mut progress = StepProgress::new("demo");
        let state = reconciler.create_with(&spec, &mut progress).unwrap();
        progress.finish();

        assert!(state.is_created());
        assert!(progress.bar.is_none());
    }
}
