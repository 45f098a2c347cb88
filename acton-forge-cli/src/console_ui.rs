//! Terminal front end for the generator: styled progress and overwrite prompts

use std::path::Path;

use acton_forge::generate::ProgressSink;
use acton_forge::materialize::OverwritePrompt;
use console::{style, Emoji};
use dialoguer::Confirm;
use similar::TextDiff;

static ARROW: Emoji<'_, '_> = Emoji("→ ", "> ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

/// Unified diff of `existing` against `proposed`
pub fn unified_diff(existing: &str, proposed: &str, path: &Path) -> String {
    let label = path.display().to_string();
    TextDiff::from_lines(existing, proposed)
        .unified_diff()
        .context_radius(3)
        .header(&format!("{label} (on disk)"), &format!("{label} (generated)"))
        .to_string()
}

/// Print a unified diff with added and removed lines colored
pub fn print_diff(diff: &str) {
    for line in diff.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            println!("{}", style(line).bold());
        } else if line.starts_with('+') {
            println!("{}", style(line).green());
        } else if line.starts_with('-') {
            println!("{}", style(line).red());
        } else if line.starts_with("@@") {
            println!("{}", style(line).cyan());
        } else {
            println!("{line}");
        }
    }
}

/// Asks on the terminal before replacing a file, showing the diff first
///
/// Without an attended terminal every overwrite is declined.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmOverwrite {
    interactive: bool,
}

impl ConfirmOverwrite {
    /// Prompt only when a user is attending the terminal
    pub fn new() -> Self {
        Self {
            interactive: console::user_attended(),
        }
    }
}

impl Default for ConfirmOverwrite {
    fn default() -> Self {
        Self::new()
    }
}

impl OverwritePrompt for ConfirmOverwrite {
    fn confirm_overwrite(&mut self, path: &Path, existing: &str, proposed: &str) -> bool {
        if !self.interactive {
            println!(
                "  {}{} differs from the generated output, left unchanged (use --force to replace)",
                CROSS,
                style(path.display()).yellow()
            );
            return false;
        }

        println!();
        print_diff(&unified_diff(existing, proposed, path));
        Confirm::new()
            .with_prompt(format!("Overwrite {}?", path.display()))
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

/// Progress notices printed to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn notice(&mut self, message: &str) {
        if message.starts_with("Failed") {
            println!("  {}{}", CROSS, style(message).red());
        } else if message.starts_with("Generating") {
            println!("{}{}", ARROW, style(message).bold());
        } else {
            println!("  {}", style(message).dim());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unified_diff_marks_changed_lines() {
        let diff = unified_diff(
            "pub struct Invoice;\nfn a() {}\n",
            "pub struct Invoice;\nfn b() {}\n",
            Path::new("src/dto/invoice_data.rs"),
        );

        assert!(diff.contains("--- src/dto/invoice_data.rs (on disk)"));
        assert!(diff.contains("+++ src/dto/invoice_data.rs (generated)"));
        assert!(diff.contains("-fn a() {}"));
        assert!(diff.contains("+fn b() {}"));
        assert!(diff.contains(" pub struct Invoice;"));
    }

    #[test]
    fn test_identical_content_has_no_hunks() {
        let diff = unified_diff("same\n", "same\n", Path::new("a.rs"));
        assert!(!diff.contains("@@"));
    }

    #[test]
    fn test_unattended_prompt_declines() {
        let mut prompt = ConfirmOverwrite { interactive: false };
        assert!(!prompt.confirm_overwrite(Path::new("a.rs"), "old", "new"));
    }
}
