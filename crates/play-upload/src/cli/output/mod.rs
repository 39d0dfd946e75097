//! Output formatting utilities

use console::{style, Style};

use play_upload_core::{ReleaseEvent, ReleaseReporter, ReleaseSummary};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", style("→").blue(), message);
}

/// Create a styled key-value line
pub fn key_value(key: &str, value: &str) -> String {
    format!("  {}: {}", style(key).dim(), value)
}

/// Style for paths
pub fn path_style() -> Style {
    Style::new().cyan()
}

/// Print the summary of a committed upload
pub fn summary(summary: &ReleaseSummary) {
    println!("{}", key_value("Package     ", &summary.package_name));
    println!(
        "{}",
        key_value("Version code", &style(summary.version_code).cyan().to_string())
    );
    println!("{}", key_value("Track       ", &summary.track));
    println!(
        "{}",
        key_value("Release     ", &format!("{} ({})", summary.release_name, summary.status))
    );
    println!("{}", key_value("Console     ", &style(&summary.console_url).dim().to_string()));
}

/// Prints a progress line before and after each release step
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ReleaseReporter for ConsoleReporter {
    fn report(&self, event: &ReleaseEvent) {
        match event {
            ReleaseEvent::Started { step, detail } => {
                let detail = detail
                    .as_ref()
                    .map(|detail| path_style().apply_to(detail).to_string());
                info(&step.start_line(detail.as_deref()))
            }
            ReleaseEvent::Completed { step, detail } => match detail {
                Some(detail) => success(&format!("{} {}", step.success_message(), detail)),
                None => success(step.success_message()),
            },
            // Failures are printed once, by the caller that ends the process
            ReleaseEvent::Failed { .. } => {}
        }
    }
}
