use crate::stack::StackAnomaly;
use console::style;
use std::fmt::Display;

/// Centralized output formatting utilities for consistent CLI presentation
pub struct Output;

impl Output {
    pub fn success<T: Display>(message: T) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error<T: Display>(message: T) {
        println!("{} {}", style("✗").red(), message);
    }

    pub fn warning<T: Display>(message: T) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info<T: Display>(message: T) {
        println!("{} {}", style("ℹ").cyan(), message);
    }

    /// Print a sub-item with arrow prefix
    pub fn sub_item<T: Display>(message: T) {
        println!("  {} {}", style("→").dim(), message);
    }

    pub fn section<T: Display>(title: T) {
        println!("\n{}", style(title).bold().underlined());
    }

    /// Print a tip/suggestion
    pub fn tip<T: Display>(message: T) {
        println!("{} {}", style("TIP:").cyan(), style(message).dim());
    }

    /// Print anomalies with their remediation hints
    pub fn problems(anomalies: &[&StackAnomaly]) {
        if anomalies.is_empty() {
            return;
        }

        Self::section("Problems detected");
        for &anomaly in anomalies {
            Self::anomaly(anomaly);
        }
    }

    pub fn anomaly(anomaly: &StackAnomaly) {
        Self::warning(format!("{}: {anomaly}", style(anomaly.kind()).bold()));
        Self::sub_item(format!("hint: {}", anomaly.hint()));
    }
}
