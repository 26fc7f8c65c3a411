//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use roost_core::Flock;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a freshly recorded log entry
    ///
    /// Human mode prints the message, JSON mode the full entry, quiet mode
    /// just the generated id.
    pub fn print_recorded<T: Serialize>(&self, id: &str, entry: &T, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(entry).unwrap());
            }
            OutputFormat::Quiet => println!("{}", id),
        }
    }

    /// Print a list of flocks, marking the selected one
    pub fn print_flocks(&self, flocks: &[Flock], selected: Option<&str>) {
        match self.format {
            OutputFormat::Human => {
                if flocks.is_empty() {
                    println!("No flocks recorded.");
                    return;
                }
                for flock in flocks {
                    let marker = if selected == Some(flock.id.as_str()) {
                        "*"
                    } else {
                        " "
                    };
                    println!(
                        "{} {} | {} | {} | started {} | {} birds",
                        marker,
                        short_id(&flock.id),
                        truncate(&flock.name, 24),
                        flock.kind,
                        flock.start_date,
                        flock.initial_count
                    );
                }
                println!("\n{} flock(s)", flocks.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(flocks).unwrap());
            }
            OutputFormat::Quiet => {
                for flock in flocks {
                    println!("{}", flock.id);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// First eight characters of an id, for compact listings
///
/// Counts characters, not bytes; imported ids are arbitrary strings.
fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

/// Truncate a string to max length, adding "..." if truncated
///
/// Counts characters, not bytes, so multibyte names never split.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
    }

    #[test]
    fn test_truncate_multibyte_names() {
        assert_eq!(truncate("Høns på øya", 20), "Høns på øya");
        assert_eq!(truncate("Høns på øya ved fjøset", 8), "Høns ...");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("a1b2c3d4-e5f6-7890"), "a1b2c3d4");
        assert_eq!(short_id("f1"), "f1");
        assert_eq!(short_id("høne-øst-42"), "høne-øst");
    }
}
