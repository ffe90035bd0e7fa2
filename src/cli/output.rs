//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for the recall CLI.

use owo_colors::OwoColorize;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print one chunk with its index and length
    pub fn chunk(&self, index: usize, chunk: &str) {
        let label = format!("[{}] {} chars", index, chunk.chars().count());
        if self.colored {
            println!("  {}", label.cyan().bold());
        } else {
            println!("  {}", label);
        }
        println!("    {}", chunk);
    }

    /// Print one ranked search hit
    pub fn hit(&self, rank: usize, id: &str, score: f32, source: &str) {
        if self.colored {
            println!(
                "  {} {} {} {}",
                format!("{:>2}.", rank).dimmed(),
                format!("{:.4}", score).bright_green(),
                id.bright_white().bold(),
                format!("({})", source).dimmed()
            );
        } else {
            println!("  {:>2}. {:.4} {} ({})", rank, score, id, source);
        }
    }

    /// Print a block of raw text, indented
    pub fn block(&self, text: &str) {
        for line in text.lines() {
            if self.colored {
                println!("      {}", line.dimmed());
            } else {
                println!("      {}", line);
            }
        }
    }
}
