//! Colored output helpers for the CLI

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
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the M.U.S.E banner
    pub fn banner(&self) {
        if self.colored {
            println!(
                r#"
   {}
   {}
   {}
"#,
                " __  __ _   _ ___ ___ ".bright_cyan().bold(),
                "|  \\/  | | | / __| __|".cyan().bold(),
                "|_|  |_|\\___/|___/___|".blue().bold(),
            );
            println!(
                "   {} {}\n",
                "Multi-agent Unified Sequential Executor".bright_white().bold(),
                format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
            );
        } else {
            println!(
                r#"
 __  __ _   _ ___ ___
|  \/  | | | / __| __|
|_|  |_|\___/|___/___|

   Multi-agent Unified Sequential Executor v{}
"#,
                env!("CARGO_PKG_VERSION")
            );
        }
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
            eprintln!("  [ERR] {}", message);
        }
    }

    /// Print a section heading
    pub fn heading(&self, message: &str) {
        if self.colored {
            println!("\n{}", message.bright_white().bold());
        } else {
            println!("\n{}", message);
        }
    }
}
