use colored::Colorize;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::window::Edge;

/// Verbosity levels for console output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum VerbosityLevel {
    /// Only show errors
    Quiet = 0,
    /// Normal output (default)
    #[default]
    Normal = 1,
    /// Verbose output with load and trim activity
    Verbose = 2,
    /// Debug output with scroll corrections and dropped results
    Debug = 3,
}

impl fmt::Display for VerbosityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerbosityLevel::Quiet => write!(f, "quiet"),
            VerbosityLevel::Normal => write!(f, "normal"),
            VerbosityLevel::Verbose => write!(f, "verbose"),
            VerbosityLevel::Debug => write!(f, "debug"),
        }
    }
}

impl VerbosityLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "quiet" => Some(VerbosityLevel::Quiet),
            "normal" => Some(VerbosityLevel::Normal),
            "verbose" => Some(VerbosityLevel::Verbose),
            "debug" => Some(VerbosityLevel::Debug),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Console {
    verbosity: VerbosityLevel,
}

impl Console {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self { verbosity }
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    fn should_show(&self, level: VerbosityLevel) -> bool {
        self.verbosity >= level
    }

    pub fn error(&self, message: &str) {
        if self.verbosity > VerbosityLevel::Quiet {
            eprintln!("❌ {}", message);
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show(VerbosityLevel::Normal) {
            eprintln!("⚠️  {}", message);
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show(VerbosityLevel::Normal) {
            println!("ℹ️  {}", message);
        }
    }

    pub fn success(&self, message: &str) {
        if self.should_show(VerbosityLevel::Normal) {
            println!("✅ {}", message);
        }
    }

    pub fn plain(&self, message: &str) {
        if self.should_show(VerbosityLevel::Normal) {
            println!("{}", message);
        }
    }

    pub fn newline(&self) {
        if self.should_show(VerbosityLevel::Normal) {
            println!();
        }
    }

    pub fn verbose(&self, message: &str) {
        if self.should_show(VerbosityLevel::Verbose) {
            println!("{}", message.dimmed());
        }
    }

    pub fn debug(&self, message: &str) {
        if self.should_show(VerbosityLevel::Debug) {
            println!("🐛 DEBUG: {}", message);
        }
    }

    pub fn load_started(&self, edge: Edge, anchor: &str, size: usize) {
        if self.should_show(VerbosityLevel::Verbose) {
            println!(
                "{} {} {}",
                "↻".dimmed(),
                format!("loading {} {} items", edge, size).cyan(),
                format!("(anchor {})", anchor).dimmed()
            );
        }
    }

    pub fn load_finished(&self, edge: Edge, added: usize, has_more: bool) {
        if self.should_show(VerbosityLevel::Verbose) {
            let tail = if has_more { "" } else { ", edge cooling down" };
            println!(
                "  {} {}",
                "⎿".dimmed(),
                format!("{} edge merged {} new items{}", edge, added, tail).dimmed()
            );
        }
    }

    pub fn trimmed(&self, edge: Edge, count: usize, remaining: usize) {
        if self.should_show(VerbosityLevel::Verbose) {
            println!(
                "{} {}",
                "✂".dimmed(),
                format!("trimmed {} items from {} edge, {} remain", count, edge, remaining)
                    .yellow()
            );
        }
    }

    pub fn scroll_corrected(&self, reason: &str, from: f64, to: f64) {
        if self.should_show(VerbosityLevel::Debug) {
            println!("🐛 DEBUG: {} correction {:.1} → {:.1}", reason, from, to);
        }
    }

    pub fn fetch_failed(&self, edge: Edge, message: &str) {
        if self.should_show(VerbosityLevel::Normal) {
            eprintln!("⚠️  {} edge fetch failed: {}", edge, message);
        }
    }
}

static GLOBAL_CONSOLE: OnceLock<Arc<Console>> = OnceLock::new();

pub fn init_console(verbosity: VerbosityLevel) {
    let _ = GLOBAL_CONSOLE.set(Arc::new(Console::new(verbosity)));
}

/// Returns the process console, falling back to normal verbosity when
/// `init_console` was never called (library embedders, tests).
pub fn console() -> Arc<Console> {
    GLOBAL_CONSOLE
        .get_or_init(|| Arc::new(Console::default()))
        .clone()
}

impl Default for Console {
    fn default() -> Self {
        Self {
            verbosity: VerbosityLevel::Normal,
        }
    }
}
