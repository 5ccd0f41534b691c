//! Output formatting for CLI commands

use serde::Serialize;

use crate::domain::Vec3;
use crate::store;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl From<store::OutputFormat> for OutputFormat {
    fn from(format: store::OutputFormat) -> Self {
        match format {
            store::OutputFormat::Text => OutputFormat::Text,
            store::OutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Prints structured data
    pub fn data<T: Serialize>(&self, data: &T) {
        let rendered = match self.format {
            // Callers normally render text themselves; this is the fallback
            OutputFormat::Text => serde_json::to_string_pretty(data),
            OutputFormat::Json => serde_json::to_string(data),
        };
        if let Ok(json) = rendered {
            println!("{}", json);
        }
    }

    /// Prints a blank line (text only)
    pub fn blank(&self) {
        if self.format == OutputFormat::Text {
            println!();
        }
    }

    /// Returns true if using JSON format
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

/// Formats a pose triple with fixed precision
pub fn format_vec3(v: &Vec3) -> String {
    format!("({:.3}, {:.3}, {:.3})", v[0], v[1], v[2])
}
