//! Output formatting for CLI results
//!
//! Supports three output formats:
//! - Table: Human-readable tables (default)
//! - JSON: Structured JSON for scripting and automation
//! - Quiet: Minimal output, exit codes only
//!
//! Private key material is never printed in any format.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;
use scramble_keys::{Key, Ring};

use crate::ExitCode;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for scripting
    Json,
    /// Minimal output - exit codes only
    Quiet,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "quiet" => Ok(Self::Quiet),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::Quiet => write!(f, "quiet"),
        }
    }
}

/// Standard JSON response wrapper for consistent schema
#[derive(Serialize)]
pub struct JsonResponse<T: Serialize> {
    /// Whether the operation was successful
    pub success: bool,
    /// The response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// RFC 3339 timestamp
    pub timestamp: String,
    /// Command that was executed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl<T: Serialize> JsonResponse<T> {
    /// Create a successful response with command context
    pub fn success_with_command(data: T, command: &str) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now().to_rfc3339(),
            command: Some(command.to_string()),
        }
    }
}

impl JsonResponse<()> {
    /// Create an error response
    pub fn error(message: &str) -> JsonResponse<()> {
        JsonResponse {
            success: false,
            data: None,
            error: Some(message.to_string()),
            timestamp: Utc::now().to_rfc3339(),
            command: None,
        }
    }
}

/// Formats output for different modes
pub struct OutputFormatter {
    format: OutputFormat,
    verbose: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn is_quiet(&self) -> bool {
        self.format == OutputFormat::Quiet
    }

    /// Format a single key's public details
    pub fn format_key(&self, key: &Key, command: &str) -> String {
        match self.format {
            OutputFormat::Table => self.key_table(key),
            OutputFormat::Json => self.to_json_response(&KeyOutput::from(key), command),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format the contents of a ring
    pub fn format_ring(&self, ring: &Ring, command: &str) -> String {
        match self.format {
            OutputFormat::Table => self.ring_table(ring),
            OutputFormat::Json => self.to_json_response(&RingOutput::from(ring), command),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format an address verification result
    pub fn format_verify(&self, result: &VerifyOutput) -> String {
        match self.format {
            OutputFormat::Table => {
                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.set_header(vec!["Property", "Value"]);
                table.add_row(vec!["Address", result.address.as_str()]);
                table.add_row(vec!["Public Key", result.public_key.as_str()]);
                table.add_row(vec!["Valid", if result.valid { "yes" } else { "no" }]);
                table.to_string()
            }
            OutputFormat::Json => self.to_json_response(result, "verify"),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format error with exit code context
    pub fn format_error_with_code(&self, error: &dyn std::fmt::Display, code: ExitCode) -> String {
        match self.format {
            OutputFormat::Table => format!("Error: {error}"),
            OutputFormat::Json => {
                let output = ErrorOutput {
                    success: false,
                    error: error.to_string(),
                    exit_code: code as i32,
                    exit_code_name: code.name(),
                    exit_code_description: code.description(),
                    timestamp: Utc::now().to_rfc3339(),
                };
                self.to_json(&output)
            }
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Progress message (only shown in verbose table mode)
    pub fn progress(&self, message: &str) {
        if self.verbose && self.format == OutputFormat::Table {
            eprintln!("... {message}");
        }
    }

    pub fn success(&self, message: &str) {
        if self.format == OutputFormat::Table {
            eprintln!("✓ {message}");
        }
    }

    pub fn warning(&self, message: &str) {
        if self.format != OutputFormat::Quiet {
            eprintln!("⚠ {message}");
        }
    }

    fn to_json<T: Serialize>(&self, value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }

    fn to_json_response<T: Serialize>(&self, value: &T, command: &str) -> String {
        let response = JsonResponse::success_with_command(value, command);
        serde_json::to_string_pretty(&response).unwrap_or_else(|e| {
            self.to_json(&JsonResponse::<()>::error(&format!("Serialization error: {e}")))
        })
    }

    fn key_table(&self, key: &Key) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Property", "Value"]);
        table.add_row(vec!["Address", key.address()]);
        table.add_row(vec!["Onion", &key.display_address()]);
        table.add_row(vec!["Kind", &key.kind().to_string()]);
        table.add_row(vec!["Public Key", &hex::encode(key.public_key())]);
        table.add_row(vec!["Expires", &format_expiry(key)]);
        table.add_row(vec!["Parent", key.parent_address().unwrap_or("-")]);
        table.to_string()
    }

    fn ring_table(&self, ring: &Ring) -> String {
        let mut out = String::new();
        match ring.root_key() {
            Some(root) => out.push_str(&format!("Root: {}\n", root.address())),
            None => out.push_str("Root: -\n"),
        }

        if ring.is_empty() {
            out.push_str("No keys in ring.");
            return out;
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Address", "Kind", "Expires", "Parent"]);
        for key in ring.iter() {
            table.add_row(vec![
                key.address(),
                &key.kind().to_string(),
                &format_expiry(key),
                key.parent_address().map(short_address).unwrap_or("-"),
            ]);
        }
        out.push_str(&table.to_string());
        out
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn format_expiry(key: &Key) -> String {
    match key.expires() {
        None => "never".to_string(),
        Some(at) if key.is_expired() => format!("{} (EXPIRED)", format_time(at)),
        Some(at) => format_time(at),
    }
}

fn short_address(address: &str) -> &str {
    address.get(..16).unwrap_or(address)
}

// JSON output structures

#[derive(Serialize)]
struct KeyOutput {
    address: String,
    onion: String,
    kind: String,
    public_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires: Option<String>,
    expired: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_address: Option<String>,
}

impl From<&Key> for KeyOutput {
    fn from(key: &Key) -> Self {
        Self {
            address: key.address().to_string(),
            onion: key.display_address(),
            kind: key.kind().to_string(),
            public_key: hex::encode(key.public_key()),
            expires: key
                .expires()
                .map(|at| at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            expired: key.is_expired(),
            parent_address: key.parent_address().map(str::to_string),
        }
    }
}

#[derive(Serialize)]
struct RingOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    root: Option<KeyOutput>,
    keys: Vec<KeyOutput>,
    count: usize,
}

impl From<&Ring> for RingOutput {
    fn from(ring: &Ring) -> Self {
        Self {
            root: ring.root_key().map(KeyOutput::from),
            keys: ring.iter().map(KeyOutput::from).collect(),
            count: ring.len(),
        }
    }
}

/// Result of `scramble verify`
#[derive(Debug, Serialize)]
pub struct VerifyOutput {
    pub address: String,
    pub public_key: String,
    pub valid: bool,
}

#[derive(Serialize)]
struct ErrorOutput {
    success: bool,
    error: String,
    exit_code: i32,
    exit_code_name: &'static str,
    exit_code_description: &'static str,
    timestamp: String,
}
