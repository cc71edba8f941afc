//! Scramble CLI - key generation and key ring management
//!
//! This crate provides a command-line interface for:
//! - Generating root, recovery and session keys
//! - Inspecting key files and verifying addresses
//! - Maintaining a key ring of derived and session keys

pub mod cli;
pub mod config;
pub mod output;

#[cfg(test)]
mod proptests;

pub use cli::Cli;
pub use config::{CliOverrides, Config};
pub use output::{JsonResponse, OutputFormat, OutputFormatter};

use scramble_keys::KeyError;

/// Exit codes for CLI operations
///
/// - 0: Success
/// - 1: General error
/// - 2: Already exists - refused to overwrite a key file
/// - 3: Not found - key or ring file, or ring entry, missing
/// - 4: Invalid input - bad arguments, seed or address
/// - 5: Expired - the key's expiry has passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully (exit code 0)
    Success = 0,
    /// General error (exit code 1)
    GeneralError = 1,
    /// Target file already exists (exit code 2)
    AlreadyExists = 2,
    /// File or ring entry not found (exit code 3)
    NotFound = 3,
    /// Invalid input provided (exit code 4)
    InvalidInput = 4,
    /// Key has expired (exit code 5)
    Expired = 5,
}

impl From<&KeyError> for ExitCode {
    fn from(err: &KeyError) -> Self {
        match err {
            KeyError::AlreadyExists { .. } => ExitCode::AlreadyExists,
            KeyError::NotFound { .. } => ExitCode::NotFound,
            KeyError::InvalidSeedLength { .. }
            | KeyError::InvalidKeyLength { .. }
            | KeyError::InvalidAddress(_) => ExitCode::InvalidInput,
            _ => ExitCode::GeneralError,
        }
    }
}

impl ExitCode {
    /// Convert to process exit code
    pub fn to_exit_code(self) -> std::process::ExitCode {
        std::process::ExitCode::from(self as u8)
    }

    /// Pick an exit code for an error, looking through anyhow context
    pub fn for_error(err: &anyhow::Error) -> Self {
        err.chain()
            .find_map(|cause| cause.downcast_ref::<KeyError>())
            .map(ExitCode::from)
            .unwrap_or(ExitCode::GeneralError)
    }

    /// Get the exit code name as a string
    pub fn name(&self) -> &'static str {
        match self {
            ExitCode::Success => "SUCCESS",
            ExitCode::GeneralError => "GENERAL_ERROR",
            ExitCode::AlreadyExists => "ALREADY_EXISTS",
            ExitCode::NotFound => "NOT_FOUND",
            ExitCode::InvalidInput => "INVALID_INPUT",
            ExitCode::Expired => "EXPIRED",
        }
    }

    /// Get a human-readable description of the exit code
    pub fn description(&self) -> &'static str {
        match self {
            ExitCode::Success => "Operation completed successfully",
            ExitCode::GeneralError => "An unspecified error occurred",
            ExitCode::AlreadyExists => "Refused to overwrite an existing file",
            ExitCode::NotFound => "Key file, ring file or ring entry not found",
            ExitCode::InvalidInput => "Invalid arguments or data provided",
            ExitCode::Expired => "The key has expired",
        }
    }
}

#[cfg(test)]
mod exit_code_tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success as i32, 0);
        assert_eq!(ExitCode::GeneralError as i32, 1);
        assert_eq!(ExitCode::AlreadyExists as i32, 2);
        assert_eq!(ExitCode::NotFound as i32, 3);
        assert_eq!(ExitCode::InvalidInput as i32, 4);
        assert_eq!(ExitCode::Expired as i32, 5);
    }

    #[test]
    fn test_exit_code_names() {
        assert_eq!(ExitCode::Success.name(), "SUCCESS");
        assert_eq!(ExitCode::GeneralError.name(), "GENERAL_ERROR");
        assert_eq!(ExitCode::AlreadyExists.name(), "ALREADY_EXISTS");
        assert_eq!(ExitCode::NotFound.name(), "NOT_FOUND");
        assert_eq!(ExitCode::InvalidInput.name(), "INVALID_INPUT");
        assert_eq!(ExitCode::Expired.name(), "EXPIRED");
    }

    #[test]
    fn test_exit_code_descriptions() {
        for code in [
            ExitCode::Success,
            ExitCode::GeneralError,
            ExitCode::AlreadyExists,
            ExitCode::NotFound,
            ExitCode::InvalidInput,
            ExitCode::Expired,
        ] {
            assert!(!code.description().is_empty());
        }
    }

    #[test]
    fn test_exit_code_from_key_error() {
        let exists = KeyError::AlreadyExists {
            path: PathBuf::from("k"),
        };
        let missing = KeyError::NotFound {
            path: PathBuf::from("k"),
        };
        let short = KeyError::InvalidSeedLength { min: 32, got: 3 };

        assert_eq!(ExitCode::from(&exists), ExitCode::AlreadyExists);
        assert_eq!(ExitCode::from(&missing), ExitCode::NotFound);
        assert_eq!(ExitCode::from(&short), ExitCode::InvalidInput);
        assert_eq!(ExitCode::from(&KeyError::InvalidSignature), ExitCode::GeneralError);
    }

    #[test]
    fn test_exit_code_for_wrapped_error() {
        let err = anyhow::Error::new(KeyError::AlreadyExists {
            path: PathBuf::from("k"),
        })
        .context("writing key file");
        assert_eq!(ExitCode::for_error(&err), ExitCode::AlreadyExists);

        let other = anyhow::anyhow!("something else");
        assert_eq!(ExitCode::for_error(&other), ExitCode::GeneralError);
    }

    #[test]
    fn test_exit_code_to_process_exit_code() {
        let _ = ExitCode::Success.to_exit_code();
        let _ = ExitCode::Expired.to_exit_code();
    }
}
