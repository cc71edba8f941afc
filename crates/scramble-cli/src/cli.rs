//! CLI command definitions and argument parsing

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use clap::{Args, Parser, Subcommand};
use scramble_keys::{
    derive_address, parse_address, verify_address, Key, KeyDocument, KeyError, Ring,
};

use crate::config::{Config, ConfigError};
use crate::output::{JsonResponse, OutputFormat, OutputFormatter, VerifyOutput};
use crate::ExitCode;

/// Scramble - self-certifying key and address tool
#[derive(Parser, Debug)]
#[command(name = "scramble")]
#[command(version, about = "Generate Ed25519 keys with onion-style addresses")]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: table, json, quiet
    #[arg(long, global = true)]
    pub output: Option<OutputFormat>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Config file path
    #[arg(long, global = true, env = "SCRAMBLE_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Execute the CLI command with a pre-loaded configuration
    pub fn execute_with_config(self, config: &Config) -> anyhow::Result<ExitCode> {
        let format = match self.output {
            Some(format) => format,
            None => config
                .output
                .format
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?,
        };
        let formatter = OutputFormatter::new(format, self.verbose || config.output.verbose);

        match self.command {
            Commands::Generate(args) => args.execute(&formatter, config),
            Commands::Session(args) => args.execute(&formatter, config),
            Commands::Show(args) => args.execute(&formatter, config),
            Commands::Verify(args) => args.execute(&formatter),
            Commands::Ring(args) => args.execute(&formatter, config),
            Commands::Config(args) => args.execute(&formatter, config, self.config.as_deref()),
        }
    }
}

/// Exit code for a command line that failed to parse.
///
/// Help and version requests succeed; every other parse failure is
/// invalid input.
pub fn usage_exit_code(err: &clap::Error) -> ExitCode {
    use clap::error::ErrorKind;

    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::Success,
        _ => ExitCode::InvalidInput,
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a root or recovery key and write it to a new file
    Generate(GenerateArgs),
    /// Generate a session key with an expiry
    Session(SessionArgs),
    /// Show the public details of a key file
    Show(ShowArgs),
    /// Check an address against its checksum or a public key
    Verify(VerifyArgs),
    /// Manage a key ring
    Ring(RingArgs),
    /// Inspect or create the configuration file
    Config(ConfigArgs),
}

/// Arguments for `scramble generate`
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Derive the key from a hex seed (at least 32 bytes) instead of randomness
    #[arg(long, conflicts_with = "recovery")]
    pub seed_hex: Option<String>,

    /// Generate a recovery key instead of a root key
    #[arg(long)]
    pub recovery: bool,

    /// Key file to write
    #[arg(long, short = 'f', env = "SCRAMBLE_KEY_FILE")]
    pub file: Option<PathBuf>,

    /// Replace an existing key file
    #[arg(long)]
    pub force: bool,
}

impl GenerateArgs {
    pub fn execute(self, formatter: &OutputFormatter, config: &Config) -> anyhow::Result<ExitCode> {
        let key = match self.seed_hex {
            Some(ref seed_hex) => {
                let seed = match hex::decode(seed_hex.trim()) {
                    Ok(seed) => seed,
                    Err(e) => return Ok(invalid_input(formatter, &format!("invalid --seed-hex: {e}"))),
                };
                formatter.progress("Deriving key from seed...");
                Key::from_seed(&seed)?
            }
            None if self.recovery => Key::generate_recovery(),
            None => Key::generate(),
        };

        let path = self.file.as_deref().unwrap_or(config.keys.key_path.as_path());
        store(&key, path, &config.keys.indent, self.force)?;
        formatter.success(&format!("Wrote {} key to {}", key.kind(), path.display()));
        println!("{}", formatter.format_key(&key, "generate"));
        Ok(ExitCode::Success)
    }
}

/// Arguments for `scramble session`
#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Lifetime in seconds (defaults to keys.session_ttl_seconds)
    #[arg(long, conflicts_with = "expires")]
    pub ttl: Option<u64>,

    /// Absolute expiry as an RFC 3339 timestamp
    #[arg(long)]
    pub expires: Option<String>,

    /// Key file to write
    #[arg(long, short = 'f', env = "SCRAMBLE_KEY_FILE")]
    pub file: Option<PathBuf>,

    /// Replace an existing key file
    #[arg(long)]
    pub force: bool,
}

impl SessionArgs {
    pub fn execute(self, formatter: &OutputFormatter, config: &Config) -> anyhow::Result<ExitCode> {
        let expires_at = match self.expires {
            Some(ref text) => match DateTime::parse_from_rfc3339(text) {
                Ok(at) => at.with_timezone(&Utc),
                Err(e) => return Ok(invalid_input(formatter, &format!("invalid --expires: {e}"))),
            },
            None => {
                let ttl = self.ttl.unwrap_or(config.keys.session_ttl_seconds);
                match expiry_after(Utc::now(), ttl) {
                    Some(at) => at,
                    None => return Ok(invalid_input(formatter, &format!("invalid --ttl: {ttl}"))),
                }
            }
        };

        let key = Key::generate_session(expires_at);
        if key.is_expired() {
            formatter.warning("session key is already expired");
        }

        let path = self.file.as_deref().unwrap_or(config.keys.key_path.as_path());
        store(&key, path, &config.keys.indent, self.force)?;
        formatter.success(&format!("Wrote session key to {}", path.display()));
        println!("{}", formatter.format_key(&key, "session"));
        Ok(ExitCode::Success)
    }
}

/// Arguments for `scramble show`
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Key file to read
    #[arg(long, short = 'f', env = "SCRAMBLE_KEY_FILE")]
    pub file: Option<PathBuf>,
}

impl ShowArgs {
    pub fn execute(self, formatter: &OutputFormatter, config: &Config) -> anyhow::Result<ExitCode> {
        let path = self.file.as_deref().unwrap_or(config.keys.key_path.as_path());
        formatter.progress(&format!("Loading {}...", path.display()));
        let key = Key::read_file(path)
            .with_context(|| format!("reading key file {}", path.display()))?;

        println!("{}", formatter.format_key(&key, "show"));
        Ok(expiry_status(&key))
    }
}

/// Arguments for `scramble verify`
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Address to check, with or without the `.onion` suffix
    pub address: String,

    /// Expected Ed25519 public key as 64 hex characters
    #[arg(long)]
    pub public_key_hex: Option<String>,
}

impl VerifyArgs {
    pub fn execute(self, formatter: &OutputFormatter) -> anyhow::Result<ExitCode> {
        let result = match self.public_key_hex {
            Some(ref public_key_hex) => {
                let public_key: [u8; 32] = match hex::decode(public_key_hex.trim())
                    .ok()
                    .and_then(|bytes| bytes.try_into().ok())
                {
                    Some(public_key) => public_key,
                    None => {
                        return Ok(invalid_input(
                            formatter,
                            "--public-key-hex must be 32 bytes of hex",
                        ))
                    }
                };
                VerifyOutput {
                    address: self.address.clone(),
                    public_key: hex::encode(public_key),
                    valid: verify_address(&self.address, &public_key),
                }
            }
            None => match parse_address(&self.address) {
                Ok(public_key) => VerifyOutput {
                    address: self.address.clone(),
                    public_key: hex::encode(public_key),
                    valid: true,
                },
                Err(e) => {
                    tracing::debug!(error = %e, "address rejected");
                    VerifyOutput {
                        address: self.address.clone(),
                        public_key: "-".to_string(),
                        valid: false,
                    }
                }
            },
        };

        println!("{}", formatter.format_verify(&result));
        if result.valid {
            Ok(ExitCode::Success)
        } else {
            Ok(ExitCode::InvalidInput)
        }
    }
}

/// Arguments for `scramble ring`
#[derive(Args, Debug)]
pub struct RingArgs {
    /// Ring action
    #[command(subcommand)]
    pub action: RingAction,

    /// Ring file path
    #[arg(long, global = true, env = "SCRAMBLE_RING_FILE")]
    pub ring: Option<PathBuf>,
}

/// Ring subcommands
#[derive(Subcommand, Debug)]
pub enum RingAction {
    /// Create a ring file with a fresh root key
    Init {
        /// Replace an existing ring file
        #[arg(long)]
        force: bool,
    },
    /// List the root and all keys in the ring
    List,
    /// Show one key from the ring
    Show {
        /// Address of the key
        address: String,
    },
    /// Derive a recovery key and add it to the ring
    Derive {
        /// Parent key address (defaults to the root key)
        #[arg(long)]
        from: Option<String>,
    },
    /// Generate a session key and add it to the ring
    Session {
        /// Lifetime in seconds (defaults to keys.session_ttl_seconds)
        #[arg(long)]
        ttl: Option<u64>,
    },
    /// Remove a key from the ring
    Remove {
        /// Address of the key
        address: String,
    },
}

impl RingArgs {
    pub fn execute(self, formatter: &OutputFormatter, config: &Config) -> anyhow::Result<ExitCode> {
        let path = self.ring.as_deref().unwrap_or(config.keys.ring_path.as_path());
        let indent = config.keys.indent.as_str();

        match self.action {
            RingAction::Init { force } => {
                let mut ring = Ring::new();
                ring.set_root(Key::generate());
                store(&ring, path, indent, force)?;
                formatter.success(&format!("Created ring {}", path.display()));
                println!("{}", formatter.format_ring(&ring, "ring init"));
                Ok(ExitCode::Success)
            }
            RingAction::List => {
                let ring = load_ring(path)?;
                println!("{}", formatter.format_ring(&ring, "ring list"));
                Ok(ExitCode::Success)
            }
            RingAction::Show { address } => {
                let ring = load_ring(path)?;
                let Some(address) = canonical_address(formatter, &address) else {
                    return Ok(ExitCode::InvalidInput);
                };
                match find_in_ring(&ring, &address) {
                    Some(key) => {
                        println!("{}", formatter.format_key(key, "ring show"));
                        Ok(expiry_status(key))
                    }
                    None => Ok(not_in_ring(formatter, &address)),
                }
            }
            RingAction::Derive { from } => {
                let mut ring = load_ring(path)?;
                let parent = match from {
                    Some(from) => {
                        let Some(address) = canonical_address(formatter, &from) else {
                            return Ok(ExitCode::InvalidInput);
                        };
                        match find_in_ring(&ring, &address) {
                            Some(parent) => parent.clone(),
                            None => return Ok(not_in_ring(formatter, &address)),
                        }
                    }
                    None => match ring.root_key() {
                        Some(root) => root.clone(),
                        None => return Ok(invalid_input(formatter, "ring has no root key")),
                    },
                };

                let child = parent.derive_child();
                ring.insert(child.clone());
                ring.overwrite_file(path, indent)?;
                formatter.success(&format!("Derived {} from {}", child.address(), parent.address()));
                println!("{}", formatter.format_key(&child, "ring derive"));
                Ok(ExitCode::Success)
            }
            RingAction::Session { ttl } => {
                let mut ring = load_ring(path)?;
                let ttl = ttl.unwrap_or(config.keys.session_ttl_seconds);
                let Some(expires_at) = expiry_after(Utc::now(), ttl) else {
                    return Ok(invalid_input(formatter, &format!("invalid --ttl: {ttl}")));
                };

                let key = Key::generate_session(expires_at);
                ring.insert(key.clone());
                ring.overwrite_file(path, indent)?;
                formatter.success(&format!("Added session key {}", key.address()));
                println!("{}", formatter.format_key(&key, "ring session"));
                Ok(ExitCode::Success)
            }
            RingAction::Remove { address } => {
                let mut ring = load_ring(path)?;
                let Some(address) = canonical_address(formatter, &address) else {
                    return Ok(ExitCode::InvalidInput);
                };
                if !ring.remove(&address) {
                    return Ok(not_in_ring(formatter, &address));
                }
                ring.overwrite_file(path, indent)?;
                formatter.success(&format!("Removed {address}"));
                Ok(ExitCode::Success)
            }
        }
    }
}

/// Arguments for `scramble config`
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Config action
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented sample config file
    Init {
        /// Replace an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file location
    Path,
}

impl ConfigArgs {
    pub fn execute(
        self,
        formatter: &OutputFormatter,
        config: &Config,
        custom_path: Option<&Path>,
    ) -> anyhow::Result<ExitCode> {
        let path = custom_path.map(Path::to_path_buf).or_else(Config::default_path);

        match self.action {
            ConfigAction::Init { force } => {
                let Some(path) = path else {
                    return Ok(report(
                        formatter,
                        "no config directory available; pass --config",
                        ExitCode::GeneralError,
                    ));
                };
                match Config::write_sample(&path, force) {
                    Ok(()) => {
                        formatter.success(&format!("Wrote sample config to {}", path.display()));
                        Ok(ExitCode::Success)
                    }
                    Err(ConfigError::AlreadyExists(path)) => Ok(report(
                        formatter,
                        &format!("config file already exists: {}", path.display()),
                        ExitCode::AlreadyExists,
                    )),
                    Err(e) => Err(e.into()),
                }
            }
            ConfigAction::Show => {
                match formatter.format() {
                    OutputFormat::Table => print!("{}", config.to_toml()?),
                    OutputFormat::Json => println!(
                        "{}",
                        serde_json::to_string_pretty(&JsonResponse::success_with_command(
                            config,
                            "config show"
                        ))?
                    ),
                    OutputFormat::Quiet => {}
                }
                Ok(ExitCode::Success)
            }
            ConfigAction::Path => {
                match path {
                    Some(path) if !formatter.is_quiet() => println!("{}", path.display()),
                    Some(_) => {}
                    None => return Ok(report(formatter, "no config directory available", ExitCode::NotFound)),
                }
                Ok(ExitCode::Success)
            }
        }
    }
}

/// Write a document, replacing an existing file only when `force` is set.
fn store<D: KeyDocument>(doc: &D, path: &Path, indent: &str, force: bool) -> Result<(), KeyError> {
    if force {
        doc.overwrite_file(path, indent)
    } else {
        doc.write_file(path, indent)
    }
}

fn load_ring(path: &Path) -> anyhow::Result<Ring> {
    Ring::read_file(path).with_context(|| format!("reading ring file {}", path.display()))
}

/// Look up `address` among the ring's keys, falling back to the root.
fn find_in_ring<'a>(ring: &'a Ring, address: &str) -> Option<&'a Key> {
    ring.lookup(address)
        .or_else(|| ring.root_key().filter(|root| root.address() == address))
}

/// Validate an address argument and normalize it to the stored form.
fn canonical_address(formatter: &OutputFormatter, address: &str) -> Option<String> {
    match parse_address(address) {
        Ok(public_key) => Some(derive_address(&public_key)),
        Err(e) => {
            invalid_input(formatter, &e.to_string());
            None
        }
    }
}

/// `now + ttl` seconds, or `None` for a zero or out-of-range lifetime.
fn expiry_after(now: DateTime<Utc>, ttl: u64) -> Option<DateTime<Utc>> {
    if ttl == 0 {
        return None;
    }
    let seconds = i64::try_from(ttl).ok()?;
    now.checked_add_signed(Duration::try_seconds(seconds)?)
}

fn expiry_status(key: &Key) -> ExitCode {
    if key.is_expired() {
        ExitCode::Expired
    } else {
        ExitCode::Success
    }
}

fn invalid_input(formatter: &OutputFormatter, message: &str) -> ExitCode {
    report(formatter, message, ExitCode::InvalidInput)
}

fn not_in_ring(formatter: &OutputFormatter, address: &str) -> ExitCode {
    report(formatter, &format!("no key {address} in ring"), ExitCode::NotFound)
}

fn report(formatter: &OutputFormatter, message: &str, code: ExitCode) -> ExitCode {
    match formatter.format() {
        OutputFormat::Json => println!("{}", formatter.format_error_with_code(&message, code)),
        OutputFormat::Table => eprintln!("{}", formatter.format_error_with_code(&message, code)),
        OutputFormat::Quiet => {}
    }
    code
}
