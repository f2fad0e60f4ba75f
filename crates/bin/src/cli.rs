//! CLI argument definitions for the cfgdoc binary.

use std::path::PathBuf;

use cfgdoc::ConfigPath;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// Inspect and protect .NET-style configuration files
#[derive(Parser, Debug)]
#[command(name = "cfgdoc")]
#[command(about = "cfgdoc: inspect and protect application configuration files")]
#[command(version)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "human", env = "CFGDOC_FORMAT")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a protection key file
    Keygen(KeygenArgs),
    /// List the declared groups and sections of a configuration file
    Show(ShowArgs),
    /// Print the effective value of a key in a property section
    Get(GetArgs),
    /// Encrypt a section in place
    Protect(ProtectArgs),
    /// Decrypt a protected section in place
    Unprotect(ProtectArgs),
}

/// Arguments for the keygen command
#[derive(clap::Args, Debug)]
pub struct KeygenArgs {
    /// Where to write the key file holding both halves
    #[arg(short, long)]
    pub out: PathBuf,

    /// Also write an encrypt-only key file here
    #[arg(long)]
    pub public_out: Option<PathBuf>,
}

/// Arguments for the show command
#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Configuration file to read
    pub file: PathBuf,
}

/// Arguments for the get command
#[derive(clap::Args, Debug)]
pub struct GetArgs {
    /// Configuration file to read
    pub file: PathBuf,

    /// Section path, with `/` between group names (e.g. `system.web/pages`)
    pub section: ConfigPath,

    /// Key to look up
    pub key: String,
}

/// Arguments for the protect and unprotect commands
#[derive(clap::Args, Debug)]
pub struct ProtectArgs {
    /// Configuration file to modify
    pub file: PathBuf,

    /// Section path, with `/` between group names
    pub section: ConfigPath,

    /// Key file to use; protecting only needs the public half
    #[arg(short, long, env = "CFGDOC_KEY_FILE")]
    pub key: PathBuf,
}
