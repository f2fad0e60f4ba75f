//! Subcommand implementations.

use std::path::Path;

use cfgdoc::{ConfigDocument, ConfigPath, ProtectionKey, SectionHandle};

pub mod get;
pub mod keygen;
pub mod protect;
pub mod show;

type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Resolves `path` to a section of `doc`
fn resolve_section(doc: &ConfigDocument, path: &ConfigPath) -> CommandResult<SectionHandle> {
    match doc.resolve(path)? {
        Some(node) => node
            .as_section()
            .ok_or_else(|| format!("'{path}' is a section group, not a section").into()),
        None => Err(format!("no section at '{path}'").into()),
    }
}

/// Reads a JSON key file
fn read_key(path: &Path) -> CommandResult<ProtectionKey> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read key file {}: {e}", path.display()))?;
    Ok(ProtectionKey::from_json(&json)?)
}
