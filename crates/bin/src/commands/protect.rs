//! Protect and unprotect commands - encrypt or decrypt a section in place.

use cfgdoc::FileStore;
use tracing::info;

use super::{CommandResult, read_key, resolve_section};
use crate::{cli::ProtectArgs, output::OutputFormat};

/// Run the protect command, or the unprotect command when `decrypt` is set
pub fn run(args: &ProtectArgs, decrypt: bool, format: OutputFormat) -> CommandResult {
    let key = read_key(&args.key)?;
    let mut doc = FileStore::new(&args.file).open()?;
    let section = resolve_section(&doc, &args.section)?;

    if decrypt {
        doc.decrypt(section, &key)?;
    } else {
        doc.encrypt(section, &key)?;
    }
    doc.save()?;
    let state = doc.protection_state(section)?.as_str();
    info!(file = %args.file.display(), section = %args.section, state, "updated configuration file");

    match format {
        OutputFormat::Human => println!("{}: {state}", args.section),
        OutputFormat::Json => {
            let value = serde_json::json!({
                "section": args.section.to_string(),
                "state": state,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }
    Ok(())
}
