//! Get command - prints the effective value of one key.

use cfgdoc::FileStore;

use super::{CommandResult, resolve_section};
use crate::{cli::GetArgs, output::OutputFormat};

/// Run the get command
pub fn run(args: &GetArgs, format: OutputFormat) -> CommandResult {
    let doc = FileStore::new(&args.file).load()?;
    let section = resolve_section(&doc, &args.section)?;
    let value = doc.properties(section)?.get_value(&args.key)?;

    match format {
        OutputFormat::Human => println!("{}", value.as_deref().unwrap_or_default()),
        OutputFormat::Json => {
            let value = serde_json::json!({
                "section": args.section.to_string(),
                "key": args.key,
                "value": value,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }
    Ok(())
}
