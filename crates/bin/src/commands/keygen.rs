//! Key generation command - writes a new protection key file.

use std::{fs, io::Write, path::Path};

use cfgdoc::ProtectionKey;
use tracing::info;

use super::CommandResult;
use crate::{cli::KeygenArgs, output::OutputFormat};

/// Writes `contents` to a new file readable only by the owner
fn write_private(path: &Path, contents: &str) -> CommandResult {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .map_err(|e| format!("failed to create {}: {e}", path.display()))?;
    file.write_all(contents.as_bytes())?;
    Ok(())
}

/// Run the keygen command
pub fn run(args: &KeygenArgs, format: OutputFormat) -> CommandResult {
    let key = ProtectionKey::generate();
    write_private(&args.out, &key.to_json()?)?;
    info!(path = %args.out.display(), "wrote key file");

    if let Some(public_out) = &args.public_out {
        fs::write(public_out, key.public_only().to_json()?)?;
        info!(path = %public_out.display(), "wrote public key file");
    }

    let public = key.public_base64();
    match format {
        OutputFormat::Human => {
            println!("Key file:    {}", args.out.display());
            if let Some(public_out) = &args.public_out {
                println!("Public file: {}", public_out.display());
            }
            println!("Public key:  {public}");
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "key_file": args.out.display().to_string(),
                "public_file": args.public_out.as_ref().map(|p| p.display().to_string()),
                "public_key": public,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }
    Ok(())
}
