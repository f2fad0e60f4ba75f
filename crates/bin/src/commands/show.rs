//! Show command - lists declared groups and sections with their state.

use cfgdoc::{ConfigDocument, FileStore, section::BuiltinSection};

use super::CommandResult;
use crate::{
    cli::ShowArgs,
    output::{OutputFormat, print_table},
};

/// One listed group or section
struct Row {
    path: String,
    kind: &'static str,
    handler_type: String,
    protected: bool,
}

fn collect_rows(doc: &ConfigDocument) -> CommandResult<Vec<Row>> {
    let mut rows = Vec::new();
    for entry in doc.declarations()? {
        let path = entry.full_path();
        let (kind, protected) = match doc.resolve(&path)? {
            Some(node) => match node.as_section() {
                Some(section) => (doc.section_kind(section)?.name(), doc.is_protected(section)?),
                None => ("group", false),
            },
            None => return Err(format!("declared '{path}' has no content").into()),
        };
        rows.push(Row {
            path: path.to_string(),
            kind,
            handler_type: entry.handler_type,
            protected,
        });
    }

    for builtin in [BuiltinSection::AppSettings, BuiltinSection::ConnectionStrings] {
        if rows.iter().any(|row| row.path == builtin.element_name()) {
            continue;
        }
        if let Some(section) = doc.builtin(builtin)? {
            rows.push(Row {
                path: builtin.element_name().to_string(),
                kind: builtin.kind().name(),
                handler_type: builtin.kind().handler_type().to_string(),
                protected: doc.is_protected(section)?,
            });
        }
    }
    Ok(rows)
}

/// Run the show command
pub fn run(args: &ShowArgs, format: OutputFormat) -> CommandResult {
    let doc = FileStore::new(&args.file).load()?;
    let rows = collect_rows(&doc)?;

    match format {
        OutputFormat::Human => {
            if rows.is_empty() {
                println!("No sections declared.");
                return Ok(());
            }
            let table: Vec<Vec<String>> = rows
                .iter()
                .map(|row| {
                    vec![
                        row.path.clone(),
                        row.kind.to_string(),
                        if row.protected { "protected" } else { "plain" }.to_string(),
                        row.handler_type.clone(),
                    ]
                })
                .collect();
            print_table(&["PATH", "KIND", "STATE", "HANDLER"], &table);
        }
        OutputFormat::Json => {
            let value: Vec<_> = rows
                .iter()
                .map(|row| {
                    serde_json::json!({
                        "path": row.path,
                        "kind": row.kind,
                        "handler_type": row.handler_type,
                        "protected": row.protected,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string(&value)?);
        }
    }
    Ok(())
}
