use std::io::Write;
use std::path::Path;

use crate::config::CompilerConfig;
use crate::errors::QueryError;
use crate::query::{Query, QueryDescriptor};
use crate::schema::SchemaRegistry;
use crate::utils::json::document_to_json;

use super::command::Command;
use super::util::{parse_project_arg, split_filter_arg};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputMode {
    Human,
    Plain,
    Json,
}

pub fn run(cmd: Command) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    run_with_format(cmd, OutputMode::Human, &mut lock)
}

/// The compiler config for a command: the `--config` file over the
/// environment, or the environment alone.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<CompilerConfig, QueryError> {
    match path {
        Some(p) => CompilerConfig::load(p),
        None => Ok(CompilerConfig::from_env()),
    }
}

fn compile(cmd: Command) -> Result<QueryDescriptor, Box<dyn std::error::Error>> {
    let Command::Compile { schema, entity, filters, order, project, no_validation, config } = cmd else {
        return Err("not a compile command".into());
    };
    let mut cfg = load_config(config.as_deref())?;
    if no_validation {
        cfg.validation = false;
    }
    let registry = SchemaRegistry::load(&schema)?.into_shared();
    let mut q = Query::with_config(registry, &entity, cfg)?;
    for f in &filters {
        let (cond, value) = split_filter_arg(f)
            .ok_or_else(|| QueryError::MalformedPredicate(format!("bad --filter '{f}'")))?;
        q.filter(&cond, value)?;
    }
    if let Some(spec) = order.as_deref() {
        q.order(spec)?;
    }
    for p in &project {
        let (field, include) =
            parse_project_arg(p).ok_or_else(|| QueryError::MalformedPredicate(format!("bad --project '{p}'")))?;
        q.project(&field, include)?;
    }
    Ok(q.freeze()?)
}

pub fn run_with_format(
    cmd: Command,
    mode: OutputMode,
    out: &mut dyn Write,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Command::CheckSchema { schema } => {
            let registry = SchemaRegistry::load(&schema)?;
            let names = registry.type_names();
            match mode {
                OutputMode::Json => {
                    let json = serde_json::json!({"action": "check-schema", "types": names});
                    writeln!(out, "{json}")?;
                }
                OutputMode::Plain => writeln!(out, "{}", names.join(" "))?,
                OutputMode::Human => writeln!(out, "ok types={}", names.join(","))?,
            }
            Ok(())
        }
        cmd @ Command::Compile { .. } => {
            let d = compile(cmd)?;
            let json = serde_json::json!({
                "entity": d.entity(),
                "filter": document_to_json(d.filter()),
                "sort": document_to_json(d.sort()),
                "projection": document_to_json(d.projection()),
                "options": document_to_json(&d.options().to_document()),
            });
            match mode {
                OutputMode::Json => writeln!(out, "{json}")?,
                OutputMode::Plain => writeln!(
                    out,
                    "filter={} sort={} projection={}",
                    json["filter"], json["sort"], json["projection"]
                )?,
                OutputMode::Human => writeln!(out, "{}", serde_json::to_string_pretty(&json)?)?,
            }
            Ok(())
        }
    }
}
