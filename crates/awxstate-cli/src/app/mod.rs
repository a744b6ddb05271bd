//! cli commands for awxstate.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use awxstate_core::{
    inspect_secret_fields, normalize, normalize_json, normalize_yaml, parse_document,
    parse_secret_fields, sanitize_inputs, InputsMap, SchemaInspection, SecretMode,
};
use awxstate_engine::{
    normalize_documents, refresh_credential_state, wait_for_job, CredentialRecord, EngineConfig,
    JobStatus, JobStatusSource, StateStore,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// top-level cli definition.
#[derive(Parser)]
#[command(name = "awxstate")]
#[command(about = "Stable Terraform state for AWX documents and credentials")]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Json,
    Yaml,
    Auto,
}

/// cli subcommands.
#[derive(Subcommand)]
enum Command {
    /// print the canonical form of a json or yaml document.
    Normalize {
        #[arg(long, value_enum, default_value_t = FormatArg::Auto)]
        format: FormatArg,
        /// input file; stdin when omitted.
        #[arg(short = 'f', long)]
        file: Option<PathBuf>,
    },
    /// list the secret field ids of a credential type inputs schema.
    SecretFields {
        #[arg(short = 'f', long)]
        file: PathBuf,
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// restore masked values in api inputs from local inputs.
    Sanitize {
        #[arg(long)]
        api: PathBuf,
        #[arg(long)]
        local: Option<PathBuf>,
        /// credential type inputs schema; every masked field counts as
        /// secret when omitted.
        #[arg(long)]
        schema: Option<PathBuf>,
    },
    /// refresh a credential's inputs in the state store.
    RefreshCredential {
        #[arg(long)]
        credential: PathBuf,
        #[arg(long)]
        credential_type: Option<PathBuf>,
        #[arg(long)]
        address: String,
        #[arg(long)]
        state: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// normalize the document fields of a resource object.
    NormalizeDocuments {
        #[arg(long)]
        kind: String,
        #[arg(short = 'f', long)]
        file: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// wait until a job status file reports a finished job.
    WaitJob {
        #[arg(long)]
        job_id: u64,
        /// json file holding `{"status": "..."}`, rewritten by whoever
        /// tracks the job.
        #[arg(long)]
        status_file: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Normalize { format, file } => {
            let raw = read_input(file.as_deref())?;
            let text = match format {
                FormatArg::Json => normalize_json(&raw)?,
                FormatArg::Yaml => normalize_yaml(&raw)?,
                FormatArg::Auto => normalize(&raw),
            };
            if text.is_empty() || text.ends_with('\n') {
                print!("{text}");
            } else {
                println!("{text}");
            }
        }
        Command::SecretFields { file, strict } => {
            let schema = read_document(&file)?;
            let secrets = if strict {
                match inspect_secret_fields(Some(&schema)) {
                    SchemaInspection::Parsed { secrets, .. } => secrets,
                    SchemaInspection::Unrecognized(reason) => {
                        return Err(anyhow!("{}: {reason}", file.display()));
                    }
                }
            } else {
                parse_secret_fields(Some(&schema))
            };
            for id in secrets.iter() {
                println!("{id}");
            }
        }
        Command::Sanitize { api, local, schema } => {
            let api = read_inputs(&api)?;
            let local = local.as_deref().map(read_inputs).transpose()?;
            let secrets = match schema.as_deref() {
                Some(path) => Some(parse_secret_fields(Some(&read_document(path)?))),
                None => None,
            };
            let mode = match &secrets {
                Some(secrets) => SecretMode::Strict(secrets),
                None => SecretMode::Lenient,
            };
            let sanitized = sanitize_inputs(&api, local.as_ref(), mode);
            println!("{}", serde_json::to_string_pretty(&sanitized)?);
        }
        Command::RefreshCredential {
            credential,
            credential_type,
            address,
            state,
            config,
        } => {
            let config = EngineConfig::load_optional(config.as_deref())?;
            let record: CredentialRecord = serde_json::from_value(read_document(&credential)?)
                .with_context(|| format!("parse credential: {}", credential.display()))?;
            let credential_type = credential_type
                .as_deref()
                .map(read_document)
                .transpose()?;
            let mut store = load_state(state.as_deref())?;
            let outcome = refresh_credential_state(
                &mut store,
                &address,
                &record,
                credential_type.as_ref(),
                &config,
            );
            store.save()?;
            for field in &outcome.still_masked {
                eprintln!("warning: {field} is still masked");
            }
            println!(
                "refreshed {address}: {} restored, {} masked",
                outcome.restored.len(),
                outcome.still_masked.len()
            );
        }
        Command::NormalizeDocuments { kind, file, config } => {
            let config = EngineConfig::load_optional(config.as_deref())?;
            let object = read_document(&file)?;
            let report = normalize_documents(&kind, &object, &config);
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.is_ok() {
                return Err(anyhow!(
                    "failed to parse document fields: {}",
                    report.failed.join(", ")
                ));
            }
        }
        Command::WaitJob {
            job_id,
            status_file,
            config,
        } => {
            let config = EngineConfig::load_optional(config.as_deref())?;
            let source = StatusFile { path: status_file };
            let status = wait_for_job(&source, job_id, &config.wait).await?;
            println!("job {job_id} {status}");
        }
    }

    Ok(())
}

/// job status read from a json file on every poll.
struct StatusFile {
    path: PathBuf,
}

#[async_trait]
impl JobStatusSource for StatusFile {
    async fn status(&self, _job_id: u64) -> Result<JobStatus> {
        let document = read_document(&self.path)?;
        let status = document
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("missing status in {}", self.path.display()))?;
        Ok(JobStatus::parse(status))
    }
}

/// build the default state store path under the workspace root.
fn state_path(root: &Path) -> PathBuf {
    root.join(".awxstate").join("state.json")
}

/// load state from the given path or the default one.
fn load_state(path: Option<&Path>) -> Result<StateStore> {
    match path {
        Some(path) => StateStore::load(path),
        None => StateStore::load(state_path(Path::new("."))),
    }
}

/// read a file, or stdin when no path is given.
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("read input: {}", path.display()))
        }
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("read stdin")?;
            Ok(raw)
        }
    }
}

/// read a json or yaml file into a json value.
fn read_document(path: &Path) -> Result<Value> {
    let raw = read_input(Some(path))?;
    parse_document(&raw).ok_or_else(|| anyhow!("parse document: {}", path.display()))
}

/// read a json or yaml file holding an inputs mapping.
fn read_inputs(path: &Path) -> Result<InputsMap> {
    match read_document(path)? {
        Value::Object(map) => Ok(map),
        _ => Err(anyhow!("expected a mapping in {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn state_path_is_under_dot_dir() {
        assert_eq!(
            state_path(Path::new("/work")),
            PathBuf::from("/work/.awxstate/state.json")
        );
    }

    #[test]
    fn read_document_accepts_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schema.yaml");
        fs::write(&path, "fields:\n  - id: token\n    secret: true\n").unwrap();
        assert_eq!(
            read_document(&path).unwrap(),
            json!({"fields": [{"id": "token", "secret": true}]})
        );
    }

    #[test]
    fn read_inputs_rejects_lists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inputs.json");
        fs::write(&path, "[1, 2]").unwrap();
        assert!(read_inputs(&path).is_err());
    }

    #[tokio::test]
    async fn status_file_reports_status() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("job.json");
        fs::write(&path, r#"{"status": "running"}"#).unwrap();
        let source = StatusFile { path: path.clone() };
        assert_eq!(source.status(1).await.unwrap(), JobStatus::Running);

        fs::write(&path, r#"{"id": 1}"#).unwrap();
        assert!(source.status(1).await.is_err());
    }
}
