use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use hub_client::{Credentials, ListOptions};
use hub_common::config::{DEFAULT_API_ROOT, DEFAULT_AUTH_URL, DEFAULT_WEB_ROOT};
use hub_common::HubConfig;
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(name = "hub")]
#[command(about = "HUB CLI for models, datasets and projects", long_about = None)]
pub struct Args {
    /// API root URL
    #[arg(long, env = "ULTRALYTICS_HUB_API", default_value = DEFAULT_API_ROOT)]
    pub api_root: String,

    /// Web app root URL (sent as origin on sign-in)
    #[arg(long, env = "ULTRALYTICS_HUB_WEB", default_value = DEFAULT_WEB_ROOT)]
    pub web_root: String,

    /// Email/password sign-in URL
    #[arg(long, env = "ULTRALYTICS_FIREBASE_AUTH_URL", default_value = DEFAULT_AUTH_URL)]
    pub auth_url: String,

    #[arg(long, env = "HUB_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "HUB_ID_TOKEN", hide_env_values = true)]
    pub id_token: Option<String>,

    #[arg(long, env = "HUB_EMAIL")]
    pub email: Option<String>,

    #[arg(long, env = "HUB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Fail on API errors instead of logging them (overrides ULTRALYTICS_HUB_EXCEPTIONS)
    #[arg(long)]
    pub raise_errors: bool,

    /// OTLP/HTTP endpoint for span export
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Bearer token for the OTLP endpoint
    #[arg(long, env = "HUB_OTLP_TOKEN", hide_env_values = true)]
    pub otlp_token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn hub_config(&self) -> HubConfig {
        let suppress_errors = !self.raise_errors && HubConfig::from_env().suppress_errors;
        HubConfig {
            api_root: self.api_root.clone(),
            web_root: self.web_root.clone(),
            auth_url: self.auth_url.clone(),
            suppress_errors,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            api_key: self.api_key.clone(),
            id_token: self.id_token.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Model management
    Model {
        #[command(subcommand)]
        subcommand: ModelCommand,
    },
    /// Dataset management
    Dataset {
        #[command(subcommand)]
        subcommand: DatasetCommand,
    },
    /// Project management
    Project {
        #[command(subcommand)]
        subcommand: ProjectCommand,
    },
    /// User records
    User {
        #[command(subcommand)]
        subcommand: RecordCommand,
    },
    /// Team management
    Team {
        #[command(subcommand)]
        subcommand: TeamCommand,
    },
}

#[derive(Debug, Clone, ClapArgs)]
pub struct ListArgs {
    /// Records per page
    #[arg(long, default_value_t = 10)]
    pub page_size: u32,

    /// List public records instead of your own
    #[arg(long)]
    pub public: bool,

    /// Number of pages to walk
    #[arg(long, default_value_t = 1)]
    pub pages: usize,

    /// JSON filter passed to the server
    #[arg(long, value_parser = parse_json)]
    pub query: Option<Value>,
}

impl ListArgs {
    pub fn options(&self) -> ListOptions {
        ListOptions {
            page_size: self.page_size,
            public: self.public.then_some(true),
            query: self.query.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum RecordCommand {
    /// Show one record
    Get { id: String },
    /// Create a record from a JSON object
    Create {
        #[arg(long, value_parser = parse_json)]
        data: Value,
    },
    /// Patch a record with a JSON object
    Update {
        id: String,
        #[arg(long, value_parser = parse_json)]
        data: Value,
    },
    /// Delete a record (soft unless --hard)
    Delete {
        id: String,
        #[arg(long)]
        hard: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum ModelCommand {
    /// List models
    List(ListArgs),
    #[command(flatten)]
    Record(RecordCommand),
    /// Upload checkpoint or final weights
    Upload {
        id: String,
        weights: PathBuf,
        #[arg(long, default_value_t = 0)]
        epoch: u32,
        /// Mark the checkpoint as the best so far
        #[arg(long)]
        best: bool,
        /// Upload as final weights
        #[arg(long = "final")]
        is_final: bool,
        /// mAP of the final weights
        #[arg(long, default_value_t = 0.0)]
        map: f64,
    },
    /// Upload a metrics object
    Metrics {
        id: String,
        #[arg(long, value_parser = parse_json)]
        data: Value,
    },
    /// Request an export
    Export {
        id: String,
        #[arg(long, default_value = "onnx")]
        format: String,
    },
    /// Run inference on an image
    Predict {
        id: String,
        image: PathBuf,
        /// JSON object of inference options
        #[arg(long, value_parser = parse_json)]
        config: Option<Value>,
    },
    /// Print a download link (best, last, parent, dataset)
    Link {
        id: String,
        #[arg(long, default_value = "best")]
        object: String,
    },
    /// Send heartbeats until Ctrl-C or SIGTERM
    Heartbeat {
        id: String,
        /// Seconds between heartbeats
        #[arg(long, default_value_t = 300)]
        interval: u64,
    },
}

#[derive(Debug, Subcommand)]
pub enum DatasetCommand {
    /// List datasets
    List(ListArgs),
    #[command(flatten)]
    Record(RecordCommand),
    /// Upload a dataset archive
    Upload { id: String, file: PathBuf },
    /// Print a download link
    Link {
        id: String,
        #[arg(long, default_value = "archive")]
        object: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    /// List projects
    List(ListArgs),
    #[command(flatten)]
    Record(RecordCommand),
    /// Upload the project cover image
    UploadImage { id: String, file: PathBuf },
}

#[derive(Debug, Subcommand)]
pub enum TeamCommand {
    /// List teams
    List(ListArgs),
    #[command(flatten)]
    Record(RecordCommand),
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_upload_flags() {
        let args = Args::try_parse_from([
            "hub", "--api-root", "http://hub", "model", "upload", "m1", "w.pt", "--epoch", "5",
            "--final", "--map", "0.4",
        ])
        .unwrap();
        assert_eq!(args.api_root, "http://hub");
        match args.command {
            Command::Model {
                subcommand:
                    ModelCommand::Upload {
                        id,
                        epoch,
                        is_final,
                        map,
                        best,
                        ..
                    },
            } => {
                assert_eq!(id, "m1");
                assert_eq!(epoch, 5);
                assert!(is_final);
                assert!(!best);
                assert_eq!(map, 0.4);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_list_and_record_commands() {
        let args = Args::try_parse_from([
            "hub", "dataset", "list", "--public", "--page-size", "5", "--query", r#"{"a":1}"#,
        ])
        .unwrap();
        let Command::Dataset {
            subcommand: DatasetCommand::List(list),
        } = args.command
        else {
            panic!("expected dataset list");
        };
        let options = list.options();
        assert_eq!(options.page_size, 5);
        assert_eq!(options.public, Some(true));
        assert_eq!(options.query, Some(serde_json::json!({"a": 1})));

        let args = Args::try_parse_from(["hub", "team", "delete", "t1", "--hard"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Team {
                subcommand: TeamCommand::Record(RecordCommand::Delete { hard: true, .. })
            }
        ));

        assert!(Args::try_parse_from(["hub", "user", "create", "--data", "{oops"]).is_err());
    }

    #[test]
    fn test_raise_errors_disables_suppression() {
        let args = Args::try_parse_from(["hub", "--raise-errors", "user", "get", "u1"]).unwrap();
        assert!(!args.hub_config().suppress_errors);
    }
}
