use clap::{ArgAction, Parser};
use std::path::PathBuf;

use orgsync::SyncOptions;

#[derive(Parser, Debug)]
#[command(name = "orgsync")]
#[command(version)]
#[command(about = "Converge teams, applications and environments on the security platform", long_about = None)]
pub struct Cli {
    /// Platform API client id
    #[arg(value_name = "CLIENT_ID")]
    pub client_id: Option<String>,

    /// Platform API client secret
    #[arg(value_name = "CLIENT_SECRET")]
    pub client_secret: Option<String>,

    /// Sync teams, auto-link rules and membership
    #[arg(
        value_name = "ACTION_TEAMS",
        action = ArgAction::Set,
        value_parser = parse_flag,
        default_value = "true"
    )]
    pub action_teams: bool,

    /// Sync applications and their components
    #[arg(
        value_name = "ACTION_CODE",
        action = ArgAction::Set,
        value_parser = parse_flag,
        default_value = "true"
    )]
    pub action_code: bool,

    /// Sync environments, services and cloud asset rules
    #[arg(
        value_name = "ACTION_CLOUD",
        action = ArgAction::Set,
        value_parser = parse_flag,
        default_value = "true"
    )]
    pub action_cloud: bool,

    /// Platform API base URL
    #[arg(value_name = "API_DOMAIN")]
    pub api_domain: Option<String>,

    /// Directory holding core-structure.yaml, Teams/ and hives.yaml
    #[arg(long, env = "ORGSYNC_RESOURCES", default_value = "Resources")]
    pub resources: PathBuf,

    /// Log writes instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Pause after every applied write, in milliseconds
    #[arg(long, value_name = "MS")]
    pub write_delay_ms: Option<u64>,

    /// Kube context to inventory (repeatable)
    #[arg(long = "kube-context", value_name = "CTX")]
    pub kube_contexts: Vec<String>,

    /// CSV file for the container image inventory
    #[arg(long, value_name = "PATH", default_value = "container_images.csv")]
    pub inventory_csv: PathBuf,

    /// kubectl binary
    #[arg(long, value_name = "PATH", default_value = "kubectl")]
    pub kubectl: String,
}

impl Cli {
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            teams: self.action_teams,
            code: self.action_code,
            cloud: self.action_cloud,
        }
    }
}

fn parse_flag(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(format!("expected true or false, got '{}'", other)),
    }
}
