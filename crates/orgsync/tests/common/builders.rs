//! Resource directory builders.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use orgsync::{DesiredState, ResourceLoader};

/// A resource directory in a temp dir, removed on drop.
pub struct ResourceDir {
    temp_dir: TempDir,
}

impl ResourceDir {
    /// Creates the directory with an empty `Teams/`.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir_all(temp_dir.path().join("Teams")).expect("Failed to create Teams");
        Self { temp_dir }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn core(self, yaml: &str) -> Self {
        self.write("core-structure.yaml", yaml)
    }

    pub fn team(self, file_name: &str, yaml: &str) -> Self {
        self.write(&format!("Teams/{}", file_name), yaml)
    }

    pub fn hives(self, yaml: &str) -> Self {
        self.write("hives.yaml", yaml)
    }

    pub fn write(self, relative: &str, content: &str) -> Self {
        let path = self.temp_dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, content).expect("Failed to write resource file");
        self
    }

    /// Loads and builds the desired state.
    pub fn desired_state(&self) -> DesiredState {
        let resources = ResourceLoader::new(self.path())
            .load()
            .expect("Failed to load resources");
        DesiredState::build(&resources).expect("Failed to build desired state")
    }
}

/// Two teams, two applications and a CLOUD environment.
pub const ORGANISATION_CORE: &str = r#"
DeploymentGroups:
  - AppName: Payments Gateway
    Status: Production
    Tier: 1
    Domain: Finance
    SubDomain: Payments
    TeamNames: [Falcon]
    Responsable: lead@example.com
    Deployment_set: pay
    Components:
      - ComponentName: payments-api
        Tier: 2
        RepositoryName: payments-api
        Cidr: 10.0.0.1, 10.1.0.0/16
      - ComponentName: payments-web
        RepositoryName: [payments-web]
        MultiConditionRules:
          - RepositoryName: payments-web
            Tags: ["env:prod"]
  - AppName: Ledger
    TeamNames: Owl
    Components:
      - ComponentName: ledger-core
        SearchName: ledger
Environment Groups:
  - Name: Production
    Type: CLOUD
    Tier: 0
    TeamNames: [Falcon, Owl]
    Services:
      - Service: Payments
        Deployment_set: pay
      - Service: Ledger
        Tier: 2
AllAccessAccounts:
  - security@example.com
"#;

pub const FALCON_TEAM: &str = r#"
TeamName: Falcon
TeamMembers:
  - Name: Alice
    EmailAddress: alice@example.com
  - Name: Bob
    EmailAddress: bob@example.com
"#;

pub const OWL_TEAM: &str = r#"
TeamName: Owl
TeamMembers:
  - Name: Carol
    EmailAddress: carol@example.com
"#;

pub fn organisation() -> ResourceDir {
    ResourceDir::new()
        .core(ORGANISATION_CORE)
        .team("falcon.yaml", FALCON_TEAM)
        .team("owl.yaml", OWL_TEAM)
}
