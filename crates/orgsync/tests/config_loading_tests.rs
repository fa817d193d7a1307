//! Table-driven tests for resource directory loading and model construction.

mod common;

use common::{organisation, ResourceDir, FALCON_TEAM};

use orgsync::model::Criticality;
use orgsync::reconcile::membership::desired_members;
use orgsync::{ConfigError, DesiredState, ResourceLoader};

/// Represents a single loading test case.
struct LoadTestCase {
    /// Test case name for identification.
    name: &'static str,
    /// `(relative path, content)` pairs written before loading.
    files: &'static [(&'static str, &'static str)],
    /// Whether loading and building should succeed.
    should_succeed: bool,
    /// Expected error substring (if should_succeed is false).
    expected_error: Option<&'static str>,
}

const LOAD_TESTS: &[LoadTestCase] = &[
    LoadTestCase {
        name: "valid_minimal",
        files: &[("core-structure.yaml", "DeploymentGroups: []\n")],
        should_succeed: true,
        expected_error: None,
    },
    LoadTestCase {
        name: "empty_core_file",
        files: &[("core-structure.yaml", "")],
        should_succeed: true,
        expected_error: None,
    },
    LoadTestCase {
        name: "missing_core_file",
        files: &[("Teams/falcon.yaml", "TeamName: Falcon\n")],
        should_succeed: false,
        expected_error: Some("Required resource file not found"),
    },
    LoadTestCase {
        name: "invalid_yaml",
        files: &[("core-structure.yaml", "DeploymentGroups: [unclosed\n")],
        should_succeed: false,
        expected_error: Some("Failed to parse YAML"),
    },
    LoadTestCase {
        name: "application_without_name",
        files: &[(
            "core-structure.yaml",
            "DeploymentGroups:\n  - Status: Production\n",
        )],
        should_succeed: false,
        expected_error: Some("has no AppName"),
    },
    LoadTestCase {
        name: "environment_without_name",
        files: &[(
            "core-structure.yaml",
            "Environment Groups:\n  - Type: CLOUD\n",
        )],
        should_succeed: false,
        expected_error: Some("has no Name"),
    },
    LoadTestCase {
        name: "invalid_team_file",
        files: &[
            ("core-structure.yaml", "DeploymentGroups: []\n"),
            ("Teams/broken.yaml", "TeamMembers: {not: [a, list}\n"),
        ],
        should_succeed: false,
        expected_error: Some("Failed to parse YAML"),
    },
];

fn load(dir: &ResourceDir) -> Result<DesiredState, ConfigError> {
    let resources = ResourceLoader::new(dir.path()).load()?;
    DesiredState::build(&resources)
}

#[test]
fn test_resource_loading_table() {
    for case in LOAD_TESTS {
        let mut dir = ResourceDir::new();
        for (relative, content) in case.files {
            dir = dir.write(relative, content);
        }

        let result = load(&dir);
        if case.should_succeed {
            assert!(
                result.is_ok(),
                "case '{}' failed: {:?}",
                case.name,
                result.err()
            );
        } else {
            let err = match result {
                Ok(_) => panic!("case '{}' should have failed", case.name),
                Err(e) => e.to_string(),
            };
            if let Some(expected) = case.expected_error {
                assert!(
                    err.contains(expected),
                    "case '{}': expected '{}' in '{}'",
                    case.name,
                    expected,
                    err
                );
            }
        }
    }
}

#[test]
fn test_missing_resource_dir() {
    let err = ResourceLoader::new("/nonexistent/orgsync/resources")
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::ResourceDirNotFound(_)));
}

#[test]
fn test_missing_teams_directory() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("core-structure.yaml"), "DeploymentGroups: []\n").unwrap();

    let err = ResourceLoader::new(dir.path()).load().unwrap_err();
    assert!(matches!(err, ConfigError::MissingTeamsDirectory(_)));
}

#[test]
fn test_organisation_model() {
    let state = organisation().desired_state();

    assert_eq!(state.teams.len(), 2);
    assert_eq!(state.all_access, vec!["security@example.com"]);

    let payments = &state.applications[0];
    assert_eq!(payments.name, "Payments Gateway");
    assert_eq!(payments.criticality, Criticality::from(9));
    assert_eq!(payments.owner.as_deref(), Some("lead@example.com"));
    assert_eq!(payments.components.len(), 2);

    // Components inherit domain, subdomain and teams.
    let api = &payments.components[0];
    assert_eq!(api.criticality, Criticality::from(8));
    assert_eq!(api.domain.as_deref(), Some("Finance"));
    assert_eq!(api.subdomain.as_deref(), Some("Payments"));
    assert_eq!(api.teams, vec!["Falcon"]);

    let production = &state.environments[0];
    assert!(production.is_cloud());
    assert_eq!(production.criticality, Criticality::from(10));
    assert!(production.has_service("Payments"));
    assert_eq!(production.services[1].criticality, Criticality::from(8));
    assert!(production.services[0].domain.is_none());
}

#[test]
fn test_first_team_declaration_wins() {
    let state = ResourceDir::new()
        .core("DeploymentGroups: []\n")
        .team("a-falcon.yaml", FALCON_TEAM)
        .team(
            "b-falcon.yaml",
            "TeamName: Falcon\nTeamMembers:\n  - EmailAddress: intruder@example.com\n",
        )
        .team(".hidden.yaml", "TeamName: Hidden\n")
        .team("notes.txt", "TeamName: Notes\n")
        .desired_state();

    assert_eq!(state.teams.len(), 1);
    assert_eq!(
        state.teams[0].members,
        vec!["alice@example.com", "bob@example.com"]
    );
}

#[test]
fn test_build_definitions_and_aliases() {
    let state = ResourceDir::new()
        .core(
            r#"
DeploymentGroups:
  - AppName: Trading
    Domain: Markets
    SubDomain: FX
    TeamNames: Falcon
    BuildDefinitions:
      - BuildDefinitionName: fx-pricer-ci
        RepositoryName: fx-pricer
        Tier: 0
NameAliases:
  FX: Foreign Exchange(FX)
"#,
        )
        .desired_state();

    let trading = &state.applications[0];
    assert_eq!(trading.subdomain.as_deref(), Some("Foreign Exchange(FX)"));

    let pricer = &trading.components[0];
    assert_eq!(pricer.name, "fx-pricer");
    assert_eq!(pricer.criticality, Criticality::from(10));
    assert_eq!(pricer.associations.repositories, vec!["fx-pricer"]);

    let owners = state.subdomain_owners();
    assert_eq!(owners["Foreign Exchange(FX)"], vec!["Falcon"]);
}

#[test]
fn test_hive_rosters_join_membership() {
    let state = ResourceDir::new()
        .core("DeploymentGroups: []\n")
        .team("falcon.yaml", FALCON_TEAM)
        .hives(
            r#"
EmailDomain: example.com
Hives:
  - Name: Core
    Teams:
      - Name: falcon
        Lead: Jane Doe
        Product: Ann Lee and Bob@Example.com
"#,
        )
        .desired_state();

    let team = state.team("Falcon").unwrap();
    assert_eq!(
        desired_members(team, &state),
        vec![
            "alice@example.com",
            "bob@example.com",
            "jane.doe@example.com",
            "ann.lee@example.com",
        ]
    );
}
