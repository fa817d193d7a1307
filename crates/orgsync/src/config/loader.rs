//! Loader for the resource directory.

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use serde::de::DeserializeOwned;

use super::schema::{CoreStructure, HivesFile, TeamFile};
use crate::error::ConfigError;

/// File holding applications, environments and the all-access allow-list.
pub const CORE_STRUCTURE_FILE: &str = "core-structure.yaml";

/// Directory with one membership file per team.
pub const TEAMS_DIR: &str = "Teams";

/// Optional leadership roster.
pub const HIVES_FILE: &str = "hives.yaml";

/// A parsed document together with the file it came from.
#[derive(Debug, Clone)]
pub struct Sourced<T> {
    pub value: T,
    /// Path relative to the resource directory.
    pub path: PathBuf,
}

/// Everything read from the resource directory, before model construction.
#[derive(Debug, Clone, Default)]
pub struct LoadedResources {
    pub core: CoreStructure,
    /// Team files in file-name order, first declaration of each name only.
    pub teams: Vec<Sourced<TeamFile>>,
    pub hives: Option<HivesFile>,
}

/// Reads the YAML resource directory.
pub struct ResourceLoader {
    resource_dir: PathBuf,
}

impl ResourceLoader {
    pub fn new(resource_dir: impl Into<PathBuf>) -> Self {
        Self {
            resource_dir: resource_dir.into(),
        }
    }

    /// Loads core structure, teams and hives.
    pub fn load(&self) -> Result<LoadedResources, ConfigError> {
        if !self.resource_dir.is_dir() {
            return Err(ConfigError::ResourceDirNotFound(self.resource_dir.clone()));
        }

        let core_path = self.resource_dir.join(CORE_STRUCTURE_FILE);
        if !core_path.is_file() {
            return Err(ConfigError::MissingFile(core_path));
        }
        let core: CoreStructure = read_yaml(&core_path)?;

        let teams = self.load_teams()?;

        let hives_path = self.resource_dir.join(HIVES_FILE);
        let hives = if hives_path.is_file() {
            Some(read_yaml::<HivesFile>(&hives_path)?)
        } else {
            log::info!("No {} found, hive rosters disabled", HIVES_FILE);
            None
        };

        log::info!(
            "Loaded {} applications, {} environments, {} teams from {}",
            core.deployment_groups.len(),
            core.environment_groups.len(),
            teams.len(),
            self.resource_dir.display()
        );

        Ok(LoadedResources { core, teams, hives })
    }

    /// Loads every team file, keeping the first declaration of each team name.
    pub fn load_teams(&self) -> Result<Vec<Sourced<TeamFile>>, ConfigError> {
        let teams_dir = self.resource_dir.join(TEAMS_DIR);
        if !teams_dir.is_dir() {
            return Err(ConfigError::MissingTeamsDirectory(teams_dir));
        }

        let mut teams: Vec<Sourced<TeamFile>> = Vec::new();

        for entry in WalkDir::new(&teams_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || !is_visible_yaml(path) {
                continue;
            }

            let team: TeamFile = read_yaml(path)?;
            let relative_path = path
                .strip_prefix(&self.resource_dir)
                .unwrap_or(path)
                .to_path_buf();

            let Some(name) = team.team_name.as_deref() else {
                log::error!("{} has no TeamName, ignoring", relative_path.display());
                continue;
            };

            if let Some(first) = teams
                .iter()
                .find(|t| t.value.team_name.as_deref() == Some(name))
            {
                log::warn!(
                    "Team '{}' in {} already declared in {}, ignoring",
                    name,
                    relative_path.display(),
                    first.path.display()
                );
                continue;
            }

            teams.push(Sourced {
                value: team,
                path: relative_path,
            });
        }

        Ok(teams)
    }
}

fn is_visible_yaml(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(true);
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    !hidden && (ext == "yaml" || ext == "yml")
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    // An empty document deserializes as null; treat it as an empty mapping.
    let content = if content.trim().is_empty() {
        "{}"
    } else {
        content.as_str()
    };

    serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn minimal_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(dir.path(), CORE_STRUCTURE_FILE, "DeploymentGroups: []\n");
        fs::create_dir_all(dir.path().join(TEAMS_DIR)).unwrap();
        dir
    }

    #[test]
    fn test_missing_resource_dir() {
        let loader = ResourceLoader::new("/nonexistent/orgsync/resources");
        assert!(matches!(
            loader.load(),
            Err(ConfigError::ResourceDirNotFound(_))
        ));
    }

    #[test]
    fn test_missing_teams_dir() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), CORE_STRUCTURE_FILE, "DeploymentGroups: []\n");

        let result = ResourceLoader::new(dir.path()).load();
        assert!(matches!(result, Err(ConfigError::MissingTeamsDirectory(_))));
    }

    #[test]
    fn test_missing_core_structure() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(TEAMS_DIR)).unwrap();

        let result = ResourceLoader::new(dir.path()).load();
        assert!(matches!(result, Err(ConfigError::MissingFile(_))));
    }

    #[test]
    fn test_first_team_declaration_wins() {
        let dir = minimal_dir();
        write(
            dir.path(),
            "Teams/a-falcon.yaml",
            "TeamName: falcon\nTeamMembers:\n  - EmailAddress: first@example.com\n",
        );
        write(
            dir.path(),
            "Teams/b-falcon.yaml",
            "TeamName: falcon\nTeamMembers:\n  - EmailAddress: second@example.com\n",
        );
        write(dir.path(), "Teams/c-owl.yml", "TeamName: owl\n");
        write(dir.path(), "Teams/.hidden.yaml", "TeamName: ghost\n");
        write(dir.path(), "Teams/notes.txt", "TeamName: text\n");

        let loaded = ResourceLoader::new(dir.path()).load().unwrap();
        let names: Vec<_> = loaded
            .teams
            .iter()
            .map(|t| t.value.team_name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["falcon", "owl"]);
        assert_eq!(
            loaded.teams[0].value.team_members[0]
                .email_address
                .as_deref(),
            Some("first@example.com")
        );
        assert!(loaded.hives.is_none());
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = minimal_dir();
        write(dir.path(), "Teams/broken.yaml", "TeamName: [unclosed\n");

        match ResourceLoader::new(dir.path()).load() {
            Err(ConfigError::ParseYaml { path, .. }) => {
                assert!(path.ends_with("broken.yaml"));
            }
            other => panic!("expected ParseYaml, got {:?}", other),
        }
    }

    #[test]
    fn test_hives_loaded_when_present() {
        let dir = minimal_dir();
        write(
            dir.path(),
            HIVES_FILE,
            "EmailDomain: example.com\nHives:\n  - Name: Core\n    Teams:\n      - Name: falcon\n        Lead: Jane Doe\n",
        );

        let loaded = ResourceLoader::new(dir.path()).load().unwrap();
        let hives = loaded.hives.unwrap();
        assert_eq!(hives.email_domain.as_deref(), Some("example.com"));
        assert_eq!(hives.hives[0].teams[0].lead.as_deref(), Some("Jane Doe"));
    }
}
