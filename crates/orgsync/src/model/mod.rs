//! Typed desired state.

pub mod association;
mod build;
pub mod criticality;
pub mod entity;
pub mod tag;

use std::collections::BTreeMap;

pub use association::{Associations, MultiCondition};
pub use criticality::Criticality;
pub use entity::{Application, Component, Environment, Hive, Team, ThirdPartyServices};
pub use tag::{Tag, TagParseError};

/// Everything the run should converge the platform to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredState {
    pub teams: Vec<Team>,
    pub hives: Vec<Hive>,
    /// Accounts that belong to every team.
    pub all_access: Vec<String>,
    pub applications: Vec<Application>,
    pub environments: Vec<Environment>,
    pub third_party: Option<ThirdPartyServices>,
}

impl DesiredState {
    pub fn team(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.name == name)
    }

    /// Hive rosters for a team, matched case-insensitively.
    pub fn hives_for<'a>(&'a self, team: &'a str) -> impl Iterator<Item = &'a Hive> + 'a {
        self.hives
            .iter()
            .filter(move |h| h.team.eq_ignore_ascii_case(team))
    }

    /// Subdomain to owning teams, from applications and their components.
    pub fn subdomain_owners(&self) -> BTreeMap<String, Vec<String>> {
        let mut owners: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut add = |subdomain: &str, teams: &[String]| {
            let entry = owners.entry(subdomain.to_string()).or_default();
            for team in teams {
                if !entry.contains(team) {
                    entry.push(team.clone());
                }
            }
        };

        for app in &self.applications {
            if let Some(subdomain) = &app.subdomain {
                add(subdomain, &app.teams);
            }
            for component in &app.components {
                if let Some(subdomain) = &component.subdomain {
                    add(subdomain, &component.teams);
                }
            }
        }
        owners
    }
}
