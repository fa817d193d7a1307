//! Construction of the desired state from loaded resources.
//!
//! All defaults (criticality, inherited domain/teams, email expansion, name
//! aliases) are applied here so that the reconcile engines only ever see
//! complete values.

use std::collections::BTreeMap;

use super::association::Associations;
use super::criticality::Criticality;
use super::entity::{Application, Component, Environment, Hive, Team, ThirdPartyServices};
use super::tag::Tag;
use super::DesiredState;
use crate::config::schema::{
    BuildDefinition, ComponentEntry, DeploymentGroup, EnvironmentGroup, HivesFile,
};
use crate::config::LoadedResources;
use crate::error::ConfigError;

const DEFAULT_THIRD_PARTY_ENVIRONMENT: &str = "Thirdparty";
const DEFAULT_THIRD_PARTY_DOMAIN: &str = "Thirdparty";

/// Values a component takes from its parent when it does not declare them.
#[derive(Default)]
struct Inherited<'a> {
    domain: Option<&'a str>,
    subdomain: Option<&'a str>,
    teams: &'a [String],
}

struct Builder<'a> {
    aliases: &'a BTreeMap<String, String>,
}

impl DesiredState {
    /// Builds the desired state, applying defaults and aliases.
    pub fn build(resources: &LoadedResources) -> Result<Self, ConfigError> {
        let builder = Builder {
            aliases: &resources.core.name_aliases,
        };

        let teams: Vec<Team> = resources
            .teams
            .iter()
            .filter_map(|sourced| {
                let file = &sourced.value;
                let name = file.team_name.clone()?;
                let members = file
                    .team_members
                    .iter()
                    .filter_map(|m| {
                        if m.email_address.is_none() {
                            log::warn!(
                                "Member {:?} of team '{}' has no EmailAddress, ignoring",
                                m.name,
                                name
                            );
                        }
                        m.email_address.clone()
                    })
                    .collect();
                Some(Team {
                    name,
                    members,
                    recreate_associations: file.recreate_team_associations.unwrap_or(true),
                })
            })
            .collect();

        let all_access = collect_all_access(
            &resources.core.all_access_accounts,
            &resources.core.all_access_teams,
            &teams,
        );

        let hives = match &resources.hives {
            Some(file) => build_hives(file),
            None => Vec::new(),
        };

        let mut applications: Vec<Application> = Vec::new();
        for (index, group) in resources.core.deployment_groups.iter().enumerate() {
            let app = builder.application(index, group)?;
            if applications.iter().any(|a| a.name == app.name) {
                log::warn!("Application '{}' declared more than once, ignoring", app.name);
                continue;
            }
            applications.push(app);
        }

        let mut environments: Vec<Environment> = Vec::new();
        for (index, group) in resources.core.environment_groups.iter().enumerate() {
            let env = builder.environment(index, group)?;
            if environments.iter().any(|e| e.name == env.name) {
                log::warn!("Environment '{}' declared more than once, ignoring", env.name);
                continue;
            }
            environments.push(env);
        }

        let third_party = resources
            .core
            .third_party_services
            .as_ref()
            .filter(|group| !group.services.is_empty())
            .map(|group| ThirdPartyServices {
                environment: group
                    .environment
                    .clone()
                    .unwrap_or_else(|| DEFAULT_THIRD_PARTY_ENVIRONMENT.to_string()),
                domain: builder.alias(
                    group
                        .domain
                        .as_deref()
                        .unwrap_or(DEFAULT_THIRD_PARTY_DOMAIN),
                ),
                services: group.services.iter().map(|s| builder.alias(s)).collect(),
            });

        Ok(DesiredState {
            teams,
            hives,
            all_access,
            applications,
            environments,
            third_party,
        })
    }
}

impl Builder<'_> {
    fn alias(&self, name: &str) -> String {
        self.aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    fn alias_opt(&self, name: Option<&str>) -> Option<String> {
        name.map(|n| self.alias(n))
    }

    fn application(
        &self,
        index: usize,
        group: &DeploymentGroup,
    ) -> Result<Application, ConfigError> {
        let name = group.app_name.clone().ok_or_else(|| {
            ConfigError::validation(format!("DeploymentGroups[{}] has no AppName", index))
        })?;

        let domain = self.alias_opt(group.domain.as_deref());
        let subdomain = self.alias_opt(group.sub_domain.as_deref());

        let inherited = Inherited {
            domain: domain.as_deref(),
            subdomain: subdomain.as_deref(),
            teams: &group.team_names,
        };

        let mut components: Vec<Component> = Vec::new();
        for (c_index, entry) in group.components.iter().enumerate() {
            let component = self.component(&name, c_index, entry, &inherited)?;
            push_unique(&mut components, component, &name);
        }
        for (b_index, definition) in group.build_definitions.iter().enumerate() {
            let component = self.build_definition(&name, b_index, definition, &inherited)?;
            push_unique(&mut components, component, &name);
        }

        Ok(Application {
            criticality: Criticality::from_tier(group.tier.as_deref()),
            owner: group.responsable.clone(),
            status: group.status.clone(),
            teams: group.team_names.clone(),
            tags: parse_tags(&group.tags, &name),
            deployment_set: group.deployment_set.clone(),
            deployment_tag: group.deployment_tag.clone(),
            domain,
            subdomain,
            components,
            name,
        })
    }

    fn environment(
        &self,
        index: usize,
        group: &EnvironmentGroup,
    ) -> Result<Environment, ConfigError> {
        let name = group.name.clone().ok_or_else(|| {
            ConfigError::validation(format!("Environment Groups[{}] has no Name", index))
        })?;

        let teams = merge_teams(&group.team_name, &group.team_names);

        let mut services: Vec<Component> = Vec::new();
        for (s_index, entry) in group.services.iter().enumerate() {
            let service = self.component(&name, s_index, entry, &Inherited::default())?;
            push_unique(&mut services, service, &name);
        }

        Ok(Environment {
            env_type: group.env_type.clone(),
            criticality: Criticality::from_tier(group.tier.as_deref()),
            owner: group.responsable.clone(),
            status: group.status.clone(),
            tags: parse_tags(&group.tags, &name),
            teams,
            services,
            cloud_accounts: group.cloud_accounts.clone(),
            name,
        })
    }

    fn component(
        &self,
        parent: &str,
        index: usize,
        entry: &ComponentEntry,
        inherited: &Inherited<'_>,
    ) -> Result<Component, ConfigError> {
        let name = entry
            .component_name
            .as_deref()
            .map(|n| self.alias(n))
            .ok_or_else(|| {
                ConfigError::validation(format!(
                    "'{}' entry #{} has no ComponentName/Service",
                    parent, index
                ))
            })?;

        let mut teams = merge_teams(&entry.team_name, &entry.team_names);
        if teams.is_empty() {
            teams = inherited.teams.to_vec();
        }

        Ok(Component {
            criticality: Criticality::from_tier(entry.tier.as_deref()),
            status: entry.status.clone(),
            component_type: entry.component_type.clone(),
            domain: self
                .alias_opt(entry.domain.as_deref())
                .or_else(|| inherited.domain.map(String::from)),
            subdomain: self
                .alias_opt(entry.sub_domain.as_deref())
                .or_else(|| inherited.subdomain.map(String::from)),
            teams,
            tags: parse_tags(&entry.tags, &name),
            associations: Associations::from(&entry.associations),
            deployment_set: entry.deployment_set.clone(),
            pipeline: None,
            name,
        })
    }

    /// A build definition becomes a component named after its repository.
    fn build_definition(
        &self,
        parent: &str,
        index: usize,
        definition: &BuildDefinition,
        inherited: &Inherited<'_>,
    ) -> Result<Component, ConfigError> {
        let repository = definition.repository_name.clone().ok_or_else(|| {
            ConfigError::validation(format!(
                "'{}' BuildDefinitions[{}] has no RepositoryName",
                parent, index
            ))
        })?;

        let teams = match &definition.team_name {
            Some(team) => vec![team.clone()],
            None => inherited.teams.to_vec(),
        };

        let mut component = Component::named(repository.clone());
        component.criticality = Criticality::from_tier(definition.tier.as_deref());
        component.domain = self
            .alias_opt(definition.domain.as_deref())
            .or_else(|| inherited.domain.map(String::from));
        component.subdomain = self
            .alias_opt(definition.sub_domain.as_deref())
            .or_else(|| inherited.subdomain.map(String::from));
        component.teams = teams;
        component.associations.repositories = vec![repository];
        component.pipeline = definition.build_definition_name.clone();
        Ok(component)
    }
}

fn push_unique(components: &mut Vec<Component>, component: Component, parent: &str) {
    if components.iter().any(|c| c.name == component.name) {
        log::warn!(
            "'{}' declared more than once under '{}', ignoring",
            component.name,
            parent
        );
        return;
    }
    components.push(component);
}

fn merge_teams(first: &[String], second: &[String]) -> Vec<String> {
    let mut teams: Vec<String> = Vec::new();
    for team in first.iter().chain(second.iter()) {
        if !teams.contains(team) {
            teams.push(team.clone());
        }
    }
    teams
}

fn parse_tags(raw: &[String], owner: &str) -> Vec<Tag> {
    raw.iter()
        .filter_map(|s| match Tag::parse(s) {
            Ok(tag) => Some(tag),
            Err(e) => {
                log::error!("Ignoring tag on '{}': {}", owner, e);
                None
            }
        })
        .collect()
}

fn collect_all_access(accounts: &[String], team_names: &[String], teams: &[Team]) -> Vec<String> {
    let mut all_access: Vec<String> = Vec::new();
    let mut push = |email: &str| {
        if !all_access.iter().any(|e| e.eq_ignore_ascii_case(email)) {
            all_access.push(email.to_string());
        }
    };

    for account in accounts {
        push(account);
    }
    for team_name in team_names {
        match teams.iter().find(|t| &t.name == team_name) {
            Some(team) => team.members.iter().for_each(|m| push(m)),
            None => log::warn!("AllAccessTeams names unknown team '{}'", team_name),
        }
    }
    all_access
}

fn build_hives(file: &HivesFile) -> Vec<Hive> {
    let domain = file.email_domain.as_deref();
    let mut hives = Vec::new();

    for hive in &file.hives {
        for team in &hive.teams {
            let Some(team_name) = team.name.clone() else {
                log::warn!("Hive {:?} has a team without Name, ignoring", hive.name);
                continue;
            };

            let lead = team.lead.as_deref().and_then(|l| to_email(l, domain));
            let product_owners = team
                .product
                .as_deref()
                .map(|p| {
                    p.split(" and ")
                        .filter_map(|person| to_email(person, domain))
                        .collect()
                })
                .unwrap_or_default();

            hives.push(Hive {
                team: team_name,
                lead,
                product_owners,
            });
        }
    }
    hives
}

/// Turns a person into an email: emails are kept, names become `first.last@domain`.
pub(crate) fn to_email(person: &str, domain: Option<&str>) -> Option<String> {
    let person = person.trim();
    if person.is_empty() {
        return None;
    }
    if person.contains('@') {
        return Some(person.to_lowercase());
    }
    match domain {
        Some(domain) => {
            let local = person
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(".")
                .to_lowercase();
            Some(format!("{}@{}", local, domain.trim_start_matches('@')))
        }
        None => {
            log::warn!("Cannot derive an email for '{}' without EmailDomain", person);
            None
        }
    }
}
