//! Full convergence of one run.
//!
//! Steps run in a fixed order, each re-reading the remote state it needs:
//! teams, then applications/environments with their components and rules,
//! then cloud asset and pipeline rules and third-party stubs, then deployments.
//! Conflicts and rejected sub-operations are recorded and the run goes on;
//! any other failure aborts the run immediately.

use std::collections::HashSet;

use tracing::{info_span, Instrument};

use super::deployments::plan_deployments;
use super::matching::{find_application, find_component, find_team};
use super::membership::{desired_members, plan};
use super::report::SyncReport;
use super::rules::{cloud_asset_rule, pipeline_rule, synthesize};
use super::tags::{diff_tags, TagDiff, TagPolicy};
use crate::model::tag::{DOMAIN_KEY, PTEAM_KEY};
use crate::model::{Component, Criticality, DesiredState, Tag, Team};
use crate::platform::{
    ApiError, AutoLinkTarget, EntityType, NewApplication, NewComponent, Operation, PlatformApi,
    RemoteApplication, RemoteComponent, RemoteTag, TagAction, WriteOutcome,
};

/// Which parts of the organisation to converge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Teams, auto-link rules and membership.
    pub teams: bool,
    /// Applications and their components.
    pub code: bool,
    /// Environments, services, cloud asset rules and third-party stubs.
    pub cloud: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            teams: true,
            code: true,
            cloud: true,
        }
    }
}

impl SyncOptions {
    /// Deployments link applications to services, so both sides must be synced.
    pub fn deployments(&self) -> bool {
        self.code && self.cloud
    }
}

/// Desired fields of an application or environment.
struct DesiredEntity<'a> {
    name: &'a str,
    criticality: Criticality,
    owner: Option<&'a str>,
    tags: Vec<Tag>,
}

pub struct Orchestrator<'a, P> {
    api: &'a P,
    state: &'a DesiredState,
    options: SyncOptions,
    tag_policy: TagPolicy,
    report: SyncReport,
}

impl<'a, P: PlatformApi> Orchestrator<'a, P> {
    pub fn new(api: &'a P, state: &'a DesiredState, options: SyncOptions) -> Self {
        Self {
            api,
            state,
            options,
            tag_policy: TagPolicy::default(),
            report: SyncReport::started(),
        }
    }

    /// Runs every enabled step and returns the outcome counts.
    pub async fn run(mut self) -> Result<SyncReport, ApiError> {
        if self.options.teams {
            self.sync_teams().instrument(info_span!("sync_teams")).await?;
        }
        if self.options.code {
            self.sync_applications()
                .instrument(info_span!("sync_applications"))
                .await?;
        }
        if self.options.cloud {
            self.sync_environments()
                .instrument(info_span!("sync_environments"))
                .await?;
            self.sync_cloud_assets()
                .instrument(info_span!("sync_cloud_assets"))
                .await?;
        }
        if self.options.deployments() {
            self.sync_deployments()
                .instrument(info_span!("sync_deployments"))
                .await?;
        }

        self.report.finish();
        self.report.log_summary();
        Ok(self.report)
    }

    async fn execute(&mut self, operation: Operation) -> Result<WriteOutcome, ApiError> {
        let outcome = self.api.execute(&operation).await?;
        self.report.record(operation.kind(), &outcome);
        Ok(outcome)
    }

    // ========================================================================
    // Step 1: teams
    // ========================================================================

    async fn sync_teams(&mut self) -> Result<(), ApiError> {
        log::info!("[Teams]");
        let state = self.state;

        let remote = self.api.teams().await?;
        let mut created: HashSet<&str> = HashSet::new();
        for team in &state.teams {
            if find_team(&team.name, &remote).is_none() {
                let outcome = self
                    .execute(Operation::CreateTeam {
                        name: team.name.clone(),
                    })
                    .await?;
                if outcome != WriteOutcome::AlreadyExists {
                    created.insert(team.name.as_str());
                }
            }
        }

        let remote = if created.is_empty() {
            remote
        } else {
            self.api.teams().await?
        };

        for team in &state.teams {
            let Some(remote_team) = find_team(&team.name, &remote) else {
                log::warn!(
                    "Team '{}' not found on the platform, links and membership skipped",
                    team.name
                );
                continue;
            };
            let is_new = created.contains(team.name.as_str());
            self.sync_team(team, &remote_team.id, is_new)
                .instrument(info_span!("team", name = %team.name))
                .await?;
        }
        Ok(())
    }

    async fn sync_team(&mut self, team: &Team, team_id: &str, is_new: bool) -> Result<(), ApiError> {
        if is_new || team.recreate_associations {
            for target in [AutoLinkTarget::Components, AutoLinkTarget::Applications] {
                self.execute(Operation::LinkTeamTags {
                    team_id: team_id.to_string(),
                    team_name: team.name.clone(),
                    target,
                })
                .await?;
            }
        } else {
            log::debug!("Team '{}' keeps its existing auto-link rules", team.name);
        }

        let remote_members = self.api.team_members(team_id).await?;
        let desired = desired_members(team, self.state);
        let changes = plan(&remote_members, &desired);

        for email in changes.to_remove {
            self.execute(Operation::RemoveTeamMember {
                team_id: team_id.to_string(),
                team_name: team.name.clone(),
                email,
            })
            .await?;
        }
        for email in changes.to_add {
            self.execute(Operation::AddTeamMember {
                team_id: team_id.to_string(),
                team_name: team.name.clone(),
                email,
            })
            .await?;
        }
        Ok(())
    }

    // ========================================================================
    // Step 2: applications, environments, components, rules
    // ========================================================================

    async fn sync_applications(&mut self) -> Result<(), ApiError> {
        log::info!("[Applications]");
        let state = self.state;

        let remote = self.api.applications().await?;
        for app in &state.applications {
            let desired = DesiredEntity {
                name: &app.name,
                criticality: app.criticality,
                owner: app.owner.as_deref(),
                tags: app.desired_tags(),
            };
            self.ensure_entity(&desired, EntityType::Application, None, &remote)
                .instrument(info_span!("application", name = %app.name))
                .await?;
        }

        let remote = self.api.applications().await?;
        let remote_components = self.api.components().await?;
        for app in &state.applications {
            let owner = find_application(&app.name, EntityType::Application, &remote);
            self.sync_components(&app.name, owner, &app.components, &remote_components)
                .instrument(info_span!("components", application = %app.name))
                .await?;
        }
        Ok(())
    }

    async fn sync_environments(&mut self) -> Result<(), ApiError> {
        log::info!("[Environments]");
        let state = self.state;

        let remote = self.api.applications().await?;
        for env in &state.environments {
            let desired = DesiredEntity {
                name: &env.name,
                criticality: env.criticality,
                owner: env.owner.as_deref(),
                tags: env.desired_tags(),
            };
            self.ensure_entity(
                &desired,
                EntityType::Environment,
                env.env_type.as_deref(),
                &remote,
            )
            .instrument(info_span!("environment", name = %env.name))
            .await?;
        }

        let remote = self.api.applications().await?;
        let remote_components = self.api.components().await?;
        for env in &state.environments {
            let owner = find_application(&env.name, EntityType::Environment, &remote);
            self.sync_components(&env.name, owner, &env.services, &remote_components)
                .instrument(info_span!("services", environment = %env.name))
                .await?;
        }
        Ok(())
    }

    /// Creates the application/environment, or patches fields and tags of the existing one.
    async fn ensure_entity(
        &mut self,
        desired: &DesiredEntity<'_>,
        entity_type: EntityType,
        sub_type: Option<&str>,
        remote: &[RemoteApplication],
    ) -> Result<(), ApiError> {
        let Some(existing) = find_application(desired.name, entity_type, remote) else {
            self.execute(Operation::CreateApplication(NewApplication {
                name: desired.name.to_string(),
                entity_type,
                sub_type: sub_type.map(String::from),
                criticality: desired.criticality,
                owner: desired.owner.map(String::from),
                tags: desired.tags.clone(),
            }))
            .await?;
            return Ok(());
        };

        let criticality =
            (existing.criticality != Some(desired.criticality)).then_some(desired.criticality);
        let owner = desired
            .owner
            .filter(|o| {
                !existing
                    .owner_email()
                    .is_some_and(|current| current.eq_ignore_ascii_case(o))
            })
            .map(String::from);

        if criticality.is_some() || owner.is_some() {
            self.execute(Operation::UpdateApplication {
                id: existing.id.clone(),
                name: existing.name.clone(),
                criticality,
                owner,
            })
            .await?;
        }

        let diff = diff_tags(&existing.tags, &desired.tags, &self.tag_policy);
        self.apply_tag_diff(diff, &existing.name, |action, tags| {
            Operation::UpdateApplicationTags {
                id: existing.id.clone(),
                name: existing.name.clone(),
                action,
                tags,
            }
        })
        .await
    }

    /// Creates missing components, converges existing ones, then submits their rules.
    async fn sync_components(
        &mut self,
        parent: &str,
        remote_parent: Option<&RemoteApplication>,
        components: &[Component],
        remote_components: &[RemoteComponent],
    ) -> Result<(), ApiError> {
        if remote_parent.is_none() && !components.is_empty() {
            log::warn!("'{}' not found on the platform after creation", parent);
        }

        for component in components {
            let existing = remote_parent
                .and_then(|p| find_component(&component.name, &p.id, remote_components));

            match existing {
                None => {
                    self.execute(Operation::CreateComponent(NewComponent {
                        application: parent.to_string(),
                        name: component.name.clone(),
                        criticality: component.criticality,
                        tags: component.desired_tags(),
                    }))
                    .await?;
                }
                Some(existing) => self.update_component(existing, component).await?,
            }

            let synthesis = synthesize(parent, &component.name, &component.associations);
            self.report.rejected_rules += synthesis.rejected.len();
            for payload in synthesis.rules {
                self.execute(Operation::CreateRule(payload)).await?;
            }
        }
        Ok(())
    }

    async fn update_component(
        &mut self,
        existing: &RemoteComponent,
        component: &Component,
    ) -> Result<(), ApiError> {
        if existing.criticality != Some(component.criticality) {
            self.execute(Operation::UpdateComponent {
                id: existing.id.clone(),
                name: existing.name.clone(),
                criticality: component.criticality,
            })
            .await?;
        }

        let diff = diff_tags(&existing.tags, &component.desired_tags(), &self.tag_policy);
        self.apply_tag_diff(diff, &existing.name, |action, tags| {
            Operation::UpdateComponentTags {
                id: existing.id.clone(),
                name: existing.name.clone(),
                action,
                tags,
            }
        })
        .await
    }

    /// Removals first, then additions, as two separate writes.
    async fn apply_tag_diff<F>(&mut self, diff: TagDiff, name: &str, build: F) -> Result<(), ApiError>
    where
        F: Fn(TagAction, Vec<RemoteTag>) -> Operation,
    {
        for tag in &diff.unremovable {
            log::warn!(
                "Tag {}:{} on '{}' has no id and cannot be removed",
                tag.key,
                tag.value,
                name
            );
        }
        self.report.unremovable_tags += diff.unremovable.len();

        if !diff.to_remove.is_empty() {
            self.execute(build(TagAction::Delete, diff.to_remove)).await?;
        }
        if !diff.to_add.is_empty() {
            let tags = diff.to_add.into_iter().map(RemoteTag::from).collect();
            self.execute(build(TagAction::Add, tags)).await?;
        }
        Ok(())
    }

    // ========================================================================
    // Step 3: cloud asset rules and third-party stubs
    // ========================================================================

    async fn sync_cloud_assets(&mut self) -> Result<(), ApiError> {
        log::info!("[Cloud assets]");
        let state = self.state;

        if let Some(third_party) = &state.third_party {
            let remote = self.api.applications().await?;
            let remote_components = self.api.components().await?;

            match find_application(&third_party.environment, EntityType::Environment, &remote) {
                None => log::warn!(
                    "Environment '{}' not found, third-party services skipped",
                    third_party.environment
                ),
                Some(env) => {
                    let owners = state.subdomain_owners();
                    for service in &third_party.services {
                        if find_component(service, &env.id, &remote_components).is_some() {
                            continue;
                        }
                        let mut tags: Vec<Tag> = owners
                            .get(service)
                            .into_iter()
                            .flatten()
                            .map(|team| Tag::new(PTEAM_KEY, team.clone()))
                            .collect();
                        tags.push(Tag::new(DOMAIN_KEY, third_party.domain.clone()));

                        self.execute(Operation::CreateComponent(NewComponent {
                            application: third_party.environment.clone(),
                            name: service.clone(),
                            criticality: Criticality::DEFAULT,
                            tags,
                        }))
                        .await?;
                    }
                }
            }
        }

        let cloud_environments: Vec<_> = state.environments.iter().filter(|e| e.is_cloud()).collect();
        for app in &state.applications {
            let service = app.cloud_service_name();
            let mut seen: HashSet<&str> = HashSet::new();
            let repositories: Vec<&str> = app.repositories().filter(|r| seen.insert(*r)).collect();

            for env in cloud_environments.iter().filter(|e| e.has_service(service)) {
                for repository in &repositories {
                    self.execute(Operation::CreateRule(cloud_asset_rule(
                        &env.name, service, repository,
                    )))
                    .await?;
                }
            }
        }

        for env in state.environments.iter().filter(|e| !e.cloud_accounts.is_empty()) {
            for app in &state.applications {
                for (service, pipeline) in app.pipelines() {
                    self.execute(Operation::CreateRule(pipeline_rule(
                        &env.name,
                        service,
                        pipeline,
                        &env.cloud_accounts,
                    )))
                    .await?;
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Step 4: deployments
    // ========================================================================

    async fn sync_deployments(&mut self) -> Result<(), ApiError> {
        log::info!("[Deployments]");
        let remote = self.api.applications().await?;
        for operation in plan_deployments(self.state, &remote) {
            self.execute(operation).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deployments_need_code_and_cloud() {
        let cases = [
            (true, true, true),
            (true, false, false),
            (false, true, false),
            (false, false, false),
        ];
        for (code, cloud, expected) in cases {
            let options = SyncOptions {
                teams: false,
                code,
                cloud,
            };
            assert_eq!(options.deployments(), expected);
        }
    }
}
