//! In-memory platform that applies writes to its own state.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use orgsync::model::Criticality;
use orgsync::platform::types::RemoteOwner;
use orgsync::platform::{
    classify, ApiError, EntityType, NewApplication, NewComponent, Operation, OperationKind,
    PlatformApi, RemoteApplication, RemoteComponent, RemoteMember, RemoteTag, RemoteTeam,
    TagAction, WriteOutcome,
};

#[derive(Default)]
struct State {
    teams: Vec<RemoteTeam>,
    /// Teams that exist but are missing from reads.
    hidden_teams: HashSet<String>,
    members: HashMap<String, Vec<String>>,
    applications: Vec<RemoteApplication>,
    components: Vec<RemoteComponent>,
    /// Auto-links, rules and deployments, keyed by request.
    links: HashSet<String>,
    never_logged_in: HashSet<String>,
    fail_on: Option<OperationKind>,
    log: Vec<Operation>,
    next_id: u32,
}

impl State {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn with_ids(&mut self, tags: impl IntoIterator<Item = RemoteTag>) -> Vec<RemoteTag> {
        tags.into_iter()
            .map(|tag| RemoteTag {
                id: Some(self.id("tag")),
                ..tag
            })
            .collect()
    }

    fn link(&mut self, operation: &Operation) -> u16 {
        let request = operation.request();
        let key = format!(
            "{} {} {}",
            request.method,
            request.path,
            request.body.map(|b| b.to_string()).unwrap_or_default()
        );
        if self.links.insert(key) {
            200
        } else {
            409
        }
    }

    fn apply(&mut self, operation: &Operation) -> u16 {
        match operation {
            Operation::CreateTeam { name } => {
                let exists = self.teams.iter().any(|t| t.name.eq_ignore_ascii_case(name));
                if exists {
                    return 409;
                }
                let id = self.id("team");
                self.teams.push(RemoteTeam {
                    id,
                    name: name.clone(),
                });
                200
            }
            Operation::LinkTeamTags { .. }
            | Operation::CreateRule(_)
            | Operation::DeployApplication { .. }
            | Operation::AutoDeploy { .. } => self.link(operation),
            Operation::AddTeamMember { team_id, email, .. } => {
                if self.never_logged_in.contains(&email.to_lowercase()) {
                    return 400;
                }
                let members = self.members.entry(team_id.clone()).or_default();
                if members.iter().any(|m| m.eq_ignore_ascii_case(email)) {
                    return 409;
                }
                members.push(email.clone());
                200
            }
            Operation::RemoveTeamMember { team_id, email, .. } => {
                let members = self.members.entry(team_id.clone()).or_default();
                let before = members.len();
                members.retain(|m| !m.eq_ignore_ascii_case(email));
                if members.len() < before {
                    200
                } else {
                    404
                }
            }
            Operation::CreateApplication(app) => self.create_application(app),
            Operation::UpdateApplication {
                id,
                criticality,
                owner,
                ..
            } => {
                let Some(app) = self.applications.iter_mut().find(|a| &a.id == id) else {
                    return 404;
                };
                if let Some(criticality) = criticality {
                    app.criticality = Some(*criticality);
                }
                if let Some(owner) = owner {
                    app.owner = Some(RemoteOwner {
                        email: Some(owner.clone()),
                    });
                }
                200
            }
            Operation::UpdateApplicationTags {
                id, action, tags, ..
            } => {
                let added = match action {
                    TagAction::Add => self.with_ids(tags.iter().cloned()),
                    TagAction::Delete => Vec::new(),
                };
                let Some(app) = self.applications.iter_mut().find(|a| &a.id == id) else {
                    return 404;
                };
                apply_tags(&mut app.tags, *action, tags, added);
                200
            }
            Operation::CreateComponent(component) => self.create_component(component),
            Operation::UpdateComponent {
                id, criticality, ..
            } => {
                let Some(component) = self.components.iter_mut().find(|c| &c.id == id) else {
                    return 404;
                };
                component.criticality = Some(*criticality);
                200
            }
            Operation::UpdateComponentTags {
                id, action, tags, ..
            } => {
                let added = match action {
                    TagAction::Add => self.with_ids(tags.iter().cloned()),
                    TagAction::Delete => Vec::new(),
                };
                let Some(component) = self.components.iter_mut().find(|c| &c.id == id) else {
                    return 404;
                };
                apply_tags(&mut component.tags, *action, tags, added);
                200
            }
        }
    }

    fn create_application(&mut self, app: &NewApplication) -> u16 {
        let exists = self
            .applications
            .iter()
            .any(|a| a.entity_type == app.entity_type && a.name.eq_ignore_ascii_case(&app.name));
        if exists {
            return 409;
        }
        let id = self.id("app");
        let tags = self.with_ids(app.tags.iter().cloned().map(RemoteTag::from));
        self.applications.push(RemoteApplication {
            id,
            name: app.name.clone(),
            entity_type: app.entity_type,
            criticality: Some(app.criticality),
            owner: app.owner.as_ref().map(|email| RemoteOwner {
                email: Some(email.clone()),
            }),
            tags,
        });
        200
    }

    fn create_component(&mut self, component: &NewComponent) -> u16 {
        let Some(parent_id) = self
            .applications
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(&component.application))
            .map(|a| a.id.clone())
        else {
            return 400;
        };
        let exists = self.components.iter().any(|c| {
            c.application_id.as_deref() == Some(parent_id.as_str())
                && c.name.eq_ignore_ascii_case(&component.name)
        });
        if exists {
            return 409;
        }
        let id = self.id("component");
        let tags = self.with_ids(component.tags.iter().cloned().map(RemoteTag::from));
        self.components.push(RemoteComponent {
            id,
            name: component.name.clone(),
            application_id: Some(parent_id),
            criticality: Some(component.criticality),
            tags,
        });
        200
    }
}

fn apply_tags(
    current: &mut Vec<RemoteTag>,
    action: TagAction,
    tags: &[RemoteTag],
    added: Vec<RemoteTag>,
) {
    match action {
        TagAction::Add => current.extend(added),
        TagAction::Delete => current.retain(|t| !tags.iter().any(|r| r.id == t.id)),
    }
}

/// Conflicts answer 409, never-logged-in users 400, an injected failure 500.
#[derive(Default)]
pub struct FakePlatform {
    state: Mutex<State>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a remote team with the given members.
    pub fn with_team(self, name: &str, members: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = state.id("team");
            state.teams.push(RemoteTeam {
                id: id.clone(),
                name: name.to_string(),
            });
            state
                .members
                .insert(id, members.iter().map(|m| m.to_string()).collect());
        }
        self
    }

    /// Like `with_team`, but the team never shows up in reads.
    pub fn with_hidden_team(self, name: &str) -> Self {
        let this = self.with_team(name, &[]);
        {
            let mut state = this.state.lock().unwrap();
            state.hidden_teams.insert(name.to_string());
        }
        this
    }

    /// Adds a remote application or environment with tags that carry ids.
    pub fn with_application(
        self,
        name: &str,
        entity_type: EntityType,
        criticality: Criticality,
        tags: &[(&str, &str)],
    ) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = state.id("app");
            let tags = state.with_ids(tags.iter().map(|(key, value)| RemoteTag {
                id: None,
                key: key.to_string(),
                value: value.to_string(),
            }));
            state.applications.push(RemoteApplication {
                id,
                name: name.to_string(),
                entity_type,
                criticality: Some(criticality),
                owner: None,
                tags,
            });
        }
        self
    }

    /// Adds a remote component under an existing application or environment.
    pub fn with_component(
        self,
        parent: &str,
        name: &str,
        criticality: Criticality,
        tags: &[(&str, &str)],
    ) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let parent_id = state
                .applications
                .iter()
                .find(|a| a.name == parent)
                .map(|a| a.id.clone())
                .expect("parent must be added first");
            let id = state.id("component");
            let tags = state.with_ids(tags.iter().map(|(key, value)| RemoteTag {
                id: None,
                key: key.to_string(),
                value: value.to_string(),
            }));
            state.components.push(RemoteComponent {
                id,
                name: name.to_string(),
                application_id: Some(parent_id),
                criticality: Some(criticality),
                tags,
            });
        }
        self
    }

    pub fn never_logged_in(self, email: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .never_logged_in
            .insert(email.to_lowercase());
        self
    }

    /// Answers 500 to every write of this kind.
    pub fn fail_on(self, kind: OperationKind) -> Self {
        self.state.lock().unwrap().fail_on = Some(kind);
        self
    }

    /// Every write received, in order.
    pub fn operations(&self) -> Vec<Operation> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn clear_operations(&self) {
        self.state.lock().unwrap().log.clear();
    }

    pub fn members_of(&self, team: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let Some(remote) = state.teams.iter().find(|t| t.name == team) else {
            return Vec::new();
        };
        let mut members = state.members.get(&remote.id).cloned().unwrap_or_default();
        members.sort();
        members
    }

    pub fn application_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.applications.iter().map(|a| a.name.clone()).collect()
    }

    pub fn component_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.components.iter().map(|c| c.name.clone()).collect()
    }

    /// `key:value` tags of an application, sorted.
    pub fn application_tags(&self, name: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut tags: Vec<String> = state
            .applications
            .iter()
            .filter(|a| a.name == name)
            .flat_map(|a| a.tags.iter())
            .map(|t| format!("{}:{}", t.key, t.value))
            .collect();
        tags.sort();
        tags
    }

    /// `key:value` tags of a component, sorted.
    pub fn component_tags(&self, name: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut tags: Vec<String> = state
            .components
            .iter()
            .filter(|c| c.name == name)
            .flat_map(|c| c.tags.iter())
            .map(|t| format!("{}:{}", t.key, t.value))
            .collect();
        tags.sort();
        tags
    }

    pub fn team_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.teams.iter().map(|t| t.name.clone()).collect()
    }
}

#[async_trait]
impl PlatformApi for FakePlatform {
    async fn teams(&self) -> Result<Vec<RemoteTeam>, ApiError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .teams
            .iter()
            .filter(|t| !state.hidden_teams.contains(&t.name))
            .cloned()
            .collect())
    }

    async fn team_members(&self, team_id: &str) -> Result<Vec<RemoteMember>, ApiError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .members
            .get(team_id)
            .into_iter()
            .flatten()
            .map(|email| RemoteMember {
                email: email.clone(),
            })
            .collect())
    }

    async fn applications(&self) -> Result<Vec<RemoteApplication>, ApiError> {
        Ok(self.state.lock().unwrap().applications.clone())
    }

    async fn components(&self) -> Result<Vec<RemoteComponent>, ApiError> {
        Ok(self.state.lock().unwrap().components.clone())
    }

    async fn execute(&self, operation: &Operation) -> Result<WriteOutcome, ApiError> {
        let status = {
            let mut state = self.state.lock().unwrap();
            state.log.push(operation.clone());
            if state.fail_on == Some(operation.kind()) {
                500
            } else {
                state.apply(operation)
            }
        };
        let body = match status {
            400 => "user has never logged in",
            500 => "internal error",
            _ => "",
        };
        classify(operation, status, body)
    }
}
