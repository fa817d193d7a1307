//! Every write the reconciler can issue, and how each maps onto HTTP.

use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

use super::types::{EntityType, RemoteTag};
use crate::model::{Criticality, Tag};

/// Which auto-link endpoint of a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoLinkTarget {
    Components,
    Applications,
}

impl AutoLinkTarget {
    fn segment(self) -> &'static str {
        match self {
            AutoLinkTarget::Components => "components",
            AutoLinkTarget::Applications => "applications",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagAction {
    Add,
    Delete,
}

/// Filter of one asset-association rule. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_like: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub repository: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fqdn: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub netbios: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub os_names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hostnames: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub provider_account_id: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub provider_account_name: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource_group: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
}

impl RuleFilter {
    pub fn is_empty(&self) -> bool {
        *self == RuleFilter::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub name: String,
    pub filter: RuleFilter,
}

/// One rule bound to a component of an application or environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulePayload {
    pub application: String,
    pub component: String,
    pub rule: Rule,
}

/// How an explicit deployment picks its services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceSelector {
    Name(String),
    Tag(Tag),
}

impl fmt::Display for ServiceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceSelector::Name(name) => write!(f, "service '{}'", name),
            ServiceSelector::Tag(tag) => write!(f, "services tagged {}", tag),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub name: String,
    pub entity_type: EntityType,
    /// Environment sub-type, e.g. `CLOUD`.
    pub sub_type: Option<String>,
    pub criticality: Criticality,
    pub owner: Option<String>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComponent {
    /// Owning application or environment, by name.
    pub application: String,
    pub name: String,
    pub criticality: Criticality,
    pub tags: Vec<Tag>,
}

/// A single platform write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    CreateTeam {
        name: String,
    },
    LinkTeamTags {
        team_id: String,
        team_name: String,
        target: AutoLinkTarget,
    },
    AddTeamMember {
        team_id: String,
        team_name: String,
        email: String,
    },
    RemoveTeamMember {
        team_id: String,
        team_name: String,
        email: String,
    },
    CreateApplication(NewApplication),
    UpdateApplication {
        id: String,
        name: String,
        criticality: Option<Criticality>,
        owner: Option<String>,
    },
    UpdateApplicationTags {
        id: String,
        name: String,
        action: TagAction,
        tags: Vec<RemoteTag>,
    },
    CreateComponent(NewComponent),
    UpdateComponent {
        id: String,
        name: String,
        criticality: Criticality,
    },
    UpdateComponentTags {
        id: String,
        name: String,
        action: TagAction,
        tags: Vec<RemoteTag>,
    },
    CreateRule(RulePayload),
    DeployApplication {
        application_id: String,
        application_name: String,
        selector: ServiceSelector,
    },
    AutoDeploy {
        application: String,
        service: String,
    },
}

/// Category used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Team,
    TeamAutoLink,
    MemberAdd,
    MemberRemove,
    Application,
    ApplicationUpdate,
    ApplicationTags,
    Component,
    ComponentUpdate,
    ComponentTags,
    Rule,
    Deployment,
    AutoDeployment,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Team => "team",
            OperationKind::TeamAutoLink => "team auto-link",
            OperationKind::MemberAdd => "member add",
            OperationKind::MemberRemove => "member remove",
            OperationKind::Application => "application",
            OperationKind::ApplicationUpdate => "application update",
            OperationKind::ApplicationTags => "application tags",
            OperationKind::Component => "component",
            OperationKind::ComponentUpdate => "component update",
            OperationKind::ComponentTags => "component tags",
            OperationKind::Rule => "rule",
            OperationKind::Deployment => "deployment",
            OperationKind::AutoDeployment => "auto deployment",
        };
        f.write_str(name)
    }
}

/// Method, path and JSON body of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

fn selector(name: &str) -> Value {
    json!({ "name": name, "caseSensitive": false })
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::CreateTeam { .. } => OperationKind::Team,
            Operation::LinkTeamTags { .. } => OperationKind::TeamAutoLink,
            Operation::AddTeamMember { .. } => OperationKind::MemberAdd,
            Operation::RemoveTeamMember { .. } => OperationKind::MemberRemove,
            Operation::CreateApplication(_) => OperationKind::Application,
            Operation::UpdateApplication { .. } => OperationKind::ApplicationUpdate,
            Operation::UpdateApplicationTags { .. } => OperationKind::ApplicationTags,
            Operation::CreateComponent(_) => OperationKind::Component,
            Operation::UpdateComponent { .. } => OperationKind::ComponentUpdate,
            Operation::UpdateComponentTags { .. } => OperationKind::ComponentTags,
            Operation::CreateRule(_) => OperationKind::Rule,
            Operation::DeployApplication { .. } => OperationKind::Deployment,
            Operation::AutoDeploy { .. } => OperationKind::AutoDeployment,
        }
    }

    /// Whether a response status means the write was already in place.
    pub fn is_conflict(&self, status: u16) -> bool {
        match self {
            Operation::RemoveTeamMember { .. } => status == 409 || status == 404,
            _ => status == 409,
        }
    }

    pub fn request(&self) -> WriteRequest {
        let (method, path, body) = match self {
            Operation::CreateTeam { name } => (
                Method::POST,
                "/v1/teams".to_string(),
                Some(json!({ "name": name, "type": "GENERAL" })),
            ),
            Operation::LinkTeamTags {
                team_id,
                team_name,
                target,
            } => (
                Method::POST,
                format!("/v1/teams/{}/{}/auto-link/tags", team_id, target.segment()),
                Some(json!({
                    "match": "ANY",
                    "tags": [{ "key": crate::model::tag::PTEAM_KEY, "value": team_name }],
                })),
            ),
            Operation::AddTeamMember { team_id, email, .. } => (
                Method::PUT,
                format!("/v1/teams/{}/users", team_id),
                Some(json!({ "users": [{ "email": email }] })),
            ),
            Operation::RemoveTeamMember { team_id, email, .. } => (
                Method::DELETE,
                format!("/v1/teams/{}/users/{}", team_id, email),
                None,
            ),
            Operation::CreateApplication(app) => {
                let mut body = json!({
                    "name": app.name,
                    "type": app.entity_type.as_str(),
                    "criticality": app.criticality,
                    "tags": app.tags,
                });
                if let Some(sub_type) = &app.sub_type {
                    body["subType"] = json!(sub_type);
                }
                if let Some(owner) = &app.owner {
                    body["owner"] = json!({ "email": owner });
                }
                (Method::POST, "/v1/applications".to_string(), Some(body))
            }
            Operation::UpdateApplication {
                id,
                criticality,
                owner,
                ..
            } => {
                let mut body = json!({});
                if let Some(criticality) = criticality {
                    body["criticality"] = json!(criticality);
                }
                if let Some(owner) = owner {
                    body["owner"] = json!({ "email": owner });
                }
                (Method::PATCH, format!("/v1/applications/{}", id), Some(body))
            }
            Operation::UpdateApplicationTags {
                id, action, tags, ..
            } => match action {
                TagAction::Add => (
                    Method::PUT,
                    format!("/v1/applications/{}/tags", id),
                    Some(json!({ "tags": tags })),
                ),
                TagAction::Delete => (
                    Method::PATCH,
                    format!("/v1/applications/{}/tags", id),
                    Some(json!({ "action": "delete", "tags": tags })),
                ),
            },
            Operation::CreateComponent(component) => (
                Method::POST,
                "/v1/components".to_string(),
                Some(json!({
                    "applicationSelector": selector(&component.application),
                    "name": component.name,
                    "criticality": component.criticality,
                    "tags": component.tags,
                })),
            ),
            Operation::UpdateComponent {
                id, criticality, ..
            } => (
                Method::PATCH,
                format!("/v1/components/{}", id),
                Some(json!({ "criticality": criticality })),
            ),
            Operation::UpdateComponentTags {
                id, action, tags, ..
            } => {
                let action = match action {
                    TagAction::Add => "add",
                    TagAction::Delete => "delete",
                };
                (
                    Method::PATCH,
                    format!("/v1/components/{}/tags", id),
                    Some(json!({ "action": action, "tags": tags })),
                )
            }
            Operation::CreateRule(payload) => (
                Method::POST,
                "/v1/components/rules".to_string(),
                Some(json!({
                    "selector": {
                        "applicationSelector": selector(&payload.application),
                        "componentSelector": selector(&payload.component),
                    },
                    "rules": [payload.rule],
                })),
            ),
            Operation::DeployApplication {
                application_id,
                selector: service,
                ..
            } => {
                let service_selector = match service {
                    ServiceSelector::Name(name) => selector(name),
                    ServiceSelector::Tag(tag) => json!({ "tags": [tag] }),
                };
                (
                    Method::PATCH,
                    format!("/v1/applications/{}/deploy", application_id),
                    Some(json!({ "serviceSelector": service_selector })),
                )
            }
            Operation::AutoDeploy {
                application,
                service,
            } => (
                Method::PATCH,
                "/v1/applications/deploy".to_string(),
                Some(json!({
                    "applicationSelector": selector(application),
                    "serviceSelector": selector(service),
                })),
            ),
        };

        WriteRequest { method, path, body }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateTeam { name } => write!(f, "create team '{}'", name),
            Operation::LinkTeamTags {
                team_name, target, ..
            } => write!(
                f,
                "auto-link {} tagged pteam:{} to team '{}'",
                target.segment(),
                team_name,
                team_name
            ),
            Operation::AddTeamMember {
                team_name, email, ..
            } => write!(f, "add {} to team '{}'", email, team_name),
            Operation::RemoveTeamMember {
                team_name, email, ..
            } => write!(f, "remove {} from team '{}'", email, team_name),
            Operation::CreateApplication(app) => write!(
                f,
                "create {} '{}'",
                app.entity_type.as_str().to_lowercase(),
                app.name
            ),
            Operation::UpdateApplication {
                name,
                criticality,
                owner,
                ..
            } => {
                write!(f, "update '{}'", name)?;
                if let Some(criticality) = criticality {
                    write!(f, " criticality={}", criticality)?;
                }
                if let Some(owner) = owner {
                    write!(f, " owner={}", owner)?;
                }
                Ok(())
            }
            Operation::UpdateApplicationTags {
                name, action, tags, ..
            }
            | Operation::UpdateComponentTags {
                name, action, tags, ..
            } => {
                let verb = match action {
                    TagAction::Add => "add",
                    TagAction::Delete => "remove",
                };
                let list: Vec<String> = tags
                    .iter()
                    .map(|t| format!("{}:{}", t.key, t.value))
                    .collect();
                write!(f, "{} tags [{}] on '{}'", verb, list.join(", "), name)
            }
            Operation::CreateComponent(component) => write!(
                f,
                "create component '{}' in '{}'",
                component.name, component.application
            ),
            Operation::UpdateComponent {
                name, criticality, ..
            } => write!(f, "update component '{}' criticality={}", name, criticality),
            Operation::CreateRule(payload) => write!(
                f,
                "create rule '{}' for '{}' in '{}'",
                payload.rule.name, payload.component, payload.application
            ),
            Operation::DeployApplication {
                application_name,
                selector,
                ..
            } => write!(f, "deploy '{}' to {}", application_name, selector),
            Operation::AutoDeploy {
                application,
                service,
            } => write!(f, "deploy '{}' to service '{}'", application, service),
        }
    }
}
