use super::association::Associations;
use super::criticality::Criticality;
use super::tag::{
    Tag, DOMAIN_KEY, PTEAM_KEY, SINGLE_VALUED_KEYS, STATUS_KEY, SUBDOMAIN_KEY, TYPE_KEY,
};

/// Environment sub-type whose services receive cloud asset rules.
pub const CLOUD_ENVIRONMENT_TYPE: &str = "CLOUD";

/// A team and its declared members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub name: String,
    /// Member emails as declared.
    pub members: Vec<String>,
    /// Whether auto-link rules are re-asserted for a team that already exists.
    pub recreate_associations: bool,
}

/// Leadership roster attached to one team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hive {
    pub team: String,
    pub lead: Option<String>,
    pub product_owners: Vec<String>,
}

impl Hive {
    pub fn emails(&self) -> impl Iterator<Item = &str> {
        self.lead
            .iter()
            .chain(self.product_owners.iter())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub name: String,
    pub criticality: Criticality,
    pub owner: Option<String>,
    pub status: Option<String>,
    pub domain: Option<String>,
    pub subdomain: Option<String>,
    pub teams: Vec<String>,
    pub tags: Vec<Tag>,
    pub deployment_set: Option<String>,
    /// Raw `"key:value"` selector for explicit deployments.
    pub deployment_tag: Option<String>,
    pub components: Vec<Component>,
}

impl Application {
    pub fn desired_tags(&self) -> Vec<Tag> {
        let mut tags = Vec::new();
        push_opt(&mut tags, STATUS_KEY, &self.status);
        push_opt(&mut tags, DOMAIN_KEY, &self.domain);
        push_opt(&mut tags, SUBDOMAIN_KEY, &self.subdomain);
        push_teams(&mut tags, &self.teams);
        push_extra(&mut tags, &self.tags, &self.name);
        tags
    }

    /// Name of the cloud service this application's assets live under.
    pub fn cloud_service_name(&self) -> &str {
        self.subdomain.as_deref().unwrap_or(&self.name)
    }

    /// Build definitions paired with the cloud service their assets belong to.
    pub fn pipelines(&self) -> impl Iterator<Item = (&str, &str)> {
        self.components.iter().filter_map(move |c| {
            let service = c.subdomain.as_deref().unwrap_or(self.cloud_service_name());
            c.pipeline.as_deref().map(|p| (service, p))
        })
    }

    /// Every repository declared by the application's components.
    pub fn repositories(&self) -> impl Iterator<Item = &str> {
        self.components
            .iter()
            .flat_map(|c| c.associations.repositories.iter())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub name: String,
    /// Platform sub-type, e.g. `CLOUD` or `INFRA`.
    pub env_type: Option<String>,
    pub criticality: Criticality,
    pub owner: Option<String>,
    pub status: Option<String>,
    pub teams: Vec<String>,
    pub tags: Vec<Tag>,
    pub services: Vec<Component>,
    /// Provider account ids that scope pipeline-tag rules.
    pub cloud_accounts: Vec<String>,
}

impl Environment {
    pub fn desired_tags(&self) -> Vec<Tag> {
        let mut tags = Vec::new();
        push_opt(&mut tags, STATUS_KEY, &self.status);
        push_teams(&mut tags, &self.teams);
        push_extra(&mut tags, &self.tags, &self.name);
        tags
    }

    pub fn is_cloud(&self) -> bool {
        self.env_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(CLOUD_ENVIRONMENT_TYPE))
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.services.iter().any(|s| s.name == name)
    }
}

/// A component of an application, or a service of an environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    pub criticality: Criticality,
    pub status: Option<String>,
    pub component_type: Option<String>,
    pub domain: Option<String>,
    pub subdomain: Option<String>,
    pub teams: Vec<String>,
    pub tags: Vec<Tag>,
    pub associations: Associations,
    pub deployment_set: Option<String>,
    /// Build definition this component came from.
    pub pipeline: Option<String>,
}

impl Component {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            criticality: Criticality::DEFAULT,
            status: None,
            component_type: None,
            domain: None,
            subdomain: None,
            teams: Vec::new(),
            tags: Vec::new(),
            associations: Associations::default(),
            deployment_set: None,
            pipeline: None,
        }
    }

    pub fn desired_tags(&self) -> Vec<Tag> {
        let mut tags = Vec::new();
        push_opt(&mut tags, STATUS_KEY, &self.status);
        push_opt(&mut tags, TYPE_KEY, &self.component_type);
        push_opt(&mut tags, DOMAIN_KEY, &self.domain);
        push_opt(&mut tags, SUBDOMAIN_KEY, &self.subdomain);
        push_teams(&mut tags, &self.teams);
        push_extra(&mut tags, &self.tags, &self.name);
        tags
    }
}

/// SaaS products tracked as stub services in one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThirdPartyServices {
    pub environment: String,
    pub domain: String,
    pub services: Vec<String>,
}

fn push_opt(tags: &mut Vec<Tag>, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        tags.push(Tag::new(key, value.clone()));
    }
}

fn push_teams(tags: &mut Vec<Tag>, teams: &[String]) {
    for team in teams {
        let tag = Tag::new(PTEAM_KEY, team.clone());
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
}

/// Free-form tags never override or duplicate a single-valued key.
fn push_extra(tags: &mut Vec<Tag>, extra: &[Tag], owner: &str) {
    for tag in extra {
        if tags.contains(tag) {
            continue;
        }
        let single = SINGLE_VALUED_KEYS.contains(&tag.key.as_str());
        if let Some(kept) = tags.iter().find(|t| single && t.key == tag.key) {
            log::warn!(
                "'{}': tag {} ignored, {} already set to '{}'",
                owner,
                tag,
                kept.key,
                kept.value
            );
            continue;
        }
        tags.push(tag.clone());
    }
}
