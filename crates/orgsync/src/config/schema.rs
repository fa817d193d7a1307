//! Raw document shapes for the resource directory.
//!
//! These mirror the YAML exactly (PascalCase keys, strings-or-lists, tiers as
//! numbers or strings). Defaults and normalisation happen later, when the
//! desired-state model is built from them.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// `core-structure.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CoreStructure {
    #[serde(default, deserialize_with = "nullable_vec")]
    pub deployment_groups: Vec<DeploymentGroup>,

    #[serde(
        rename = "Environment Groups",
        alias = "EnvironmentGroups",
        default,
        deserialize_with = "nullable_vec"
    )]
    pub environment_groups: Vec<EnvironmentGroup>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub all_access_accounts: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub all_access_teams: Vec<String>,

    #[serde(default)]
    pub third_party_services: Option<ThirdPartyGroup>,

    #[serde(default, deserialize_with = "nullable_map")]
    pub name_aliases: BTreeMap<String, String>,
}

/// One application declaration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeploymentGroup {
    #[serde(default, deserialize_with = "optional_scalar")]
    pub app_name: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub tier: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub domain: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub sub_domain: Option<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub team_names: Vec<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub responsable: Option<String>,

    #[serde(rename = "Deployment_set", default, deserialize_with = "optional_scalar")]
    pub deployment_set: Option<String>,

    #[serde(rename = "Deployment_tag", default, deserialize_with = "optional_scalar")]
    pub deployment_tag: Option<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub tags: Vec<String>,

    #[serde(default, deserialize_with = "nullable_vec")]
    pub components: Vec<ComponentEntry>,

    #[serde(default, deserialize_with = "nullable_vec")]
    pub build_definitions: Vec<BuildDefinition>,
}

/// A repository built by a pipeline, shorthand for a repository-backed component.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuildDefinition {
    #[serde(default, deserialize_with = "optional_scalar")]
    pub build_definition_name: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub repository_name: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub domain: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub sub_domain: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub tier: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub team_name: Option<String>,
}

/// One environment declaration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EnvironmentGroup {
    #[serde(default, deserialize_with = "optional_scalar")]
    pub name: Option<String>,

    #[serde(rename = "Type", default, deserialize_with = "optional_scalar")]
    pub env_type: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub tier: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub responsable: Option<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub team_name: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub team_names: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub tags: Vec<String>,

    #[serde(default, deserialize_with = "nullable_vec")]
    pub services: Vec<ComponentEntry>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub cloud_accounts: Vec<String>,
}

/// A component (under an application) or a service (under an environment).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComponentEntry {
    #[serde(alias = "Service", default, deserialize_with = "optional_scalar")]
    pub component_name: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub status: Option<String>,

    #[serde(rename = "Type", default, deserialize_with = "optional_scalar")]
    pub component_type: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub tier: Option<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub team_name: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub team_names: Vec<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub domain: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub sub_domain: Option<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub tags: Vec<String>,

    #[serde(rename = "Deployment_set", default, deserialize_with = "optional_scalar")]
    pub deployment_set: Option<String>,

    #[serde(flatten)]
    pub associations: AssociationEntry,
}

/// Association keys shared by components and services.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssociationEntry {
    #[serde(default, deserialize_with = "one_or_many")]
    pub repository_name: Vec<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub search_name: Option<String>,

    #[serde(rename = "Tag_rule", default, deserialize_with = "one_or_many")]
    pub tag_rule: Vec<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub cidr: Option<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub fqdn: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub netbios: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub os_names: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub hostnames: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub provider_account_id: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub provider_account_name: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub resource_group: Vec<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub asset_type: Option<String>,

    #[serde(default)]
    pub multi_condition_rule: Option<MultiConditionEntry>,

    #[serde(default, deserialize_with = "nullable_vec")]
    pub multi_condition_rules: Vec<MultiConditionEntry>,
}

/// A composite rule: every populated key lands in the same filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MultiConditionEntry {
    #[serde(default, deserialize_with = "optional_scalar")]
    pub search_name: Option<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub repository_name: Vec<String>,

    #[serde(alias = "Tag_rule", default, deserialize_with = "one_or_many")]
    pub tags: Vec<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub cidr: Option<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub fqdn: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub netbios: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub os_names: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub hostnames: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub provider_account_id: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub provider_account_name: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub resource_group: Vec<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub asset_type: Option<String>,
}

/// Stub services for SaaS products that have no deployment pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ThirdPartyGroup {
    #[serde(default, deserialize_with = "optional_scalar")]
    pub environment: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub domain: Option<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub services: Vec<String>,
}

/// One file under `Teams/`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TeamFile {
    #[serde(default, deserialize_with = "optional_scalar")]
    pub team_name: Option<String>,

    #[serde(default, deserialize_with = "nullable_vec")]
    pub team_members: Vec<TeamMemberEntry>,

    #[serde(default)]
    pub recreate_team_associations: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TeamMemberEntry {
    #[serde(default, deserialize_with = "optional_scalar")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub email_address: Option<String>,
}

/// `hives.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HivesFile {
    #[serde(default, deserialize_with = "optional_scalar")]
    pub email_domain: Option<String>,

    #[serde(default, deserialize_with = "nullable_vec")]
    pub hives: Vec<HiveEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HiveEntry {
    #[serde(default, deserialize_with = "optional_scalar")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "nullable_vec")]
    pub teams: Vec<HiveTeamEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HiveTeamEntry {
    #[serde(default, deserialize_with = "optional_scalar")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub lead: Option<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub product: Option<String>,
}

// ============================================================================
// Lenient scalar helpers
// ============================================================================

/// Any YAML scalar, kept as text (tiers and account ids are often numbers).
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl From<Scalar> for String {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Text(s) => s,
            Scalar::Integer(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(Scalar),
    Many(Vec<Scalar>),
}

/// Scalar as trimmed text; blank or null becomes `None`.
fn optional_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(value
        .map(String::from)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// A scalar or a list of scalars; blanks are dropped.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![String::from(s)],
        Some(OneOrMany::Many(v)) => v.into_iter().map(String::from).collect(),
    };
    Ok(values
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_accepts_number_or_string() {
        let yaml = r#"
DeploymentGroups:
  - AppName: Payments
    Tier: 2
  - AppName: Ledger
    Tier: "3"
"#;
        let core: CoreStructure = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(core.deployment_groups[0].tier.as_deref(), Some("2"));
        assert_eq!(core.deployment_groups[1].tier.as_deref(), Some("3"));
    }

    #[test]
    fn test_one_or_many_and_nulls() {
        let yaml = r#"
DeploymentGroups:
  - AppName: Payments
    TeamNames: falcon
    Components:
  - AppName: Ledger
    TeamNames: [owl, "", hawk]
AllAccessAccounts:
"#;
        let core: CoreStructure = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(core.deployment_groups[0].team_names, vec!["falcon"]);
        assert!(core.deployment_groups[0].components.is_empty());
        assert_eq!(core.deployment_groups[1].team_names, vec!["owl", "hawk"]);
        assert!(core.all_access_accounts.is_empty());
    }

    #[test]
    fn test_service_alias_and_flattened_associations() {
        let yaml = r#"
Environment Groups:
  - Name: Production
    Type: CLOUD
    Services:
      - Service: Compute
        Cidr: "10.0.0.1, 10.0.0.0/24"
        ProviderAccountId: 123456789012
        Tag_rule: "env:prod"
        MultiConditionRule:
          SearchName: compute
          Tags: ["team:core"]
"#;
        let core: CoreStructure = serde_yaml::from_str(yaml).unwrap();
        let env = &core.environment_groups[0];
        assert_eq!(env.env_type.as_deref(), Some("CLOUD"));

        let service = &env.services[0];
        assert_eq!(service.component_name.as_deref(), Some("Compute"));
        assert_eq!(
            service.associations.cidr.as_deref(),
            Some("10.0.0.1, 10.0.0.0/24")
        );
        assert_eq!(
            service.associations.provider_account_id,
            vec!["123456789012"]
        );
        assert_eq!(service.associations.tag_rule, vec!["env:prod"]);

        let multi = service.associations.multi_condition_rule.as_ref().unwrap();
        assert_eq!(multi.search_name.as_deref(), Some("compute"));
        assert_eq!(multi.tags, vec!["team:core"]);
    }

    #[test]
    fn test_team_file() {
        let yaml = r#"
TeamName: falcon
RecreateTeamAssociations: false
TeamMembers:
  - Name: Jane Doe
    EmailAddress: jane.doe@example.com
"#;
        let team: TeamFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(team.team_name.as_deref(), Some("falcon"));
        assert_eq!(team.recreate_team_associations, Some(false));
        assert_eq!(
            team.team_members[0].email_address.as_deref(),
            Some("jane.doe@example.com")
        );
    }
}
