//! Declared ways of attributing discovered assets to a component or service.
//!
//! Values are kept as declared; validation (tag syntax, CIDR parsing) happens
//! when rules are synthesized so a bad entry only costs its own rule.

use crate::config::schema::{AssociationEntry, MultiConditionEntry};

/// Simple associations, each compiled to its own rule(s).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Associations {
    pub repositories: Vec<String>,
    pub search_name: Option<String>,
    /// Raw `"key:value"` strings.
    pub tag_rules: Vec<String>,
    /// Raw comma-separated CIDR list.
    pub cidr: Option<String>,
    pub fqdn: Vec<String>,
    pub netbios: Vec<String>,
    pub os_names: Vec<String>,
    pub hostnames: Vec<String>,
    pub provider_account_id: Vec<String>,
    pub provider_account_name: Vec<String>,
    pub resource_group: Vec<String>,
    pub asset_type: Option<String>,
    pub multi_conditions: Vec<MultiCondition>,
}

/// A composite association: every populated field lands in one filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiCondition {
    pub search_name: Option<String>,
    pub repositories: Vec<String>,
    /// Raw `"key:value"` strings.
    pub tags: Vec<String>,
    pub cidr: Option<String>,
    pub fqdn: Vec<String>,
    pub netbios: Vec<String>,
    pub os_names: Vec<String>,
    pub hostnames: Vec<String>,
    pub provider_account_id: Vec<String>,
    pub provider_account_name: Vec<String>,
    pub resource_group: Vec<String>,
    pub asset_type: Option<String>,
}

impl From<&AssociationEntry> for Associations {
    fn from(entry: &AssociationEntry) -> Self {
        let multi_conditions = entry
            .multi_condition_rule
            .iter()
            .chain(entry.multi_condition_rules.iter())
            .map(MultiCondition::from)
            .collect();

        Self {
            repositories: entry.repository_name.clone(),
            search_name: entry.search_name.clone(),
            tag_rules: entry.tag_rule.clone(),
            cidr: entry.cidr.clone(),
            fqdn: entry.fqdn.clone(),
            netbios: entry.netbios.clone(),
            os_names: entry.os_names.clone(),
            hostnames: entry.hostnames.clone(),
            provider_account_id: entry.provider_account_id.clone(),
            provider_account_name: entry.provider_account_name.clone(),
            resource_group: entry.resource_group.clone(),
            asset_type: entry.asset_type.clone(),
            multi_conditions,
        }
    }
}

impl From<&MultiConditionEntry> for MultiCondition {
    fn from(entry: &MultiConditionEntry) -> Self {
        Self {
            search_name: entry.search_name.clone(),
            repositories: entry.repository_name.clone(),
            tags: entry.tags.clone(),
            cidr: entry.cidr.clone(),
            fqdn: entry.fqdn.clone(),
            netbios: entry.netbios.clone(),
            os_names: entry.os_names.clone(),
            hostnames: entry.hostnames.clone(),
            provider_account_id: entry.provider_account_id.clone(),
            provider_account_name: entry.provider_account_name.clone(),
            resource_group: entry.resource_group.clone(),
            asset_type: entry.asset_type.clone(),
        }
    }
}
