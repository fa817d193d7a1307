//! Rule synthesis: declared associations to platform filter rules.
//!
//! Each simple association kind fills exactly one filter field. List-valued
//! kinds produce one rule per entry, so a conflict or rejection on one entry
//! never blocks its siblings. A multi-condition association produces a single
//! rule with every populated field, or nothing at all when none is populated.

use ipnetwork::IpNetwork;
use std::net::IpAddr;

use crate::model::{Associations, MultiCondition, Tag};
use crate::platform::{Rule, RuleFilter, RulePayload};

/// Tag that cloud assets carry naming the pipeline that deployed them.
pub const PIPELINE_TAG_KEY: &str = "pipeline";

/// An association entry that could not be turned into a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    pub component: String,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Synthesis {
    pub rules: Vec<RulePayload>,
    pub rejected: Vec<Rejected>,
}

/// Builds every rule for one component of `application`.
pub fn synthesize(application: &str, component: &str, associations: &Associations) -> Synthesis {
    let mut builder = SynthesisBuilder {
        application,
        component,
        out: Synthesis::default(),
    };

    for repository in &associations.repositories {
        builder.push(
            repository.clone(),
            RuleFilter {
                repository: vec![repository.clone()],
                ..Default::default()
            },
        );
    }

    if let Some(search) = &associations.search_name {
        builder.push(
            format!("search {}", search),
            RuleFilter {
                key_like: Some(search.clone()),
                ..Default::default()
            },
        );
    }

    for raw in &associations.tag_rules {
        match Tag::parse(raw) {
            Ok(tag) => builder.push(
                format!("tag {}", tag),
                RuleFilter {
                    tags: vec![tag],
                    ..Default::default()
                },
            ),
            Err(e) => builder.reject(raw, e.to_string()),
        }
    }

    if let Some(cidrs) = &associations.cidr {
        for entry in split_list(cidrs) {
            match normalize_cidr(entry) {
                Ok(cidr) => builder.push(
                    cidr.clone(),
                    RuleFilter {
                        cidr: Some(cidr),
                        ..Default::default()
                    },
                ),
                Err(reason) => builder.reject(entry, reason),
            }
        }
    }

    let list_kinds: [(&str, &Vec<String>, fn(String) -> RuleFilter); 7] = [
        ("fqdn", &associations.fqdn, |v| RuleFilter {
            fqdn: vec![v],
            ..Default::default()
        }),
        ("netbios", &associations.netbios, |v| RuleFilter {
            netbios: vec![v],
            ..Default::default()
        }),
        ("os", &associations.os_names, |v| RuleFilter {
            os_names: vec![v],
            ..Default::default()
        }),
        ("hostname", &associations.hostnames, |v| RuleFilter {
            hostnames: vec![v],
            ..Default::default()
        }),
        ("account", &associations.provider_account_id, |v| RuleFilter {
            provider_account_id: vec![v],
            ..Default::default()
        }),
        ("account name", &associations.provider_account_name, |v| {
            RuleFilter {
                provider_account_name: vec![v],
                ..Default::default()
            }
        }),
        ("resource group", &associations.resource_group, |v| RuleFilter {
            resource_group: vec![v],
            ..Default::default()
        }),
    ];

    for (label, values, filter) in list_kinds {
        for value in values {
            builder.push(format!("{} {}", label, value), filter(value.clone()));
        }
    }

    if let Some(asset_type) = &associations.asset_type {
        builder.push(
            format!("asset type {}", asset_type),
            RuleFilter {
                asset_type: Some(asset_type.clone()),
                ..Default::default()
            },
        );
    }

    for (index, condition) in associations.multi_conditions.iter().enumerate() {
        let filter = builder.multi_condition_filter(condition);
        if filter.is_empty() {
            log::debug!(
                "Multi-condition rule #{} of '{}' has no populated field, not sent",
                index + 1,
                component
            );
            continue;
        }
        builder.push(format!("{} multi-condition {}", component, index + 1), filter);
    }

    builder.out
}

/// The rule that ties cloud assets named after a repository to a service.
pub fn cloud_asset_rule(environment: &str, service: &str, repository: &str) -> RulePayload {
    RulePayload {
        application: environment.to_string(),
        component: service.to_string(),
        rule: Rule {
            name: repository.to_string(),
            filter: RuleFilter {
                key_like: Some(format!("*{}(*", repository)),
                ..Default::default()
            },
        },
    }
}

/// Binds cloud assets tagged with a build pipeline to a service, scoped to the
/// environment's provider accounts.
pub fn pipeline_rule(
    environment: &str,
    service: &str,
    pipeline: &str,
    accounts: &[String],
) -> RulePayload {
    RulePayload {
        application: environment.to_string(),
        component: service.to_string(),
        rule: Rule {
            name: format!("{} {}", PIPELINE_TAG_KEY, pipeline),
            filter: RuleFilter {
                tags: vec![Tag::new(PIPELINE_TAG_KEY, pipeline)],
                provider_account_id: accounts.to_vec(),
                ..Default::default()
            },
        },
    }
}

struct SynthesisBuilder<'a> {
    application: &'a str,
    component: &'a str,
    out: Synthesis,
}

impl SynthesisBuilder<'_> {
    fn push(&mut self, name: String, filter: RuleFilter) {
        self.out.rules.push(RulePayload {
            application: self.application.to_string(),
            component: self.component.to_string(),
            rule: Rule { name, filter },
        });
    }

    fn reject(&mut self, value: &str, reason: String) {
        log::error!(
            "Skipping rule for '{}' in '{}': {}",
            self.component,
            self.application,
            reason
        );
        self.out.rejected.push(Rejected {
            component: self.component.to_string(),
            value: value.to_string(),
            reason,
        });
    }

    /// Every populated field of the condition; invalid parts are rejected
    /// individually and left out.
    fn multi_condition_filter(&mut self, condition: &MultiCondition) -> RuleFilter {
        let mut tags = Vec::new();
        for raw in &condition.tags {
            match Tag::parse(raw) {
                Ok(tag) => tags.push(tag),
                Err(e) => self.reject(raw, e.to_string()),
            }
        }

        let cidr = match condition.cidr.as_deref() {
            Some(raw) if raw.contains(',') => {
                let reason = format!(
                    "'{}' is a list; a multi-condition takes a single CIDR block",
                    raw
                );
                self.reject(raw, reason);
                None
            }
            Some(raw) => match normalize_cidr(raw.trim()) {
                Ok(cidr) => Some(cidr),
                Err(reason) => {
                    self.reject(raw, reason);
                    None
                }
            },
            None => None,
        };

        RuleFilter {
            key_like: condition.search_name.clone(),
            repository: condition.repositories.clone(),
            tags,
            cidr,
            fqdn: condition.fqdn.clone(),
            netbios: condition.netbios.clone(),
            os_names: condition.os_names.clone(),
            hostnames: condition.hostnames.clone(),
            provider_account_id: condition.provider_account_id.clone(),
            provider_account_name: condition.provider_account_name.clone(),
            resource_group: condition.resource_group.clone(),
            asset_type: condition.asset_type.clone(),
        }
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Bare addresses get a host mask (/32 or /128); prefixed blocks are kept as written.
pub fn normalize_cidr(entry: &str) -> Result<String, String> {
    let candidate = if entry.contains('/') {
        entry.to_string()
    } else {
        match entry.parse::<IpAddr>() {
            Ok(IpAddr::V4(_)) => format!("{}/32", entry),
            Ok(IpAddr::V6(_)) => format!("{}/128", entry),
            Err(_) => return Err(format!("'{}' is not an IP address or CIDR block", entry)),
        }
    };

    candidate
        .parse::<IpNetwork>()
        .map(|_| candidate.clone())
        .map_err(|e| format!("'{}' is not a valid CIDR block: {}", entry, e))
}
