//! Application to service deployment links.

use std::collections::HashSet;

use super::matching::{find_application, similar};
use crate::model::{Application, DesiredState, Tag};
use crate::platform::{EntityType, Operation, RemoteApplication, ServiceSelector};

/// Explicit links first, then similarity links not already covered.
pub fn plan_deployments(state: &DesiredState, remote: &[RemoteApplication]) -> Vec<Operation> {
    let services: Vec<(&str, Option<&str>)> = state
        .environments
        .iter()
        .flat_map(|env| env.services.iter())
        .map(|s| (s.name.as_str(), s.deployment_set.as_deref()))
        .collect();

    let mut operations = Vec::new();
    let mut covered: HashSet<(String, String)> = HashSet::new();

    for app in &state.applications {
        let sets = deployment_sets(app);
        let tag = app.deployment_tag.as_deref().and_then(|raw| match Tag::parse(raw) {
            Ok(tag) => Some(tag),
            Err(e) => {
                log::error!("Ignoring Deployment_tag of '{}': {}", app.name, e);
                None
            }
        });

        if sets.is_empty() && tag.is_none() {
            continue;
        }

        let Some(remote_app) = find_application(&app.name, EntityType::Application, remote) else {
            log::warn!(
                "Application '{}' not found on the platform, explicit deployments skipped",
                app.name
            );
            continue;
        };

        for (service, service_set) in &services {
            let matches = service_set
                .is_some_and(|set| sets.iter().any(|s| s.eq_ignore_ascii_case(set)));
            if matches && covered.insert(pair(&app.name, service)) {
                operations.push(Operation::DeployApplication {
                    application_id: remote_app.id.clone(),
                    application_name: app.name.clone(),
                    selector: ServiceSelector::Name(service.to_string()),
                });
            }
        }

        if let Some(tag) = tag {
            operations.push(Operation::DeployApplication {
                application_id: remote_app.id.clone(),
                application_name: app.name.clone(),
                selector: ServiceSelector::Tag(tag),
            });
        }
    }

    let mut seen_services: HashSet<String> = HashSet::new();
    let unique_services: Vec<&str> = services
        .iter()
        .map(|(name, _)| *name)
        .filter(|name| seen_services.insert(name.to_lowercase()))
        .collect();

    for app in &state.applications {
        for service in &unique_services {
            if similar(&app.name, service) && covered.insert(pair(&app.name, service)) {
                operations.push(Operation::AutoDeploy {
                    application: app.name.clone(),
                    service: service.to_string(),
                });
            }
        }
    }

    operations
}

fn deployment_sets(app: &Application) -> Vec<&str> {
    let mut sets: Vec<&str> = Vec::new();
    let declared = app
        .deployment_set
        .as_deref()
        .into_iter()
        .chain(app.components.iter().filter_map(|c| c.deployment_set.as_deref()));
    for set in declared {
        if !sets.iter().any(|s| s.eq_ignore_ascii_case(set)) {
            sets.push(set);
        }
    }
    sets
}

fn pair(application: &str, service: &str) -> (String, String) {
    (application.to_lowercase(), service.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Component, Criticality, Environment};

    fn app(name: &str, set: Option<&str>, tag: Option<&str>) -> Application {
        Application {
            name: name.into(),
            criticality: Criticality::DEFAULT,
            owner: None,
            status: None,
            domain: None,
            subdomain: None,
            teams: vec![],
            tags: vec![],
            deployment_set: set.map(String::from),
            deployment_tag: tag.map(String::from),
            components: vec![],
        }
    }

    fn service(name: &str, set: Option<&str>) -> Component {
        let mut s = Component::named(name);
        s.deployment_set = set.map(String::from);
        s
    }

    fn environment(services: Vec<Component>) -> Environment {
        Environment {
            name: "Production".into(),
            env_type: Some("CLOUD".into()),
            criticality: Criticality::DEFAULT,
            owner: None,
            status: None,
            teams: vec![],
            tags: vec![],
            services,
            cloud_accounts: vec![],
        }
    }

    fn remote_app(id: &str, name: &str) -> RemoteApplication {
        RemoteApplication {
            id: id.into(),
            name: name.into(),
            entity_type: EntityType::Application,
            criticality: None,
            owner: None,
            tags: vec![],
        }
    }

    #[test]
    fn test_explicit_before_automatic_without_duplicates() {
        let state = DesiredState {
            applications: vec![app("Payments", Some("PAY"), None), app("Ledger", None, None)],
            environments: vec![environment(vec![
                service("payments", Some("pay")),
                service("LEDGER", None),
                service("Treasury", None),
            ])],
            ..Default::default()
        };
        let remote = vec![remote_app("a1", "Payments"), remote_app("a2", "Ledger")];

        let operations = plan_deployments(&state, &remote);
        assert_eq!(
            operations,
            vec![
                Operation::DeployApplication {
                    application_id: "a1".into(),
                    application_name: "Payments".into(),
                    selector: ServiceSelector::Name("payments".into()),
                },
                Operation::AutoDeploy {
                    application: "Ledger".into(),
                    service: "LEDGER".into(),
                },
            ]
        );
    }

    #[test]
    fn test_deployment_tag() {
        let state = DesiredState {
            applications: vec![
                app("Payments", None, Some("deploy:payments")),
                app("Broken", None, Some("nocolon")),
            ],
            ..Default::default()
        };
        let remote = vec![remote_app("a1", "Payments"), remote_app("a2", "Broken")];

        let operations = plan_deployments(&state, &remote);
        assert_eq!(
            operations,
            vec![Operation::DeployApplication {
                application_id: "a1".into(),
                application_name: "Payments".into(),
                selector: ServiceSelector::Tag(Tag::new("deploy", "payments")),
            }]
        );
    }

    #[test]
    fn test_every_similar_service_is_linked() {
        let state = DesiredState {
            applications: vec![app("Payments Gateway", None, None)],
            environments: vec![
                environment(vec![service("Payments Gateways", None)]),
                environment(vec![
                    service("Payments Gateway", None),
                    service("payments gateways", None),
                ]),
            ],
            ..Default::default()
        };

        let operations = plan_deployments(&state, &[]);
        assert_eq!(operations.len(), 2);
    }
}
