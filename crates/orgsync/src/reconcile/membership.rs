//! Team membership convergence, a set reconciliation redone every run.

use crate::model::{DesiredState, Team};
use crate::platform::RemoteMember;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipPlan {
    pub to_add: Vec<String>,
    pub to_remove: Vec<String>,
}

/// Declared members, all-access accounts and the team's hive roster.
/// Emails are deduplicated case-insensitively, first spelling kept.
pub fn desired_members(team: &Team, state: &DesiredState) -> Vec<String> {
    let mut members: Vec<String> = Vec::new();
    let candidates = team
        .members
        .iter()
        .map(String::as_str)
        .chain(state.all_access.iter().map(String::as_str))
        .chain(state.hives_for(&team.name).flat_map(|h| h.emails()));

    for email in candidates {
        if !contains_email(&members, email) {
            members.push(email.to_string());
        }
    }
    members
}

/// Remote members outside `desired` are removed, missing ones added.
pub fn plan(remote: &[RemoteMember], desired: &[String]) -> MembershipPlan {
    let to_remove = remote
        .iter()
        .filter(|m| !contains_email(desired, &m.email))
        .map(|m| m.email.clone())
        .collect();

    let to_add = desired
        .iter()
        .filter(|email| !remote.iter().any(|m| m.email.eq_ignore_ascii_case(email)))
        .cloned()
        .collect();

    MembershipPlan { to_add, to_remove }
}

fn contains_email(list: &[String], email: &str) -> bool {
    list.iter().any(|e| e.eq_ignore_ascii_case(email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Hive;

    fn members(emails: &[&str]) -> Vec<RemoteMember> {
        emails
            .iter()
            .map(|e| RemoteMember {
                email: e.to_string(),
            })
            .collect()
    }

    fn strings(emails: &[&str]) -> Vec<String> {
        emails.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_plan_converges_sets() {
        let remote = members(&["a@x.io", "b@x.io", "c@x.io"]);
        let plan = plan(&remote, &strings(&["a@x.io", "d@x.io"]));

        let mut removed = plan.to_remove.clone();
        removed.sort();
        assert_eq!(removed, vec!["b@x.io", "c@x.io"]);
        assert_eq!(plan.to_add, vec!["d@x.io"]);
    }

    #[test]
    fn test_plan_is_case_insensitive() {
        let remote = members(&["Jane.Doe@X.io"]);
        let plan = plan(&remote, &strings(&["jane.doe@x.io"]));
        assert_eq!(plan, MembershipPlan::default());
    }

    #[test]
    fn test_desired_members_union() {
        let team = Team {
            name: "falcon".into(),
            members: strings(&["a@x.io", "shared@x.io"]),
            recreate_associations: true,
        };
        let state = DesiredState {
            all_access: strings(&["SHARED@x.io", "boss@x.io"]),
            hives: vec![
                Hive {
                    team: "Falcon".into(),
                    lead: Some("lead@x.io".into()),
                    product_owners: strings(&["po@x.io"]),
                },
                Hive {
                    team: "owl".into(),
                    lead: Some("other@x.io".into()),
                    product_owners: vec![],
                },
            ],
            ..Default::default()
        };

        assert_eq!(
            desired_members(&team, &state),
            strings(&["a@x.io", "shared@x.io", "boss@x.io", "lead@x.io", "po@x.io"])
        );
    }
}
