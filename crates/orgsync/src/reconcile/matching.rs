//! Existence checks against remote snapshots, and fuzzy name similarity.

use crate::platform::{EntityType, RemoteApplication, RemoteComponent, RemoteTeam};

/// Minimum normalized similarity (0..=1) for two names to be linked.
pub const SIMILARITY_THRESHOLD: f64 = 0.9;

pub fn find_team<'a>(name: &str, remote: &'a [RemoteTeam]) -> Option<&'a RemoteTeam> {
    remote.iter().find(|t| t.name == name)
}

/// Exact, case-sensitive name plus exact type.
pub fn find_application<'a>(
    name: &str,
    entity_type: EntityType,
    remote: &'a [RemoteApplication],
) -> Option<&'a RemoteApplication> {
    remote
        .iter()
        .find(|a| a.entity_type == entity_type && a.name == name)
}

/// Exact, case-sensitive name within one application or environment.
pub fn find_component<'a>(
    name: &str,
    application_id: &str,
    remote: &'a [RemoteComponent],
) -> Option<&'a RemoteComponent> {
    remote
        .iter()
        .find(|c| c.application_id.as_deref() == Some(application_id) && c.name == name)
}

/// Normalized Levenshtein similarity of the lower-cased names.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// Case-insensitive equality, or similarity above [`SIMILARITY_THRESHOLD`].
pub fn similar(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase() || similarity(a, b) > SIMILARITY_THRESHOLD
}
