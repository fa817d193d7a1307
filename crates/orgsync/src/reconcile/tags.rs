//! Tag set reconciliation.
//!
//! Each tag key is either single-valued (one value per entity, matched by
//! key), multi-valued (matched by key and value) or unmanaged (only ever
//! added). The diff is computed from the freshly read remote tags every run.

use crate::model::tag::{PTEAM_KEY, SINGLE_VALUED_KEYS};
use crate::model::Tag;
use crate::platform::RemoteTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Single,
    Multi,
    Unmanaged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPolicy {
    single: Vec<String>,
    multi: Vec<String>,
}

impl Default for TagPolicy {
    fn default() -> Self {
        Self {
            single: SINGLE_VALUED_KEYS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            multi: vec![PTEAM_KEY.to_string()],
        }
    }
}

impl TagPolicy {
    pub fn kind(&self, key: &str) -> KeyKind {
        if self.single.iter().any(|k| k == key) {
            KeyKind::Single
        } else if self.multi.iter().any(|k| k == key) {
            KeyKind::Multi
        } else {
            KeyKind::Unmanaged
        }
    }

    fn managed_keys(&self) -> impl Iterator<Item = &str> {
        self.single.iter().chain(self.multi.iter()).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    pub to_add: Vec<Tag>,
    /// Remote tags to delete, all carrying an id.
    pub to_remove: Vec<RemoteTag>,
    /// Tags that should go but have no id to delete them by.
    pub unremovable: Vec<RemoteTag>,
}

impl TagDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty() && self.unremovable.is_empty()
    }
}

/// Computes additions and removals that turn `remote` into `desired`.
pub fn diff_tags(remote: &[RemoteTag], desired: &[Tag], policy: &TagPolicy) -> TagDiff {
    let mut diff = TagDiff::default();
    let mut removals: Vec<&RemoteTag> = Vec::new();

    for key in policy.managed_keys() {
        let wanted: Vec<&str> = match policy.kind(key) {
            // First declaration of a single-valued key wins.
            KeyKind::Single => desired
                .iter()
                .find(|t| t.key == key)
                .map(|t| vec![t.value.as_str()])
                .unwrap_or_default(),
            _ => desired
                .iter()
                .filter(|t| t.key == key)
                .map(|t| t.value.as_str())
                .collect(),
        };

        for tag in remote.iter().filter(|t| t.key == key) {
            if !wanted.contains(&tag.value.as_str()) {
                removals.push(tag);
            }
        }

        for value in wanted {
            let present = remote.iter().any(|t| t.key == key && t.value == value);
            let tag = Tag::new(key, value);
            if !present && !diff.to_add.contains(&tag) {
                diff.to_add.push(tag);
            }
        }
    }

    for tag in desired
        .iter()
        .filter(|t| policy.kind(&t.key) == KeyKind::Unmanaged)
    {
        let present = remote.iter().any(|r| r.matches(tag));
        if !present && !diff.to_add.contains(tag) {
            diff.to_add.push(tag.clone());
        }
    }

    for tag in removals {
        if tag.id.is_some() {
            diff.to_remove.push(tag.clone());
        } else {
            diff.unremovable.push(tag.clone());
        }
    }

    diff
}
