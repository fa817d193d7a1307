//! Entities as the platform returns them.

use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{Criticality, Tag};

/// Application and environment share one remote entity, discriminated by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Application,
    Environment,
    #[serde(other)]
    Other,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Application => "APPLICATION",
            EntityType::Environment => "ENVIRONMENT",
            EntityType::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteTeam {
    #[serde(deserialize_with = "id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteMember {
    pub email: String,
}

/// A persisted tag. Removal needs the id; additions are sent without one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteTag {
    #[serde(default, deserialize_with = "optional_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub key: String,
    pub value: String,
}

impl RemoteTag {
    pub fn matches(&self, tag: &Tag) -> bool {
        self.key == tag.key && self.value == tag.value
    }
}

impl From<Tag> for RemoteTag {
    fn from(tag: Tag) -> Self {
        Self {
            id: None,
            key: tag.key,
            value: tag.value,
        }
    }
}

impl From<&RemoteTag> for Tag {
    fn from(tag: &RemoteTag) -> Self {
        Tag::new(tag.key.clone(), tag.value.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct RemoteOwner {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteApplication {
    #[serde(deserialize_with = "id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(default, deserialize_with = "optional_criticality")]
    pub criticality: Option<Criticality>,
    #[serde(default)]
    pub owner: Option<RemoteOwner>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub tags: Vec<RemoteTag>,
}

impl RemoteApplication {
    pub fn owner_email(&self) -> Option<&str> {
        self.owner.as_ref().and_then(|o| o.email.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteComponent {
    #[serde(deserialize_with = "id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "applicationId", default, deserialize_with = "optional_id")]
    pub application_id: Option<String>,
    #[serde(default, deserialize_with = "optional_criticality")]
    pub criticality: Option<Criticality>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub tags: Vec<RemoteTag>,
}

/// Paginated list envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(rename = "totalPages", default)]
    pub total_pages: Option<u32>,
}

/// Some list endpoints answer with a bare array, others with a page.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    List(Vec<T>),
    Page(Page<T>),
}

impl<T> ListResponse<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            ListResponse::List(items) => items,
            ListResponse::Page(page) => page.content,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn optional_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

fn optional_criticality<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Criticality>, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?
        .map(|c| Criticality::from(c.round().clamp(0.0, 255.0) as u8)))
}

fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
