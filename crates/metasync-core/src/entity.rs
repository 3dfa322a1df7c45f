//! Typed catalog entity payloads.
//!
//! Commits are full replacements of the remote entity, so the structs here
//! declare only the fields the engine reads or writes (`attributes`,
//! `contacts`, `referredEntities`) and capture everything else through
//! `#[serde(flatten)]` maps. A fetched payload re-serializes with all of
//! its unknown fields intact.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Attribute carrying the user-maintained description.
pub const ATTR_USER_DESCRIPTION: &str = "userDescription";
/// Attribute carrying the entity display name.
pub const ATTR_NAME: &str = "name";
/// Attribute carrying the unique qualified name.
pub const ATTR_QUALIFIED_NAME: &str = "qualifiedName";
/// Contact role replaced when a row carries an owner.
pub const CONTACT_OWNER: &str = "Owner";

/// Response of an entity fetch: the entity plus its nested referred
/// entities (typically columns), keyed by their opaque id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityEnvelope {
    pub entity: CatalogEntity,
    /// Id -> nested entity, kept as raw JSON so untouched entries
    /// re-serialize with their key order and fields exactly as fetched.
    #[serde(
        default,
        rename = "referredEntities",
        skip_serializing_if = "Map::is_empty"
    )]
    pub referred_entities: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntityEnvelope {
    /// Serialize the envelope into the commit payload shape.
    pub fn to_payload(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// A remote catalog entity (asset level).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Role -> ordered ownership references. Kept as raw JSON so an
    /// untouched mapping re-serializes in its original key order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contacts: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogEntity {
    /// Entity display name, when present.
    pub fn name(&self) -> Option<&str> {
        self.attributes.get(ATTR_NAME).and_then(Value::as_str)
    }

    /// Unique qualified name, when present.
    pub fn qualified_name(&self) -> Option<&str> {
        self.attributes
            .get(ATTR_QUALIFIED_NAME)
            .and_then(Value::as_str)
    }

    /// Drop any existing `userDescription`, then set it to `text`.
    pub fn set_user_description(&mut self, text: &str) {
        self.attributes.remove(ATTR_USER_DESCRIPTION);
        self.attributes
            .insert(ATTR_USER_DESCRIPTION.to_string(), Value::String(text.to_string()));
    }

    /// Replace the `Owner` contact list wholesale with a single reference.
    ///
    /// Other contact roles are left as they were fetched.
    pub fn set_owner(&mut self, owner_id: &str) {
        let contacts = self.contacts.get_or_insert_with(Map::new);
        contacts.insert(CONTACT_OWNER.to_string(), json!([{ "id": owner_id }]));
    }
}

/// Display name of a referred entity (typically a column).
pub fn referred_name(value: &Value) -> Option<&str> {
    value.get("attributes")?.get(ATTR_NAME)?.as_str()
}

/// Qualified name of a referred entity, when present.
pub fn referred_qualified_name(value: &Value) -> Option<&str> {
    value.get("attributes")?.get(ATTR_QUALIFIED_NAME)?.as_str()
}

/// Drop any existing `userDescription` on a referred entity, then set it
/// to `text`. Everything else in the entry stays as fetched.
pub fn set_referred_description(value: &mut Value, text: &str) {
    let Some(object) = value.as_object_mut() else {
        return;
    };
    let attributes = object
        .entry("attributes")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Some(attributes) = attributes.as_object_mut() {
        attributes.remove(ATTR_USER_DESCRIPTION);
        attributes.insert(
            ATTR_USER_DESCRIPTION.to_string(),
            Value::String(text.to_string()),
        );
    }
}
