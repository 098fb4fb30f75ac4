//! JSON:API document types shared by every HCP Terraform endpoint

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Single-resource document: `{"data": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document<T> {
    pub data: T,
}

impl<T> Document<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Collection document with pagination metadata
#[derive(Debug, Clone, Deserialize)]
pub struct ListDocument<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: Option<ListMeta>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListMeta {
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Pagination {
    pub current_page: u32,
    #[serde(default)]
    pub next_page: Option<u32>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_count: u32,
}

/// A JSON:API resource object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceObject<A> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: A,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub relationships: HashMap<String, Relationship>,
    #[serde(default, skip_serializing)]
    pub links: HashMap<String, serde_json::Value>,
}

impl<A> ResourceObject<A> {
    pub fn new(kind: &str, attributes: A) -> Self {
        Self {
            id: None,
            kind: kind.to_string(),
            attributes,
            relationships: HashMap::new(),
            links: HashMap::new(),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_relationship(mut self, name: &str, relationship: Relationship) -> Self {
        self.relationships.insert(name.to_string(), relationship);
        self
    }

    /// Server-assigned id; empty for objects that were never persisted
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    pub fn related_id(&self, name: &str) -> Option<&str> {
        self.relationships.get(name).and_then(Relationship::id)
    }

    /// Relative link such as `self-html`
    pub fn link(&self, name: &str) -> Option<&str> {
        self.links.get(name).and_then(serde_json::Value::as_str)
    }

    pub fn related_ids(&self, name: &str) -> Vec<String> {
        self.relationships
            .get(name)
            .map(Relationship::ids)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub data: Option<RelationshipData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationshipData {
    One(ResourceIdentifier),
    Many(Vec<ResourceIdentifier>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

impl ResourceIdentifier {
    pub fn new(kind: &str, id: &str) -> Self {
        Self {
            kind: kind.to_string(),
            id: id.to_string(),
        }
    }
}

impl Relationship {
    pub fn one(kind: &str, id: &str) -> Self {
        Self {
            data: Some(RelationshipData::One(ResourceIdentifier::new(kind, id))),
        }
    }

    pub fn many<I, S>(kind: &str, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            data: Some(RelationshipData::Many(
                ids.into_iter()
                    .map(|id| ResourceIdentifier::new(kind, id.as_ref()))
                    .collect(),
            )),
        }
    }

    pub fn id(&self) -> Option<&str> {
        match &self.data {
            Some(RelationshipData::One(identifier)) => Some(identifier.id.as_str()),
            _ => None,
        }
    }

    pub fn ids(&self) -> Vec<String> {
        match &self.data {
            Some(RelationshipData::Many(identifiers)) => {
                identifiers.iter().map(|i| i.id.clone()).collect()
            }
            Some(RelationshipData::One(identifier)) => vec![identifier.id.clone()],
            None => vec![],
        }
    }
}

/// Body for relationship endpoints: `{"data": [{"type": ..., "id": ...}]}`
pub fn identifiers<I, S>(kind: &str, ids: I) -> Document<Vec<ResourceIdentifier>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Document::new(
        ids.into_iter()
            .map(|id| ResourceIdentifier::new(kind, id.as_ref()))
            .collect(),
    )
}

/// JSON:API error response body
#[derive(Debug, Deserialize)]
pub struct ErrorDocument {
    #[serde(default)]
    pub errors: Vec<ErrorObject>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorObject {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ErrorObject {
    pub fn message(&self) -> String {
        match (&self.title, &self.detail) {
            (_, Some(detail)) if !detail.is_empty() => detail.clone(),
            (Some(title), _) => title.clone(),
            _ => self
                .status
                .clone()
                .unwrap_or_else(|| "unknown error".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiQueryParams {
    params: Vec<(String, String)>,
}

impl ApiQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn add_optional<K: Into<String>, V: ToString>(mut self, key: K, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.params.push((key.into(), v.to_string()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!(
                "?{}",
                self.params
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&")
            )
        }
    }
}

/// Page selection plus endpoint-specific filters
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub page_number: u32,
    pub page_size: u32,
    pub params: ApiQueryParams,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: 100,
            params: ApiQueryParams::new(),
        }
    }
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// Adds `filter[...]=value`
    pub fn filter(mut self, key: &str, value: &str) -> Self {
        self.params = self.params.add(format!("filter[{}]", key), value);
        self
    }

    pub fn search(mut self, key: &str, value: &str) -> Self {
        self.params = self.params.add(format!("search[{}]", key), value);
        self
    }

    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.params = self.params.add(key, value);
        self
    }

    pub fn to_query_params(&self) -> ApiQueryParams {
        let mut params = self.params.clone();
        params = params.add("page[number]", self.page_number);
        params = params.add("page[size]", self.page_size);
        params
    }
}

/// Percent-encodes a single path segment such as an organization name
pub fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "kebab-case")]
    struct Attrs {
        name: String,
        #[serde(default)]
        auto_apply: bool,
    }

    #[test]
    fn resource_object_parses_relationships() {
        let doc: Document<ResourceObject<Attrs>> = serde_json::from_value(json!({
            "data": {
                "id": "ws-123",
                "type": "workspaces",
                "attributes": {"name": "app", "auto-apply": true},
                "relationships": {
                    "project": {"data": {"id": "prj-1", "type": "projects"}},
                    "tags": {"data": [{"id": "tag-1", "type": "tags"}, {"id": "tag-2", "type": "tags"}]},
                    "current-run": {"data": null},
                    "outputs": {"links": {"related": "/api/v2/workspaces/ws-123/current-state-version-outputs"}}
                },
                "links": {"self": "/api/v2/workspaces/ws-123", "self-html": "/app/acme/workspaces/app"}
            }
        }))
        .unwrap();

        assert_eq!(doc.data.id(), "ws-123");
        assert!(doc.data.attributes.auto_apply);
        assert_eq!(doc.data.related_id("project"), Some("prj-1"));
        assert_eq!(doc.data.related_ids("tags"), vec!["tag-1", "tag-2"]);
        assert_eq!(doc.data.related_id("current-run"), None);
        assert!(doc.data.related_ids("outputs").is_empty());
        assert_eq!(doc.data.link("self-html"), Some("/app/acme/workspaces/app"));
    }

    #[test]
    fn new_resource_object_serializes_without_id() {
        let object = ResourceObject::new(
            "workspaces",
            Attrs {
                name: "app".to_string(),
                auto_apply: false,
            },
        )
        .with_relationship("project", Relationship::one("projects", "prj-1"));

        let value = serde_json::to_value(Document::new(object)).unwrap();
        assert_eq!(
            value,
            json!({
                "data": {
                    "type": "workspaces",
                    "attributes": {"name": "app", "auto-apply": false},
                    "relationships": {"project": {"data": {"type": "projects", "id": "prj-1"}}}
                }
            })
        );
    }

    #[test]
    fn error_objects_prefer_detail() {
        let doc: ErrorDocument = serde_json::from_value(json!({
            "errors": [
                {"status": "422", "title": "invalid attribute", "detail": "Name has already been taken"},
                {"status": "404", "title": "not found"}
            ]
        }))
        .unwrap();

        let messages: Vec<String> = doc.errors.iter().map(ErrorObject::message).collect();
        assert_eq!(messages, vec!["Name has already been taken", "not found"]);
    }

    #[test]
    fn list_options_encode_filters_and_pages() {
        let query = ListOptions::new()
            .with_page_size(20)
            .filter("workspace][name", "app prod")
            .to_query_params()
            .to_query_string();
        assert_eq!(
            query,
            "?filter[workspace][name]=app%20prod&page[number]=1&page[size]=20"
        );
    }

    #[test]
    fn segments_are_percent_encoded() {
        assert_eq!(segment("my org/x"), "my%20org%2Fx");
    }
}
