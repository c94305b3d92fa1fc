//! User and role selection models

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A user account as served by the registry.
///
/// Updates are whole-entity PUTs of a previously fetched record, so fields
/// this client does not model are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub key: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default)]
    pub roles: Vec<String>,

    /// Soft-delete marker: a timestamp when the user is deleted, absent
    /// otherwise. Restoring serializes it as absent, not null.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    pub fn get_display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.user_name.clone().unwrap_or_else(|| self.key.clone()),
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }

    pub fn get_status(&self) -> &str {
        if self.is_deleted() {
            "Deleted"
        } else {
            "Active"
        }
    }
}

/// Checkbox state for role assignment, derived from the role catalog and a
/// user's current roles.
///
/// The map's key set always equals the catalog it was derived from, so roles
/// outside the catalog never survive a save.
#[derive(Debug, Clone, Default)]
pub struct RoleSelection {
    catalog: Vec<String>,
    selected: HashMap<String, bool>,
}

impl RoleSelection {
    /// Build the selection map: each catalog role is marked selected iff the
    /// user currently holds it.
    pub fn derive(catalog: Vec<String>, user_roles: &[String]) -> Self {
        let selected = catalog
            .iter()
            .map(|role| (role.clone(), user_roles.iter().any(|r| r == role)))
            .collect();
        Self { catalog, selected }
    }

    /// Catalog roles in their original order
    pub fn roles(&self) -> &[String] {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    pub fn is_selected(&self, role: &str) -> bool {
        self.selected.get(role).copied().unwrap_or(false)
    }

    /// Toggle the role at a catalog position
    pub fn toggle(&mut self, index: usize) {
        if let Some(role) = self.catalog.get(index) {
            if let Some(flag) = self.selected.get_mut(role) {
                *flag = !*flag;
            }
        }
    }

    /// Selected roles in catalog order; exactly what a save writes back
    pub fn selected_roles(&self) -> Vec<String> {
        self.catalog
            .iter()
            .filter(|role| self.is_selected(role))
            .cloned()
            .collect()
    }

    /// Rebuild `user.roles` from the current selection
    pub fn apply_to(&self, user: &mut User) {
        user.roles = self.selected_roles();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_user_deserialization() {
        let json = r#"
        {
            "key": "u1",
            "userName": "alice",
            "firstName": "Alice",
            "lastName": "Andersen",
            "email": "alice@example.org",
            "country": "DK",
            "roles": ["ADMIN"],
            "settings": {"locale": "da"}
        }
        "#;

        let user: User = serde_json::from_str(json).unwrap();

        assert_eq!(user.key, "u1");
        assert_eq!(user.user_name.as_deref(), Some("alice"));
        assert_eq!(user.roles, roles(&["ADMIN"]));
        assert!(!user.is_deleted());
        assert_eq!(user.get_display_name(), "Alice Andersen");
        // unmodeled backend fields survive the round trip
        assert!(user.extra.contains_key("settings"));
        let out = serde_json::to_value(&user).unwrap();
        assert_eq!(out["settings"]["locale"], "da");
    }

    #[test]
    fn test_display_name_fallbacks() {
        let user: User = serde_json::from_str(r#"{"key": "u2", "userName": "bob"}"#).unwrap();
        assert_eq!(user.get_display_name(), "bob");

        let user: User = serde_json::from_str(r#"{"key": "u3"}"#).unwrap();
        assert_eq!(user.get_display_name(), "u3");
    }

    #[test]
    fn test_cleared_deleted_marker_is_absent() {
        let json = r#"{"key": "u1", "deleted": "2024-05-01T10:00:00Z"}"#;
        let mut user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.get_status(), "Deleted");

        user.deleted = None;
        let out = serde_json::to_value(&user).unwrap();
        assert!(out.get("deleted").is_none());
        assert_eq!(user.get_status(), "Active");
    }

    #[test]
    fn test_selection_map_covers_catalog() {
        let selection = RoleSelection::derive(roles(&["ADMIN", "VIEWER"]), &roles(&["ADMIN"]));

        assert_eq!(selection.roles(), roles(&["ADMIN", "VIEWER"]).as_slice());
        assert!(selection.is_selected("ADMIN"));
        assert!(!selection.is_selected("VIEWER"));
        // the key set is exactly the catalog, even for roles the user holds
        // but the catalog does not list
        let selection = RoleSelection::derive(roles(&["ADMIN", "VIEWER"]), &roles(&["GHOST"]));
        assert_eq!(selection.len(), 2);
        assert!(!selection.is_selected("GHOST"));
    }

    #[test]
    fn test_selection_round_trip_without_edits() {
        let catalog = roles(&["ADMIN", "EDITOR", "VIEWER"]);
        let held = roles(&["VIEWER", "ADMIN"]);
        let selection = RoleSelection::derive(catalog, &held);

        // same set as the original, in catalog order
        assert_eq!(selection.selected_roles(), roles(&["ADMIN", "VIEWER"]));
    }

    #[test]
    fn test_roles_outside_catalog_dropped_on_save() {
        let mut user: User =
            serde_json::from_str(r#"{"key": "u1", "roles": ["ADMIN", "GHOST"]}"#).unwrap();
        let selection = RoleSelection::derive(roles(&["ADMIN", "VIEWER"]), &user.roles);

        selection.apply_to(&mut user);
        assert_eq!(user.roles, roles(&["ADMIN"]));
    }

    #[test]
    fn test_toggle_and_apply() {
        let mut user: User =
            serde_json::from_str(r#"{"key": "u1", "roles": ["ADMIN"]}"#).unwrap();
        let mut selection = RoleSelection::derive(roles(&["ADMIN", "VIEWER"]), &user.roles);

        selection.toggle(1);
        selection.apply_to(&mut user);
        assert_eq!(user.roles, roles(&["ADMIN", "VIEWER"]));

        selection.toggle(0);
        selection.apply_to(&mut user);
        assert_eq!(user.roles, roles(&["VIEWER"]));
    }
}
