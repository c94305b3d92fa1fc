//! User search and administration endpoints

use super::{ApiError, RegistryClient};
use crate::models::{PagingResponse, User};

impl RegistryClient {
    /// Search users matching a free-text query, one page at most.
    /// An empty query matches everything.
    pub async fn search_users(
        &self,
        q: &str,
        limit: u32,
    ) -> Result<PagingResponse<User>, ApiError> {
        self.get_json(&search_endpoint(q, limit)).await
    }

    /// Fetch one user by key
    pub async fn get_user(&self, key: &str) -> Result<User, ApiError> {
        self.get_json(&user_endpoint(key)).await
    }

    /// Get the catalog of assignable roles
    pub async fn get_roles(&self) -> Result<Vec<String>, ApiError> {
        self.get_json("user/roles").await
    }

    /// Persist an edited user (whole-entity update)
    pub async fn update_user(&self, user: &User) -> Result<(), ApiError> {
        self.put_json(&user_endpoint(&user.key), user).await
    }

    /// Remove (soft-delete) a user
    pub async fn delete_user(&self, key: &str) -> Result<(), ApiError> {
        self.delete(&user_endpoint(key)).await
    }
}

fn search_endpoint(q: &str, limit: u32) -> String {
    format!("user/search?q={}&limit={}", urlencoding::encode(q), limit)
}

fn user_endpoint(key: &str) -> String {
    format!("user/{}", urlencoding::encode(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_endpoint_encoding() {
        assert_eq!(search_endpoint("", 20), "user/search?q=&limit=20");
        assert_eq!(
            search_endpoint("a b&c", 20),
            "user/search?q=a%20b%26c&limit=20"
        );
    }

    #[test]
    fn test_user_endpoint_encoding() {
        assert_eq!(user_endpoint("u1"), "user/u1");
        assert_eq!(user_endpoint("a/b"), "user/a%2Fb");
    }
}
