//! Enumeration endpoints

use super::{ApiError, RegistryClient};

impl RegistryClient {
    /// Get the country enumeration that backs the user edit form's
    /// country selector
    pub async fn get_countries(&self) -> Result<Vec<String>, ApiError> {
        self.get_json("enumeration/basic/Country").await
    }
}
