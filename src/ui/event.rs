//! Completion events sent back from spawned API calls
//!
//! Every backend call is issued under a sequence token; the handler in
//! `App` discards completions whose token is no longer the latest issued,
//! so a slow response can never overwrite a newer one.

use crate::api::ApiError;
use crate::models::{PagingResponse, User};

#[derive(Debug)]
pub enum ApiEvent {
    SearchCompleted {
        seq: u64,
        query: String,
        outcome: Result<PagingResponse<User>, ApiError>,
    },
    UserLoaded {
        seq: u64,
        outcome: Result<User, ApiError>,
    },
    RolesLoaded {
        seq: u64,
        outcome: Result<Vec<String>, ApiError>,
    },
    CountriesLoaded {
        seq: u64,
        outcome: Result<Vec<String>, ApiError>,
    },
    SaveCompleted {
        seq: u64,
        outcome: Result<(), ApiError>,
    },
    DeleteCompleted {
        seq: u64,
        outcome: Result<(), ApiError>,
    },
    RestoreCompleted {
        seq: u64,
        outcome: Result<(), ApiError>,
    },
}
