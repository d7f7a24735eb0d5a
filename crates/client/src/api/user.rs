//! User profile endpoint.

use reqwest::Method;
use tracing::instrument;

use super::{ApiClient, Endpoint, UpdateUserRequest};
use crate::error::Result;

const UPDATE_USER: Endpoint = Endpoint::authenticated("update user").with_detail_from_body();

impl ApiClient {
    /// Update the logged-in user's profile. The response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error carrying the body's `detail` (or
    /// "Failed to update user: <reason>") on a non-success status, or another
    /// error if the request fails.
    #[instrument(skip(self))]
    pub async fn update_user(&self, update: &UpdateUserRequest) -> Result<()> {
        let builder = self
            .json_request(Method::PUT, "/auth/user", true)
            .await
            .json(update);
        self.send(builder, &UPDATE_USER).await?;
        Ok(())
    }
}
