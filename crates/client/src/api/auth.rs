//! OTP login endpoints.
//!
//! Login is two steps: request a one-time code for a mobile number, then
//! verify it. A successful verification stores the tokens and the user
//! profile, after which authenticated endpoints pick the token up.

use reqwest::Method;
use tracing::{info, instrument, warn};

use cropcare_core::{MobileNumber, OtpCode};

use super::{
    ApiClient, RequestOtpRequest, RequestOtpResponse, UserProfile, VerifyOtpRequest,
    VerifyOtpResponse, error_detail, truncate_body,
};
use crate::error::{ApiError, Result, set_sentry_user};

impl ApiClient {
    /// Ask the backend to send a one-time code to `mobile_number`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` with the body's `message` (or
    /// "Failed to send OTP") when the body does not report success, or
    /// `ApiError::Network` if the request fails.
    #[instrument(skip(self), fields(mobile_number = %mobile_number))]
    pub async fn request_otp(&self, mobile_number: &MobileNumber) -> Result<()> {
        let builder = self
            .json_request(Method::POST, "/auth/request-otp", false)
            .await
            .json(&RequestOtpRequest { mobile_number });
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        let result: RequestOtpResponse = serde_json::from_str(&body).unwrap_or_else(|e| {
            warn!(status = %status, error = %e, body = %truncate_body(&body), "Unreadable OTP response");
            RequestOtpResponse::default()
        });

        // The body's flag decides, whatever the status
        if result.success {
            info!("OTP sent");
            return Ok(());
        }

        Err(ApiError::Rejected(
            result
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Failed to send OTP".to_string()),
        ))
    }

    /// Verify a one-time code and persist the resulting session.
    ///
    /// On success the access token, refresh token, user profile and the
    /// logged-in flag are written to local storage in one write.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` with the body's `detail` (or
    /// "Invalid OTP") on a non-success status, `ApiError::Parse` if the
    /// success body lacks a token, or a storage error if the session cannot be
    /// saved.
    #[instrument(skip(self, otp), fields(mobile_number = %mobile_number))]
    pub async fn verify_otp(
        &self,
        mobile_number: &MobileNumber,
        otp: &OtpCode,
    ) -> Result<UserProfile> {
        let builder = self
            .json_request(Method::POST, "/auth/verify-otp", false)
            .await
            .json(&VerifyOtpRequest { mobile_number, otp });
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %truncate_body(&body), "OTP verification rejected");
            return Err(ApiError::Rejected(
                error_detail(&body).unwrap_or_else(|| "Invalid OTP".to_string()),
            ));
        }

        let verified: VerifyOtpResponse = Self::decode(response).await?;
        self.session()
            .save_auth(
                &verified.access_token,
                verified.refresh_token.as_deref(),
                &verified.user,
            )
            .await?;

        let profile: UserProfile = serde_json::from_value(verified.user).unwrap_or_default();
        if let Some(id) = profile.id_string() {
            set_sentry_user(&id);
        }

        info!("Logged in");
        Ok(profile)
    }
}
