//! Typed view over the session and preference entries in local storage.
//!
//! Nothing is cached here: every accessor reads storage, so a login or
//! logout written through one `Session` is seen by every other clone.

use secrecy::SecretString;
use tracing::{info, instrument, warn};

use crate::api::UserProfile;
use crate::error::clear_sentry_user;
use crate::storage::{LocalStorage, StorageError, keys};

/// Stored flag value meaning "yes".
const TRUE: &str = "true";

/// First screen to show on launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchRoute {
    /// Language onboarding has not been completed.
    Language,
    /// Onboarded and logged in.
    Home,
    /// Onboarded but logged out.
    Login,
}

/// Session and preferences stored in [`LocalStorage`].
#[derive(Debug, Clone)]
pub struct Session {
    storage: LocalStorage,
}

impl Session {
    /// Create a session view over `storage`.
    #[must_use]
    pub const fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    /// The underlying storage.
    #[must_use]
    pub const fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// The stored access token, if any.
    pub async fn access_token(&self) -> Option<SecretString> {
        self.secret(keys::ACCESS_TOKEN).await
    }

    /// The stored refresh token, if any.
    pub async fn refresh_token(&self) -> Option<SecretString> {
        self.secret(keys::REFRESH_TOKEN).await
    }

    async fn secret(&self, key: &str) -> Option<SecretString> {
        self.storage
            .get(key)
            .await
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from)
    }

    /// Whether OTP verification has completed and not been signed out.
    pub async fn is_logged_in(&self) -> bool {
        self.storage.get(keys::IS_LOGGED_IN).await.as_deref() == Some(TRUE)
    }

    /// The stored user profile.
    ///
    /// A missing or unreadable entry yields `None`.
    pub async fn current_user(&self) -> Option<UserProfile> {
        match self.storage.get_json::<UserProfile>(keys::USER).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Stored user profile is unreadable");
                None
            }
        }
    }

    /// Persist a verified login in one write.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    #[instrument(skip_all)]
    pub async fn save_auth(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        user: &serde_json::Value,
    ) -> Result<(), StorageError> {
        let mut pairs = vec![
            (keys::ACCESS_TOKEN, access_token.to_string()),
            (keys::USER, serde_json::to_string(user)?),
            (keys::IS_LOGGED_IN, TRUE.to_string()),
        ];
        match refresh_token {
            Some(token) => pairs.push((keys::REFRESH_TOKEN, token.to_string())),
            None => self.storage.remove(keys::REFRESH_TOKEN).await?,
        }
        self.storage.multi_set(&pairs).await
    }

    /// Forget the login. Preferences are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    #[instrument(skip_all)]
    pub async fn sign_out(&self) -> Result<(), StorageError> {
        self.storage
            .multi_remove(&[
                keys::ACCESS_TOKEN,
                keys::REFRESH_TOKEN,
                keys::USER,
                keys::IS_LOGGED_IN,
            ])
            .await?;
        clear_sentry_user();
        info!("Signed out");
        Ok(())
    }

    // =========================================================================
    // Preferences
    // =========================================================================

    /// The selected UI language, if one was chosen.
    pub async fn language(&self) -> Option<String> {
        self.storage
            .get(keys::LANGUAGE)
            .await
            .filter(|l| !l.trim().is_empty())
    }

    /// Change the UI language without touching other preferences.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub async fn set_language(&self, language: &str) -> Result<(), StorageError> {
        self.storage.set(keys::LANGUAGE, language).await
    }

    /// Whether spoken guidance is on. `None` if never chosen.
    pub async fn audio_enabled(&self) -> Option<bool> {
        self.storage
            .get_json::<bool>(keys::AUDIO_ENABLED)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Stored audio preference is unreadable");
                None
            })
    }

    /// Whether language onboarding is complete.
    pub async fn onboarding_done(&self) -> bool {
        self.storage.get(keys::ONBOARDING_DONE).await.as_deref() == Some(TRUE)
    }

    /// Save the onboarding choices and mark onboarding complete.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    #[instrument(skip(self))]
    pub async fn save_preferences(
        &self,
        language: &str,
        audio_enabled: bool,
    ) -> Result<(), StorageError> {
        self.storage
            .multi_set(&[
                (keys::LANGUAGE, language.to_string()),
                (keys::AUDIO_ENABLED, serde_json::to_string(&audio_enabled)?),
                (keys::ONBOARDING_DONE, TRUE.to_string()),
            ])
            .await
    }

    /// Mark onboarding complete without choosing preferences.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub async fn skip_onboarding(&self) -> Result<(), StorageError> {
        self.storage.set(keys::ONBOARDING_DONE, TRUE).await
    }

    /// Clear the preferences and send the user back through onboarding.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    #[instrument(skip(self))]
    pub async fn reset_preferences(&self) -> Result<(), StorageError> {
        self.storage
            .multi_set(&[
                (keys::LANGUAGE, String::new()),
                (keys::AUDIO_ENABLED, String::new()),
                (keys::ONBOARDING_DONE, "false".to_string()),
            ])
            .await
    }

    /// Pick the first screen: onboarding first, then home or login.
    pub async fn launch_route(&self) -> LaunchRoute {
        if !self.onboarding_done().await {
            LaunchRoute::Language
        } else if self.is_logged_in().await {
            LaunchRoute::Home
        } else {
            LaunchRoute::Login
        }
    }
}
