//! Logging and error tracking setup.
//!
//! Call [`init`] once at start-up and keep the returned guard alive for the
//! lifetime of the app; dropping it flushes pending Sentry events.

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ClientConfig;

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "cropcare_client=info";

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Map tracing levels to Sentry: errors become events, the rest breadcrumbs.
///
/// Warnings stay breadcrumbs because failed calls are already captured
/// through [`crate::error::report`].
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO | tracing::Level::DEBUG => {
            sentry_tracing::EventFilter::Breadcrumb
        }
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the tracing subscriber and, when a DSN is configured, Sentry.
///
/// Sentry is initialized first so the tracing layer has a client to report
/// to. If a global subscriber is already installed (e.g., by the host app or
/// a test), it is left in place.
#[must_use = "dropping the guard shuts Sentry down"]
pub fn init(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let guard = init_sentry(config);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let (json_layer, text_layer) = if config.log_json {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(sentry = guard.is_some(), json = config.log_json, "Telemetry initialized");
    }

    guard
}
