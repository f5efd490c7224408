use crate::config::Environment;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    layer::{Identity, Layered, SubscriberExt},
    util::SubscriberInitExt,
};

/// Subscriber stack that extra layers (e.g. the OpenTelemetry bridge) attach to.
pub(crate) type FilteredRegistry = Layered<EnvFilter, Registry>;

/// Filter from `RUST_LOG`, `info` when unset or invalid.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber: filter, optional `extra` layer, then the
/// formatter for `environment`.
pub(crate) fn install_subscriber<L>(environment: Environment, extra: Option<L>)
where
    L: Layer<FilteredRegistry> + Send + Sync + 'static,
{
    let registry = tracing_subscriber::registry().with(env_filter()).with(extra);

    match environment {
        Environment::Production => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_level(true))
                .init();
        }
        Environment::Development => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_ansi(true))
                .init();
        }
    }
}

/// Initialize the tracing subscriber: pretty output for development, JSON
/// for production.
///
/// Uses `RUST_LOG` for filtering. Call at most once per process, and not at
/// all when [`crate::TelemetryGuard::init`] already installed a subscriber.
pub fn setup_logging(environment: Environment) {
    install_subscriber(environment, None::<Identity>);
}

/// Creates an info-level span and enters it.
#[macro_export]
macro_rules! span {
    ($name:literal) => {
        tracing::info_span!($name).entered()
    };
}

/// Creates a debug-level span and enters it.
#[macro_export]
macro_rules! span_debug {
    ($name:literal) => {
        tracing::debug_span!($name).entered()
    };
}
