//! Logging infrastructure
//!
//! - Trace ids for request correlation
//! - Request/response logging middleware with header redaction
//! - Subscriber setup: compact console output, optional daily file rotation

mod middleware;
mod trace_context;

pub use middleware::{http_logging_middleware, redact_headers};
pub use trace_context::{generate_trace_id, RequestSpan, TraceContext};

use oauth_app_core::branding;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the default filter. When `log_dir` is
/// given, logs are also written to `{log_dir}/oauth-app-server.YYYY-MM-DD.log`;
/// keep the returned guard alive for the lifetime of the process.
pub fn init_tracing(log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,oauth_app_core=debug,oauth_app_gateway=debug,tower_http=info")
    });

    let console_layer = fmt::layer()
        .with_ansi(true)
        .compact()
        .with_line_number(false)
        .with_file(false)
        .with_target(true);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(branding::LOG_PREFIX)
                .filename_suffix("log")
                .build(dir)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true)
                .with_target(true)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
