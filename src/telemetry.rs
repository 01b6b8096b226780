use anyhow::Result;
use tracing::subscriber::set_global_default;
use tracing::Subscriber;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

/// Reported as `name` on every bunyan record.
pub const SERVICE_NAME: &str = "tracker";

/// Bunyan JSON subscriber writing to `sink`.
///
/// `RUST_LOG` wins over `log_filter` when set.
pub fn get_subscriber<Sink>(log_filter: &str, sink: Sink) -> impl Subscriber + Sync + Send
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter));

    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(BunyanFormattingLayer::new(SERVICE_NAME.into(), sink))
}

/// Install the server's stdout subscriber and route sqlx/warp `log` records into it.
pub fn init_subscriber(log_filter: &str) -> Result<()> {
    LogTracer::init()?;
    set_global_default(get_subscriber(log_filter, std::io::stdout))?;
    Ok(())
}
