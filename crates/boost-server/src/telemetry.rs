use anyhow::Result;
use opentelemetry::trace::TracerProvider;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::runtime::Tokio;
use opentelemetry_sdk::Resource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Reported as `service.name` and in health responses.
pub const SERVICE_NAME: &str = "bewertungenboost";

pub fn init(config: &Config) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json());

    let Some(endpoint) = &config.otlp_endpoint else {
        registry.init();
        return Ok(());
    };

    let provider = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint),
        )
        .with_trace_config(
            opentelemetry_sdk::trace::Config::default()
                .with_resource(Resource::new(vec![KeyValue::new("service.name", SERVICE_NAME)])),
        )
        .install_batch(Tokio)?;

    let tracer = provider.tracer(SERVICE_NAME);
    // flushed by shutdown_tracer_provider in main
    opentelemetry::global::set_tracer_provider(provider);

    registry
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .init();

    tracing::info!(%endpoint, "exporting traces over OTLP");

    Ok(())
}
