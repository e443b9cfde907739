#[cfg(feature = "lambda")]
use estate_publisher::utils::{logger, validation::Validate};
#[cfg(feature = "lambda")]
use estate_publisher::{build_pipeline, AppConfig, LivePipeline, PipelineResult, WebhookEvent};
#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
#[cfg(feature = "lambda")]
use std::sync::Arc;

#[cfg(feature = "lambda")]
const DEFAULT_CONFIG_PATH: &str = "estate-publisher.toml";

#[cfg(feature = "lambda")]
async fn function_handler(
    pipeline: &LivePipeline,
    event: LambdaEvent<WebhookEvent>,
) -> Result<PipelineResult, Error> {
    tracing::info!(
        "📨 Lambda event {} for listing {}",
        event.payload.event,
        event.payload.estate_id
    );
    Ok(pipeline.run(&event.payload).await)
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    tracing::info!("📁 Loading configuration from: {}", config_path);

    let config = AppConfig::from_file(&config_path)?;
    config.validate()?;

    let pipeline = Arc::new(build_pipeline(&config)?);

    run(service_fn(move |event: LambdaEvent<WebhookEvent>| {
        let pipeline = Arc::clone(&pipeline);
        async move { function_handler(&pipeline, event).await }
    }))
    .await
}
