mod config;
mod error;
mod fetcher;
mod gemini;
mod parser;
mod pipeline;
mod record;
mod store;
mod ui;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;

use config::MenuflowConfig;
use fetcher::CloudinaryImageSource;
use gemini::GeminiClient;
use pipeline::MenuPipeline;
use store::PgRecordStore;
use ui::RunProgress;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = MenuflowConfig::load()?;
    config.validate()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("failed to connect to the record store")?;
    let store = PgRecordStore::new(pool);
    store
        .ensure_schema()
        .await
        .context("failed to prepare record store schema")?;

    let images = CloudinaryImageSource::new(config.image_base_url(), config.namespace.clone());
    let generator = GeminiClient::new(config.api_key.clone(), config.model.clone());
    let pipeline = MenuPipeline::new(store, images, generator, Some(config.max_output_tokens));

    let progress = RunProgress::start();
    let summary = pipeline.process_backlog().await?;
    progress.complete(&summary);
    progress.print_summary(&summary);

    Ok(())
}
