use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use estate_publisher::server::{self, AppState};
use estate_publisher::utils::{logger, validation::Validate};
use estate_publisher::{build_pipeline, AppConfig, CliConfig, Command, WebhookEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("🚀 Starting estate-publisher");
    tracing::info!("📁 Loading configuration from: {}", cli.config);

    let mut config = match AppConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Command::Serve { port: Some(port) } = &cli.command {
        config.server.port = *port;
        tracing::info!("🔧 Port overridden to: {}", port);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    match cli.command {
        Command::CheckConfig => {
            println!("✅ Configuration '{}' is valid", cli.config);
            println!("   Listing API:     {}", config.listing_api.base_url);
            println!(
                "   Templates:       {}/{} ({})",
                config.template_store.repository.owner,
                config.template_store.repository.repo,
                config.template_store.templates_dir
            );
            println!(
                "   Sites:           {}/{} ({})",
                config.publisher.repository.owner,
                config.publisher.repository.repo,
                config.publisher.site_root
            );
            println!(
                "   Hosting:         {}",
                if config.hosting_token().is_some() {
                    "provisioning enabled"
                } else {
                    "no token, derived URLs only"
                }
            );
        }
        Command::Run { estate_id, event } => {
            let pipeline = build_pipeline(&config).context("failed to build pipeline")?;
            let event = WebhookEvent { event, estate_id };
            let result = pipeline.run(&event).await;

            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                std::process::exit(1);
            }
        }
        Command::Serve { .. } => {
            let addr: SocketAddr = config
                .bind_address()
                .parse()
                .with_context(|| format!("invalid bind address {}", config.bind_address()))?;
            let pipeline = build_pipeline(&config).context("failed to build pipeline")?;
            server::serve(addr, AppState::new(Arc::new(pipeline))).await?;
        }
    }

    Ok(())
}
