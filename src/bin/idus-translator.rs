use anyhow::Result;
use clap::Parser;
use idus_translator::{LaunchOptions, ProductService, ServiceConfig, TargetLocale};

/// Scrape an idus.com product page and print the (optionally
/// translated) record as JSON.
#[derive(Parser, Debug)]
#[command(name = "idus-translator", version, about)]
struct Cli {
    /// Product page URL
    url: String,

    /// Target locale: en or ja
    #[arg(short, long, default_value = "en")]
    locale: String,

    /// Run with a visible browser window (useful for debugging)
    #[arg(long)]
    headed: bool,

    /// Skip translation and print the raw extraction only
    #[arg(long)]
    no_translate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let api_key = std::env::var("GEMINI_API_KEY").ok();
    if api_key.is_none() && !cli.no_translate {
        log::warn!("GEMINI_API_KEY is not set; output will be untranslated");
    }

    let config = ServiceConfig {
        launch: LaunchOptions::new().headless(!cli.headed),
        gemini_api_key: if cli.no_translate { None } else { api_key },
    };

    let service = ProductService::start(config).await?;

    let result = run(&service, &cli).await;
    service.shutdown();

    println!("{}", result?);
    Ok(())
}

async fn run(service: &ProductService, cli: &Cli) -> Result<String> {
    if cli.no_translate {
        let record = service.scrape(&cli.url)?;
        Ok(serde_json::to_string_pretty(&record)?)
    } else {
        let locale = TargetLocale::from_code(&cli.locale);
        let translated = service.scrape_and_translate(&cli.url, locale).await?;
        Ok(serde_json::to_string_pretty(&translated)?)
    }
}
