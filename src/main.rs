use bot::BotService;
use config::AppConfig;

extern crate pretty_env_logger;
#[macro_use]
extern crate log;

mod bot;
mod command;
mod config;
mod error;
mod event;
mod handler;
mod service;
mod state;
mod storage;
mod webhook;

#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    let _ = pretty_env_logger::try_init_timed();

    info!("Starting bot...");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let bot_service = BotService::new(config)?;
    info!("Bot instance created");

    bot_service.start().await?;

    Ok(())
}
