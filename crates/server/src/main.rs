//! querygate server binary.
//!
//! Reads `.env`, then `querygate.{toml,yaml,json}`, then `QUERYGATE__*`
//! variables, and serves until SIGTERM or Ctrl+C.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let config = ServerConfig::load()?;

    server::start_server(config).await?;

    Ok(())
}
