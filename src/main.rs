mod commands;
mod config;
mod discovery;
mod error;
mod geo;
mod matching;
mod places;
mod registry;
mod resolve;
mod state;
#[cfg(test)]
mod testutil;

use tracing::{info, Level};

use config::AppConfig;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    // Load env
    let _ = dotenv::dotenv();
    let config = AppConfig::from_env()?;
    let state = AppState::from_config(&config)?;

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("dedup") => {
            let stats = commands::dedup::run(&state).await?;
            info!(%stats, "dedup done");
        }
        Some("repair") => {
            let stats = commands::repair::run(&state).await?;
            info!(%stats, "repair done");
        }
        Some("discover") => {
            let query = args.collect::<Vec<_>>().join(" ");
            if query.is_empty() {
                anyhow::bail!("discover requires a query, e.g. `discover brutalist buildings in Berlin`");
            }
            let stats =
                commands::discover::run(&state, &query, config.discovery_origin_hint.as_deref())
                    .await?;
            info!(%stats, "discover done");
        }
        Some("flag") => {
            let (id, flag, value) = match (args.next(), args.next(), args.next()) {
                (Some(id), Some(flag), Some(value)) => (id, flag, value),
                _ => anyhow::bail!("usage: flag ID <hidden|prioritized|favourite> <on|off>"),
            };
            let value = match value.as_str() {
                "on" => true,
                "off" => false,
                other => anyhow::bail!("expected on|off, got '{}'", other),
            };
            commands::edit::set_flag(&state, &id, &flag, value).await?;
        }
        Some("comment") => {
            let (id, action) = match (args.next(), args.next()) {
                (Some(id), Some(action)) => (id, action),
                _ => anyhow::bail!("usage: comment ID <add TEXT... | edit INDEX TEXT... | remove INDEX>"),
            };
            match action.as_str() {
                "add" => {
                    let text = args.collect::<Vec<_>>().join(" ");
                    commands::edit::comment_add(&state, &id, &text).await?;
                }
                "edit" => {
                    let index: usize = args
                        .next()
                        .and_then(|s| s.parse().ok())
                        .ok_or_else(|| anyhow::anyhow!("comment edit requires an index"))?;
                    let text = args.collect::<Vec<_>>().join(" ");
                    commands::edit::comment_edit(&state, &id, index, &text).await?;
                }
                "remove" => {
                    let index: usize = args
                        .next()
                        .and_then(|s| s.parse().ok())
                        .ok_or_else(|| anyhow::anyhow!("comment remove requires an index"))?;
                    commands::edit::comment_remove(&state, &id, index).await?;
                }
                other => anyhow::bail!("unknown comment action '{}'", other),
            }
        }
        _ => {
            eprintln!(
                "usage: atlas-registry <dedup | repair | discover QUERY... | flag ID FLAG on|off | comment ID ...>"
            );
            std::process::exit(2);
        }
    }

    Ok(())
}
