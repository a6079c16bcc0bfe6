//! Developer CLI over `pokecapture_core`.
//!
//! # Responsibility
//! - List the annotated catalog and toggle capture state from a terminal.
//! - Keep output line-oriented for quick local checks.

use clap::{Parser, Subcommand};
use pokecapture_core::{
    auth_provider_from_config, init_logging, AppContext, CoreConfig, CoreError, LookupMode, Notice,
    UserId,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, Parser)]
#[command(name = "pokecapture", version, about = "Catalog capture tracker")]
struct Cli {
    /// Catalog base URL (defaults to POKECAPTURE_CATALOG_URL or the public API).
    #[arg(long, global = true)]
    catalog_url: Option<String>,
    /// SQLite file holding capture records.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Absolute directory for rolling logs; logging is off when omitted.
    #[arg(long, global = true)]
    log_dir: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Prints core linkage info.
    Ping,
    /// Lists the first catalog page with capture marks.
    List {
        #[arg(long)]
        user: Option<String>,
        /// Query each entity separately instead of one batched query.
        #[arg(long)]
        per_entity: bool,
    },
    /// Captures a released entity or releases a captured one.
    Toggle {
        #[arg(long)]
        user: String,
        #[arg(long)]
        name: String,
    },
    /// Shows detail attributes behind a catalog entry URL.
    Details {
        #[arg(long)]
        url: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    if let Command::Ping = cli.command {
        println!("pokecapture_core ping={}", pokecapture_core::ping());
        println!("pokecapture_core version={}", pokecapture_core::core_version());
        return Ok(());
    }

    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(pokecapture_core::default_log_level(), log_dir).map_err(|err| err.to_string())?;
    }

    let mut config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(url) = cli.catalog_url {
        config.catalog_base_url = url;
    }
    if let Some(db) = cli.db {
        config.store_path = Some(db);
    }
    if let Command::List { per_entity: true, .. } = cli.command {
        config.lookup_mode = LookupMode::PerEntity;
    }

    let provider = auth_provider_from_config(&config).map_err(|err| err.to_string())?;
    let (context, mut notices) =
        AppContext::start(config, provider).map_err(|err| err.to_string())?;

    let outcome = match cli.command {
        Command::Ping => Ok(()),
        Command::List { user, .. } => {
            if let Some(user) = user {
                restore_user(&context, user).await?;
            }
            list(&context).await
        }
        Command::Toggle { user, name } => {
            restore_user(&context, user).await?;
            toggle(&context, &name).await
        }
        Command::Details { url } => details(&context, &url).await,
    };

    print_notices(&mut notices);
    context.shutdown().await;
    outcome.map_err(|err| err.to_string())
}

async fn restore_user(context: &AppContext, user: String) -> Result<(), String> {
    let user_id = UserId::new(user).map_err(|err| err.to_string())?;
    context.session().restore(user_id).await;
    Ok(())
}

async fn list(context: &AppContext) -> Result<(), CoreError> {
    let page = context.sync().fetch_annotated_catalog().await?;
    for entity in &page.entities {
        let mark = if entity.captured { "[x]" } else { "[ ]" };
        println!("{mark} {}", entity.display_label());
    }
    println!("showing {} of {}", page.entities.len(), page.count);
    Ok(())
}

async fn toggle(context: &AppContext, name: &str) -> Result<(), CoreError> {
    let sync = context.sync();
    let currently_captured = sync.refresh_capture(name).await?;
    let captured = sync.toggle_capture(name, currently_captured).await?;
    println!(
        "{name}: {}",
        if captured { "captured" } else { "released" }
    );
    Ok(())
}

async fn details(context: &AppContext, url: &str) -> Result<(), CoreError> {
    let details = context.sync().entity_details(url).await?;
    println!("name={}", details.name);
    println!("height={}", details.height);
    println!("weight={}", details.weight);
    if let Some(sprite) = details.sprite_url {
        println!("sprite={sprite}");
    }
    Ok(())
}

fn print_notices(notices: &mut UnboundedReceiver<Notice>) {
    while let Ok(notice) = notices.try_recv() {
        eprintln!("notice[{}]: {}", notice.kind.as_str(), notice.message);
    }
}
