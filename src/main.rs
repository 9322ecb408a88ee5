use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tasker::api::{ApiClient, HttpClient};
use tasker::cli::{self, Cli, Commands};
use tasker::session::SessionStore;
use tasker::{Config, Profile, logging, utils};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // --dev keeps a separate config, session and log directory
    let profile = Profile::from_dev_flag(cli.dev);

    let config = match cli.config {
        Some(ref path) => Config::load_from(&utils::expand_path(path))?,
        None => Config::load_with_profile(profile)?,
    };

    let _log_guard = utils::get_log_dir(profile)
        .and_then(|dir| logging::init_logging(&dir, cli.log.as_deref()));

    let session_path: PathBuf = utils::get_session_path(profile)
        .ok_or_else(|| eyre!("Could not determine data directory"))?;
    let session = SessionStore::load(session_path)?.into_shared();

    let base_url = cli.api_url.clone().unwrap_or_else(|| config.api_base_url.clone());
    tracing::info!(%base_url, ?profile, "starting");

    // The TUI watches this flag to return to the login screen after a 401
    let session_expired = Arc::new(AtomicBool::new(false));
    let expired = Arc::clone(&session_expired);
    let http = HttpClient::with_timeout(&base_url, session, config.request_timeout())?
        .on_session_expired(move || expired.store(true, Ordering::SeqCst));
    let client = ApiClient::new(http);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        match cli.command.unwrap_or(Commands::Tui) {
            Commands::Tui => {
                let app = tasker::tui::App::new(config, Arc::new(client), session_expired)?;
                tasker::tui::run_event_loop(app).await?;
            }
            Commands::Login { username, password } => {
                cli::handle_login(&client, username, password).await?;
            }
            Commands::Register {
                username,
                email,
                password,
            } => {
                cli::handle_register(&client, username, email, password).await?;
            }
            Commands::Logout => cli::handle_logout(&client)?,
            Commands::Whoami => cli::handle_whoami(&client)?,
            Commands::List(args) => cli::handle_list(&client, args).await?,
            Commands::Show { id } => cli::handle_show(&client, id).await?,
            Commands::Add {
                title,
                description,
                priority,
                category,
                due,
            } => {
                cli::handle_add(&client, title, description, priority, category, due).await?;
            }
            Commands::Edit(args) => cli::handle_edit(&client, args).await?,
            Commands::Toggle { id } => cli::handle_toggle(&client, id).await?,
            Commands::Delete { id } => cli::handle_delete(&client, id).await?,
            Commands::Categories => cli::handle_categories(&client).await?,
            Commands::AddCategory { name } => cli::handle_add_category(&client, name).await?,
            Commands::RenameCategory { id, name } => {
                cli::handle_rename_category(&client, id, name).await?;
            }
            Commands::DeleteCategory { id } => cli::handle_delete_category(&client, id).await?,
        }
        Ok::<(), color_eyre::Report>(())
    })
}
