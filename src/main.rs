use ailearn::{
    config::Config, create_router, db::Database, mailer::build_mailer, services::AuthService,
    AppState,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "ailearn")]
#[command(about = "Content API for the AI Learning site")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create an admin account, or reset the password of an existing one
    CreateAdmin {
        /// Admin username
        #[arg(short, long)]
        username: String,

        /// Password; read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,

        /// Remove every other admin account
        #[arg(long)]
        replace_all: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ailearn=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Arc::new(Config::load()?);
    tracing::info!("Configuration loaded");

    let db = Database::new(&config.database.path).await?;
    db.run_migrations().await?;
    tracing::info!("Database initialized");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(db, config).await,
        Command::CreateAdmin {
            username,
            password,
            replace_all,
        } => create_admin(&db, &username, password, replace_all).await,
    }
}

async fn serve(db: Database, config: Arc<Config>) -> anyhow::Result<()> {
    tracing::info!("Starting AI Learning API...");

    let mailer = build_mailer(&config.mail)?;
    let state = AppState::new(db, config.clone(), mailer);
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn create_admin(
    db: &Database,
    username: &str,
    password: Option<String>,
    replace_all: bool,
) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => {
            eprint!("Password for {}: ", username);
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("failed to read password from stdin")?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    let id = AuthService::create_admin(db, username, &password).await?;
    println!("Admin '{}' saved (id {})", username, id);

    if replace_all {
        let removed = AuthService::remove_other_admins(db, username).await?;
        println!("Removed {} other admin account(s)", removed);
    }

    Ok(())
}
