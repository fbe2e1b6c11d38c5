//! Endoville accounts service.
//!
//! ```bash
//! accounts                      # same as `accounts serve`
//! accounts cleanup-otps
//! accounts create-staff --email admin@endoville.health --password '...'
//! accounts set-password --email user@example.com --password '...'
//! ```

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use sea_orm::{Database, DatabaseConnection};
use tracing::info;

use endoville_accounts::config::AccountsConfig;
use endoville_accounts::domain::clock::SystemClock;
use endoville_accounts::domain::repository::UserDirectory;
use endoville_accounts::domain::types::NewUser;
use endoville_accounts::infra::db::{DbOtpRepository, DbUserDirectory};
use endoville_accounts::infra::google::GoogleIdentityProvider;
use endoville_accounts::infra::mailer::OtpNotifier;
use endoville_accounts::router::build_router;
use endoville_accounts::state::AppState;
use endoville_accounts::usecase::otp::OtpStore;
use endoville_core::tracing::init_tracing;

#[derive(Parser)]
#[command(about = "Endoville accounts service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Delete expired OTPs once and print how many were removed
    CleanupOtps,
    /// Create an active staff account
    CreateStaff {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Reset a user's password
    SetPassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info");
    let cli = Cli::parse();
    let config = AccountsConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, db).await,
        Command::CleanupOtps => {
            let store = OtpStore {
                repo: DbOtpRepository { db },
                clock: SystemClock,
            };
            let removed = store.cleanup_expired().await?;
            println!("{removed} expired OTP(s) removed");
            Ok(())
        }
        Command::CreateStaff {
            email,
            password,
            first_name,
            last_name,
        } => {
            let users = DbUserDirectory { db };
            let user = users
                .create_user(&NewUser {
                    email: Some(email.trim().to_lowercase()),
                    first_name,
                    last_name,
                    password: Some(password),
                    is_active: true,
                    is_staff: true,
                    ..Default::default()
                })
                .await?;
            println!("staff user {} created ({})", user.id, user.identifier());
            Ok(())
        }
        Command::SetPassword { email, password } => {
            let users = DbUserDirectory { db };
            let email = email.trim().to_lowercase();
            let Some(user) = users.find_by_email(&email).await? else {
                bail!("no user with email {email}");
            };
            users.set_password(user.id, Some(&password)).await?;
            println!("password updated for user {}", user.id);
            Ok(())
        }
    }
}

async fn serve(config: AccountsConfig, db: DatabaseConnection) -> Result<()> {
    let state = AppState {
        db,
        tokens: config.token_settings(),
        notifier: OtpNotifier::new(&config.mail_settings())?,
        google: GoogleIdentityProvider::new(
            config.google_userinfo_url.clone(),
            config.outbound_timeout(),
        )?,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.accounts_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("failed to bind")?;

    info!("accounts service listening on {addr}");
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
