//! Provision the single super-admin account.
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/festflow festflow-create-super-admin
//! ```
//!
//! Running it again is harmless: an existing super-admin is reported and left untouched.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use festflow_auth::Passwords;
use festflow_core::SystemClock;
use festflow_infra::services::bootstrap::SUPER_ADMIN_TEMP_PASSWORD;
use festflow_infra::services::{BootstrapOutcome, ensure_super_admin};
use festflow_infra::store::{self, PostgresIdentityStore};
use festflow_observability::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "festflow-create-super-admin", about = "Create the FestFlow super-admin account")]
struct Cli {
    /// PostgreSQL connection string.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

async fn run(cli: Cli) -> anyhow::Result<BootstrapOutcome> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&cli.database_url)
        .await
        .context("failed to connect to database")?;
    store::migrate(&pool)
        .await
        .context("failed to prepare database schema")?;

    let identities = PostgresIdentityStore::new(pool);
    let outcome = ensure_super_admin(&identities, &Passwords::default(), &SystemClock).await?;
    Ok(outcome)
}

#[tokio::main]
async fn main() -> ExitCode {
    festflow_observability::init(LogFormat::Pretty);
    let cli = Cli::parse();

    match run(cli).await {
        Ok(BootstrapOutcome::Created(admin)) => {
            println!("Super admin created.");
            println!("  email:              {}", admin.email);
            println!("  temporary password: {SUPER_ADMIN_TEMP_PASSWORD}");
            println!("The password must be changed at first login.");
            ExitCode::SUCCESS
        }
        Ok(BootstrapOutcome::AlreadyExists(admin)) => {
            println!("Super admin already exists ({}); nothing to do.", admin.email);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "super-admin bootstrap failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
