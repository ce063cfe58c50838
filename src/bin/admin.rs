//! Administration CLI for snax-shortener.
//!
//! Manages API tokens and inspects the database without going through the
//! HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Issue a token bound to subject "user-42"
//! cargo run --bin admin -- token create --name "CI" --subject user-42
//!
//! # List all tokens
//! cargo run --bin admin -- token list
//!
//! # Revoke a token by name or id
//! cargo run --bin admin -- token revoke CI
//!
//! # URL / click / token counts
//! cargo run --bin admin -- stats
//!
//! # Database diagnostics
//! cargo run --bin admin -- db check
//! cargo run --bin admin -- db info
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string
//! - `TOKEN_SIGNING_SECRET` (required for `token create`): must match the server's

use snax_shortener::application::services::auth_service::hash_token;
use snax_shortener::domain::repositories::{ApiToken, TokenRepository};
use snax_shortener::infrastructure::persistence::PgTokenRepository;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use rand::Rng;
use rand::distr::Alphanumeric;
use sqlx::PgPool;
use std::sync::Arc;

/// Length of generated API tokens (alphanumeric, ~285 bits of entropy).
const TOKEN_LEN: usize = 48;

#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about = "snax-shortener administration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage API tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Show URL, click and token counts
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a new API token bound to a subject id
    Create {
        /// Token name (e.g., "Production API", "Mobile App")
        #[arg(short, long)]
        name: Option<String>,

        /// Subject id the token authenticates as; owns the URLs it creates
        #[arg(short, long)]
        subject: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List all tokens
    List,

    /// Revoke a token
    Revoke {
        /// Token name or numeric id
        name_or_id: String,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show server version and applied migrations
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Token { action } => handle_token_action(action, &pool).await,
        Commands::Stats => handle_stats(&pool).await,
        Commands::Db { action } => handle_db_action(action, &pool).await,
    }
}

async fn handle_token_action(action: TokenAction, pool: &PgPool) -> Result<()> {
    let repo = PgTokenRepository::new(Arc::new(pool.clone()));

    match action {
        TokenAction::Create { name, subject, yes } => create_token(&repo, name, subject, yes).await,
        TokenAction::List => list_tokens(&repo).await,
        TokenAction::Revoke { name_or_id } => revoke_token(&repo, &name_or_id).await,
    }
}

/// Issues a token.
///
/// Only the HMAC-SHA256 of the token (keyed by `TOKEN_SIGNING_SECRET`) is
/// stored; the raw value is printed once.
async fn create_token(
    repo: &impl TokenRepository,
    name: Option<String>,
    subject: Option<String>,
    skip_confirm: bool,
) -> Result<()> {
    let secret = std::env::var("TOKEN_SIGNING_SECRET")
        .context("TOKEN_SIGNING_SECRET must be set to issue tokens")?;
    anyhow::ensure!(!secret.is_empty(), "TOKEN_SIGNING_SECRET must not be empty");

    println!("{}", "Create API Token".bright_blue().bold());
    println!();

    let name = match name {
        Some(n) => n,
        None => Input::new()
            .with_prompt("Token name")
            .with_initial_text("Production API")
            .interact_text()?,
    };

    let subject = match subject {
        Some(s) => s,
        None => Input::new().with_prompt("Subject id").interact_text()?,
    };
    anyhow::ensure!(!subject.trim().is_empty(), "Subject id must not be empty");

    let token = generate_token();

    println!("  Name:    {}", name.cyan());
    println!("  Subject: {}", subject.cyan());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Create this token?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "Cancelled".red());
            return Ok(());
        }
    }

    repo.create_token(&name, subject.trim(), &hash_token(&secret, &token))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create token: {}", e))?;

    println!();
    println!("{}", "Token created.".green().bold());
    println!(
        "{}",
        "Save it now, it cannot be shown again:".red().bold()
    );
    println!();
    println!("  {}", token.bright_yellow().bold());
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -H \"Authorization: Bearer {}\" http://localhost:3000/api/urls",
        token
    );
    println!();

    Ok(())
}

async fn list_tokens(repo: &impl TokenRepository) -> Result<()> {
    let tokens = repo
        .list_tokens()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list tokens: {}", e))?;

    if tokens.is_empty() {
        println!("{}", "No tokens found".yellow());
        println!(
            "Create one with: {} admin -- token create",
            "cargo run --bin".bright_cyan()
        );
        return Ok(());
    }

    println!(
        "  {:<4} {:<24} {:<20} {:<17} {:<17} {}",
        "ID".bright_white().bold(),
        "Name".bright_white().bold(),
        "Subject".bright_white().bold(),
        "Created".bright_white().bold(),
        "Last used".bright_white().bold(),
        "Status".bright_white().bold()
    );
    println!("  {}", "-".repeat(96).bright_black());

    for token in &tokens {
        print_token_row(token);
    }

    println!();
    println!("  Total: {}", tokens.len().to_string().bright_white().bold());

    Ok(())
}

fn print_token_row(token: &ApiToken) {
    let status = if token.revoked_at.is_some() {
        "REVOKED".red()
    } else {
        "ACTIVE".green()
    };

    let last_used = token
        .last_used_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string());

    println!(
        "  {:<4} {:<24} {:<20} {:<17} {:<17} {}",
        token.id.to_string().bright_black(),
        token.name.cyan(),
        token.subject,
        token.created_at.format("%Y-%m-%d %H:%M").to_string(),
        last_used,
        status
    );
}

/// Revokes a token looked up by numeric id first, then by exact name.
async fn revoke_token(repo: &impl TokenRepository, name_or_id: &str) -> Result<()> {
    let by_id = match name_or_id.parse::<i64>() {
        Ok(id) => repo
            .find_by_id(id)
            .await
            .map_err(|e| anyhow::anyhow!("Database error: {}", e))?,
        Err(_) => None,
    };

    let token = match by_id {
        Some(t) => Some(t),
        None => repo
            .find_by_name(name_or_id)
            .await
            .map_err(|e| anyhow::anyhow!("Database error: {}", e))?,
    };

    let token = token.context("Token not found")?;

    if token.revoked_at.is_some() {
        println!("{}", "This token is already revoked".yellow());
        return Ok(());
    }

    println!("  Token:   {}", token.name.cyan());
    println!("  Subject: {}", token.subject);
    println!("  ID:      {}", token.id.to_string().bright_black());
    println!();

    let confirmed = Confirm::new()
        .with_prompt("Revoke this token?")
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "Cancelled".red());
        return Ok(());
    }

    repo.revoke_token(token.id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to revoke token: {}", e))?;

    println!("{}", "Token revoked.".green().bold());

    Ok(())
}

async fn handle_stats(pool: &PgPool) -> Result<()> {
    let (total, active, clicks): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*),
            COUNT(*) FILTER (WHERE is_active),
            COALESCE(SUM(click_count), 0)::BIGINT
        FROM short_urls
        "#,
    )
    .fetch_one(pool)
    .await?;

    let expired: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM short_urls WHERE is_active AND expires_at IS NOT NULL AND expires_at <= NOW()",
    )
    .fetch_one(pool)
    .await?;

    let tokens: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM api_tokens WHERE revoked_at IS NULL")
            .fetch_one(pool)
            .await?;

    println!("{}", "Statistics".bright_blue().bold());
    println!();
    println!("  URLs:          {}", total.to_string().bright_green().bold());
    println!("    active:      {}", active.to_string().bright_green());
    println!("    expired:     {}", expired.to_string().yellow());
    println!("    deleted:     {}", (total - active).to_string().bright_black());
    println!("  Clicks:        {}", clicks.to_string().bright_green().bold());
    println!("  Active tokens: {}", tokens.to_string().bright_green().bold());

    Ok(())
}

async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            sqlx::query("SELECT 1").execute(pool).await?;
            println!("{}", "Database connection OK".green().bold());
        }
        DbAction::Info => {
            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let migrations: Option<i64> = sqlx::query_scalar(
                "SELECT COUNT(*) FROM _sqlx_migrations WHERE success",
            )
            .fetch_one(pool)
            .await
            .ok();

            println!("  PostgreSQL: {}", version.bright_white());
            match migrations {
                Some(n) => println!("  Migrations: {} applied", n),
                None => println!("  Migrations: {}", "not initialized".yellow()),
            }
        }
    }

    Ok(())
}

fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}
