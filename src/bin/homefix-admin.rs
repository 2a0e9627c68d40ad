use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::json;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use homefix_backend::{
    backend::{Backend, SupabaseClient, PROFILES},
    config::Config,
    models::{NewAuthUser, UpsertProfile, UserRole},
    utils::validators::{validate_email, MIN_PASSWORD_LEN},
};

/// Operator tooling for the HomeFix backend.
#[derive(Parser)]
#[command(name = "homefix-admin", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List tables in the public schema (needs DATABASE_URL)
    CheckTables,
    /// Create tables, row-level security and policies (needs DATABASE_URL)
    SetupDb,
    /// Create an administrator account interactively
    CreateAdmin {
        /// Pre-fill the email prompt
        #[arg(long)]
        email: Option<String>,
        /// Pre-fill the full name prompt
        #[arg(long)]
        full_name: Option<String>,
    },
    /// List auth users with their profiles
    ListUsers,
    /// Check that the backend answers with the configured key
    TestConnection,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homefix_backend=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.cmd).await {
        eprintln!("\n❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cmd: Cmd) -> anyhow::Result<()> {
    match cmd {
        Cmd::CheckTables => check_tables(&Config::from_env()?).await,
        Cmd::SetupDb => setup_db(&Config::from_env()?).await,
        Cmd::CreateAdmin { email, full_name } => {
            let config = Config::from_env()?;
            let stdin = io::stdin();
            let answers = prompt_admin(&mut stdin.lock(), &mut io::stdout(), email, full_name)?;
            create_admin(&config, answers).await
        }
        Cmd::ListUsers => list_users(&Config::from_env()?).await,
        Cmd::TestConnection => test_connection().await,
    }
}

async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    let url = config.require_database_url()?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(url)
        .await
        .context("Failed to connect to database")?;
    Ok(pool)
}

async fn check_tables(config: &Config) -> anyhow::Result<()> {
    println!("🔍 Checking database tables...\n");
    let pool = connect(config).await?;

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT tablename::text FROM pg_tables WHERE schemaname = 'public' ORDER BY tablename",
    )
    .fetch_all(&pool)
    .await
    .context("Failed to list tables")?;

    if tables.is_empty() {
        println!("⚠️ No tables in the public schema");
    } else {
        println!("📋 Tables:");
        println!("{}", "=".repeat(40));
        for (i, table) in tables.iter().enumerate() {
            println!("{}. {}", i + 1, table);
        }
        println!("\n✅ Total: {}", tables.len());
    }
    Ok(())
}

async fn setup_db(config: &Config) -> anyhow::Result<()> {
    println!("🚀 Setting up database...");
    let pool = connect(config).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    println!("✅ Tables, row-level security and policies are in place");
    println!("\nNext: homefix-admin create-admin");
    Ok(())
}

#[derive(Debug, PartialEq)]
struct AdminAnswers {
    email: String,
    password: String,
    full_name: String,
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> anyhow::Result<String> {
    write!(output, "{}", prompt)?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("input closed before all answers were given");
    }
    Ok(line.trim().to_string())
}

/// Asks until each answer is acceptable. Pre-filled values are still checked.
fn prompt_admin<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    email: Option<String>,
    full_name: Option<String>,
) -> anyhow::Result<AdminAnswers> {
    writeln!(output, "=== Create administrator ===\n")?;

    let mut email = email.map(|e| e.trim().to_string());
    let email = loop {
        let candidate = match email.take() {
            Some(e) => e,
            None => ask(input, output, "Email: ")?,
        };
        if validate_email(&candidate) {
            break candidate.to_lowercase();
        }
        writeln!(output, "❌ Please enter a valid email address")?;
    };

    let password = loop {
        let candidate = ask(
            input,
            output,
            &format!("Password (at least {} characters): ", MIN_PASSWORD_LEN),
        )?;
        if candidate.chars().count() >= MIN_PASSWORD_LEN {
            break candidate;
        }
        writeln!(
            output,
            "❌ Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )?;
    };

    let mut full_name = full_name.map(|n| n.trim().to_string());
    let full_name = loop {
        let candidate = match full_name.take() {
            Some(n) => n,
            None => ask(input, output, "Full name: ")?,
        };
        if !candidate.is_empty() {
            break candidate;
        }
        writeln!(output, "❌ Please enter a name")?;
    };

    Ok(AdminAnswers {
        email,
        password,
        full_name,
    })
}

async fn create_admin(config: &Config, answers: AdminAnswers) -> anyhow::Result<()> {
    println!("\nCreating administrator account...");
    let client = SupabaseClient::new(config);

    let user = client
        .create_auth_user(&NewAuthUser {
            email: answers.email.clone(),
            password: answers.password,
            email_confirm: true,
            user_metadata: json!({ "full_name": answers.full_name }),
            app_metadata: json!({ "role": UserRole::Admin.as_str() }),
        })
        .await
        .context("Failed to create auth user (is the email already registered?)")?;

    client
        .upsert_profile(&UpsertProfile {
            id: user.id,
            email: answers.email.clone(),
            full_name: Some(answers.full_name.clone()),
            role: UserRole::Admin,
        })
        .await
        .context("Failed to save profile")?;

    println!("\n✅ Administrator created");
    println!("📧 Email: {}", answers.email);
    println!("👤 Name: {}", answers.full_name);
    println!("👑 Role: {}", UserRole::Admin.as_str());
    Ok(())
}

async fn list_users(config: &Config) -> anyhow::Result<()> {
    println!("Fetching users...\n");
    let client = SupabaseClient::new(config);

    let users = client
        .list_auth_users()
        .await
        .context("Failed to list auth users")?;
    let profiles: HashMap<_, _> = client
        .list_profiles()
        .await
        .context("Failed to list profiles")?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    println!("📋 Registered users:");
    println!("{}", "=".repeat(60));
    for user in &users {
        let profile = profiles.get(&user.id);
        println!("👤 Id: {}", user.id);
        println!("📧 Email: {}", user.email.as_deref().unwrap_or("-"));
        println!(
            "👤 Name: {}",
            profile
                .and_then(|p| p.full_name.as_deref())
                .unwrap_or("not set")
        );
        println!(
            "👑 Role: {}",
            profile.map_or("not set", |p| p.role.as_str())
        );
        println!(
            "✅ Confirmed: {}",
            if user.email_confirmed_at.is_some() { "yes" } else { "no" }
        );
        println!("📅 Created: {}", user.created_at.format("%Y-%m-%d %H:%M"));
        println!("{}", "─".repeat(60));
    }
    println!("\n✅ Total users: {}", users.len());
    Ok(())
}

fn presence(name: &str) -> &'static str {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => "✅ set",
        _ => "❌ missing",
    }
}

async fn test_connection() -> anyhow::Result<()> {
    println!("🔍 Testing backend connection...");
    let url_state = match std::env::var("SUPABASE_URL") {
        Ok(v) if !v.is_empty() => "✅ set",
        _ => presence("NEXT_PUBLIC_SUPABASE_URL"),
    };
    println!("URL: {}", url_state);
    println!("Service role key: {}", presence("SUPABASE_SERVICE_ROLE_KEY"));
    println!("JWT secret: {}", presence("SUPABASE_JWT_SECRET"));
    println!("Database URL: {}", presence("DATABASE_URL"));

    let config = Config::from_env()?;
    let client = SupabaseClient::new(&config);

    println!("\n🔌 Connecting...");
    match client.rpc("version", &json!({})).await {
        Ok(version) => {
            println!("✅ Connected");
            println!("Database version: {}", version);
            return Ok(());
        }
        Err(e) => {
            tracing::debug!("version rpc failed: {}", e);
            println!("ℹ️ version() is not exposed, trying a table read...");
        }
    }

    match client.probe_table(PROFILES).await {
        Ok(_) => {
            println!("✅ Connected (table read)");
            Ok(())
        }
        Err(e) => {
            println!("\n🔧 Troubleshooting:");
            println!("1. Check the backend URL and service role key in .env");
            println!("2. Check your network connection");
            println!("3. Make sure the URL is reachable");
            println!("4. Make sure the key has service-role permissions");
            Err(e).context("Connection failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn answers(input: &str, email: Option<&str>, name: Option<&str>) -> (anyhow::Result<AdminAnswers>, String) {
        let mut output = Vec::new();
        let result = prompt_admin(
            &mut Cursor::new(input.as_bytes().to_vec()),
            &mut output,
            email.map(str::to_string),
            name.map(str::to_string),
        );
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn reprompts_until_answers_are_valid() {
        let (result, output) = answers(
            "not-an-email\nAdmin@Example.com\nshort\nlongenough\n   \nNora Saleh\n",
            None,
            None,
        );
        assert_eq!(
            result.unwrap(),
            AdminAnswers {
                email: "admin@example.com".into(),
                password: "longenough".into(),
                full_name: "Nora Saleh".into(),
            }
        );
        assert!(output.contains("valid email"));
        assert!(output.contains("at least 8 characters"));
        assert!(output.contains("enter a name"));
    }

    #[test]
    fn prefilled_answers_skip_prompts() {
        let (result, output) = answers("password123\n", Some("ops@homefix.sa"), Some("Ops"));
        let answers = result.unwrap();
        assert_eq!(answers.email, "ops@homefix.sa");
        assert_eq!(answers.full_name, "Ops");
        assert!(!output.contains("Email: "));
    }

    #[test]
    fn closed_input_is_an_error() {
        let (result, _) = answers("admin@example.com\n", None, None);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["homefix-admin", "create-admin", "--email", "a@b.co"]).unwrap();
        assert!(matches!(cli.cmd, Cmd::CreateAdmin { email: Some(_), full_name: None }));
        assert!(Cli::try_parse_from(["homefix-admin", "bogus"]).is_err());
    }
}
