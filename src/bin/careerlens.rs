//! careerlens CLI: profile onboarding backed by a local SQLite database.
//!
//! Usage:
//!   careerlens [--db path] [--generator program] profile <subcommand>
//!   careerlens [--db path] insight <subcommand>

use careerlens::{
    Clock, CommandGenerator, Credential, DisabledGenerator, ExternalId, InsightGenerator,
    InsightStore, OnboardingApi, OpenStore, ProfileStore, ProfileUpdate, ProfileUpdateCoordinator,
    SqliteStore, SystemClock, TrustedIdentity,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "careerlens",
    version,
    about = "Profile onboarding with generated industry insights"
)]
struct Cli {
    /// Path to SQLite database file
    #[arg(long, global = true, env = "CAREERLENS_DB")]
    db: Option<PathBuf>,
    /// Program that prints an insight JSON object for the industry given as its argument
    #[arg(long, global = true, env = "CAREERLENS_GENERATOR")]
    generator: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage user profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Inspect stored industry insights
    Insight {
        #[command(subcommand)]
        action: InsightAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Provision a profile for an identity-provider account
    Create {
        /// External (identity provider) user id
        external_id: String,
    },
    /// Update a profile, generating the industry's insight if needed
    Update {
        /// External (identity provider) user id
        external_id: String,
        #[arg(long)]
        industry: String,
        /// Years of experience
        #[arg(long)]
        experience: u32,
        #[arg(long)]
        bio: Option<String>,
        /// Skill (repeatable)
        #[arg(long = "skill")]
        skills: Vec<String>,
    },
    /// Print whether a profile has completed onboarding
    Status {
        /// External (identity provider) user id
        external_id: String,
    },
}

#[derive(Subcommand)]
enum InsightAction {
    /// Show the insight stored for an industry
    Show { industry: String },
    /// List all stored insights
    List,
}

/// Get the default database path (~/.local/share/careerlens/careerlens.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("careerlens").join("careerlens.db")
}

fn open_store(db: Option<PathBuf>) -> Result<Arc<SqliteStore>, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    tracing::debug!(path = %db_path.display(), "opening database");
    SqliteStore::open(&db_path)
        .map(Arc::new)
        .map_err(|e| format!("Failed to open database: {}", e))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("careerlens=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn build_api(store: Arc<SqliteStore>, generator: Option<PathBuf>) -> OnboardingApi {
    // Without a program, industries that already have an insight still work.
    let generator: Arc<dyn InsightGenerator> = match generator {
        Some(program) => Arc::new(CommandGenerator::new(program)),
        None => Arc::new(DisabledGenerator::new(
            "no insight generator configured (use --generator or CAREERLENS_GENERATOR)",
        )),
    };
    let coordinator = ProfileUpdateCoordinator::new(store, generator);
    OnboardingApi::new(Arc::new(TrustedIdentity), coordinator)
}

fn cmd_profile_create(store: &SqliteStore, external_id: &str) -> i32 {
    match store.ensure_profile(&ExternalId::from(external_id), SystemClock.now()) {
        Ok(profile) => print_json(&profile),
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn cmd_profile_update(
    store: Arc<SqliteStore>,
    generator: Option<PathBuf>,
    external_id: &str,
    update: ProfileUpdate,
) -> i32 {
    let api = build_api(store, generator);
    let response = api.update_user(&Credential::new(external_id), update).await;
    let code = print_json(&response);
    if response.success {
        code
    } else {
        1
    }
}

async fn cmd_profile_status(
    store: Arc<SqliteStore>,
    generator: Option<PathBuf>,
    external_id: &str,
) -> i32 {
    let api = build_api(store, generator);
    match api.onboarding_status(&Credential::new(external_id)).await {
        Ok(status) => print_json(&status),
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_insight_show(store: &SqliteStore, industry: &str) -> i32 {
    match store.find_insight(industry) {
        Ok(Some(insight)) => print_json(&insight),
        Ok(None) => {
            eprintln!("Error: no insight for industry '{}'", industry);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_insight_list(store: &SqliteStore) -> i32 {
    let insights = match store.list_insights() {
        Ok(insights) => insights,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if insights.is_empty() {
        println!("No insights stored.");
        return 0;
    }
    println!("{:<32}  {:<25}  {:<25}", "INDUSTRY", "CREATED", "NEXT UPDATE");
    println!("{}", "-".repeat(86));
    for insight in insights {
        println!(
            "{:<32}  {:<25}  {:<25}",
            insight.industry,
            insight.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            insight.next_update.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    0
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    let store = match open_store(cli.db) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Profile { action } => match action {
            ProfileAction::Create { external_id } => cmd_profile_create(&store, &external_id),
            ProfileAction::Update {
                external_id,
                industry,
                experience,
                bio,
                skills,
            } => {
                let update = ProfileUpdate {
                    industry,
                    experience,
                    bio,
                    skills,
                };
                cmd_profile_update(store, cli.generator, &external_id, update).await
            }
            ProfileAction::Status { external_id } => {
                cmd_profile_status(store, cli.generator, &external_id).await
            }
        },
        Commands::Insight { action } => match action {
            InsightAction::Show { industry } => cmd_insight_show(&store, &industry),
            InsightAction::List => cmd_insight_list(&store),
        },
    };
    std::process::exit(code);
}
