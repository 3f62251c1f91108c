use anyhow::{Context, Result};
use colored::*;

use crate::config::AppConfig;
use crate::dashboard::{self, DashboardState};
use crate::logger::AuditLog;
use crate::store::ConsoleStore;

pub fn print_banner() {
    println!("{}", "====================================".bright_cyan());
    println!("{}", "        BOT CONSOLE v0.1.0          ".bright_cyan().bold());
    println!("{}", "====================================".bright_cyan());
    println!("{}", " Bot administration dashboard".bright_white());
    println!("{}\n", " Press Ctrl+C to stop".dimmed());
}

/// Builds the store and shared state, resumes pending ingestion, and serves
/// the console until the process exits.
pub async fn serve(config: AppConfig) -> Result<()> {
    print_banner();

    let audit = AuditLog::new(&config.log_dir).context("Failed to create audit log")?;
    println!(
        "{} {}",
        "✓ Audit log:".green(),
        audit.path().display().to_string().dimmed()
    );

    let store = if config.seed_demo_data {
        println!("{}", "✓ Demo data loaded.".green());
        ConsoleStore::seeded()
    } else {
        println!("{}", "⚠️  Starting with an empty console (seed_demo_data = false).".yellow());
        ConsoleStore::new()
    };
    println!(
        "  {} bots, {} users, {} admins",
        store.bots().len(),
        store.users().len(),
        store.admins().len()
    );

    let addr = config.bind_addr();
    let state = DashboardState::new(config, store, audit);
    state.resume_pending_ingestion().await;

    println!(
        "{} {}",
        "✓ Console:".green(),
        format!("http://{}", addr).bright_white()
    );
    println!("{} {}\n", "✓ API:".green(), format!("http://{}/api", addr).dimmed());

    dashboard::start_dashboard(state)
        .await
        .with_context(|| format!("Console server on {} stopped", addr))
}
