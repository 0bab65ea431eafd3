// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use change_of_address::{export, init_tracing, AddressBook, AppError, Config};

#[derive(Parser)]
#[command(name = "change-of-address", version, about = "Manage profiles and draft change-of-address notices")]
struct Cli {
    /// Data directory (overrides configuration)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Create the data directory and seed the service catalog
    Init,
    /// List profiles
    Profiles,
    /// Move a profile to a new address and draft notices for its services
    Move {
        profile_id: String,
        new_address: String,
    },
    /// Print drafted notifications
    Notifications {
        #[arg(long)]
        profile: Option<String>,
    },
    /// Export drafted notifications to CSV
    Export {
        path: PathBuf,
        #[arg(long)]
        profile: Option<String>,
    },
    /// Browse profiles, services and notifications (default)
    Ui,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Ui);

    // The TUI owns the terminal; log lines would corrupt it
    if !matches!(command, Command::Ui) {
        init_tracing();
    }

    let mut config = Config::load()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let book = AddressBook::open(&config.data_dir)?;

    match command {
        Command::Init => run_init(&book, &config),
        Command::Profiles => run_profiles(&book),
        Command::Move {
            profile_id,
            new_address,
        } => run_move(&book, &profile_id, &new_address),
        Command::Notifications { profile } => run_notifications(&book, profile.as_deref()),
        Command::Export { path, profile } => run_export(&book, &path, profile.as_deref()),
        Command::Ui => run_ui_mode(book),
    }
}

fn run_init(book: &AddressBook, config: &Config) -> Result<()> {
    let catalog = book.catalog.list()?;
    println!("✓ Data directory ready: {}", config.data_dir.display());
    println!("✓ Service catalog: {} entries", catalog.len());
    Ok(())
}

fn run_profiles(book: &AddressBook) -> Result<()> {
    let profiles = book.profiles.list()?;

    if profiles.is_empty() {
        println!("No profiles yet.");
        return Ok(());
    }

    for profile in profiles.values() {
        println!(
            "{:<14} {:<24} {:<40} {} services",
            profile.id,
            profile.name,
            profile.current_address,
            profile.services.len()
        );
    }

    Ok(())
}

fn run_move(book: &AddressBook, profile_id: &str, new_address: &str) -> Result<()> {
    let change = match book.moves.change_address(profile_id, new_address) {
        Ok(change) => change,
        Err(AppError::Storage(err)) => return Err(err),
        Err(err) => {
            eprintln!("❌ {}", err);
            std::process::exit(1);
        }
    };

    println!("🏠 {} → {}", change.profile.previous_address, change.profile.current_address);
    println!("✓ {}", change.message);

    for notice in &change.notifications {
        println!("  {}  {:<28} {}", notice.id, notice.service_name, notice.contact_info);
    }

    Ok(())
}

fn run_notifications(book: &AddressBook, profile_id: Option<&str>) -> Result<()> {
    let notifications = book.notifications.list(profile_id)?;

    for notice in &notifications {
        println!(
            "{:<10} {:<14} {:<28} {:<8} {} → {}",
            notice.id,
            notice.profile_id,
            notice.service_name,
            notice.status.as_str(),
            notice.old_address,
            notice.new_address
        );
    }
    println!("{} notifications", notifications.len());

    Ok(())
}

fn run_export(book: &AddressBook, path: &Path, profile_id: Option<&str>) -> Result<()> {
    let notifications = book.notifications.list(profile_id)?;

    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let rows = export::write_csv(file, &notifications)?;

    println!("✓ Exported {} notifications to {}", rows, path.display());
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(book: AddressBook) -> Result<()> {
    let mut app = ui::App::load(&book)?;
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_book: AddressBook) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the web API: cargo run --bin address-server --features server");
    std::process::exit(1);
}
