//! Termine Admin CLI
//!
//! Command-line back office for the Termine admin API:
//! - List users, toggle admin rights, set or add coupons
//! - Create users and appointment slots
//! - Watch the user table live and edit it interactively
//!
//! Run with: cargo run -- users list
//!
//! Environment variables (see `termine-admin config` for the file format):
//! - `TERMINE_API_URL`: Admin API base URL
//! - `TERMINE_LOG_LEVEL` / `TERMINE_LOG_FORMAT`: Log output
//! - `RUST_LOG`: Full log filter, overrides the level

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use termine_admin::config::{generate_default_config, Config, LoggingConfig};
use termine_admin::{
    AppointmentBatch, HttpUserApi, NewUser, TableError, UserApi, UserField, UserList,
    UserTableController, ENTER_KEY,
};

#[derive(Parser)]
#[command(name = "termine-admin")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Back office for the Termine booking service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Admin API base URL (overrides the config file)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Config file (default: search the usual locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage users
    Users {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Change coupon counts
    Coupons {
        #[command(subcommand)]
        action: CouponCommand,
    },

    /// Manage appointment slots
    Appointments {
        #[command(subcommand)]
        action: AppointmentCommand,
    },

    /// Show the user table live; type commands to edit it
    Watch,

    /// Check that the admin API is reachable
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// List all users
    List,

    /// Grant or revoke admin rights
    ToggleAdmin {
        /// User name
        name: String,
    },

    /// Set the coupon count of a user
    SetCoupons {
        /// User name
        name: String,
        /// New coupon count
        coupons: u32,
    },

    /// Create a user
    Add {
        /// User name
        name: String,
        /// Password (default: generate one)
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CouponCommand {
    /// Add coupons to a user (negative to take them away)
    Add {
        /// User name
        name: String,
        /// Coupons to add
        #[arg(allow_negative_numbers = true)]
        increment: i64,
    },
}

#[derive(Subcommand)]
pub enum AppointmentCommand {
    /// Create one day of appointment slots
    Add {
        #[arg(long)]
        day: u32,
        #[arg(long)]
        month: u32,
        /// Year (default: current year)
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, default_value_t = AppointmentBatch::DEFAULT_START_HOUR)]
        start_hour: u32,
        #[arg(long, default_value_t = AppointmentBatch::DEFAULT_START_MIN)]
        start_min: u32,
        #[arg(long, default_value_t = AppointmentBatch::DEFAULT_NUM_SLOTS)]
        num_slots: u32,
        #[arg(long, default_value_t = AppointmentBatch::DEFAULT_APPOINTMENTS_PER_SLOT)]
        per_slot: u32,
        #[arg(long, default_value_t = AppointmentBatch::DEFAULT_SLOT_DURATION_MIN)]
        slot_duration: u32,
        /// Only print the slots that would be created
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }

    init_logging(&config.logging);
    tracing::debug!("Admin API: {}", config.api.base_url);

    if let Commands::Config { output } = &cli.command {
        return write_config(output.as_ref());
    }

    let api = HttpUserApi::new(config.api.clone()).context("Failed to create HTTP client")?;
    let json = cli.format == "json";

    match cli.command {
        Commands::Users { action } => run_user_command(api, action, json).await,
        Commands::Coupons {
            action: CouponCommand::Add { name, increment },
        } => {
            api.increment_coupons(&name, increment)
                .await
                .with_context(|| format!("Failed to change coupons of {}", name))?;
            println!("Changed coupons of {} by {:+}", name, increment);
            Ok(())
        }
        Commands::Appointments { action } => run_appointment_command(api, action).await,
        Commands::Watch => {
            println!("{}", config.display.instance_name);
            watch(api, config.display.poll_interval(), json).await
        }
        Commands::Status => {
            api.health().await.context("Admin API is not healthy")?;
            println!("Admin API at {}: healthy", api.base_url());
            Ok(())
        }
        Commands::Config { .. } => Ok(()),
    }
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("termine_admin={}", config.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn write_config(output: Option<&PathBuf>) -> anyhow::Result<()> {
    let content = generate_default_config();
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write config to {:?}", path))?;
            println!("Config written to {:?}", path);
        }
        None => print!("{}", content),
    }
    Ok(())
}

async fn run_user_command(api: HttpUserApi, action: UserCommand, json: bool) -> anyhow::Result<()> {
    let controller = UserTableController::new(api);
    controller.first_load().await;
    if let Some(error) = controller.last_error() {
        bail!("{}", error);
    }

    match action {
        UserCommand::List => print_users(&controller.users(), json)?,

        UserCommand::ToggleAdmin { name } => {
            let now_admin = controller.user(&name).map(|u| !u.is_admin).unwrap_or_default();
            controller.toggle_admin(&name).await?;
            println!(
                "{} is {} an administrator",
                name,
                if now_admin { "now" } else { "no longer" }
            );
        }

        UserCommand::SetCoupons { name, coupons } => {
            controller.begin_edit(&name)?;
            controller.change_field(UserField::Coupons(coupons))?;
            if controller.on_key_down(ENTER_KEY).await? {
                println!("{} now has {} coupons", name, coupons);
            } else {
                println!("{} already has {} coupons", name, coupons);
            }
        }

        UserCommand::Add { name, password } => {
            let generated = password.is_none();
            let password = password.unwrap_or_else(generate_password);
            controller.add_user(&NewUser::new(name.clone(), password.clone())).await?;
            if generated {
                println!("Created {} with password {}", name, password);
            } else {
                println!("Created {}", name);
            }
        }
    }

    controller.shutdown();
    Ok(())
}

async fn run_appointment_command(api: HttpUserApi, action: AppointmentCommand) -> anyhow::Result<()> {
    let AppointmentCommand::Add {
        day,
        month,
        year,
        start_hour,
        start_min,
        num_slots,
        per_slot,
        slot_duration,
        dry_run,
    } = action;

    let batch = AppointmentBatch {
        day,
        month,
        year: year.unwrap_or_else(|| AppointmentBatch::default().year),
        start_hour,
        start_min,
        num_slots,
        num_appointment_per_slot: per_slot,
        slot_duration_min: slot_duration,
    };

    let slots = batch.slot_starts()?;
    if dry_run {
        for start in &slots {
            println!("{}  {} appointments", start.format("%Y-%m-%d %H:%M"), per_slot);
        }
        println!("{} slots, {} appointments total", slots.len(), batch.total_appointments());
        return Ok(());
    }

    let controller = UserTableController::new(api);
    controller.add_appointments(&batch).await?;
    controller.shutdown();
    println!(
        "Created {} slots with {} appointments on {}",
        slots.len(),
        batch.total_appointments(),
        batch.date()?.format("%Y-%m-%d")
    );
    Ok(())
}

/// Interactive live view. Reads one command per line from stdin.
async fn watch(api: HttpUserApi, poll_interval: Duration, json: bool) -> anyhow::Result<()> {
    let controller = UserTableController::with_poll_interval(api, poll_interval);
    println!("Commands: edit <user> <coupons> | toggle <user> | refresh | dismiss | quit");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut render = tokio::time::interval(Duration::from_millis(250));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut shown_users: Option<UserList> = None;
    let mut shown_error: Option<TableError> = None;
    let mut shown_spinner = false;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match run_watch_command(&controller, line.trim()).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => eprintln!("{}", e),
                }
            }
            _ = render.tick() => {
                let table = controller.snapshot();
                if shown_users.as_ref() != Some(table.users()) {
                    print_users(table.users(), json)?;
                    shown_users = Some(table.users().clone());
                }
                if table.spinner_visible() != shown_spinner {
                    shown_spinner = table.spinner_visible();
                    if shown_spinner {
                        eprintln!("(refreshing...)");
                    }
                }
                if table.last_error() != shown_error.as_ref() {
                    if let Some(error) = table.last_error() {
                        eprintln!("! {}", error);
                    }
                    shown_error = table.last_error().cloned();
                }
            }
        }
    }

    controller.shutdown();
    Ok(())
}

/// Returns false when the user asked to quit
async fn run_watch_command(
    controller: &UserTableController<HttpUserApi>,
    line: &str,
) -> anyhow::Result<bool> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        [] => {}
        ["quit"] | ["exit"] | ["q"] => return Ok(false),
        ["refresh"] | ["r"] => controller.schedule_refresh(),
        ["dismiss"] => controller.dismiss_error(),
        ["toggle", name] => controller.toggle_admin(name).await?,
        ["edit", name, coupons] => {
            controller.begin_edit(name)?;
            controller.change_input(UserField::COUPONS, coupons)?;
            controller.on_key_down(ENTER_KEY).await?;
        }
        _ => eprintln!("Unknown command: {}", line),
    }
    Ok(true)
}

fn print_users(users: &UserList, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&users.to_vec())?);
        return Ok(());
    }

    println!("{:<24} {:>6} {:>10} {:>8}", "USER", "ADMIN", "BOOKINGS", "COUPONS");
    for user in users.iter() {
        println!(
            "{:<24} {:>6} {:>10} {:>8}",
            user.user_name,
            if user.is_admin { "yes" } else { "no" },
            user.total_bookings,
            user.coupons
        );
    }
    println!("{} users", users.len());
    Ok(())
}

fn generate_password() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..12].to_string()
}
