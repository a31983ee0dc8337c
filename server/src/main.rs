use boardroom_server::cli::{database_migration, manage_users};
use boardroom_server::cli_error::CliError;
use clap::ArgAction;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use log::warn;

fn main() {
    let args = CliArgs::parse();
    let dotenv_result = dotenv();

    let env = env_logger::Env::new().filter_or(
        "RUST_LOG",
        match args.global_opts.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        },
    );
    env_logger::Builder::from_env(env).init();
    if dotenv_result.is_err() {
        warn!("Could not read .env file: {}", dotenv_result.unwrap_err());
    }

    if let Err(e) = run(args.command) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Serve => {
            let missing_migrations = database_migration::pending_migrations()
                .map_err(|e| CliError::DatabaseMigrationError(e.to_string()))?;
            if !missing_migrations.is_empty() {
                return Err(CliError::DatabaseMigrationRequired { missing_migrations });
            }
            boardroom_server::web::serve()
        }
        Command::MigrateDatabase => database_migration::run_migrations()
            .map_err(|e| CliError::DatabaseMigrationError(e.to_string())),
        Command::CreateUser => manage_users::add_user(),
        Command::ListUsers => manage_users::print_user_list(),
    }
}

/// Backend server and management cli of the boardroom meeting planner
#[derive(Debug, Parser)]
#[clap(name = "boardroom-server", version)]
pub struct CliArgs {
    #[clap(flatten)]
    global_opts: GlobalOpts,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the boardroom web API
    Serve,
    /// Apply pending database schema migrations
    MigrateDatabase,
    /// Interactively create a new user account
    CreateUser,
    /// List all registered user accounts
    ListUsers,
}

#[derive(Debug, Args)]
struct GlobalOpts {
    /// Verbosity level (can be specified multiple times)
    #[clap(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,
}
