//! This module uses the embedded Diesel migration data to provide functions for checking the
//! database migration status and migrating the database schema to the current state.
//!
//! The provided functions are meant to be used directly from the command line interface
//! implementation.
use crate::setup::get_database_url_from_env;
use diesel::migration::Migration;
use diesel::Connection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/postgresql");

/// Migrate the database schema to the latest known migration for the current application version.
///
/// The database connection URL is taken from the environment variable, using
/// [get_database_url_from_env]. Information about the migration process is printed to stdout.
pub fn run_migrations() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let mut connection = diesel::pg::PgConnection::establish(&get_database_url_from_env()?)?;
    let mut connection =
        diesel_migrations::HarnessWithOutput::new(&mut connection, std::io::stdout());
    connection.run_pending_migrations(MIGRATIONS)?;

    Ok(())
}

/// Return the names of the database schema migrations that have not been applied to the database
/// yet. An empty list means the schema is up to date with the current application version.
///
/// The database connection URL is taken from the environment variable, using
/// [get_database_url_from_env].
pub fn pending_migrations(
) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync + 'static>> {
    let mut connection = diesel::pg::PgConnection::establish(&get_database_url_from_env()?)?;
    let pending = connection.pending_migrations(MIGRATIONS)?;
    Ok(pending.iter().map(|m| m.name().to_string()).collect())
}
