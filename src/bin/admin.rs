//! Operator commands: seed the ingredient catalog and create staff accounts.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use diesel::prelude::*;
use foodgram_server::accounts::{create_account, NewAccount};
use foodgram_server::config::Config;
use foodgram_server::db::create_pool;
use foodgram_server::error::FieldErrors;
use foodgram_server::models::NewIngredient;
use foodgram_server::schema::ingredients;
use foodgram_server::telemetry::init_console_logging;
use foodgram_server::validation::check_ingredient;

/// Rows per INSERT; keeps bind parameters well under the Postgres limit.
const BATCH_SIZE: usize = 1000;

#[derive(Parser)]
#[command(name = "foodgram-admin")]
#[command(about = "Foodgram administration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load ingredients from a JSON array of {"name", "measurement_unit"}
    LoadIngredients {
        /// Path to the JSON catalog
        file: PathBuf,
    },
    /// Create a staff account
    CreateSuperuser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "Admin")]
        first_name: String,
        #[arg(long, default_value = "Admin")]
        last_name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_console_logging();

    let config = Config::load()?;
    let pool = create_pool(&config.database_url, 1)?;
    let mut conn = pool.get().context("failed to get a database connection")?;

    match cli.command {
        Commands::LoadIngredients { file } => {
            let inserted = load_ingredients(&mut conn, &file)?;
            println!("Loaded {inserted} ingredients");
        }
        Commands::CreateSuperuser {
            email,
            username,
            password,
            first_name,
            last_name,
        } => {
            let user = create_account(
                &mut conn,
                &NewAccount {
                    email: &email,
                    username: &username,
                    first_name: &first_name,
                    last_name: &last_name,
                    password: &password,
                },
                true,
            )?;
            println!("Created staff user {} (id {})", user.username, user.id);
        }
    }

    Ok(())
}

/// Splits a catalog into rows worth inserting and the number rejected.
fn valid_ingredients(catalog: Vec<NewIngredient>) -> (Vec<NewIngredient>, usize) {
    let total = catalog.len();
    let valid: Vec<NewIngredient> = catalog
        .into_iter()
        .map(|i| NewIngredient {
            name: i.name.trim().to_string(),
            measurement_unit: i.measurement_unit.trim().to_string(),
        })
        .filter(|i| {
            let mut errors = FieldErrors::new();
            check_ingredient(&mut errors, &i.name, &i.measurement_unit);
            if !errors.is_empty() {
                tracing::warn!(name = %i.name, unit = %i.measurement_unit, "skipping invalid ingredient");
            }
            errors.is_empty()
        })
        .collect();
    let skipped = total - valid.len();
    (valid, skipped)
}

/// Inserts the catalog, leaving existing (name, unit) pairs alone. Returns
/// the number of new rows.
fn load_ingredients(conn: &mut PgConnection, file: &PathBuf) -> Result<usize> {
    let raw = fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let catalog: Vec<NewIngredient> =
        serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", file.display()))?;

    let (rows, skipped) = valid_ingredients(catalog);
    if skipped > 0 {
        tracing::warn!(skipped, "invalid catalog entries were ignored");
    }

    conn.transaction(|conn| {
        let mut inserted = 0;
        for batch in rows.chunks(BATCH_SIZE) {
            inserted += diesel::insert_into(ingredients::table)
                .values(batch)
                .on_conflict((ingredients::name, ingredients::measurement_unit))
                .do_nothing()
                .execute(conn)?;
        }
        Ok::<_, diesel::result::Error>(inserted)
    })
    .context("failed to insert ingredients")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_format() {
        let catalog: Vec<NewIngredient> = serde_json::from_str(
            r#"[{"name": "абрикосовое варенье", "measurement_unit": "г"},
                {"name": "  salt ", "measurement_unit": "g"},
                {"name": "", "measurement_unit": "g"}]"#,
        )
        .unwrap();

        let (valid, skipped) = valid_ingredients(catalog);
        assert_eq!(skipped, 1);
        assert_eq!(valid.len(), 2);
        assert_eq!(valid[1].name, "salt");
    }

    #[test]
    fn test_cli_parses_create_superuser() {
        let cli = Cli::try_parse_from([
            "foodgram-admin",
            "create-superuser",
            "--email",
            "admin@example.com",
            "--username",
            "admin",
            "--password",
            "secret",
        ])
        .unwrap();
        match cli.command {
            Commands::CreateSuperuser {
                username, first_name, ..
            } => {
                assert_eq!(username, "admin");
                assert_eq!(first_name, "Admin");
            }
            Commands::LoadIngredients { .. } => panic!("wrong command"),
        }
    }
}
