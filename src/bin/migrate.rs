//! CLI tool to apply and inspect database migrations.
//!
//! Usage:
//!   cargo run --bin vista-migrate -- up
//!   cargo run --bin vista-migrate -- status

use std::env;

use vista_lib::config::Config;
use vista_lib::db::{DbPool, MigrationRunner};

fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let command = &args[1];
    if matches!(command.as_str(), "help" | "--help" | "-h") {
        print_usage();
        return;
    }

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match DbPool::open(&config.database_path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error opening database: {}", e);
            std::process::exit(1);
        }
    };
    let runner = MigrationRunner::new(&config.migrations_dir);

    match command.as_str() {
        "up" => migrate_up(&pool, &runner),
        "status" => show_status(&pool, &runner),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            std::process::exit(1);
        }
    }

    if let Err(e) = pool.close() {
        eprintln!("Error closing database: {}", e);
        std::process::exit(1);
    }
}

fn migrate_up(pool: &DbPool, runner: &MigrationRunner) {
    match runner.apply(pool) {
        Ok(applied) if applied.is_empty() => {
            println!("No pending migrations in {}.", runner.dir().display());
        }
        Ok(applied) => {
            for name in &applied {
                println!("Applied {}", name);
            }
            println!("{} migration(s) applied.", applied.len());
        }
        Err(e) => {
            eprintln!("Error applying migrations: {}", e);
            std::process::exit(1);
        }
    }
}

fn show_status(pool: &DbPool, runner: &MigrationRunner) {
    let applied = match MigrationRunner::applied(pool) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error reading migrations: {}", e);
            std::process::exit(1);
        }
    };

    println!("Migrations directory: {}", runner.dir().display());
    if applied.is_empty() {
        println!("No migrations applied.");
        return;
    }

    println!();
    println!("{:<48} {:<20}", "NAME", "RUN AT");
    println!("{}", "-".repeat(68));
    for migration in applied {
        println!("{:<48} {:<20}", migration.name, migration.run_at);
    }
    println!();
}

fn print_usage() {
    eprintln!();
    eprintln!("Usage: vista-migrate <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  up        Apply pending migrations");
    eprintln!("  status    List applied migrations");
    eprintln!("  help      Show this help");
    eprintln!();
    eprintln!("The database and migrations directory are read from DATABASE_PATH");
    eprintln!("and VISTA_MIGRATIONS_DIR (see .env).");
    eprintln!();
}
