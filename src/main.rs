// Stockroom - Command line tools
// Database bootstrap, demo seed data, and CSV entity import.

use std::env;
use std::path::Path;

use anyhow::{Context, Result};

use stockroom::{
    entity_count, insert_entities, insert_material, insert_user, load_entities_csv, Config,
    Database, EntityKind, Material, NamedEntity, Role, StoreError, UnitOfMeasure, User,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("init") => run_init(),
        Some("seed") => run_seed(),
        Some("import") => {
            let csv_path = args
                .get(2)
                .context("usage: stockroom import <entities.csv>")?;
            run_import(Path::new(csv_path))
        }
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn open_database() -> Result<Database> {
    let config = Config::from_env();
    let db = Database::global_init(&config)?;
    Ok(db.clone())
}

fn run_init() -> Result<()> {
    let config = Config::from_env();
    Database::global_init(&config)?;
    println!("✓ Database initialized at {}", config.db_path.display());
    Ok(())
}

fn run_seed() -> Result<()> {
    let db = open_database()?;

    let existing = db.with_conn(entity_count)?;
    if existing > 0 {
        println!("Database already has {existing} entities, skipping demo data");
    } else {
        let batch = demo_entities();
        let summary = db.with_conn(|conn| {
            for (name, unit) in [
                ("Copper wire", UnitOfMeasure::Meter),
                ("Hydraulic oil", UnitOfMeasure::Liter),
                ("Bearing 6204", UnitOfMeasure::Piece),
                ("Welding electrodes", UnitOfMeasure::Pack),
            ] {
                insert_material(conn, &Material::new(name, unit))?;
            }
            insert_entities(conn, &batch)
        })?;
        println!("✓ Seeded {} entities and 4 materials", summary.inserted);
    }

    seed_users(&db)
}

fn demo_entities() -> Vec<(EntityKind, NamedEntity)> {
    let mut batch = Vec::new();
    for name in ["Petro Kovalenko", "Olena Shevchenko", "Taras Hnatiuk"] {
        batch.push((EntityKind::Repairman, NamedEntity::new(name)));
    }
    for name in ["Budmat Trading", "OfficeMart"] {
        batch.push((EntityKind::Buyer, NamedEntity::new(name)));
    }
    for name in ["Dnipro Metals", "TechPostach"] {
        batch.push((EntityKind::Supplier, NamedEntity::new(name)));
    }
    batch
}

fn seed_users(db: &Database) -> Result<()> {
    for (username, role) in [
        ("admin", Role::Admin),
        ("warehouse", Role::Warehouse),
        ("maintenance", Role::Maintenance),
    ] {
        // Printed once at creation; only the salted hash is stored
        let password = uuid::Uuid::new_v4().simple().to_string();
        let user = User::new(username, &password, role);

        match db.with_conn(|conn| insert_user(conn, &user)) {
            Ok(()) => println!("✓ Created user `{username}` with password {password}"),
            Err(StoreError::Query(rusqlite::Error::SqliteFailure(e, _)))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                println!("User `{username}` already exists, keeping current password");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn run_import(csv_path: &Path) -> Result<()> {
    let db = open_database()?;

    println!("Loading entities from {}...", csv_path.display());
    let batch = load_entities_csv(csv_path)?;
    println!("✓ Loaded {} rows", batch.len());

    let summary = db.with_conn(|conn| insert_entities(conn, &batch))?;
    println!("✓ Inserted: {} entities", summary.inserted);
    println!("✓ Skipped existing: {}", summary.skipped);

    Ok(())
}

fn print_usage() {
    println!("Stockroom {}", stockroom::VERSION);
    println!();
    println!("Usage:");
    println!("  stockroom init              Create the database and schema");
    println!("  stockroom seed              Load demo entities, materials, and accounts");
    println!("  stockroom import <csv>      Import entities from a kind,name CSV");
}
