//! # Seed Data Generator
//!
//! Populates a database with a demo catalog and a few client companies for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed ./tally_dev.db
//! cargo run -p tally-db --bin seed
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! ## Generated Data
//! - Products in every category, with stock
//! - Two companies with three employees each
//! - The walk-in company/employee pair is created by the migration; the seed
//!   only checks that it is there

use std::env;

use tally_core::{
    Category, Company, Employee, Money, Product, WALK_IN_COMPANY_ID, WALK_IN_EMPLOYEE_ID,
};
use tally_db::{Database, DbConfig, WriteBatch, WriteOp};
use uuid::Uuid;

/// Demo catalog: (name, category, price in cents, stock)
const CATALOG: &[(&str, Category, i64, i64)] = &[
    ("Coxinha", Category::Snack, 650, 40),
    ("Pastel de queijo", Category::Snack, 700, 30),
    ("Pão de queijo", Category::Snack, 450, 60),
    ("Empada de frango", Category::Snack, 600, 25),
    ("Marmita do dia", Category::Food, 2200, 15),
    ("Sanduíche natural", Category::Food, 1200, 20),
    ("Suco de laranja", Category::Drink, 800, 30),
    ("Refrigerante lata", Category::Drink, 600, 48),
    ("Café", Category::Drink, 400, 100),
    ("Brigadeiro", Category::Dessert, 300, 50),
    ("Bolo de pote", Category::Dessert, 1000, 12),
];

/// Demo companies and their employees: (company, [(employee, handle)])
const PARTIES: &[(&str, &[(&str, &str)])] = &[
    (
        "Acme Logística",
        &[
            ("Ana Souza", "5511990000001"),
            ("Bruno Lima", "5511990000002"),
            ("Carla Dias", ""),
        ],
    ),
    (
        "Globex Contabilidade",
        &[
            ("Diego Alves", "5511990000004"),
            ("Elisa Rocha", "5511990000005"),
            ("Fábio Nunes", "5511990000006"),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    match db.parties().get_employee(WALK_IN_EMPLOYEE_ID).await? {
        Some(employee) if employee.company_id == WALK_IN_COMPANY_ID => {
            println!("✓ Walk-in party present");
        }
        _ => {
            eprintln!("✗ Walk-in party missing; the schema migration did not run cleanly");
            return Err("walk-in party missing".into());
        }
    }

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut batch = WriteBatch::new();

    for (name, category, price_cents, stock) in CATALOG {
        batch.push(WriteOp::PutProduct(Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            price: Money::from_cents(*price_cents),
            category: *category,
            stock: *stock,
        }));
    }

    let mut employee_count = 0;
    for (company_name, employees) in PARTIES {
        let company_id = Uuid::new_v4().to_string();
        batch.push(WriteOp::PutCompany(Company {
            id: company_id.clone(),
            name: company_name.to_string(),
        }));

        for (employee_name, handle) in employees.iter() {
            batch.push(WriteOp::PutEmployee(Employee {
                id: Uuid::new_v4().to_string(),
                name: employee_name.to_string(),
                contact_handle: handle.to_string(),
                company_id: company_id.clone(),
            }));
            employee_count += 1;
        }
    }

    db.commit(batch).await?;

    println!();
    println!("✓ {} products", CATALOG.len());
    println!("✓ {} companies, {} employees", PARTIES.len(), employee_count);
    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
