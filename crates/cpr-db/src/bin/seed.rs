//! # Seed Data Generator
//!
//! Populates the database with branches, people, today's tickets and a few
//! guarantees for local development.
//!
//! ## Usage
//! ```bash
//! # Seed ./data/cpr.db with 20 tickets (default)
//! cargo run -p cpr-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p cpr-db --bin seed -- --tickets 60 --db ./data/dev.db
//! ```
//!
//! ## Generated Data
//! - Two branches (Mirpur, Uttara)
//! - One admin, one manager and two staff per branch (password `password`)
//! - Tickets spread over the current business day, alternating between the
//!   structured and plain branch id shapes, some with the id only at the
//!   top level
//! - One guarantee per third ticket; every other one deactivated

use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};
use std::env;
use uuid::Uuid;

use cpr_core::guarantee::NewGuarantee;
use cpr_core::ticket::{Summary, Ticket};
use cpr_core::{Branch, NewBranch, PersonRecord};
use cpr_db::{Database, DbConfig};

const BRANCHES: &[(&str, &str)] = &[("Mirpur", "Mirpur 10, Dhaka"), ("Uttara", "Sector 7, Uttara, Dhaka")];

const STAFF_NAMES: &[&str] = &["Rafi", "Tanvir", "Nusrat", "Sabbir"];

const BRANDS: &[&str] = &["Samsung", "Xiaomi", "Nokia", "Apple", "Realme", "Oppo"];

/// (work part, base amount in Taka, part cost in Taka)
const SERVICES: &[(&str, i64, i64)] = &[
    ("SCREEN", 1800, 1100),
    ("BATTERY", 900, 450),
    ("CHARGING PORT", 600, 150),
    ("SOFTWARE", 500, 0),
    ("CAMERA", 1200, 700),
];

const PASSWORD: &str = "password";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut tickets: usize = 20;
    let mut db_path = String::from("./data/cpr.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--tickets" | "-t" => {
                if i + 1 < args.len() {
                    tickets = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("CPR Back Office Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -t, --tickets <N>  Number of tickets to generate (default: 20)");
                println!("  -d, --db <PATH>    Database file path (default: ./data/cpr.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 CPR Back Office Seed Data Generator");
    println!("=====================================");
    println!("Database: {}", db_path);
    println!("Tickets:  {}", tickets);
    println!();

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.branches().list().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} branches", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Branches
    let mut branches: Vec<Branch> = Vec::new();
    for (name, location) in BRANCHES {
        let branch = NewBranch {
            branch_name: name.to_string(),
            branch_location: location.to_string(),
        }
        .into_branch(Uuid::new_v4().to_string());
        db.branches().insert(&branch).await?;
        branches.push(branch);
    }
    println!("✓ Created {} branches", branches.len());

    // People
    let (admin, password) = person(json!({
        "name": "Owner",
        "phone": "01700000000",
        "email": "admin@cpr.local",
        "password": PASSWORD,
        "role": "admin"
    }))?;
    db.people().insert(&admin, &password).await?;

    let mut staff: Vec<(PersonRecord, &Branch)> = Vec::new();
    for (b, branch) in branches.iter().enumerate() {
        let key = branch.branch_name.to_lowercase();
        let (manager, password) = person(json!({
            "name": format!("{} Manager", branch.branch_name),
            "phone": format!("0171000000{b}"),
            "email": format!("manager.{key}@cpr.local"),
            "password": PASSWORD,
            "role": "manager",
            "branchName": branch.branch_name,
            "branchId": { "$oid": branch.id },
            "managerDailySalary": 800
        }))?;
        db.people().insert(&manager, &password).await?;

        for s in 0..2 {
            let name = STAFF_NAMES[(b * 2 + s) % STAFF_NAMES.len()];
            let (record, password) = person(json!({
                "name": name,
                "phone": format!("018{b}{s}0000000"),
                "email": format!("{}.{key}@cpr.local", name.to_lowercase()),
                "password": PASSWORD,
                "role": "staff",
                "branchName": branch.branch_name,
                "branchId": { "$oid": branch.id },
                "salaryPercentage": 20 + 5 * s
            }))?;
            db.people().insert(&record, &password).await?;
            staff.push((record, branch));
        }
    }
    println!("✓ Created 1 admin, {} managers, {} staff", branches.len(), staff.len());

    // Tickets and guarantees
    let now = Utc::now();
    let mut guarantees = 0;
    for n in 0..tickets {
        let (member, branch) = &staff[n % staff.len()];
        let (work_part, base, part_cost) = SERVICES[n % SERVICES.len()];
        let brand = BRANDS[n % BRANDS.len()];
        let guaranteed = n % 3 == 0;
        let guarantee_fee = if guaranteed { 200 } else { 0 };
        let duration = if guaranteed { "3 Months" } else { "" };

        let branch_ref = if n % 2 == 0 {
            json!({ "$oid": branch.id })
        } else {
            json!(branch.id)
        };
        let meta = json!({
            "enteredBy": member.name,
            "staffEmail": member.email,
            "staffId": member.id,
            "branchName": branch.branch_name,
            "branchId": branch_ref
        });
        let body = json!({
            "customer": { "name": format!("Customer {n}"), "phone": format!("019{n:08}") },
            "device": { "brand": brand, "modelNo": format!("M{}", 10 + n) },
            "problems": [{
                "IdProvidedWhileCreatingData": format!("p-{n}"),
                "workPart": work_part,
                "problemDescription": format!("{} issue", work_part.to_lowercase()),
                "extraPart": { "used": part_cost > 0, "source": "stock", "partCost": part_cost },
                "guarantee": {
                    "eligible": guaranteed,
                    "included": guaranteed,
                    "duration": duration,
                    "amount": guarantee_fee
                },
                "amounts": { "baseAmount": base, "collectedTotal": base + guarantee_fee }
            }],
            "meta": meta
        });

        let mut ticket: Ticket = serde_json::from_value(body)?;
        ticket.summary = Summary::recompute(&ticket.problems);
        let mut ticket = ticket.prepare_new(Uuid::new_v4().to_string(), now)?;
        let at = now - Duration::minutes(7 * n as i64);
        ticket.created_at = Some(at);
        ticket.updated_at = Some(at);
        // every fifth ticket mimics early clients: branch id at the top level only
        if n % 5 == 4 {
            ticket.branch_id = ticket.meta.branch_id.take();
        }
        db.tickets().insert(&ticket).await?;

        if guaranteed {
            let submission: NewGuarantee = serde_json::from_value(json!({
                "IdProvidedWhileCreatingData": format!("p-{n}"),
                "customer": ticket.customer,
                "device": ticket.device,
                "problem": { "workPart": work_part },
                "guarantee": {
                    "duration": "3 Months",
                    "amount": guarantee_fee,
                    "startDate": at.to_rfc3339(),
                    "endDate": (at + Duration::days(90)).to_rfc3339()
                },
                "meta": {
                    "enteredBy": member.name,
                    "staffId": member.id,
                    "branchId": { "$oid": branch.id },
                    "branchName": branch.branch_name
                }
            }))?;
            let mut record = submission.into_record(Uuid::new_v4().to_string(), Some(&ticket.id), now)?;
            if guarantees % 2 == 1 {
                record.deactivate(now);
            }
            db.guarantees().insert_many(&[record]).await?;
            guarantees += 1;
        }
    }
    println!("✓ Created {} tickets, {} guarantees", tickets, guarantees);

    println!();
    println!("Logins (password \"{}\"):", PASSWORD);
    println!("  admin    admin@cpr.local");
    for branch in &branches {
        println!(
            "  manager  manager.{}@cpr.local  (branchId {})",
            branch.branch_name.to_lowercase(),
            branch.id
        );
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn person(body: Value) -> Result<(PersonRecord, String), Box<dyn std::error::Error>> {
    let map: Map<String, Value> = match body {
        Value::Object(map) => map,
        _ => return Err("person body must be an object".into()),
    };
    let (mut record, password) = PersonRecord::from_submission(map)?;
    record.id = Uuid::new_v4().to_string();
    Ok((record, password))
}
