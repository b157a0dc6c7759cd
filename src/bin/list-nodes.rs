//! CLI tool to list the node schemas discovered in a nodepacks folder
//!
//! Usage:
//!   cargo run --bin list-nodes
//!   cargo run --bin list-nodes -- ./nodepacks
//!   cargo run --bin list-nodes -- --json ./nodepacks

use std::env;
use std::process;

use nodepack_registry::nodes::NodepackLocator;
use nodepack_registry::registry::SchemaRegistry;

fn main() {
    let args: Vec<String> = env::args().collect();

    let json = args.iter().skip(1).any(|a| a == "--json");
    let dirs: Vec<&String> = args.iter().skip(1).filter(|a| !a.starts_with("--")).collect();

    if dirs.len() > 1 || args.iter().skip(1).any(|a| a.starts_with("--") && a != "--json") {
        eprintln!("Usage: {} [--json] [nodepacks-dir]", args[0]);
        eprintln!();
        eprintln!("Without a directory the nodepacks folder is searched for from the");
        eprintln!("executable location, falling back to ./nodepacks.");
        process::exit(1);
    }

    let mut locator = NodepackLocator::from_process();
    if let Some(dir) = dirs.first() {
        locator = locator.pinned(dir.as_str());
    }

    let registry = SchemaRegistry::new(locator);
    let nodepacks_dir = registry.nodepacks_dir();

    let records = match registry.list_all() {
        Ok(records) => records,
        Err(e) => {
            eprintln!("Error scanning {}: {}", nodepacks_dir.display(), e);
            process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&*records) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error serializing schemas: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    println!("Node schemas in: {}", nodepacks_dir.display());
    println!();

    if records.is_empty() {
        println!("  (none)");
        return;
    }

    let width = records.iter().map(|r| r.name.len()).max().unwrap_or(0);
    for record in records.iter() {
        println!("  {:<width$}  {}", record.name, record.filepath, width = width);
    }
    println!();
    println!("{} node(s)", records.len());
}
