//! Exécute une requête MDX et affiche le cellset.
//!
//! ```text
//! cargo run -p xmlaclient --example query -- <url> <catalog> "<mdx>"
//! cargo run -p xmlaclient --example query -- --drillthrough <url> <catalog> "<mdx>"
//! ```

use std::env;

use anyhow::Result;
use xmlaclient::{Cellset, DrillthroughResult, Endpoint, XmlaClient};

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let mut args: Vec<String> = env::args().collect();
    let drillthrough = args.get(1).map(String::as_str) == Some("--drillthrough");
    if drillthrough {
        args.remove(1);
    }
    if args.len() != 4 {
        eprintln!(
            "Usage:\n  {0} [--drillthrough] <url> <catalog> <mdx>",
            args[0]
        );
        std::process::exit(1);
    }

    let client = XmlaClient::new(Endpoint::parse(&args[1])?);
    if drillthrough {
        let table = client.execute_drillthrough_table(&args[3], &args[2])?;
        print_table(&table);
    } else {
        let cellset = client.execute_cellset(&args[3], &args[2])?;
        print_cellset(&cellset);
    }
    Ok(())
}

fn print_cellset(cellset: &Cellset) {
    if let Some(slicer) = cellset.slicer() {
        let members: Vec<&str> = slicer
            .positions
            .iter()
            .flat_map(|p| p.members.iter().map(|m| m.unique_name.as_str()))
            .collect();
        println!("WHERE {}", members.join(", "));
    }

    for axis in cellset.axes() {
        println!("{} ({}) : {} positions", axis.name, axis.hierarchies.join(", "), axis.positions.len());
    }

    for cell in cellset.cells() {
        let value = cell
            .value
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "(null)".to_string());
        println!("  [{}] {} \"{}\"", cell.ordinal, value, cell.formatted_value);
    }
}

fn print_table(table: &DrillthroughResult) {
    let columns = table.column_names();
    println!("{}", columns.join("\t"));
    for row in &table.rows {
        let line: Vec<&str> = columns
            .iter()
            .map(|c| row.get(*c).map(String::as_str).unwrap_or(""))
            .collect();
        println!("{}", line.join("\t"));
    }
}
