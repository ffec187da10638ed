//! Parcourt les métadonnées d'un serveur XML/A.
//!
//! ```text
//! cargo run -p xmlaclient --example discover -- [url] [catalog]
//! ```
//!
//! Sans argument, l'URL et le catalogue viennent de la configuration
//! (`xmla.url`, `xmla.catalog`).

use std::env;

use anyhow::{Context, Result, anyhow};
use xmlaclient::{Endpoint, MetadataRow, XmlaClient, XmlaConfigExt};
use xmlaconfig::get_config;

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let args: Vec<String> = env::args().collect();
    let config = get_config();

    let client = match args.get(1) {
        Some(url) => XmlaClient::new(Endpoint::parse(url)?),
        None => XmlaClient::from_config(&config)?,
    };
    let catalog = args
        .get(2)
        .cloned()
        .or_else(|| config.get_xmla_catalog());

    let data_source = client.connect().context("Unable to reach the XML/A server")?;
    println!("Data source : {} ({})", data_source, client.dialect());

    let catalogs = client.discover_catalogs()?;
    println!("Catalogs : {}", catalogs.len());
    print_rows(&catalogs);

    let catalog = match catalog {
        Some(catalog) => catalog,
        None => catalogs
            .first()
            .and_then(|c| c.name.clone())
            .ok_or_else(|| anyhow!("No catalog on this server"))?,
    };

    for cube in client.discover_cubes(&catalog)? {
        let Some(cube_name) = cube.name.as_deref() else {
            continue;
        };
        println!("=====================");
        println!("Cube {} / {}", catalog, cube_name);

        for dimension in client.discover_dimensions(&catalog, cube_name)? {
            println!("  {}", dimension);
            let hierarchies =
                client.discover_hierarchies(&catalog, cube_name, dimension.unique_name.as_deref())?;
            for hierarchy in hierarchies {
                println!("    {}", hierarchy);
            }
        }
    }

    Ok(())
}

fn print_rows(rows: &[MetadataRow]) {
    for row in rows {
        println!("- {}", row);
    }
}
