//! services/api/src/bin/schema.rs
//!
//! This binary prints the GraphQL schema in SDL form and saves it to a file
//! named `schema.graphql`.

use api_lib::graphql::schema_sdl;

/// Writes the SDL to `path`.
fn generate_schema(sdl: String, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, sdl)?;
    println!("GraphQL schema generated at {}", path);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    generate_schema(schema_sdl(), "schema.graphql")?;
    Ok(())
}
