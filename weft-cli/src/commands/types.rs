//! List what the builtin registry knows about.

use anyhow::Result;
use serde::Serialize;
use weft_core::Registry;

#[derive(Serialize)]
struct RegistryListing<'a> {
    types: Vec<&'a str>,
    functions: Vec<&'a str>,
}

pub fn list_types(json: bool) -> Result<()> {
    let registry = Registry::with_builtins();
    let listing = RegistryListing {
        types: registry.type_names(),
        functions: registry.function_names(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        println!("types: {}", listing.types.join(", "));
        println!("functions: {}", listing.functions.join(", "));
    }
    Ok(())
}
