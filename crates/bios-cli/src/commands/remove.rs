//! `bios remove`

use super::open_store;
use crate::config::BiosConfig;
use anyhow::Result;

pub fn run(config: &BiosConfig, name: &str) -> Result<()> {
    let store = open_store(config);
    match store.discard(name)? {
        Some(dest) => println!("Moved {} to {}", name, dest.display()),
        None => println!("{} is not in the store", name),
    }
    Ok(())
}
