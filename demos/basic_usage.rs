//! Basic usage example for dual-key-registry.
//!
//! Demonstrates:
//! - Inserting entries addressed by a UUID identity and an `i32` index
//! - Looking entries up by either key
//! - Overwriting by index, which evicts the previous occupant
//! - Allocating the next free index
//! - Deleting and listing entries
//!
//! Run with: `cargo run --example basic_usage`

use dual_key_registry::{define_lookup, Identifiable, Named, RegistryError};
use std::sync::Arc;
use uuid::Uuid;

/// A game definition, addressed by a stable id and a slot in a dense table.
#[derive(Debug)]
pub struct Definition {
    id: Uuid,
    index: i32,
    name: String,
}

impl Identifiable<Uuid, i32> for Definition {
    fn identity(&self) -> Uuid {
        self.id
    }

    fn index(&self) -> i32 {
        self.index
    }
}

impl Named for Definition {
    fn name(&self) -> &str {
        &self.name
    }
}

fn definition(index: i32, name: &str) -> Arc<Definition> {
    Arc::new(Definition {
        id: Uuid::new_v4(),
        index,
        name: name.to_string(),
    })
}

// Create an isolated lookup for this example
define_lookup!(definitions, Uuid, i32, Definition);

fn main() {
    println!("=== dual-key-registry: Basic Usage ===\n");

    // -------------------------------------------------------------------------
    // 1. Insert entries
    // -------------------------------------------------------------------------
    println!("1. Inserting entries...");

    let sword = definition(0, "Sword");
    let shield = definition(1, "Shield");
    println!("   insert Sword  -> {}", definitions::insert(Arc::clone(&sword)));
    println!("   insert Shield -> {}", definitions::insert(Arc::clone(&shield)));

    // Same index again: strict insert refuses it
    println!("   insert Axe@0  -> {}", definitions::insert(definition(0, "Axe")));

    // -------------------------------------------------------------------------
    // 2. Look up by either key
    // -------------------------------------------------------------------------
    println!("\n2. Looking up by identity and by index...");

    let by_identity = definitions::get(sword.id).map(|d| d.name.clone());
    let by_index = definitions::get_at(1).map(|d| d.name.clone());
    println!("   get({})  = {:?}", sword.id, by_identity);
    println!("   get_at(1) = {:?}", by_index);

    // -------------------------------------------------------------------------
    // 3. Overwrite by index
    // -------------------------------------------------------------------------
    println!("\n3. Replacing the entry at index 0...");

    definitions::set_at(0, definition(0, "Greatsword")).unwrap();
    println!("   get_at(0)       = {:?}", definitions::get_at(0).map(|d| d.name.clone()));
    println!("   get(old sword)  = {:?}", definitions::get(sword.id).map(|d| d.name.clone()));

    // A value whose own index disagrees with the target is refused
    match definitions::set_at(5, definition(6, "Bow")) {
        Ok(()) => println!("   unexpected success"),
        Err(e @ RegistryError::KeyMismatch { .. }) => println!("   Error (expected): {}", e),
        Err(e) => println!("   Error: {}", e),
    }

    // -------------------------------------------------------------------------
    // 4. Allocate the next free index
    // -------------------------------------------------------------------------
    println!("\n4. Allocating the next free index...");

    let bow = definitions::lookup()
        .insert_with_next_index(|index| definition(index, "Bow"))
        .unwrap();
    println!("   Bow was placed at index {}", bow.index);

    // -------------------------------------------------------------------------
    // 5. Delete and list
    // -------------------------------------------------------------------------
    println!("\n5. Deleting and listing...");

    println!("   delete_at(1)   = {}", definitions::delete_at(1));
    println!("   delete_at(1)   = {}", definitions::delete_at(1));

    let mut names = definitions::lookup().names();
    names.sort();
    println!("   names          = {:?}", names);

    // -------------------------------------------------------------------------
    // Summary
    // -------------------------------------------------------------------------
    println!("\n=== Example Complete ===");
    println!("The lookup now contains {} entries.", definitions::count());
}
