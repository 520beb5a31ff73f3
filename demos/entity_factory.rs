//! Entity factory example for dual-key-registry.
//!
//! Demonstrates:
//! - Storing several concrete kinds behind one trait object (`dyn Npc`)
//! - Registering constructors per kind in an `EntityFactory`
//! - Creating entries from an identity, an index, or both
//! - Narrowing a stored trait object back to its concrete kind
//!
//! Run with: `cargo run --example entity_factory`

use dual_key_registry::{
    AnyEntity, Constructor, DualKeyRegistry, EntityFactory, EntityKind, Identifiable,
};
use std::sync::Arc;
use uuid::Uuid;

// =============================================================================
// Contract
// =============================================================================

trait Npc: Identifiable<Uuid, u32> + AnyEntity {
    fn greet(&self) -> String;
}

// =============================================================================
// Kinds
// =============================================================================

struct Guard {
    id: Uuid,
    post: u32,
}

struct Merchant {
    id: Uuid,
    stall: u32,
    stock: usize,
}

impl Identifiable<Uuid, u32> for Guard {
    fn identity(&self) -> Uuid {
        self.id
    }

    fn index(&self) -> u32 {
        self.post
    }
}

impl Identifiable<Uuid, u32> for Merchant {
    fn identity(&self) -> Uuid {
        self.id
    }

    fn index(&self) -> u32 {
        self.stall
    }
}

impl Npc for Guard {
    fn greet(&self) -> String {
        format!("Halt! Post {} is guarded.", self.post)
    }
}

impl Npc for Merchant {
    fn greet(&self) -> String {
        format!("Welcome to stall {}, {} wares today.", self.stall, self.stock)
    }
}

fn main() {
    println!("=== dual-key-registry: Entity Factory ===\n");

    let npcs: DualKeyRegistry<Uuid, u32, dyn Npc> = DualKeyRegistry::with_label("npcs");

    // -------------------------------------------------------------------------
    // 1. Register constructors
    // -------------------------------------------------------------------------
    println!("1. Registering constructors...");

    let mut factory: EntityFactory<Uuid, u32, dyn Npc> = EntityFactory::new();
    factory
        .register(
            EntityKind::of::<Guard>(),
            Constructor::IdentityAndIndex(|id, post| Arc::new(Guard { id, post }) as Arc<dyn Npc>),
        )
        .register(
            EntityKind::of::<Merchant>(),
            Constructor::Index(|stall| {
                Arc::new(Merchant {
                    id: Uuid::new_v4(),
                    stall,
                    stock: 12,
                }) as Arc<dyn Npc>
            }),
        );

    for kind in factory.kinds() {
        println!("   {:?}", kind);
    }

    // -------------------------------------------------------------------------
    // 2. Create entries
    // -------------------------------------------------------------------------
    println!("\n2. Creating entries...");

    let captain = factory
        .add_new(&npcs, EntityKind::of::<Guard>(), Uuid::new_v4())
        .unwrap();
    let trader = factory
        .add_new_at(&npcs, EntityKind::of::<Merchant>(), 7)
        .unwrap();
    println!("   Guard placed at the next free index: {}", captain.index());
    println!("   Merchant placed at index: {}", trader.index());

    // Merchants have no identity-only constructor
    match factory.add_new(&npcs, EntityKind::of::<Merchant>(), Uuid::new_v4()) {
        Ok(_) => println!("   unexpected success"),
        Err(e) => println!("   Error (expected): {}", e),
    }

    // -------------------------------------------------------------------------
    // 3. Use through the contract
    // -------------------------------------------------------------------------
    println!("\n3. Greeting every NPC by index...");

    let mut indices = npcs.indices();
    indices.sort();
    for index in indices {
        if let Some(npc) = npcs.get_by_index(index) {
            println!("   [{}] {}", index, npc.greet());
        }
    }

    // -------------------------------------------------------------------------
    // 4. Narrow back to a concrete kind
    // -------------------------------------------------------------------------
    println!("\n4. Narrowing...");

    let merchant = npcs.try_get_typed_at::<Merchant>(7).unwrap();
    println!("   Merchant stock: {:?}", merchant.map(|m| m.stock));

    match npcs.try_get_typed_at::<Guard>(7) {
        Ok(_) => println!("   unexpected success"),
        Err(e) => println!("   Error (expected): {}", e),
    }

    println!("\n=== Example Complete ===");
}
