//! Invariant tests for satchel_inventory
//!
//! These tests verify container invariants that MUST NEVER be violated

use std::cell::RefCell;
use std::sync::Arc;

use satchel_inventory::persistence::{
    load_equipment, load_inventory, save_equipment, save_inventory,
};
use satchel_inventory::prelude::*;

fn stackable(id: &str, max_stack: u32) -> ItemInstance {
    ItemInstance::new(Arc::new(
        ItemDefinition::new(id, id).with_max_stack(max_stack),
    ))
}

fn helmet(id: &str) -> ItemInstance {
    ItemInstance::new(Arc::new(
        ItemDefinition::new(id, id)
            .with_equippable(true)
            .with_tag("head"),
    ))
}

/// INVARIANT: No operation sequence creates or destroys units
#[test]
fn invariant_units_are_conserved() {
    let arrow = stackable("arrow", 20);
    let mut a = Inventory::new(5);
    let mut b = Inventory::new(3);
    let mut ground = GroundItems::new();

    let seeded = 90;
    let add = a.try_add(&arrow, seeded, ActionSource::External);
    assert_eq!(add.payload(), Some(&0));

    let total = |a: &Inventory, b: &Inventory, ground: &GroundItems| {
        a.count(&arrow) + b.count(&arrow) + ground.count(&arrow)
    };
    assert_eq!(total(&a, &b, &ground), seeded);

    assert!(a
        .transfer_items(&arrow, &mut b, 35, ActionSource::External)
        .is_success());
    assert_eq!(total(&a, &b, &ground), seeded);

    assert!(a
        .drop_item(&arrow, 12, ActionSource::External, &mut ground)
        .is_success());
    assert_eq!(total(&a, &b, &ground), seeded);

    let mut pile = ground.take_pile(0).unwrap();
    assert!(pile.pick_up(&mut b).is_success());
    if !pile.is_empty() {
        let leftover = pile.amount();
        ground.spawn(&arrow, leftover);
    }
    assert_eq!(total(&a, &b, &ground), seeded);

    // Failing operations must not disturb the balance either
    assert!(a.try_take(&arrow, 9_999, ActionSource::External).is_failure());
    assert!(a
        .transfer_items(&arrow, &mut b, 9_999, ActionSource::External)
        .is_failure());
    assert_eq!(total(&a, &b, &ground), seeded);
}

/// INVARIANT: Equip and unequip move exactly one unit, never duplicating it
#[test]
fn invariant_equipping_conserves_units() {
    let iron = helmet("iron_helmet");
    let steel = helmet("steel_helmet");
    let mut inventory = Inventory::new(4);
    let mut equipment = Equipment::new().with_slot("head");
    let mut ground = GroundItems::new();

    inventory.try_add(&iron, 1, ActionSource::External);
    inventory.try_add(&steel, 1, ActionSource::External);

    let units = |item: &ItemInstance,
                 inventory: &Inventory,
                 equipment: &Equipment,
                 ground: &GroundItems| {
        inventory.count(item) + u32::from(equipment.is_equipped(item)) + ground.count(item)
    };

    assert!(inventory
        .equip_at(
            0,
            &mut equipment,
            EquipFlags::MODIFY_INVENTORY,
            ActionSource::External,
            &mut ground,
        )
        .is_success());
    assert_eq!(units(&iron, &inventory, &equipment, &ground), 1);
    assert_eq!(units(&steel, &inventory, &equipment, &ground), 1);

    // Swapping in the steel helmet evicts the iron one back to the inventory
    let steel_slot = inventory
        .find_first(|item| item.stack_compatible(&steel))
        .map(|(index, _)| index)
        .unwrap();
    assert!(inventory
        .equip_at(
            steel_slot,
            &mut equipment,
            EquipFlags::MODIFY_INVENTORY | EquipFlags::ALLOW_ITEM_SWAP,
            ActionSource::External,
            &mut ground,
        )
        .is_success());
    assert_eq!(units(&iron, &inventory, &equipment, &ground), 1);
    assert_eq!(units(&steel, &inventory, &equipment, &ground), 1);
    assert_eq!(inventory.count(&iron), 1);

    // Removing the slot itself still routes the occupant somewhere
    assert!(equipment
        .remove_slot(0, Some(&mut inventory), &mut ground)
        .is_success());
    assert_eq!(units(&steel, &inventory, &equipment, &ground), 1);
    assert!(equipment.is_empty());
}

/// INVARIANT: A failed take leaves every slot untouched
#[test]
fn invariant_take_is_all_or_nothing() {
    let arrow = stackable("arrow", 5);
    let mut inventory = Inventory::new(4);
    inventory.try_add(&arrow, 9, ActionSource::External);

    let snapshot: Vec<u32> = inventory.slots().iter().map(Slot::count).collect();
    let result = inventory.try_take(&arrow, 10, ActionSource::External);
    assert_eq!(result.reason(), Reason::NotEnoughItems);

    let after: Vec<u32> = inventory.slots().iter().map(Slot::count).collect();
    assert_eq!(snapshot, after);

    // The exact amount drains everything and clears the slots
    assert!(inventory.try_take(&arrow, 9, ActionSource::External).is_success());
    assert_eq!(inventory.count(&arrow), 0);
    assert!(inventory.slots().iter().all(Slot::is_empty));
}

/// INVARIANT: Adding tops up existing stacks before opening new slots
#[test]
fn invariant_add_prefers_existing_stacks() {
    let arrow = stackable("arrow", 10);
    let mut inventory = Inventory::new(3);

    // Park a partial stack away from slot 0
    inventory.try_add(&arrow, 4, ActionSource::External);
    assert!(inventory.swap_slots(0, 2));

    inventory.try_add(&arrow, 8, ActionSource::External);
    assert_eq!(inventory.count_at(2), 10);
    assert_eq!(inventory.count_at(0), 2);
    assert_eq!(inventory.count_at(1), 0);
}

/// INVARIANT: The add payload is exactly the unplaced remainder
#[test]
fn invariant_add_reports_remainder() {
    let arrow = stackable("arrow", 50);
    let mut inventory = Inventory::new(2);

    let result = inventory.try_add(&arrow, 120, ActionSource::External);
    assert!(result.is_success());
    assert_eq!(result.payload(), Some(&20));
    assert_eq!(inventory.count(&arrow), 100);

    // A full container still reports success, with everything left over
    let full = inventory.try_add(&arrow, 7, ActionSource::External);
    assert!(full.is_success());
    assert_eq!(full.payload(), Some(&7));
    assert_eq!(inventory.count(&arrow), 100);
}

/// INVARIANT: Slot transfers neither lose nor mint units
#[test]
fn invariant_transfers_preserve_totals() {
    let arrow = stackable("arrow", 5);
    let rock = stackable("rock", 5);

    // Combining: 3 + 2 within the cap merges completely
    let mut a = Inventory::new(1);
    let mut b = Inventory::new(1);
    a.try_add(&arrow, 3, ActionSource::External);
    b.try_add(&arrow, 2, ActionSource::External);
    assert!(a
        .transfer_to(0, &mut b, 0, TransferFlags::NONE, ActionSource::External)
        .is_success());
    assert_eq!(a.count(&arrow), 0);
    assert_eq!(b.count(&arrow), 5);

    // A full target rejects the move even with the partial flag
    let mut c = Inventory::new(1);
    c.try_add(&arrow, 4, ActionSource::External);
    let partial = c.transfer_to(
        0,
        &mut b,
        0,
        TransferFlags::ALLOW_PARTIAL_TRANSFER,
        ActionSource::External,
    );
    assert_eq!(partial.reason(), Reason::NotEnoughSpace);
    assert_eq!(c.count(&arrow) + b.count(&arrow), 9);

    // Swapping different items keeps both stacks intact
    let mut d = Inventory::new(1);
    d.try_add(&rock, 2, ActionSource::External);
    assert!(c
        .transfer_to(
            0,
            &mut d,
            0,
            TransferFlags::SWAP_IF_OCCUPIED_BY_ANOTHER,
            ActionSource::External,
        )
        .is_success());
    assert_eq!(c.count(&rock), 2);
    assert_eq!(d.count(&arrow), 4);
}

/// INVARIANT: Free equipment slots always win over eviction
#[test]
fn invariant_free_slot_beats_swap() {
    let iron = helmet("iron_helmet");
    let steel = helmet("steel_helmet");
    let mut equipment = Equipment::new().with_slot("head").with_slot("head");
    let mut sink = DiscardSink;

    assert!(equipment
        .equip(
            &iron,
            None,
            EquipFlags::ALLOW_ITEM_SWAP,
            ActionSource::External,
            &mut sink,
        )
        .is_success());
    assert!(equipment
        .equip(
            &steel,
            None,
            EquipFlags::ALLOW_ITEM_SWAP,
            ActionSource::External,
            &mut sink,
        )
        .is_success());

    // The swap permission was never exercised: both items remain worn,
    // filling the slots in declaration order
    assert!(equipment.is_equipped(&iron));
    assert!(equipment.is_equipped(&steel));
    let worn_at = |index: usize| {
        equipment
            .slot(index)
            .and_then(EquipmentSlot::item)
            .map(|item| item.id().name().to_string())
    };
    assert_eq!(worn_at(0).as_deref(), Some("iron_helmet"));
    assert_eq!(worn_at(1).as_deref(), Some("steel_helmet"));
}

/// INVARIANT: Ranking ties resolve to the earliest slot
#[test]
fn invariant_best_match_keeps_earliest_on_tie() {
    let definition = Arc::new(ItemDefinition::new("potion", "Potion").with_max_stack(5));
    let brew = |color: &str, quality: i32| {
        ItemInstance::new(definition.clone()).with_data(
            InstanceData::new("brew", quality)
                .with_property("color", InstanceValue::Text(color.into())),
        )
    };

    // Differing properties keep the equally ranked brews in separate slots
    let mut inventory = Inventory::new(4);
    inventory.try_add(&brew("red", 9), 1, ActionSource::External);
    inventory.try_add(&brew("blue", 9), 1, ActionSource::External);
    inventory.try_add(&brew("green", 9), 1, ActionSource::External);
    inventory.try_add(&brew("grey", 1), 1, ActionSource::External);
    assert_eq!(inventory.items().count(), 4);

    // Equal rank at slots 0, 1 and 2: the earliest must win
    let (index, item) = inventory.find_best(|_| true).unwrap();
    assert_eq!(index, 0);
    assert!(item.stack_compatible(&brew("red", 9)));
}

/// INVARIANT: Saved containers reload with an identical slot layout
#[test]
fn invariant_save_load_round_trips() {
    let catalog = ItemCatalog::new(vec![
        ItemDefinition::new("arrow", "Arrow").with_max_stack(20),
        ItemDefinition::new("sword", "Sword"),
        ItemDefinition::new("iron_helmet", "Iron Helmet")
            .with_equippable(true)
            .with_tag("head"),
    ]);
    let arrow = catalog.instance("arrow").unwrap();
    let sword = catalog
        .instance("sword")
        .unwrap()
        .with_data(InstanceData::new("forge", 7));

    let mut inventory = Inventory::new(4);
    inventory.try_add(&arrow, 30, ActionSource::External);
    inventory.try_add(&sword, 1, ActionSource::External);

    for format in [SaveFormat::Json, SaveFormat::Binary] {
        let bytes = save_inventory(&inventory, format).unwrap();
        let loaded = load_inventory(&bytes, &catalog, format).unwrap();

        assert_eq!(loaded.size(), inventory.size());
        for index in 0..inventory.size() {
            assert_eq!(loaded.count_at(index), inventory.count_at(index));
            assert_eq!(
                loaded.item_at(index).map(|item| item.id().name()),
                inventory.item_at(index).map(|item| item.id().name()),
            );
        }
        assert_eq!(
            loaded
                .find_first(|item| item.data.is_some())
                .and_then(|(_, item)| item.data.as_ref().map(|d| d.quality)),
            Some(7)
        );
    }

    let worn = catalog.instance("iron_helmet").unwrap();
    let mut equipment = Equipment::new().with_slot("head").with_slot("finger");
    let mut sink = DiscardSink;
    equipment.equip(&worn, None, EquipFlags::NONE, ActionSource::External, &mut sink);

    let bytes = save_equipment(&equipment, SaveFormat::Binary).unwrap();
    let loaded = load_equipment(&bytes, &catalog, SaveFormat::Binary).unwrap();
    assert!(loaded.is_equipped(&worn));
    assert_eq!(loaded.slot(1).unwrap().tag(), "finger");
}

/// INVARIANT: A zero-slot container refuses every mutation
#[test]
fn invariant_uncreated_container_rejects_mutation() {
    let arrow = stackable("arrow", 10);
    let mut missing = Inventory::default();
    let mut other = Inventory::new(2);

    assert_eq!(
        missing.try_add(&arrow, 1, ActionSource::External).reason(),
        Reason::InventoryNotCreated
    );
    assert_eq!(
        missing.try_take(&arrow, 1, ActionSource::External).reason(),
        Reason::InventoryNotCreated
    );
    assert_eq!(
        missing
            .transfer_to(0, &mut other, 0, TransferFlags::NONE, ActionSource::External)
            .reason(),
        Reason::InventoryNotCreated
    );
    assert_eq!(
        missing.use_at(0, ActionSource::External).reason(),
        Reason::InventoryNotCreated
    );
}

#[derive(Default)]
struct CountingHooks {
    fired: RefCell<u32>,
}

impl InventoryHooks for CountingHooks {
    fn on_added(&self, _ctx: satchel_inventory::context::AddItemContext<'_>, _result: &OperationResult<u32>) {
        *self.fired.borrow_mut() += 1;
    }

    fn on_taken(&self, _ctx: satchel_inventory::context::TakeItemContext<'_>, _result: &OperationResult<u32>) {
        *self.fired.borrow_mut() += 1;
    }
}

/// INVARIANT: Internal operations mutate identically but stay silent
#[test]
fn invariant_internal_source_is_silent() {
    let arrow = stackable("arrow", 10);
    let hooks = Arc::new(CountingHooks::default());
    let mut inventory = Inventory::new(2).with_hooks(hooks.clone());

    inventory.try_add(&arrow, 4, ActionSource::Internal);
    inventory.try_take(&arrow, 2, ActionSource::Internal);
    assert_eq!(inventory.count(&arrow), 2);
    assert_eq!(*hooks.fired.borrow(), 0);

    inventory.try_add(&arrow, 4, ActionSource::External);
    inventory.try_take(&arrow, 2, ActionSource::External);
    assert_eq!(inventory.count(&arrow), 4);
    assert_eq!(*hooks.fired.borrow(), 2);
}

/// INVARIANT: Items never stack across differing per-instance data
#[test]
fn invariant_instance_data_separates_stacks() {
    let definition = Arc::new(ItemDefinition::new("potion", "Potion").with_max_stack(10));
    let plain = ItemInstance::new(definition.clone());
    let brewed = ItemInstance::new(definition.clone()).with_data(InstanceData::new("brew", 3));

    let mut inventory = Inventory::new(4);
    inventory.try_add(&plain, 3, ActionSource::External);
    inventory.try_add(&brewed, 3, ActionSource::External);

    // Two separate stacks despite the shared definition
    assert_eq!(inventory.count(&plain), 3);
    assert_eq!(inventory.count(&brewed), 3);
    assert_eq!(inventory.items().count(), 2);

    inventory.try_take(&brewed, 3, ActionSource::External);
    assert_eq!(inventory.count(&plain), 3);
    assert_eq!(inventory.count(&brewed), 0);
}
