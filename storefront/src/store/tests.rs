use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use shared::cart::{LineItemChanges, SchedulingMarker, Theme};
use shared::models::catalog::{AddOn, CatalogItem};
use shared::models::customer::{CustomerProfile, DeliveryAddress};
use shared::models::payment::PaymentSelection;

use super::*;
use crate::catalog::Catalog;
use crate::storage::{MemoryStore, StorageError, StorageResult};

fn test_catalog() -> Catalog {
    Catalog::new(vec![
        CatalogItem {
            id: "item-1".to_string(),
            name: "X-Burger".to_string(),
            description: "Hambúrguer artesanal".to_string(),
            price: 15.00,
            category: "lanches".to_string(),
            available: true,
            image: String::new(),
            extras: vec![
                AddOn { id: "extra-1".to_string(), name: "Queijo extra".to_string(), price: 2.00 },
                AddOn { id: "extra-2".to_string(), name: "Bacon".to_string(), price: 3.00 },
            ],
        },
        CatalogItem {
            id: "item-2".to_string(),
            name: "Coca-Cola".to_string(),
            description: "350ml gelada".to_string(),
            price: 5.00,
            category: "bebidas".to_string(),
            available: true,
            image: String::new(),
            extras: vec![],
        },
        CatalogItem {
            id: "item-3".to_string(),
            name: "Esgotado".to_string(),
            description: "Fora do cardápio hoje".to_string(),
            price: 10.00,
            category: "lanches".to_string(),
            available: false,
            image: String::new(),
            extras: vec![],
        },
    ])
}

fn test_store() -> CartStore {
    CartStore::open(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::new()),
        CartLimits::default(),
    )
}

fn test_customer() -> CustomerProfile {
    CustomerProfile {
        name: "Maria da Silva".to_string(),
        phone: "11987654321".to_string(),
        secondary_phone: Some("1187654321".to_string()),
        address: DeliveryAddress {
            street: "Rua das Flores".to_string(),
            number: "123".to_string(),
            neighborhood: "Centro".to_string(),
            city: "Campinas".to_string(),
            postal_code: Some("13010000".to_string()),
            reference: Some("Portão azul".to_string()),
        },
    }
}

// ========================================================================
// add_item
// ========================================================================

#[test]
fn add_item_snapshots_name_and_price() {
    let store = test_store();
    let catalog = test_catalog();

    let line = store.add_item(&catalog, "item-1", vec![], None, None).unwrap();
    assert_eq!(line.name, "X-Burger");
    assert_eq!(line.base_price, 15.00);
    assert_eq!(line.unit_price, 15.00);
    assert_eq!(line.quantity, 1);
}

#[test]
fn add_item_sums_selected_extras_into_unit_price() {
    let store = test_store();
    let catalog = test_catalog();

    let extras = vec!["extra-1".to_string(), "extra-2".to_string()];
    let line = store.add_item(&catalog, "item-1", extras, None, None).unwrap();
    assert_eq!(line.unit_price, 20.00);
    assert_eq!(line.base_price, 15.00);
}

#[test]
fn add_item_rejects_unknown_catalog_item() {
    let store = test_store();
    let catalog = test_catalog();

    let err = store.add_item(&catalog, "item-99", vec![], None, None).unwrap_err();
    assert!(matches!(err, CartError::CatalogItemNotFound(_)));
    assert!(store.is_empty());
}

#[test]
fn add_item_rejects_unknown_extra() {
    let store = test_store();
    let catalog = test_catalog();

    let err = store
        .add_item(&catalog, "item-1", vec!["extra-99".to_string()], None, None)
        .unwrap_err();
    assert!(matches!(err, CartError::UnknownExtra { .. }));
    assert!(store.is_empty());
}

#[test]
fn add_item_rejects_unavailable_item() {
    let store = test_store();
    let catalog = test_catalog();

    let err = store.add_item(&catalog, "item-3", vec![], None, None).unwrap_err();
    assert!(matches!(err, CartError::ItemUnavailable(_)));
}

#[test]
fn add_item_beyond_capacity_is_rejected_and_length_unchanged() {
    let store = test_store();
    let catalog = test_catalog();

    for _ in 0..20 {
        store.add_item(&catalog, "item-1", vec![], None, None).unwrap();
    }
    let err = store.add_item(&catalog, "item-2", vec![], None, None).unwrap_err();
    assert!(matches!(err, CartError::CapacityExceeded(20)));
    assert_eq!(store.items().len(), 20);
}

#[test]
fn add_item_sanitizes_note_and_recipient() {
    let store = test_store();
    let catalog = test_catalog();

    let line = store
        .add_item(
            &catalog,
            "item-1",
            vec![],
            Some("sem  cebola 🧅 https://spam.example".to_string()),
            Some("João\u{0007}".to_string()),
        )
        .unwrap();
    assert_eq!(line.note.as_deref(), Some("sem cebola"));
    assert_eq!(line.recipient.as_deref(), Some("João"));
}

#[test]
fn insertion_order_is_preserved() {
    let store = test_store();
    let catalog = test_catalog();

    store.add_item(&catalog, "item-2", vec![], None, None).unwrap();
    store.add_item(&catalog, "item-1", vec![], None, None).unwrap();
    let names: Vec<String> = store.items().into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["Coca-Cola".to_string(), "X-Burger".to_string()]);
}

// ========================================================================
// quantity and removal
// ========================================================================

#[test]
fn set_quantity_zero_and_negative_behave_as_remove() {
    let store = test_store();
    let catalog = test_catalog();

    let a = store.add_item(&catalog, "item-1", vec![], None, None).unwrap();
    let b = store.add_item(&catalog, "item-2", vec![], None, None).unwrap();

    store.set_quantity(&a.id, 0).unwrap();
    assert_eq!(store.items().len(), 1);

    store.set_quantity(&b.id, -1).unwrap();
    assert!(store.is_empty());
}

#[test]
fn set_quantity_above_ceiling_is_rejected_and_unchanged() {
    let store = test_store();
    let catalog = test_catalog();

    let line = store.add_item(&catalog, "item-1", vec![], None, None).unwrap();
    store.set_quantity(&line.id, 10).unwrap();

    let err = store.set_quantity(&line.id, 11).unwrap_err();
    assert!(matches!(err, CartError::InvalidQuantity { got: 11, max: 10 }));
    assert_eq!(store.items()[0].quantity, 10);
}

#[test]
fn set_quantity_on_unknown_item_is_an_integrity_error() {
    let store = test_store();
    let err = store.set_quantity("missing", 2).unwrap_err();
    assert!(matches!(err, CartError::ItemNotFound(_)));
}

#[test]
fn remove_item_is_a_no_op_when_absent() {
    let store = test_store();
    let catalog = test_catalog();

    store.add_item(&catalog, "item-1", vec![], None, None).unwrap();
    store.remove_item("missing");
    assert_eq!(store.items().len(), 1);
}

// ========================================================================
// totals
// ========================================================================

#[test]
fn cart_total_matches_independent_recomputation_after_every_mutation() {
    let store = test_store();
    let catalog = test_catalog();

    let recompute = |store: &CartStore| -> f64 {
        let sum: rust_decimal::Decimal = store
            .items()
            .iter()
            .map(|i| money::to_decimal(i.unit_price) * rust_decimal::Decimal::from(i.quantity))
            .sum();
        money::to_f64(sum)
    };

    let a = store.add_item(&catalog, "item-1", vec!["extra-2".to_string()], None, None).unwrap();
    assert_eq!(store.cart_total(), recompute(&store));

    store.set_quantity(&a.id, 3).unwrap();
    assert_eq!(store.cart_total(), recompute(&store));

    let b = store.add_item(&catalog, "item-2", vec![], None, None).unwrap();
    store.set_quantity(&b.id, 2).unwrap();
    assert_eq!(store.cart_total(), recompute(&store));

    store.remove_item(&a.id);
    assert_eq!(store.cart_total(), recompute(&store));
}

#[test]
fn cart_total_and_item_count_for_a_mixed_cart() {
    // X-Burger qty 2 at 15.00 + Coca-Cola qty 1 at 5.00 = 35.00
    let store = test_store();
    let catalog = test_catalog();

    let burger = store.add_item(&catalog, "item-1", vec![], None, None).unwrap();
    store.set_quantity(&burger.id, 2).unwrap();
    store.add_item(&catalog, "item-2", vec![], None, None).unwrap();

    assert_eq!(store.cart_total(), 35.00);
    assert_eq!(store.item_count(), 3);
}

// ========================================================================
// update_item
// ========================================================================

#[test]
fn update_item_recomputes_unit_price_from_original_price_table() {
    let store = test_store();
    let catalog = test_catalog();

    let line = store
        .add_item(&catalog, "item-1", vec!["extra-1".to_string()], None, None)
        .unwrap();
    assert_eq!(line.unit_price, 17.00);

    store
        .update_item(
            &catalog,
            &line.id,
            LineItemChanges {
                selected_extras: Some(vec!["extra-2".to_string()]),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(store.items()[0].unit_price, 18.00);
    assert_eq!(store.items()[0].base_price, 15.00);
}

#[test]
fn update_item_partial_update_touches_only_provided_fields() {
    let store = test_store();
    let catalog = test_catalog();

    let line = store
        .add_item(
            &catalog,
            "item-1",
            vec!["extra-1".to_string()],
            Some("sem cebola".to_string()),
            Some("Ana".to_string()),
        )
        .unwrap();

    store
        .update_item(
            &catalog,
            &line.id,
            LineItemChanges { note: Some("bem passado".to_string()), ..Default::default() },
        )
        .unwrap();

    let updated = &store.items()[0];
    assert_eq!(updated.note.as_deref(), Some("bem passado"));
    assert_eq!(updated.recipient.as_deref(), Some("Ana"));
    assert_eq!(updated.selected_extras, vec!["extra-1".to_string()]);
    assert_eq!(updated.unit_price, 17.00);
}

#[test]
fn update_item_quantity_follows_set_quantity_semantics() {
    let store = test_store();
    let catalog = test_catalog();

    let line = store.add_item(&catalog, "item-1", vec![], None, None).unwrap();

    let err = store
        .update_item(
            &catalog,
            &line.id,
            LineItemChanges { quantity: Some(99), ..Default::default() },
        )
        .unwrap_err();
    assert!(matches!(err, CartError::InvalidQuantity { .. }));

    store
        .update_item(&catalog, &line.id, LineItemChanges { quantity: Some(0), ..Default::default() })
        .unwrap();
    assert!(store.is_empty());
}

// ========================================================================
// complete_order
// ========================================================================

#[test]
fn complete_order_clears_cart_and_payment_but_keeps_customer() {
    let store = test_store();
    let catalog = test_catalog();

    store.add_item(&catalog, "item-1", vec![], None, None).unwrap();
    store.set_customer(test_customer());
    store.set_payment(PaymentSelection::cash_with_change(50.00));

    store.complete_order();

    assert!(store.is_empty());
    assert!(store.payment().is_none());
    assert_eq!(store.customer().unwrap().name, "Maria da Silva");
}

// ========================================================================
// subscriptions
// ========================================================================

#[test]
fn each_mutation_fires_exactly_one_notification() {
    let store = test_store();
    let catalog = test_catalog();

    let count = Arc::new(AtomicUsize::new(0));
    let seen = count.clone();
    store.subscribe(move || {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let line = store.add_item(&catalog, "item-1", vec![], None, None).unwrap();
    store.set_quantity(&line.id, 2).unwrap();
    store.set_theme(Theme::Dark);
    store.clear_cart();

    assert_eq!(count.load(Ordering::SeqCst), 4);
}

#[test]
fn rejected_operations_do_not_notify() {
    let store = test_store();
    let catalog = test_catalog();

    let count = Arc::new(AtomicUsize::new(0));
    let seen = count.clone();
    store.subscribe(move || {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let _ = store.add_item(&catalog, "item-99", vec![], None, None);
    let _ = store.set_quantity("missing", 5);
    store.remove_item("missing");

    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn unsubscribe_stops_delivery() {
    let store = test_store();
    let catalog = test_catalog();

    let count = Arc::new(AtomicUsize::new(0));
    let seen = count.clone();
    let id = store.subscribe(move || {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    store.add_item(&catalog, "item-1", vec![], None, None).unwrap();
    store.unsubscribe(id);
    store.clear_cart();

    assert_eq!(count.load(Ordering::SeqCst), 1);
}

// ========================================================================
// persistence
// ========================================================================

#[test]
fn state_round_trips_through_storage_except_phones() {
    let durable: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let catalog = test_catalog();

    {
        let store = CartStore::open(
            durable.clone(),
            Arc::new(MemoryStore::new()),
            CartLimits::default(),
        );
        let line = store
            .add_item(&catalog, "item-1", vec!["extra-1".to_string()], None, None)
            .unwrap();
        store.set_quantity(&line.id, 2).unwrap();
        store.set_customer(test_customer());
        store.set_payment(PaymentSelection::cash_no_change());
        store.set_theme(Theme::Dark);
    }

    // Fresh session: new session store, same durable store
    let reloaded = CartStore::open(
        durable,
        Arc::new(MemoryStore::new()),
        CartLimits::default(),
    );

    let items = reloaded.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[0].unit_price, 17.00);
    assert_eq!(reloaded.payment(), Some(PaymentSelection::cash_no_change()));
    assert_eq!(reloaded.theme(), Theme::Dark);

    let customer = reloaded.customer().unwrap();
    assert_eq!(customer.name, "Maria da Silva");
    assert_eq!(customer.address.city, "Campinas");
    // Phones are session-scoped and do not survive a fresh session
    assert!(customer.phone.is_empty());
    assert!(customer.secondary_phone.is_none());
}

#[test]
fn phones_survive_within_the_same_session() {
    let durable: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let session: Arc<MemoryStore> = Arc::new(MemoryStore::new());

    {
        let store = CartStore::open(durable.clone(), session.clone(), CartLimits::default());
        store.set_customer(test_customer());
    }

    let reloaded = CartStore::open(durable, session, CartLimits::default());
    let customer = reloaded.customer().unwrap();
    assert_eq!(customer.phone, "11987654321");
    assert_eq!(customer.secondary_phone.as_deref(), Some("1187654321"));
}

#[test]
fn corrupt_records_are_discarded_not_fatal() {
    let durable: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    durable.set(CART_KEY, "{not json").unwrap();
    durable.set(PAYMENT_KEY, "42").unwrap();

    let store = CartStore::open(durable, Arc::new(MemoryStore::new()), CartLimits::default());
    assert!(store.is_empty());
    assert!(store.payment().is_none());
}

/// Store whose writes always fail, for degraded-mode coverage
struct FailingStore;

impl KvStore for FailingStore {
    fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Serialization(serde::de::Error::custom("disk unavailable")))
    }

    fn remove(&self, _key: &str) -> StorageResult<()> {
        Err(StorageError::Serialization(serde::de::Error::custom("disk unavailable")))
    }

    fn clear(&self) -> StorageResult<()> {
        Ok(())
    }
}

#[test]
fn persistence_failure_degrades_to_in_memory_operation() {
    let store = CartStore::open(
        Arc::new(FailingStore),
        Arc::new(FailingStore),
        CartLimits::default(),
    );
    let catalog = test_catalog();

    let line = store.add_item(&catalog, "item-1", vec![], None, None).unwrap();
    store.set_quantity(&line.id, 3).unwrap();

    assert_eq!(store.item_count(), 3);
    assert_eq!(store.cart_total(), 45.00);
}

// ========================================================================
// scheduling marker
// ========================================================================

#[test]
fn scheduling_marker_is_single_use() {
    let store = test_store();
    let marker = SchedulingMarker {
        scheduled: true,
        delivery_window: "sexta-feira às 18h".to_string(),
        created_at: 1_700_000_000_000,
    };

    store.set_scheduling_marker(&marker);
    assert_eq!(store.take_scheduling_marker(), Some(marker));
    assert_eq!(store.take_scheduling_marker(), None);
}

#[test]
fn scheduling_marker_does_not_survive_a_fresh_session() {
    let durable: Arc<MemoryStore> = Arc::new(MemoryStore::new());

    {
        let store = CartStore::open(
            durable.clone(),
            Arc::new(MemoryStore::new()),
            CartLimits::default(),
        );
        store.set_scheduling_marker(&SchedulingMarker {
            scheduled: true,
            delivery_window: "hoje às 18h".to_string(),
            created_at: 1_700_000_000_000,
        });
    }

    let reloaded = CartStore::open(durable, Arc::new(MemoryStore::new()), CartLimits::default());
    assert_eq!(reloaded.take_scheduling_marker(), None);
}
