//! Cart store
//!
//! Sole mutable owner of the cart aggregate: line items, customer
//! profile, payment selection, theme. Every mutation persists the
//! affected records and then notifies subscribers synchronously, one
//! notification per mutation.
//!
//! The store is an explicitly constructed instance; tests run isolated
//! stores side by side with no shared process state.
//!
//! Persistence failures degrade the store to in-memory operation for
//! the rest of the session: the error is logged and the mutation still
//! applies.

pub mod error;
pub mod money;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::cart::{CartSnapshot, LineItem, LineItemChanges, SchedulingMarker, Theme};
use shared::models::customer::CustomerProfile;
use shared::models::payment::PaymentSelection;

use crate::catalog::Catalog;
use crate::storage::KvStore;
use crate::validation::{MAX_NAME_LEN, MAX_NOTE_LEN, sanitize_text};

use self::error::{CartError, CartResult};

// ── Storage keys ────────────────────────────────────────────────────

const CART_KEY: &str = "cart";
const CUSTOMER_KEY: &str = "customer";
const CUSTOMER_PHONES_KEY: &str = "customer_phones";
const PAYMENT_KEY: &str = "payment";
const THEME_KEY: &str = "theme";
const SCHEDULED_ORDER_KEY: &str = "scheduled_order";

/// Session-scoped phone record, kept apart from the durable profile
#[derive(Debug, Serialize, Deserialize)]
struct PhoneRecord {
    phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    secondary_phone: Option<String>,
}

/// Cart ceilings, taken from the store configuration
#[derive(Debug, Clone, Copy)]
pub struct CartLimits {
    pub max_cart_items: usize,
    pub max_item_quantity: i32,
}

impl Default for CartLimits {
    fn default() -> Self {
        Self { max_cart_items: 20, max_item_quantity: 10 }
    }
}

/// Handle returned by [`CartStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberId(u64);

type Listener = Box<dyn Fn() + Send>;

/// The cart store
///
/// Listeners are invoked synchronously after each mutation with no
/// payload; they re-read state through the accessors. A listener must
/// not subscribe or unsubscribe from within its own callback.
pub struct CartStore {
    state: Mutex<CartSnapshot>,
    durable: Arc<dyn KvStore>,
    session: Arc<dyn KvStore>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener_id: AtomicU64,
    limits: CartLimits,
}

impl CartStore {
    /// Open a store, loading any persisted state
    ///
    /// Unreadable or corrupt records are logged and replaced with
    /// defaults; storage trouble never prevents the store from opening.
    pub fn open(durable: Arc<dyn KvStore>, session: Arc<dyn KvStore>, limits: CartLimits) -> Self {
        let state = load_state(&*durable, &*session);
        Self {
            state: Mutex::new(state),
            durable,
            session,
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(0),
            limits,
        }
    }

    // ── Cart operations ─────────────────────────────────────────────

    /// Add a catalog item to the cart with quantity 1
    ///
    /// Name and base price are snapshotted; the unit price is the base
    /// price plus the selected add-on prices. Items append in insertion
    /// order.
    pub fn add_item(
        &self,
        catalog: &Catalog,
        catalog_item_id: &str,
        selected_extras: Vec<String>,
        note: Option<String>,
        recipient: Option<String>,
    ) -> CartResult<LineItem> {
        let line = {
            let mut state = self.state.lock();
            if state.items.len() >= self.limits.max_cart_items {
                return Err(CartError::CapacityExceeded(self.limits.max_cart_items));
            }

            let entry = catalog
                .item(catalog_item_id)
                .ok_or_else(|| CartError::CatalogItemNotFound(catalog_item_id.to_string()))?;
            if !entry.available {
                return Err(CartError::ItemUnavailable(entry.name.clone()));
            }
            money::require_valid_price(entry.price, "price")?;
            for extra_id in &selected_extras {
                let extra = entry.extra(extra_id).ok_or_else(|| CartError::UnknownExtra {
                    item: catalog_item_id.to_string(),
                    extra: extra_id.clone(),
                })?;
                money::require_valid_price(extra.price, "add-on price")?;
            }

            let line = LineItem {
                id: Uuid::new_v4().to_string(),
                catalog_item_id: entry.id.clone(),
                name: entry.name.clone(),
                base_price: entry.price,
                quantity: 1,
                unit_price: entry.price_with_extras(&selected_extras),
                selected_extras,
                note: clean_text(note, MAX_NOTE_LEN),
                recipient: clean_text(recipient, MAX_NAME_LEN),
            };
            state.items.push(line.clone());
            self.persist(&state);
            line
        };
        self.notify();
        Ok(line)
    }

    /// Remove a line item; no-op when the id is not in the cart
    pub fn remove_item(&self, line_item_id: &str) {
        let removed = {
            let mut state = self.state.lock();
            let before = state.items.len();
            state.items.retain(|item| item.id != line_item_id);
            if state.items.len() != before {
                self.persist(&state);
                true
            } else {
                false
            }
        };
        if removed {
            self.notify();
        }
    }

    /// Set a line item's quantity
    ///
    /// Quantities below 1 behave as [`CartStore::remove_item`]; above
    /// the ceiling the call is rejected and the quantity is unchanged.
    pub fn set_quantity(&self, line_item_id: &str, quantity: i32) -> CartResult<()> {
        if quantity > self.limits.max_item_quantity {
            return Err(CartError::InvalidQuantity {
                got: quantity,
                max: self.limits.max_item_quantity,
            });
        }
        if quantity < 1 {
            self.remove_item(line_item_id);
            return Ok(());
        }
        {
            let mut state = self.state.lock();
            let item = state
                .items
                .iter_mut()
                .find(|item| item.id == line_item_id)
                .ok_or_else(|| CartError::ItemNotFound(line_item_id.to_string()))?;
            item.quantity = quantity;
            self.persist(&state);
        }
        self.notify();
        Ok(())
    }

    /// Partially update a line item
    ///
    /// A changed add-on selection recomputes the unit price against the
    /// original catalog entry's price table; fields left `None` in the
    /// changes are untouched.
    pub fn update_item(
        &self,
        catalog: &Catalog,
        line_item_id: &str,
        changes: LineItemChanges,
    ) -> CartResult<()> {
        if let Some(quantity) = changes.quantity
            && quantity > self.limits.max_item_quantity
        {
            return Err(CartError::InvalidQuantity {
                got: quantity,
                max: self.limits.max_item_quantity,
            });
        }
        {
            let mut state = self.state.lock();
            let pos = state
                .items
                .iter()
                .position(|item| item.id == line_item_id)
                .ok_or_else(|| CartError::ItemNotFound(line_item_id.to_string()))?;

            if let Some(extras) = &changes.selected_extras {
                let source_id = state.items[pos].catalog_item_id.clone();
                let entry = catalog
                    .item(&source_id)
                    .ok_or_else(|| CartError::CatalogItemNotFound(source_id.clone()))?;
                for extra_id in extras {
                    entry.extra(extra_id).ok_or_else(|| CartError::UnknownExtra {
                        item: source_id.clone(),
                        extra: extra_id.clone(),
                    })?;
                }
                let item = &mut state.items[pos];
                item.selected_extras = extras.clone();
                item.unit_price = entry.price_with_extras(extras);
            }
            if let Some(note) = changes.note {
                state.items[pos].note = clean_text(Some(note), MAX_NOTE_LEN);
            }
            if let Some(recipient) = changes.recipient {
                state.items[pos].recipient = clean_text(Some(recipient), MAX_NAME_LEN);
            }
            if let Some(quantity) = changes.quantity {
                if quantity < 1 {
                    state.items.remove(pos);
                } else {
                    state.items[pos].quantity = quantity;
                }
            }
            self.persist(&state);
        }
        self.notify();
        Ok(())
    }

    /// Empty the line-item sequence
    pub fn clear_cart(&self) {
        {
            let mut state = self.state.lock();
            state.items.clear();
            self.persist(&state);
        }
        self.notify();
    }

    /// Clear cart and payment selection after a successful handoff
    ///
    /// The customer profile is retained for future visits.
    pub fn complete_order(&self) {
        {
            let mut state = self.state.lock();
            state.items.clear();
            state.payment = None;
            self.persist(&state);
        }
        self.notify();
    }

    // ── Pure reads ──────────────────────────────────────────────────

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Sum of unit price × quantity over all line items (2dp)
    pub fn cart_total(&self) -> f64 {
        money::cart_total(&self.state.lock().items)
    }

    /// Sum of quantities
    pub fn item_count(&self) -> i32 {
        self.state.lock().items.iter().map(|item| item.quantity).sum()
    }

    pub fn items(&self) -> Vec<LineItem> {
        self.state.lock().items.clone()
    }

    pub fn snapshot(&self) -> CartSnapshot {
        self.state.lock().clone()
    }

    // ── Customer / payment / theme ──────────────────────────────────

    pub fn set_customer(&self, profile: CustomerProfile) {
        {
            let mut state = self.state.lock();
            state.customer = Some(profile);
            self.persist(&state);
        }
        self.notify();
    }

    pub fn customer(&self) -> Option<CustomerProfile> {
        self.state.lock().customer.clone()
    }

    pub fn set_payment(&self, selection: PaymentSelection) {
        {
            let mut state = self.state.lock();
            state.payment = Some(selection);
            self.persist(&state);
        }
        self.notify();
    }

    pub fn payment(&self) -> Option<PaymentSelection> {
        self.state.lock().payment.clone()
    }

    pub fn set_theme(&self, theme: Theme) {
        {
            let mut state = self.state.lock();
            state.theme = theme;
            self.persist(&state);
        }
        self.notify();
    }

    pub fn toggle_theme(&self) -> Theme {
        let theme = {
            let mut state = self.state.lock();
            state.theme = state.theme.toggle();
            self.persist(&state);
            state.theme
        };
        self.notify();
        theme
    }

    pub fn theme(&self) -> Theme {
        self.state.lock().theme
    }

    // ── Scheduling marker (session-scoped, single-use) ──────────────

    pub fn set_scheduling_marker(&self, marker: &SchedulingMarker) {
        match serde_json::to_string(marker) {
            Ok(json) => write_key(&*self.session, SCHEDULED_ORDER_KEY, &json),
            Err(e) => tracing::warn!(error = %e, "failed to serialize scheduling marker"),
        }
    }

    /// Read and consume the scheduling marker
    pub fn take_scheduling_marker(&self) -> Option<SchedulingMarker> {
        let marker: Option<SchedulingMarker> = read_json(&*self.session, SCHEDULED_ORDER_KEY);
        if marker.is_some()
            && let Err(e) = self.session.remove(SCHEDULED_ORDER_KEY)
        {
            tracing::warn!(error = %e, "failed to consume scheduling marker");
        }
        marker
    }

    // ── Subscriptions ───────────────────────────────────────────────

    /// Register a listener invoked after every state-mutating operation
    pub fn subscribe(&self, listener: impl Fn() + Send + 'static) -> SubscriberId {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, Box::new(listener)));
        SubscriberId(id)
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.listeners.lock().retain(|(listener_id, _)| *listener_id != id.0);
    }

    fn notify(&self) {
        for (_, listener) in self.listeners.lock().iter() {
            listener();
        }
    }

    // ── Persistence ─────────────────────────────────────────────────

    fn persist(&self, state: &CartSnapshot) {
        write_json(&*self.durable, CART_KEY, &state.items);

        match &state.customer {
            Some(profile) => {
                // Name and address are durable; phones live only in the
                // session store.
                let durable_profile = CustomerProfile {
                    phone: String::new(),
                    secondary_phone: None,
                    ..profile.clone()
                };
                write_json(&*self.durable, CUSTOMER_KEY, &durable_profile);
                let phones = PhoneRecord {
                    phone: profile.phone.clone(),
                    secondary_phone: profile.secondary_phone.clone(),
                };
                write_json(&*self.session, CUSTOMER_PHONES_KEY, &phones);
            }
            None => {
                remove_key(&*self.durable, CUSTOMER_KEY);
                remove_key(&*self.session, CUSTOMER_PHONES_KEY);
            }
        }

        match &state.payment {
            Some(selection) => write_json(&*self.durable, PAYMENT_KEY, selection),
            None => remove_key(&*self.durable, PAYMENT_KEY),
        }

        let theme = match state.theme {
            Theme::Light => "light",
            Theme::Dark => "dark",
        };
        write_key(&*self.durable, THEME_KEY, theme);
    }
}

fn load_state(durable: &dyn KvStore, session: &dyn KvStore) -> CartSnapshot {
    let items: Vec<LineItem> = read_json(durable, CART_KEY).unwrap_or_default();

    let customer = read_json::<CustomerProfile>(durable, CUSTOMER_KEY).map(|mut profile| {
        if let Some(phones) = read_json::<PhoneRecord>(session, CUSTOMER_PHONES_KEY) {
            profile.phone = phones.phone;
            profile.secondary_phone = phones.secondary_phone;
        }
        profile
    });

    let payment = read_json(durable, PAYMENT_KEY);

    let theme = match durable.get(THEME_KEY) {
        Ok(Some(value)) if value == "dark" => Theme::Dark,
        Ok(_) => Theme::Light,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read theme, using default");
            Theme::Light
        }
    };

    CartSnapshot { items, customer, payment, theme }
}

/// Sanitize and length-bound a free-text field; empty results become None
fn clean_text(value: Option<String>, max_len: usize) -> Option<String> {
    let cleaned = sanitize_text(&value?);
    if cleaned.is_empty() {
        return None;
    }
    Some(cleaned.chars().take(max_len).collect())
}

fn read_json<T: serde::de::DeserializeOwned>(store: &dyn KvStore, key: &str) -> Option<T> {
    match store.get(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding corrupt record");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(key, error = %e, "storage read failed");
            None
        }
    }
}

fn write_json<T: Serialize>(store: &dyn KvStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => write_key(store, key, &json),
        Err(e) => tracing::warn!(key, error = %e, "failed to serialize record"),
    }
}

fn write_key(store: &dyn KvStore, key: &str, value: &str) {
    if let Err(e) = store.set(key, value) {
        tracing::warn!(key, error = %e, "persist failed; state kept in memory only");
    }
}

fn remove_key(store: &dyn KvStore, key: &str) {
    if let Err(e) = store.remove(key) {
        tracing::warn!(key, error = %e, "storage remove failed");
    }
}
