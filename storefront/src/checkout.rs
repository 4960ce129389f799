//! Checkout gate
//!
//! Pure decisions over an injected clock: whether the store is open at
//! a given instant, and when the next open window starts. Checkout
//! preconditions are checked in a fixed order — non-empty cart, then
//! minimum total, then business hours — and a rejected gate leaves all
//! state untouched.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Timelike, Weekday};
use chrono_tz::Tz;
use thiserror::Error;

use shared::cart::SchedulingMarker;

use crate::config::StoreConfig;
use crate::store::CartStore;
use crate::store::money::to_decimal;

/// One weekday's opening window
///
/// `close == None` means the window runs until midnight, the observed
/// configuration; a bounded window is honored when configured.
#[derive(Debug, Clone, Copy)]
pub struct DayWindow {
    pub weekday: Weekday,
    pub open: NaiveTime,
    pub close: Option<NaiveTime>,
}

/// Weekly opening schedule
#[derive(Debug, Clone)]
pub struct BusinessHours {
    windows: Vec<DayWindow>,
}

impl BusinessHours {
    pub fn new(windows: Vec<DayWindow>) -> Self {
        Self { windows }
    }

    pub fn window_for(&self, weekday: Weekday) -> Option<&DayWindow> {
        self.windows.iter().find(|w| w.weekday == weekday)
    }

    /// True iff the instant falls inside an open window
    ///
    /// The open minute itself counts as open.
    pub fn is_open_at(&self, now: DateTime<Tz>) -> bool {
        match self.window_for(now.weekday()) {
            None => false,
            Some(window) => {
                let time = now.time();
                time >= window.open && window.close.is_none_or(|close| time < close)
            }
        }
    }

    /// Next open window: later today if today opens later, otherwise
    /// the first open weekday within the coming week
    pub fn next_window(&self, now: DateTime<Tz>) -> Option<NextWindow> {
        for days_ahead in 0..=7u8 {
            let date = now.date_naive() + Duration::days(i64::from(days_ahead));
            let Some(window) = self.window_for(date.weekday()) else {
                continue;
            };
            if days_ahead == 0 && now.time() >= window.open {
                continue;
            }
            return Some(NextWindow {
                weekday: window.weekday,
                open: window.open,
                days_ahead,
            });
        }
        None
    }
}

/// The resolved next open window, with a human-readable relative label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextWindow {
    pub weekday: Weekday,
    pub open: NaiveTime,
    pub days_ahead: u8,
}

impl NextWindow {
    /// "hoje às 18h", "amanhã às 15h", "sexta-feira às 18h",
    /// "próxima sexta-feira às 18h"
    pub fn label(&self) -> String {
        let hour = if self.open.minute() == 0 {
            format!("{}h", self.open.hour())
        } else {
            format!("{}h{:02}", self.open.hour(), self.open.minute())
        };
        match self.days_ahead {
            0 => format!("hoje às {hour}"),
            1 => format!("amanhã às {hour}"),
            2 => format!("{} às {hour}", weekday_name(self.weekday)),
            _ => format!("próxima {} às {hour}", weekday_name(self.weekday)),
        }
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "segunda-feira",
        Weekday::Tue => "terça-feira",
        Weekday::Wed => "quarta-feira",
        Weekday::Thu => "quinta-feira",
        Weekday::Fri => "sexta-feira",
        Weekday::Sat => "sábado",
        Weekday::Sun => "domingo",
    }
}

/// Precondition failures; navigation halts, no state changes
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("order total {total:.2} is below the minimum of {minimum:.2}")]
    BelowMinimum { minimum: f64, total: f64 },

    #[error("store is closed and no open window was found within a week")]
    Closed,
}

/// Outcome of the precondition gates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutDecision {
    /// Open now, proceed directly to the delivery step
    Proceed,
    /// Closed; the caller must obtain explicit acknowledgment that the
    /// order will be scheduled for this window
    RequiresScheduling(NextWindow),
}

/// Run the checkout gates in order: non-empty → minimum → hours
pub fn begin_checkout(
    store: &CartStore,
    config: &StoreConfig,
    now: DateTime<Tz>,
) -> Result<CheckoutDecision, CheckoutError> {
    if store.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    let total = store.cart_total();
    if to_decimal(total) < to_decimal(config.minimum_order) {
        return Err(CheckoutError::BelowMinimum { minimum: config.minimum_order, total });
    }
    if config.hours.is_open_at(now) {
        return Ok(CheckoutDecision::Proceed);
    }
    match config.hours.next_window(now) {
        Some(window) => Ok(CheckoutDecision::RequiresScheduling(window)),
        None => Err(CheckoutError::Closed),
    }
}

/// Record the customer's scheduling acknowledgment
///
/// Declining is simply not calling this; checkout then aborts with no
/// state change.
pub fn accept_schedule(store: &CartStore, window: &NextWindow, now: DateTime<Tz>) {
    store.set_scheduling_marker(&SchedulingMarker {
        scheduled: true,
        delivery_window: window.label(),
        created_at: now.timestamp_millis(),
    });
}
