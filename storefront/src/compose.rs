//! Order composer
//!
//! Renders the confirmed order into the outbound WhatsApp message and
//! its handoff URL. Pure: identical inputs yield identical output (the
//! greeting follows the injected clock, nothing else moves). Section
//! order is fixed — greeting, header, customer, items, total, payment,
//! address, optional scheduling notice — downstream readers are humans
//! scanning the same layout on every order.

use chrono::{DateTime, Timelike};
use chrono_tz::Tz;
use url::Url;

use shared::cart::{LineItem, SchedulingMarker};
use shared::models::customer::{CustomerProfile, DeliveryAddress};
use shared::models::payment::{PaymentMethod, PaymentSelection};

use crate::catalog::Catalog;
use crate::config::StoreConfig;
use crate::store::money;
use crate::validation::{mask_phone, sanitize_text};

/// Fallback recipient label for unlabeled items
const DEFAULT_RECIPIENT: &str = "Sem Nome";

/// Coarse device class, used only to pick the handoff host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Mobile,
    Desktop,
}

impl Platform {
    /// Heuristic over the user-agent string
    pub fn from_user_agent(user_agent: &str) -> Self {
        const MOBILE_MARKERS: [&str; 8] = [
            "Android", "webOS", "iPhone", "iPad", "iPod", "BlackBerry", "IEMobile", "Opera Mini",
        ];
        if MOBILE_MARKERS.iter().any(|marker| user_agent.contains(marker)) {
            Platform::Mobile
        } else {
            Platform::Desktop
        }
    }
}

/// The composed message and its handoff URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedOrder {
    pub text: String,
    pub handoff_url: String,
}

/// Currency display: "1234,56" (comma decimal separator)
pub fn format_price(value: f64) -> String {
    format!("{value:.2}").replace('.', ",")
}

/// Address as a single comma-joined line with optional reference note
pub fn format_address(address: &DeliveryAddress) -> String {
    let mut line = format!(
        "{}, {}, {}, {}",
        sanitize_text(&address.street),
        sanitize_text(&address.number),
        sanitize_text(&address.neighborhood),
        sanitize_text(&address.city),
    );
    if let Some(reference) = &address.reference {
        let reference = sanitize_text(reference);
        if !reference.is_empty() {
            line.push_str(" - Ref: ");
            line.push_str(&reference);
        }
    }
    line
}

/// Time-of-day greeting: (salutation, period word)
fn greeting(hour: u32) -> (&'static str, &'static str) {
    match hour {
        0..=11 => ("Bom dia", "dia"),
        12..=17 => ("Boa tarde", "tarde"),
        _ => ("Boa noite", "noite"),
    }
}

/// One message line per cart item
///
/// Add-on names are resolved against the catalog, names only — prices
/// never appear in the outbound text. Quantities above one show the
/// line subtotal.
fn format_item(item: &LineItem, catalog: &Catalog) -> String {
    let recipient = item
        .recipient
        .as_deref()
        .map(sanitize_text)
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| DEFAULT_RECIPIENT.to_string());

    let extras = extra_names(item, catalog);
    let extras = if extras.is_empty() { String::new() } else { format!(" ({})", extras.join(", ")) };

    let quantity = if item.quantity > 1 { format!("{}x ", item.quantity) } else { String::new() };
    let subtotal = money::to_f64(money::line_subtotal(item));

    let mut line = format!(
        "• {recipient} - {quantity}{}{extras} - R$ {}",
        sanitize_text(&item.name),
        format_price(subtotal),
    );
    if let Some(note) = &item.note {
        let note = sanitize_text(note);
        if !note.is_empty() {
            line.push_str("\n  Obs: ");
            line.push_str(&note);
        }
    }
    line
}

fn extra_names(item: &LineItem, catalog: &Catalog) -> Vec<String> {
    let Some(entry) = catalog.item(&item.catalog_item_id) else {
        return Vec::new();
    };
    item.selected_extras
        .iter()
        .filter_map(|id| entry.extra(id))
        .map(|extra| extra.name.clone())
        .collect()
}

/// Payment line plus the optional change-due line
fn format_payment(payment: &PaymentSelection) -> String {
    let mut line = match payment.method {
        PaymentMethod::Cash => "Pagamento: Dinheiro na entrega".to_string(),
        PaymentMethod::Credit => "Pagamento: Cartão de Crédito na entrega".to_string(),
        PaymentMethod::Debit => "Pagamento: Cartão de Débito na entrega".to_string(),
        PaymentMethod::Pix => "Pagamento: PIX".to_string(),
    };
    if payment.method == PaymentMethod::Cash
        && !payment.no_change
        && let Some(change_for) = payment.change_for
    {
        line.push_str(&format!("\n💵 Troco para: R$ {}", format_price(change_for)));
    }
    line
}

/// Compose the outbound order message and handoff URL
#[allow(clippy::too_many_arguments)]
pub fn compose(
    config: &StoreConfig,
    catalog: &Catalog,
    customer: &CustomerProfile,
    payment: &PaymentSelection,
    items: &[LineItem],
    total: f64,
    marker: Option<&SchedulingMarker>,
    now: DateTime<Tz>,
    platform: Platform,
) -> ComposedOrder {
    let (salutation, period) = greeting(now.hour());

    let item_lines: Vec<String> = items.iter().map(|item| format_item(item, catalog)).collect();

    let name = sanitize_text(&customer.name);
    let phone = mask_phone(&sanitize_text(&customer.phone));
    let phone = if phone.is_empty() { "Não informado".to_string() } else { phone };

    let secondary = customer
        .secondary_phone
        .as_deref()
        .map(|p| mask_phone(&sanitize_text(p)))
        .filter(|p| !p.is_empty())
        .map(|p| format!("\n📞 *Telefone adicional:* {p}"))
        .unwrap_or_default();

    let schedule = marker
        .filter(|m| m.scheduled)
        .map(|m| {
            format!(
                "\n\n⏰ *PEDIDO AGENDADO*\n\
                 📅 Entrega prevista para *{}*\n\
                 📞 _O estabelecimento entrará em contato para confirmar o pedido_",
                sanitize_text(&m.delivery_window),
            )
        })
        .unwrap_or_default();

    let text = format!(
        "{salutation}! 👋\n\
         _Que bom que nos escolheu para o seu {period}_\n\
         \n\
         🍔 *Pedido {}*\n\
         \n\
         👤 *Cliente:* {name}\n\
         📞 *Telefone:* {phone}{secondary}\n\
         \n\
         📝 *Itens:*\n\
         {}\n\
         \n\
         💰 *Total: R$ {}*\n\
         💳 {}\n\
         \n\
         📍 *Endereço:* {}{schedule}",
        config.business_name,
        item_lines.join("\n"),
        format_price(total),
        format_payment(payment),
        format_address(&customer.address),
    );

    let handoff_url = handoff_url(&config.whatsapp_number, &text, platform);

    ComposedOrder { text, handoff_url }
}

/// Handoff URL with the recipient and the percent-encoded message
///
/// The caller opens it in a new browsing context; no response is
/// awaited or parsed.
pub fn handoff_url(number: &str, text: &str, platform: Platform) -> String {
    let base = match platform {
        Platform::Mobile => "https://api.whatsapp.com/send",
        Platform::Desktop => "https://web.whatsapp.com/send",
    };
    match Url::parse_with_params(base, &[("phone", number), ("text", text)]) {
        Ok(url) => url.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to build handoff URL");
            String::new()
        }
    }
}
