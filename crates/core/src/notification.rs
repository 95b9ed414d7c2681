//! Notification kinds, order metadata, and toast rendering.
//!
//! A notification row carries an opaque JSON `metadata` payload whose
//! shape depends on the kind. For `order` notifications the payload is
//! either a car-trip order or a shop/food order; [`OrderMetadata`]
//! recognizes both and [`toast_for`] turns them into the user-visible
//! toast body shown by the live feed.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Notification kind
// ---------------------------------------------------------------------------

/// Category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Order,
    Success,
    Warning,
    Error,
}

/// All valid notification kind strings.
const VALID_KIND_STRINGS: &[&str] = &["info", "order", "success", "warning", "error"];

impl NotificationKind {
    /// Return the kind as a lowercase string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Order => "order",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Parse a kind from a string slice.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "info" => Ok(Self::Info),
            "order" => Ok(Self::Order),
            "success" => Ok(Self::Success),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            _ => Err(CoreError::Validation(format!(
                "Invalid notification kind '{s}'. Must be one of: {}",
                VALID_KIND_STRINGS.join(", ")
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Order metadata
// ---------------------------------------------------------------------------

/// One line item of a shop/food order payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_name: String,
    pub quantity: i64,
    pub price: f64,
}

/// Recognized shapes of the `metadata` payload on `order` notifications.
///
/// A payload containing a `car_order_id` key is a car trip; anything with
/// an `order_id` key is a shop/food order. Unrecognized payloads yield
/// `None` from [`OrderMetadata::from_value`] and the caller falls back to
/// a generic toast.
#[derive(Debug, Clone)]
pub enum OrderMetadata {
    CarTrip {
        car_order_id: String,
        from_location: String,
        to_location: String,
        customer_name: String,
        telegram_username: String,
        price: f64,
    },
    Order {
        order_id: String,
        order_type: String,
        item_count: i64,
        total_amount: f64,
        items: Vec<OrderItem>,
    },
}

/// Read a string field, tolerating numeric ids.
fn field_str(value: &serde_json::Value, key: &str) -> String {
    match value.get(key) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Read a numeric field, defaulting to zero.
fn field_f64(value: &serde_json::Value, key: &str) -> f64 {
    value.get(key).and_then(|v| v.as_f64()).unwrap_or(0.0)
}

impl OrderMetadata {
    /// Recognize an order payload from the raw metadata value.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }

        if value.get("car_order_id").is_some() {
            return Some(Self::CarTrip {
                car_order_id: field_str(value, "car_order_id"),
                from_location: field_str(value, "from_location"),
                to_location: field_str(value, "to_location"),
                customer_name: field_str(value, "customer_name"),
                telegram_username: field_str(value, "telegram_username"),
                price: field_f64(value, "price"),
            });
        }

        if value.get("order_id").is_some() {
            let items: Vec<OrderItem> = value
                .get("items")
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default();
            let item_count = value
                .get("item_count")
                .and_then(|v| v.as_i64())
                .unwrap_or(items.len() as i64);

            return Some(Self::Order {
                order_id: field_str(value, "order_id"),
                order_type: field_str(value, "order_type"),
                item_count,
                total_amount: field_f64(value, "total_amount"),
                items,
            });
        }

        None
    }
}

// ---------------------------------------------------------------------------
// Toasts
// ---------------------------------------------------------------------------

/// Visual severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    Info,
    Success,
    Warning,
    Error,
}

/// A user-visible toast message, delivered fire-and-forget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Toast {
    pub title: String,
    pub body: String,
    pub variant: ToastVariant,
    pub duration_ms: u64,
}

/// How long order toasts stay on screen.
pub const ORDER_TOAST_DURATION_MS: u64 = 10_000;

/// How long generic toasts stay on screen.
pub const DEFAULT_TOAST_DURATION_MS: u64 = 5_000;

/// Maximum number of item lines rendered in a shop/food order toast.
/// Longer orders are truncated with an "...and N more" suffix.
pub const MAX_TOAST_ITEM_LINES: usize = 2;

/// Number of order-id characters shown in a toast.
const ORDER_ID_PREFIX_LEN: usize = 8;

impl NotificationKind {
    /// Map a notification kind to the toast variant used for its generic
    /// rendering.
    pub fn toast_variant(&self) -> ToastVariant {
        match self {
            Self::Info | Self::Order => ToastVariant::Info,
            Self::Success => ToastVariant::Success,
            Self::Warning => ToastVariant::Warning,
            Self::Error => ToastVariant::Error,
        }
    }
}

/// Build the toast for a newly-arrived notification.
///
/// Order notifications with a recognized metadata payload render the
/// order details; everything else renders the title/message pair as-is.
pub fn toast_for(
    kind: NotificationKind,
    title: &str,
    message: &str,
    metadata: &serde_json::Value,
) -> Toast {
    if kind == NotificationKind::Order {
        if let Some(meta) = OrderMetadata::from_value(metadata) {
            return order_toast(&meta);
        }
    }

    Toast {
        title: title.to_string(),
        body: message.to_string(),
        variant: kind.toast_variant(),
        duration_ms: DEFAULT_TOAST_DURATION_MS,
    }
}

/// Render the body of an order toast from its metadata.
fn order_toast(meta: &OrderMetadata) -> Toast {
    match meta {
        OrderMetadata::CarTrip {
            from_location,
            to_location,
            customer_name,
            telegram_username,
            price,
            ..
        } => Toast {
            title: "New car order".to_string(),
            body: format!(
                "{from_location} → {to_location}\n{customer_name} (@{telegram_username})\n{price:.2}"
            ),
            variant: ToastVariant::Info,
            duration_ms: ORDER_TOAST_DURATION_MS,
        },
        OrderMetadata::Order {
            order_id,
            order_type,
            item_count,
            total_amount,
            items,
        } => {
            let id_prefix: String = order_id.chars().take(ORDER_ID_PREFIX_LEN).collect();
            let mut body = format!(
                "Order #{id_prefix} ({order_type})\n{item_count} item(s), total {total_amount:.2}"
            );
            for item in items.iter().take(MAX_TOAST_ITEM_LINES) {
                body.push_str(&format!(
                    "\n{}x {} ({:.2})",
                    item.quantity, item.product_name, item.price
                ));
            }
            if items.len() > MAX_TOAST_ITEM_LINES {
                body.push_str(&format!(
                    "\n...and {} more",
                    items.len() - MAX_TOAST_ITEM_LINES
                ));
            }
            Toast {
                title: "New order".to_string(),
                body,
                variant: ToastVariant::Info,
                duration_ms: ORDER_TOAST_DURATION_MS,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_round_trips_through_strings() {
        for s in ["info", "order", "success", "warning", "error"] {
            let kind = NotificationKind::parse(s).expect("valid kind");
            assert_eq!(kind.as_str(), s);
        }
        assert!(NotificationKind::parse("urgent").is_err());
    }

    #[test]
    fn car_trip_toast_contains_trip_fields() {
        let meta = json!({
            "car_order_id": "c-77",
            "from_location": "Old Town",
            "to_location": "Airport",
            "customer_name": "Nino",
            "telegram_username": "nino_k",
            "price": 35.0,
        });
        let toast = toast_for(NotificationKind::Order, "New order", "", &meta);

        assert!(toast.body.contains("Old Town → Airport"));
        assert!(toast.body.contains("Nino"));
        assert!(toast.body.contains("@nino_k"));
        assert!(toast.body.contains("35.00"));
        assert_eq!(toast.duration_ms, ORDER_TOAST_DURATION_MS);
    }

    #[test]
    fn shop_order_toast_truncates_to_two_item_lines() {
        let meta = json!({
            "order_id": "a1b2c3d4e5f6",
            "order_type": "shop",
            "item_count": 4,
            "total_amount": 52.5,
            "items": [
                {"product_name": "Bread", "quantity": 2, "price": 3.0},
                {"product_name": "Milk", "quantity": 1, "price": 4.5},
                {"product_name": "Eggs", "quantity": 1, "price": 6.0},
                {"product_name": "Butter", "quantity": 1, "price": 5.0},
            ],
        });
        let toast = toast_for(NotificationKind::Order, "New order", "", &meta);

        assert!(toast.body.contains("Order #a1b2c3d4"));
        assert!(toast.body.contains("4 item(s)"));
        assert!(toast.body.contains("52.50"));
        assert!(toast.body.contains("2x Bread"));
        assert!(toast.body.contains("1x Milk"));
        assert!(!toast.body.contains("Eggs"));
        assert!(toast.body.contains("...and 2 more"));
    }

    #[test]
    fn short_orders_have_no_truncation_suffix() {
        for n in 0..=2 {
            let items: Vec<_> = (0..n)
                .map(|i| json!({"product_name": format!("Item{i}"), "quantity": 1, "price": 1.0}))
                .collect();
            let meta = json!({
                "order_id": "xyz",
                "order_type": "food",
                "item_count": n,
                "total_amount": 1.0,
                "items": items,
            });
            let toast = toast_for(NotificationKind::Order, "New order", "", &meta);
            assert!(
                !toast.body.contains("more"),
                "no suffix expected for {n} items: {}",
                toast.body
            );
        }
    }

    #[test]
    fn non_order_kinds_render_generic_toast() {
        let toast = toast_for(
            NotificationKind::Warning,
            "Heads up",
            "Your session expires soon",
            &json!({}),
        );
        assert_eq!(toast.title, "Heads up");
        assert_eq!(toast.body, "Your session expires soon");
        assert_eq!(toast.variant, ToastVariant::Warning);
        assert_eq!(toast.duration_ms, DEFAULT_TOAST_DURATION_MS);
    }

    #[test]
    fn order_kind_with_unrecognized_metadata_falls_back_to_generic() {
        let toast = toast_for(
            NotificationKind::Order,
            "New order",
            "You have a new order",
            &json!({"unexpected": true}),
        );
        assert_eq!(toast.body, "You have a new order");
    }
}
