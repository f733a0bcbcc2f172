//! Order domain types.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use bazaar_core::{OrderId, OrderLineId, Price, ProductId, Quantity, UserId};

/// Days between placing an order and its ship date.
pub const SHIPPING_DELAY_DAYS: u64 = 7;

/// Status given to every new order.
pub const INITIAL_ORDER_STATUS: &str = "In transit";

/// Ship date for an order created on `created_on`.
///
/// `None` only when the date would overflow the calendar.
#[must_use]
pub fn ship_date(created_on: NaiveDate) -> Option<NaiveDate> {
    created_on.checked_add_days(Days::new(SHIPPING_DELAY_DAYS))
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub created_on: NaiveDate,
    pub ships_on: NaiveDate,
    pub status: String,
    pub address: String,
}

/// One purchased product, with the name and price captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    /// `None` once the product has been deleted from the catalog.
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub unit_price: Price,
    pub quantity: Quantity,
}

impl OrderLine {
    /// `quantity × unit_price`.
    #[must_use]
    pub fn line_total(&self) -> i64 {
        self.unit_price.times(self.quantity)
    }
}

/// An order line about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Price,
    pub quantity: Quantity,
}

/// An order with its lines and grand total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub total: i64,
}

impl OrderDetail {
    /// Attach lines and compute the total.
    #[must_use]
    pub fn new(order: Order, lines: Vec<OrderLine>) -> Self {
        let total = lines.iter().map(OrderLine::line_total).sum();
        Self {
            order,
            lines,
            total,
        }
    }
}
