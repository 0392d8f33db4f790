use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A manifest was stored for an order. Terminal event of the fulfillment workflow.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderShipped {
    pub shipping_reference: String,
    pub item_ids: Vec<String>,
    pub shipping_cost: Decimal,
    pub order_total: Decimal,
}
