use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::store::Record;

/// What the shipping context stores for every shipped order
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShippingManifest {
    pub shipping_reference: String,
    /// Book ids joined with `", "`
    pub book_ids: String,
    pub shipping_cost: Decimal,
}

impl Record for ShippingManifest {
    fn key(&self) -> &str {
        &self.shipping_reference
    }
}
