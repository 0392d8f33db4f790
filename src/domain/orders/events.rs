use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::model::PurchaseOrder;

// ============================================================================
// Order Events
// ============================================================================
//
// Payloads carry plain values only, so other contexts never depend on the
// order record types.
//
// ============================================================================

/// A new purchase order was accepted and persisted
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderReceived {
    pub purchase_order_reference: String,
    pub books_ordered: Vec<OrderedBook>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderedBook {
    pub book_id: String,
    pub unit_price: Decimal,
}

impl PurchaseOrderReceived {
    /// `None` when the line prices overflow
    pub fn subtotal(&self) -> Option<Decimal> {
        self.books_ordered
            .iter()
            .try_fold(Decimal::ZERO, |total, line| total.checked_add(line.unit_price))
    }
}

impl From<&PurchaseOrder> for PurchaseOrderReceived {
    fn from(order: &PurchaseOrder) -> Self {
        Self {
            purchase_order_reference: order.id.clone(),
            books_ordered: order
                .books_ordered
                .iter()
                .map(|line| OrderedBook {
                    book_id: line.id.clone(),
                    unit_price: line.book_price,
                })
                .collect(),
        }
    }
}
