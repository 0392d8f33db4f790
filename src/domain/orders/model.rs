use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::store::Record;

// ============================================================================
// Order Records
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: String,
    #[serde(default)]
    pub books_ordered: Vec<BookOrder>,
}

/// One ordered line: which book, at what unit price
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookOrder {
    pub id: String,
    pub book_price: Decimal,
}

impl PurchaseOrder {
    pub fn new(id: impl Into<String>, books_ordered: Vec<BookOrder>) -> Self {
        Self {
            id: id.into(),
            books_ordered,
        }
    }

    /// Sum of the line prices; `None` when it does not fit a `Decimal`
    pub fn subtotal(&self) -> Option<Decimal> {
        self.books_ordered
            .iter()
            .try_fold(Decimal::ZERO, |total, line| total.checked_add(line.book_price))
    }
}

impl BookOrder {
    pub fn new(id: impl Into<String>, book_price: Decimal) -> Self {
        Self {
            id: id.into(),
            book_price,
        }
    }
}

impl Record for PurchaseOrder {
    fn key(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_subtotal_sums_line_prices() {
        let order = PurchaseOrder::new(
            "PO1",
            vec![BookOrder::new("B1", dec!(10.00)), BookOrder::new("B2", dec!(5.00))],
        );

        assert_eq!(order.subtotal(), Some(dec!(15.00)));
    }

    #[test]
    fn test_subtotal_overflow_is_none() {
        let order = PurchaseOrder::new(
            "PO1",
            vec![BookOrder::new("B1", Decimal::MAX), BookOrder::new("B2", Decimal::MAX)],
        );

        assert_eq!(order.subtotal(), None);
    }

    #[test]
    fn test_order_json_uses_camel_case() {
        let json = r#"{"id":"PO9","booksOrdered":[{"id":"B7","bookPrice":12.5}]}"#;
        let order: PurchaseOrder = serde_json::from_str(json).unwrap();

        assert_eq!(order.books_ordered[0].id, "B7");
        assert_eq!(order.books_ordered[0].book_price, dec!(12.5));
    }
}
