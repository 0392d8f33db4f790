use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::store::Record;

// ============================================================================
// Book Records
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub year: Option<DateTime<Utc>>,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub authors: Vec<Author>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub place_of_birth: Option<String>,
    #[serde(default)]
    pub date_of_death: Option<NaiveDate>,
    #[serde(default)]
    pub place_of_death: Option<String>,
}

/// The part of a book a patch document may change
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookForUpdate {
    pub title: String,
    pub price: Decimal,
}

impl Book {
    pub fn updatable_section(&self) -> BookForUpdate {
        BookForUpdate {
            title: self.title.clone(),
            price: self.price,
        }
    }

    pub fn apply_update(&mut self, update: BookForUpdate) {
        self.title = update.title;
        self.price = update.price;
    }
}

impl Record for Book {
    fn key(&self) -> &str {
        &self.id
    }
}
