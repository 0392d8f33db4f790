use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CancelShipment {
    pub shipping_reference: String,
    #[serde(default)]
    pub reason: Option<String>,
}
