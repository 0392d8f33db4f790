use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::BookForUpdate;

// ============================================================================
// JSON Patch (RFC 6902) over BookForUpdate
// ============================================================================
//
// Supported operations: add, replace, remove, test. Paths address the two
// updatable fields and are matched case-insensitively. A document applies
// as a whole or not at all.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Remove,
    Replace,
    Test,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatchError {
    #[error("unknown path '{0}'")]
    UnknownPath(String),

    #[error("'{op:?}' at '{path}' requires a value")]
    MissingValue { op: PatchOp, path: String },

    #[error("invalid value for '{path}': {reason}")]
    InvalidValue { path: String, reason: String },

    #[error("test failed at '{0}'")]
    TestFailed(String),
}

#[derive(Clone, Copy)]
enum Field {
    Title,
    Price,
}

impl Field {
    fn parse(path: &str) -> Result<Self, PatchError> {
        match path.to_ascii_lowercase().as_str() {
            "/title" => Ok(Field::Title),
            "/price" => Ok(Field::Price),
            _ => Err(PatchError::UnknownPath(path.to_string())),
        }
    }
}

impl PatchOperation {
    pub fn new(op: PatchOp, path: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            op,
            path: path.into(),
            value,
        }
    }

    fn value(&self) -> Result<&Value, PatchError> {
        self.value.as_ref().ok_or_else(|| PatchError::MissingValue {
            op: self.op,
            path: self.path.clone(),
        })
    }

    fn title(&self) -> Result<String, PatchError> {
        match self.value()? {
            Value::String(title) => Ok(title.clone()),
            other => Err(PatchError::InvalidValue {
                path: self.path.clone(),
                reason: format!("expected a string, got {}", other),
            }),
        }
    }

    fn price(&self) -> Result<Decimal, PatchError> {
        serde_json::from_value(self.value()?.clone()).map_err(|e| PatchError::InvalidValue {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn apply(&self, target: &mut BookForUpdate) -> Result<(), PatchError> {
        let field = Field::parse(&self.path)?;

        match (self.op, field) {
            (PatchOp::Add | PatchOp::Replace, Field::Title) => target.title = self.title()?,
            (PatchOp::Add | PatchOp::Replace, Field::Price) => target.price = self.price()?,
            (PatchOp::Remove, Field::Title) => target.title = String::new(),
            (PatchOp::Remove, Field::Price) => target.price = Decimal::ZERO,
            (PatchOp::Test, Field::Title) => {
                if target.title != self.title()? {
                    return Err(PatchError::TestFailed(self.path.clone()));
                }
            }
            (PatchOp::Test, Field::Price) => {
                if target.price != self.price()? {
                    return Err(PatchError::TestFailed(self.path.clone()));
                }
            }
        }

        Ok(())
    }
}

/// Apply `operations` in order to a copy of `target`
pub fn apply_patch(target: &BookForUpdate, operations: &[PatchOperation]) -> Result<BookForUpdate, PatchError> {
    let mut working = target.clone();
    for operation in operations {
        operation.apply(&mut working)?;
    }
    Ok(working)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn section() -> BookForUpdate {
        BookForUpdate {
            title: "Dune".to_string(),
            price: dec!(9.99),
        }
    }

    #[test]
    fn test_replace_title_and_price() {
        let ops: Vec<PatchOperation> = serde_json::from_value(json!([
            { "op": "replace", "path": "/title", "value": "Dune Messiah" },
            { "op": "replace", "path": "/price", "value": 12.5 }
        ]))
        .unwrap();

        let updated = apply_patch(&section(), &ops).unwrap();

        assert_eq!(updated.title, "Dune Messiah");
        assert_eq!(updated.price, dec!(12.5));
    }

    #[test]
    fn test_paths_are_case_insensitive() {
        let ops = vec![PatchOperation::new(PatchOp::Add, "/Title", Some(json!("Children of Dune")))];

        assert_eq!(apply_patch(&section(), &ops).unwrap().title, "Children of Dune");
    }

    #[test]
    fn test_remove_resets_field() {
        let ops = vec![
            PatchOperation::new(PatchOp::Remove, "/title", None),
            PatchOperation::new(PatchOp::Remove, "/price", None),
        ];

        let updated = apply_patch(&section(), &ops).unwrap();

        assert_eq!(updated.title, "");
        assert_eq!(updated.price, Decimal::ZERO);
    }

    #[test]
    fn test_failed_test_leaves_target_untouched() {
        let target = section();
        let ops = vec![
            PatchOperation::new(PatchOp::Replace, "/title", Some(json!("Changed"))),
            PatchOperation::new(PatchOp::Test, "/price", Some(json!(1))),
        ];

        let err = apply_patch(&target, &ops).unwrap_err();

        assert_eq!(err, PatchError::TestFailed("/price".to_string()));
        assert_eq!(target, section());
    }

    #[test]
    fn test_unknown_path_and_bad_values_are_rejected() {
        let unknown = vec![PatchOperation::new(PatchOp::Replace, "/publisher", Some(json!("X")))];
        assert_eq!(
            apply_patch(&section(), &unknown).unwrap_err(),
            PatchError::UnknownPath("/publisher".to_string())
        );

        let wrong_type = vec![PatchOperation::new(PatchOp::Replace, "/title", Some(json!(42)))];
        assert!(matches!(apply_patch(&section(), &wrong_type), Err(PatchError::InvalidValue { .. })));

        let missing = vec![PatchOperation::new(PatchOp::Replace, "/price", None)];
        assert!(matches!(apply_patch(&section(), &missing), Err(PatchError::MissingValue { .. })));
    }

    #[test]
    fn test_unknown_op_fails_to_parse() {
        let parsed = serde_json::from_value::<Vec<PatchOperation>>(json!([
            { "op": "explode", "path": "/title" }
        ]));

        assert!(parsed.is_err());
    }
}
