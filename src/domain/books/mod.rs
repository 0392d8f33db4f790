// ============================================================================
// Books Context
// ============================================================================
//
// The catalogue. Plain CRUD plus JSON Patch on title and price.
//
// ============================================================================

mod errors;
mod model;
mod patch;
mod service;

pub use errors::BookError;
pub use model::{Author, Book, BookForUpdate};
pub use patch::{apply_patch, PatchError, PatchOp, PatchOperation};
pub use service::BookService;
