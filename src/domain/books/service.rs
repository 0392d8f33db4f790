use std::sync::Arc;

use super::errors::BookError;
use super::model::Book;
use super::patch::{apply_patch, PatchOperation};
use crate::store::RecordStore;

/// Catalogue operations. Books take no part in the order workflow.
pub struct BookService {
    store: Arc<dyn RecordStore<Book>>,
}

impl BookService {
    pub fn new(store: Arc<dyn RecordStore<Book>>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Book>, BookError> {
        Ok(self.store.session().list().await?)
    }

    pub async fn get(&self, id: &str) -> Result<Book, BookError> {
        self.store
            .session()
            .find_by_id(id)
            .await?
            .ok_or_else(|| BookError::NotFound(id.to_string()))
    }

    pub async fn create(&self, book: Book) -> Result<Book, BookError> {
        if book.id.trim().is_empty() {
            return Err(BookError::Invalid("book id must not be empty".to_string()));
        }

        let mut session = self.store.session();
        if session.find_by_id(&book.id).await?.is_some() {
            return Err(BookError::Conflict(book.id));
        }

        session.add(book.clone()).await?;
        session.commit().await?;

        tracing::info!(book_id = %book.id, title = %book.title, "Book created");
        Ok(book)
    }

    /// Insert or replace the book stored under `id`. The path id wins over the body's.
    pub async fn put(&self, id: &str, mut book: Book) -> Result<Book, BookError> {
        book.id = id.to_string();

        let mut session = self.store.session();
        session.remove(id).await?;
        session.add(book.clone()).await?;
        session.commit().await?;

        tracing::debug!(book_id = %id, "Book stored");
        Ok(book)
    }

    /// Returns whether a book was actually removed
    pub async fn delete(&self, id: &str) -> Result<bool, BookError> {
        let mut session = self.store.session();
        session.remove(id).await?;
        let removed = session.commit().await? > 0;

        tracing::debug!(book_id = %id, removed = removed, "Book delete");
        Ok(removed)
    }

    /// Apply a JSON Patch document to the title/price view of a book
    pub async fn patch(&self, id: &str, document: Option<Vec<PatchOperation>>) -> Result<Book, BookError> {
        let operations = document.ok_or_else(|| BookError::Invalid("patch document is required".to_string()))?;

        let mut book = self.get(id).await?;
        let updated = apply_patch(&book.updatable_section(), &operations)?;
        book.apply_update(updated);

        let mut session = self.store.session();
        session.remove(id).await?;
        session.add(book.clone()).await?;
        session.commit().await?;

        tracing::info!(book_id = %id, operations = operations.len(), "Book patched");
        Ok(book)
    }
}
