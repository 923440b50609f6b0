use crate::domain::model::id::BookId;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("book not found: {0}")]
    BookNotFound(BookId),
}
