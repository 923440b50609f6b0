use super::model::id::BookId;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("duplicate book id in catalog: {0}")]
    DuplicateBookId(BookId),

    #[error("genre listed twice in genre order: {0}")]
    DuplicateGenre(String),

    #[error("rating {rating} of book {id} is outside 0-5")]
    RatingOutOfRange { id: BookId, rating: f64 },
}
