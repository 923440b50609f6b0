use serde::{Deserialize, Serialize};

use super::id::BookId;

/// Upper bound of the rating scale.
pub const MAX_RATING: f64 = 5.0;

/// Ratings at or above this count as highly rated.
pub const HIGH_RATING: f64 = 4.0;

/// A catalog entry. Immutable once built; the `with_*` methods are for
/// assembling a record before it enters a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    id: BookId,
    title: String,
    author: String,
    genre: String,
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    plot: Option<String>,
    #[serde(default)]
    image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    published_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rating: Option<f64>,
}

impl Book {
    pub fn new(
        id: impl Into<BookId>,
        title: impl Into<String>,
        author: impl Into<String>,
        genre: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            genre: genre.into(),
            description: String::new(),
            plot: None,
            image: String::new(),
            published_year: None,
            pages: None,
            rating: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_plot(mut self, plot: impl Into<String>) -> Self {
        self.plot = Some(plot.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_published_year(mut self, year: i32) -> Self {
        self.published_year = Some(year);
        self
    }

    pub fn with_pages(mut self, pages: u32) -> Self {
        self.pages = Some(pages);
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn id(&self) -> &BookId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn plot(&self) -> Option<&str> {
        self.plot.as_deref()
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn published_year(&self) -> Option<i32> {
        self.published_year
    }

    pub fn pages(&self) -> Option<u32> {
        self.pages
    }

    pub fn rating(&self) -> Option<f64> {
        self.rating
    }

    /// Whether the rating (if any) lies on the 0–5 scale.
    pub fn has_valid_rating(&self) -> bool {
        self.rating
            .map_or(true, |r| r.is_finite() && (0.0..=MAX_RATING).contains(&r))
    }

    pub fn is_highly_rated(&self) -> bool {
        self.rating.is_some_and(|r| r >= HIGH_RATING)
    }

    /// Case-insensitive substring match. `needle` must already be lowercase.
    ///
    /// Title, author and genre are always searched; description and plot only
    /// when `include_synopsis` is set.
    pub(crate) fn matches(&self, needle: &str, include_synopsis: bool) -> bool {
        let hit = |field: &str| field.to_lowercase().contains(needle);
        if hit(&self.title) || hit(&self.author) || hit(&self.genre) {
            return true;
        }
        include_synopsis && (hit(&self.description) || self.plot.as_deref().is_some_and(hit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rosa() -> Book {
        Book::new("1", "Il Nome della Rosa", "Umberto Eco", "Romanzo storico")
            .with_description("Un misterioso giallo medievale.")
            .with_published_year(1980)
            .with_pages(512)
            .with_rating(4.5)
    }

    #[test]
    fn serializes_with_camel_case_and_skips_absent_fields() {
        let json = serde_json::to_value(rosa()).unwrap();
        assert_eq!(json["publishedYear"], 1980);
        assert_eq!(json["id"], "1");
        assert!(json.get("plot").is_none());
    }

    #[test]
    fn deserializes_minimal_record() {
        let book: Book = serde_json::from_str(
            r#"{"id":"7","title":"T","author":"A","genre":"G"}"#,
        )
        .unwrap();
        assert_eq!(book.id().as_str(), "7");
        assert_eq!(book.description(), "");
        assert_eq!(book.rating(), None);
    }

    #[test]
    fn matches_is_case_insensitive_over_core_fields() {
        let book = rosa();
        assert!(book.matches("rosa", false));
        assert!(book.matches("umberto", false));
        assert!(book.matches("storico", false));
        assert!(!book.matches("medievale", false));
        assert!(book.matches("medievale", true));
    }

    #[test]
    fn matches_plot_only_with_synopsis() {
        let book = Book::new("2", "X", "Y", "Z").with_plot("Un monastero sulle Alpi");
        assert!(!book.matches("monastero", false));
        assert!(book.matches("monastero", true));
    }

    #[test]
    fn highly_rated_threshold() {
        assert!(rosa().is_highly_rated());
        assert!(Book::new("3", "a", "b", "c").with_rating(4.0).is_highly_rated());
        assert!(!Book::new("3", "a", "b", "c").with_rating(3.9).is_highly_rated());
        assert!(!Book::new("3", "a", "b", "c").is_highly_rated());
    }

    #[test]
    fn rating_bounds() {
        assert!(rosa().has_valid_rating());
        assert!(Book::new("3", "a", "b", "c").has_valid_rating());
        assert!(!Book::new("3", "a", "b", "c").with_rating(5.5).has_valid_rating());
        assert!(!Book::new("3", "a", "b", "c").with_rating(-1.0).has_valid_rating());
    }
}
