use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::book::Book;
use super::id::BookId;
use crate::domain::error::DomainError;

/// 表示順のジャンル一覧（ホーム画面の棚の並び）
pub const DEFAULT_GENRE_ORDER: [&str; 4] = [
    "Giallo/Thriller",
    "Romanzo storico",
    "Romanzo rosa",
    "Saggio/Non-fiction",
];

/// One genre shelf: the label and its books in catalog order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreShelf<'a> {
    pub genre: &'a str,
    pub books: Vec<&'a Book>,
}

/// 検索条件。空のtextかつgenre無しなら全件。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    /// 完全一致のジャンル絞り込み
    pub genre: Option<String>,
    /// description / plot も検索対象に含める
    pub include_synopsis: bool,
}

impl SearchQuery {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn in_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_synopsis(mut self) -> Self {
        self.include_synopsis = true;
        self
    }
}

/// Catalog — 読み取り専用の蔵書一覧。構築後は変更されない。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    genre_order: Vec<String>,
    books: Vec<Book>,
}

impl Catalog {
    /// Builds a catalog, rejecting duplicate ids, repeated genre labels and out-of-range ratings.
    pub fn new(books: Vec<Book>, genre_order: Vec<String>) -> Result<Self, DomainError> {
        let catalog = Self { genre_order, books };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The bundled catalog.
    pub fn builtin() -> Self {
        Self {
            genre_order: DEFAULT_GENRE_ORDER.iter().map(|g| g.to_string()).collect(),
            books: builtin_books(),
        }
    }

    /// Checks the catalog invariants. Also used after deserializing a catalog file.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut genres = HashSet::new();
        for genre in &self.genre_order {
            if !genres.insert(genre.as_str()) {
                return Err(DomainError::DuplicateGenre(genre.clone()));
            }
        }

        let mut seen = HashSet::new();
        for book in &self.books {
            if !seen.insert(book.id()) {
                return Err(DomainError::DuplicateBookId(book.id().clone()));
            }
            if !book.has_valid_rating() {
                return Err(DomainError::RatingOutOfRange {
                    id: book.id().clone(),
                    rating: book.rating().unwrap_or_default(),
                });
            }
        }
        Ok(())
    }

    pub fn list_all(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn find_by_id(&self, id: &BookId) -> Option<&Book> {
        self.books.iter().find(|b| b.id() == id)
    }

    /// 表示用ジャンル一覧: genre_order順、その後に順序未定義のジャンルを出現順で。
    pub fn genres(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.genre_order.iter().map(String::as_str).collect();
        for book in &self.books {
            if !out.contains(&book.genre()) {
                out.push(book.genre());
            }
        }
        out
    }

    /// ジャンル別の棚。本のないジャンルは省く。棚内はカタログ順。
    pub fn group_by_genre(&self) -> Vec<GenreShelf<'_>> {
        self.genres()
            .into_iter()
            .filter_map(|genre| {
                let books: Vec<&Book> = self.books.iter().filter(|b| b.genre() == genre).collect();
                (!books.is_empty()).then_some(GenreShelf { genre, books })
            })
            .collect()
    }

    /// Linear filter over the catalog; matches keep catalog order.
    pub fn search(&self, query: &SearchQuery) -> Vec<&Book> {
        let needle = query.text.trim().to_lowercase();
        self.books
            .iter()
            .filter(|b| match &query.genre {
                Some(genre) => b.genre() == genre,
                None => true,
            })
            .filter(|b| needle.is_empty() || b.matches(&needle, query.include_synopsis))
            .collect()
    }
}

fn cover(title: &str) -> String {
    format!(
        "https://placehold.co/300x450?text={}",
        urlencoding::encode(title)
    )
}

fn builtin_books() -> Vec<Book> {
    vec![
        Book::new("1", "Il Nome della Rosa", "Umberto Eco", "Romanzo storico")
            .with_description(
                "Un misterioso giallo medievale ambientato in un monastero benedettino.",
            )
            .with_plot(
                "Nel 1327 il frate francescano Guglielmo da Baskerville e il novizio Adso \
                 giungono in un'abbazia dell'Italia settentrionale, dove una serie di morti \
                 misteriose ruota attorno alla biblioteca e a un libro proibito.",
            )
            .with_image("https://m.media-amazon.com/images/I/81JcSw7auLL._AC_UF1000,1000_QL80_.jpg")
            .with_published_year(1980)
            .with_pages(512)
            .with_rating(4.5),
        Book::new("2", "I Promessi Sposi", "Alessandro Manzoni", "Romanzo storico")
            .with_description("Renzo e Lucia nella Lombardia del Seicento sotto il dominio spagnolo.")
            .with_image(cover("I Promessi Sposi"))
            .with_published_year(1827)
            .with_pages(720)
            .with_rating(4.1),
        Book::new("3", "Il giorno della civetta", "Leonardo Sciascia", "Giallo/Thriller")
            .with_description("Il capitano Bellodi indaga su un omicidio in un paese siciliano.")
            .with_image(cover("Il giorno della civetta"))
            .with_published_year(1961)
            .with_pages(144)
            .with_rating(4.2),
        Book::new("4", "La donna della domenica", "Fruttero & Lucentini", "Giallo/Thriller")
            .with_description("Un delitto nella Torino borghese e il commissario Santamaria.")
            .with_image(cover("La donna della domenica"))
            .with_published_year(1972)
            .with_pages(480)
            .with_rating(4.0),
        Book::new("5", "Va' dove ti porta il cuore", "Susanna Tamaro", "Romanzo rosa")
            .with_description("Una lunga lettera di una nonna alla nipote lontana.")
            .with_image(cover("Va' dove ti porta il cuore"))
            .with_published_year(1994)
            .with_pages(176)
            .with_rating(3.7),
        Book::new("6", "Tre metri sopra il cielo", "Federico Moccia", "Romanzo rosa")
            .with_description("L'amore tra Babi e Step nella Roma degli anni Novanta.")
            .with_image(cover("Tre metri sopra il cielo"))
            .with_published_year(1992)
            .with_pages(336)
            .with_rating(3.4),
        Book::new("7", "Sette brevi lezioni di fisica", "Carlo Rovelli", "Saggio/Non-fiction")
            .with_description("La fisica moderna raccontata in sette brevi lezioni.")
            .with_image(cover("Sette brevi lezioni di fisica"))
            .with_published_year(2014)
            .with_pages(88)
            .with_rating(4.0),
        Book::new("8", "Se questo è un uomo", "Primo Levi", "Saggio/Non-fiction")
            .with_description("La testimonianza della prigionia ad Auschwitz.")
            .with_image(cover("Se questo è un uomo"))
            .with_published_year(1947)
            .with_pages(208)
            .with_rating(4.7),
    ]
}
