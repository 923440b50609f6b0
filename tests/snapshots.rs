//! Snapshot tests — catalog shelves, search results and the persisted slot format.

mod common;

use std::sync::Arc;

use common::InMemoryStore;
use insta::{assert_json_snapshot, assert_snapshot};
use serde::Serialize;

use libro::application::favorites::FavoritesStore;
use libro::domain::model::book::Book;
use libro::domain::model::catalog::{Catalog, SearchQuery};

#[derive(Serialize)]
struct ShelfView<'a> {
    genre: &'a str,
    titles: Vec<&'a str>,
}

// =============================================================================
// Catalog snapshots
// =============================================================================

#[test]
fn snapshot_genre_shelves() {
    let catalog = Catalog::builtin();
    let shelves: Vec<ShelfView<'_>> = catalog
        .group_by_genre()
        .into_iter()
        .map(|s| ShelfView {
            genre: s.genre,
            titles: s.books.iter().map(|b| b.title()).collect(),
        })
        .collect();

    assert_json_snapshot!(shelves, @r###"
    [
      {
        "genre": "Giallo/Thriller",
        "titles": [
          "Il giorno della civetta",
          "La donna della domenica"
        ]
      },
      {
        "genre": "Romanzo storico",
        "titles": [
          "Il Nome della Rosa",
          "I Promessi Sposi"
        ]
      },
      {
        "genre": "Romanzo rosa",
        "titles": [
          "Va' dove ti porta il cuore",
          "Tre metri sopra il cielo"
        ]
      },
      {
        "genre": "Saggio/Non-fiction",
        "titles": [
          "Sette brevi lezioni di fisica",
          "Se questo è un uomo"
        ]
      }
    ]
    "###);
}

#[test]
fn snapshot_search_rosa() {
    let catalog = Catalog::builtin();
    let hits = catalog.search(&SearchQuery::text("rosa"));
    let lines: Vec<String> = hits
        .iter()
        .map(|b| format!("{} | {} | {}", b.id(), b.title(), b.genre()))
        .collect();

    assert_snapshot!(lines.join("\n"), @r###"
    1 | Il Nome della Rosa | Romanzo storico
    5 | Va' dove ti porta il cuore | Romanzo rosa
    6 | Tre metri sopra il cielo | Romanzo rosa
    "###);
}

// =============================================================================
// Slot format
// =============================================================================

#[test]
fn snapshot_persisted_slot() {
    let storage = InMemoryStore::new();
    let store = FavoritesStore::open(Arc::clone(&storage));
    store.add(
        Book::new("1", "Il Nome della Rosa", "Umberto Eco", "Romanzo storico")
            .with_description("Un giallo medievale.")
            .with_image("https://example.invalid/rosa.jpg")
            .with_published_year(1980)
            .with_pages(512)
            .with_rating(4.5),
    );

    let raw = storage.raw().unwrap();
    assert_snapshot!(raw, @r###"[{"id":"1","title":"Il Nome della Rosa","author":"Umberto Eco","genre":"Romanzo storico","description":"Un giallo medievale.","image":"https://example.invalid/rosa.jpg","publishedYear":1980,"pages":512,"rating":4.5}]"###);
}
