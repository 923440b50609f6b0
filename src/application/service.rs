use std::sync::Arc;

use crate::domain::model::book::Book;
use crate::domain::model::catalog::{Catalog, SearchQuery};
use crate::domain::model::id::BookId;
use crate::domain::repository::KeyValueStore;

use super::error::AppError;
use super::favorites::FavoritesStore;
use super::link::purchase_search_url;

/// Detail page data for a single book.
#[derive(Debug, Clone)]
pub struct BookDetail<'a> {
    pub book: &'a Book,
    pub saved: bool,
    pub purchase_url: String,
}

/// 画面から呼ばれるユースケース。CatalogとFavoritesStoreを束ねる合成ルート。
/// 画面はbook idで操作し、ここで蔵書に解決する。
pub struct LibraryService<S: KeyValueStore> {
    catalog: Catalog,
    favorites: Arc<FavoritesStore<S>>,
}

impl<S: KeyValueStore> LibraryService<S> {
    pub fn new(catalog: Catalog, favorites: Arc<FavoritesStore<S>>) -> Self {
        Self { catalog, favorites }
    }

    /// Opens the favorites store on `storage` and wires it to `catalog`.
    pub fn open(catalog: Catalog, storage: S) -> Self {
        Self::new(catalog, Arc::new(FavoritesStore::open(storage)))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn favorites(&self) -> &Arc<FavoritesStore<S>> {
        &self.favorites
    }

    pub fn search(&self, query: &SearchQuery) -> Vec<&Book> {
        self.catalog.search(query)
    }

    /// 詳細ページ。カタログに無ければBookNotFound。
    pub fn detail(&self, id: &BookId) -> Result<BookDetail<'_>, AppError> {
        let book = self.find(id)?;
        Ok(BookDetail {
            book,
            saved: self.favorites.contains(id),
            purchase_url: purchase_search_url(book),
        })
    }

    /// お気に入りに追加する。既に保存済みなら何もしない。
    pub fn save(&self, id: &BookId) -> Result<&Book, AppError> {
        let book = self.find(id)?;
        self.favorites.add(book.clone());
        Ok(book)
    }

    /// Removes `id` from favorites. The id does not need to be in the catalog.
    pub fn unsave(&self, id: &BookId) {
        self.favorites.remove(id);
    }

    pub fn saved_books(&self) -> Vec<Book> {
        self.favorites.list()
    }

    // --- private ---

    fn find(&self, id: &BookId) -> Result<&Book, AppError> {
        self.catalog
            .find_by_id(id)
            .ok_or_else(|| AppError::BookNotFound(id.clone()))
    }
}
