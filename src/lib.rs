//! libro — book catalog browsing with persistent, observable favorites.
//!
//! Layers: `domain` (Book, Catalog, storage trait) → `application`
//! (FavoritesStore, LibraryService) → `infra` (JSON file store) →
//! `interface` (MCP stdio server).

pub mod config;

pub mod domain {
    pub mod error;
    pub mod model {
        pub mod book;
        pub mod catalog;
        pub mod id;
    }
    pub mod repository;
}

pub mod application {
    pub mod error;
    pub mod favorites;
    pub mod link;
    pub mod service;
}

pub mod infra {
    pub mod json_store;
}

pub mod interface {
    pub mod mcp;
}
