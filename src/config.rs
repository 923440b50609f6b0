use std::path::PathBuf;

use clap::Parser;

use crate::domain::model::catalog::Catalog;
use crate::infra::json_store::{load_catalog, JsonFileStore, JsonStoreError};

/// Command-line / environment configuration of the server binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "libro", version, about = "Book catalog and favorites MCP server")]
pub struct Config {
    /// Directory holding the favorites slot file
    #[arg(env = "LIBRO_DATA_DIR", default_value = "libro-data")]
    pub data_dir: PathBuf,

    /// Catalog JSON file replacing the bundled catalog
    #[arg(long, env = "LIBRO_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// tracing filter directive (written to stderr)
    #[arg(long, env = "LIBRO_LOG", default_value = "libro=info")]
    pub log: String,
}

impl Config {
    pub fn store(&self) -> JsonFileStore {
        JsonFileStore::new(&self.data_dir)
    }

    /// 指定があればファイルから、無ければ同梱カタログ。
    pub fn load_catalog(&self) -> Result<Catalog, JsonStoreError> {
        match &self.catalog {
            Some(path) => load_catalog(path),
            None => Ok(Catalog::builtin()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["libro"]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("libro-data"));
        assert!(config.catalog.is_none());
        assert_eq!(config.log, "libro=info");
    }

    #[test]
    fn explicit_arguments() {
        let config = Config::try_parse_from([
            "libro",
            "/var/lib/libro",
            "--catalog",
            "books.json",
            "--log",
            "libro=debug",
        ])
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/libro"));
        assert_eq!(config.catalog, Some(PathBuf::from("books.json")));
        assert_eq!(config.log, "libro=debug");
        assert_eq!(config.store().dir(), std::path::Path::new("/var/lib/libro"));
    }

    #[test]
    fn builtin_catalog_without_file() {
        let config = Config::try_parse_from(["libro"]).unwrap();
        assert_eq!(config.load_catalog().unwrap().len(), 8);
    }
}
