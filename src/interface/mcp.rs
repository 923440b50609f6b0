//! MCP Server for libro
//!
//! MCP Protocol (stdio) <-> application::LibraryService
//!
//! 7 tools: catalog, genres, search, book, favorite_add, favorite_remove, favorites

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rmcp::{
    handler::server::{tool::ToolCallContext, tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
    transport::stdio,
    ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::application::error::AppError;
use crate::application::favorites::Subscription;
use crate::application::service::{BookDetail, LibraryService};
use crate::config::Config;
use crate::domain::model::book::Book;
use crate::domain::model::catalog::{GenreShelf, SearchQuery};
use crate::domain::model::id::BookId;
use crate::infra::json_store::JsonFileStore;

// =============================================================================
// Public entry point
// =============================================================================

/// MCP Serverを起動する。カタログとお気に入りスロットはconfigから解決する。
pub async fn run(config: Config) -> anyhow::Result<()> {
    let catalog = config.load_catalog()?;
    tracing::info!(
        books = catalog.len(),
        data_dir = %config.data_dir.display(),
        "starting libro MCP server"
    );
    let service = LibraryService::open(catalog, config.store());
    let server = LibroMcpServer::new(service);
    let running = server.serve(stdio()).await?;
    running.waiting().await?;
    Ok(())
}

// =============================================================================
// MCP Server
// =============================================================================

#[derive(Clone)]
struct LibroMcpServer {
    service: Arc<LibraryService<JsonFileStore>>,
    /// お気に入り変更の通番。ストアの購読コールバックが進める。
    revision: Arc<AtomicU64>,
    _subscription: Arc<Subscription>,
    tool_router: ToolRouter<Self>,
}

impl LibroMcpServer {
    fn new(service: LibraryService<JsonFileStore>) -> Self {
        let revision = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&revision);
        let subscription = service.favorites().subscribe(move || {
            let rev = counter.fetch_add(1, Ordering::SeqCst) + 1;
            tracing::debug!(revision = rev, "favorites changed");
        });
        Self {
            service: Arc::new(service),
            revision,
            _subscription: Arc::new(subscription),
            tool_router: Self::tool_router(),
        }
    }

    fn to_mcp_error(e: AppError) -> McpError {
        match e {
            AppError::BookNotFound(id) => McpError::invalid_params(
                format!("Book not found: '{id}'. Use `search` or `catalog` to find ids."),
                None,
            ),
        }
    }
}

// =============================================================================
// ServerHandler impl
// =============================================================================

impl ServerHandler for LibroMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "libro".to_string(),
                title: Some("Libro — Book Catalog & Favorites".to_string()),
                description: Some(
                    "Browse a curated book catalog by genre, search it, \
                     and keep a persistent list of favorite books."
                        .to_string(),
                ),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Browse with `catalog` (genre shelves) or `search`, open a book with `book`.\n\
                 \n\
                 Favorites: `favorite_add` / `favorite_remove` by book id, `favorites` to list. \
                 Favorites persist across restarts."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool_ctx = ToolCallContext::new(self, request, context);
        self.tool_router.call(tool_ctx).await
    }
}

// =============================================================================
// Request types
// =============================================================================

/// 空文字列・空白のみはNone扱い。
fn normalize_text(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_book_id(s: &str) -> Result<BookId, McpError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(McpError::invalid_params("book id must not be empty", None));
    }
    Ok(BookId::from(trimmed))
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpCatalogRequest {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpGenresRequest {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpSearchRequest {
    #[schemars(
        description = "Text matched case-insensitively against title, author and genre. Omit or leave empty to list everything."
    )]
    pub query: Option<String>,
    #[schemars(description = "Exact genre label from `genres` output (e.g. 'Romanzo rosa')")]
    pub genre: Option<String>,
    #[schemars(description = "Also match description and plot (default: false)")]
    #[serde(default)]
    pub include_synopsis: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBookRequest {
    #[schemars(description = "Book id as shown in brackets by `catalog`/`search` (e.g. '1')")]
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpFavoriteRequest {
    #[schemars(description = "Book id as shown in brackets by `catalog`/`search` (e.g. '1')")]
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpFavoritesRequest {}

// =============================================================================
// Tool implementations
// =============================================================================

#[tool_router]
impl LibroMcpServer {
    #[tool(
        name = "catalog",
        description = "Show the catalog grouped into genre shelves. Each book is listed as [id] title — author. Saved books are marked with ♥.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn catalog(
        &self,
        #[allow(unused_variables)] Parameters(_req): Parameters<McpCatalogRequest>,
    ) -> Result<CallToolResult, McpError> {
        let catalog = self.service.catalog();
        let saved = self.service.favorites();
        let output = format_shelves(&catalog.group_by_genre(), |b| saved.contains(b.id()));
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "genres",
        description = "List genre labels in display order. Use a label as `genre` in `search`.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn genres(
        &self,
        #[allow(unused_variables)] Parameters(_req): Parameters<McpGenresRequest>,
    ) -> Result<CallToolResult, McpError> {
        let genres = self.service.catalog().genres();
        let output = genres
            .iter()
            .enumerate()
            .map(|(i, g)| format!("{}. {}", i + 1, g))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "search",
        description = "Search books by title, author or genre (case-insensitive substring). Optionally restrict to one genre and include description/plot.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn search(
        &self,
        Parameters(req): Parameters<McpSearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        let query = SearchQuery {
            text: normalize_text(req.query).unwrap_or_default(),
            genre: normalize_text(req.genre),
            include_synopsis: req.include_synopsis,
        };
        let hits = self.service.search(&query);
        let saved = self.service.favorites();
        let output = format_search(&query, &hits, |b| saved.contains(b.id()));
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "book",
        description = "Show the detail page of a book: metadata, plot, saved state and an online purchase search link.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn book(
        &self,
        Parameters(req): Parameters<McpBookRequest>,
    ) -> Result<CallToolResult, McpError> {
        let id = parse_book_id(&req.id)?;
        // 見つからない場合はエラーではなく「not found」画面を返す
        let output = match self.service.detail(&id) {
            Ok(detail) => format_detail(&detail),
            Err(AppError::BookNotFound(id)) => format!("Book not found: '{id}'"),
        };
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "favorite_add",
        description = "Add a book to favorites by id. Adding an already saved book does nothing.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn favorite_add(
        &self,
        Parameters(req): Parameters<McpFavoriteRequest>,
    ) -> Result<CallToolResult, McpError> {
        let id = parse_book_id(&req.id)?;
        let book = self.service.save(&id).map_err(Self::to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(format!(
            "\"{}\" added to favorites ({} saved)",
            book.title(),
            self.service.favorites().len()
        ))]))
    }

    #[tool(
        name = "favorite_remove",
        description = "Remove a book from favorites by id. Removing a book that is not saved is harmless.",
        annotations(
            read_only_hint = false,
            destructive_hint = true,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn favorite_remove(
        &self,
        Parameters(req): Parameters<McpFavoriteRequest>,
    ) -> Result<CallToolResult, McpError> {
        let id = parse_book_id(&req.id)?;
        let was_saved = self.service.favorites().contains(&id);
        self.service.unsave(&id);

        let label = self
            .service
            .catalog()
            .find_by_id(&id)
            .map(|b| format!("\"{}\"", b.title()))
            .unwrap_or_else(|| format!("'{id}'"));
        let msg = if was_saved {
            format!("{label} removed from favorites")
        } else {
            format!("{label} was not in favorites")
        };
        Ok(CallToolResult::success(vec![Content::text(msg)]))
    }

    #[tool(
        name = "favorites",
        description = "List saved books in the order they were added.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn favorites(
        &self,
        #[allow(unused_variables)] Parameters(_req): Parameters<McpFavoritesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let books = self.service.saved_books();
        let revision = self.revision.load(Ordering::SeqCst);
        Ok(CallToolResult::success(vec![Content::text(format_favorites(
            &books, revision,
        ))]))
    }
}

// =============================================================================
// Helpers — text rendering
// =============================================================================

fn format_book_line(book: &Book, saved: bool) -> String {
    let marker = if saved { " ♥" } else { "" };
    format!("[{}] {} — {}{}", book.id(), book.title(), book.author(), marker)
}

/// ジャンル棚を見出し付きで並べる。
fn format_shelves(shelves: &[GenreShelf<'_>], is_saved: impl Fn(&Book) -> bool) -> String {
    if shelves.is_empty() {
        return String::from("Catalog is empty.");
    }
    let mut output = String::new();
    for shelf in shelves {
        output.push_str(&format!("## {} ({})\n", shelf.genre, shelf.books.len()));
        for book in &shelf.books {
            output.push_str(&format_book_line(book, is_saved(*book)));
            output.push('\n');
        }
        output.push('\n');
    }
    output.trim_end().to_string()
}

fn format_search(query: &SearchQuery, hits: &[&Book], is_saved: impl Fn(&Book) -> bool) -> String {
    let mut header = format!("Results ({})", hits.len());
    if !query.text.is_empty() {
        header.push_str(&format!(" for \"{}\"", query.text));
    }
    if let Some(genre) = &query.genre {
        header.push_str(&format!(" in {genre}"));
    }
    if hits.is_empty() {
        return format!("{header}\n\nNo books found.");
    }
    let lines: Vec<String> = hits
        .iter()
        .map(|b| format!("{} ({})", format_book_line(b, is_saved(*b)), b.genre()))
        .collect();
    format!("{header}\n\n{}", lines.join("\n"))
}

fn format_detail(detail: &BookDetail<'_>) -> String {
    let book = detail.book;
    let mut output = format!("# {}\n\n", book.title());
    output.push_str(&format!("Author: {}\n", book.author()));
    output.push_str(&format!("Genre: {}\n", book.genre()));
    if let Some(year) = book.published_year() {
        output.push_str(&format!("Published: {year}\n"));
    }
    if let Some(pages) = book.pages() {
        output.push_str(&format!("Pages: {pages}\n"));
    }
    if let Some(rating) = book.rating() {
        output.push_str(&format!("Rating: {rating}/5\n"));
    }
    if !book.description().is_empty() {
        output.push_str(&format!("\n{}\n", book.description()));
    }
    if let Some(plot) = book.plot() {
        output.push_str(&format!("\n## Plot\n\n{plot}\n"));
    }
    output.push_str(&format!(
        "\nSaved: {}\nBuy online: {}",
        if detail.saved { "yes ♥" } else { "no" },
        detail.purchase_url
    ));
    output
}

fn format_favorites(books: &[Book], revision: u64) -> String {
    if books.is_empty() {
        return format!("No saved books yet. (revision {revision})");
    }
    let highly_rated = books.iter().filter(|b| b.is_highly_rated()).count();
    let mut output = format!(
        "# Favorites ({} books, {} highly rated, revision {})\n\n",
        books.len(),
        highly_rated,
        revision
    );
    for (i, book) in books.iter().enumerate() {
        output.push_str(&format!(
            "{}. {} ({})\n",
            i + 1,
            format_book_line(book, false),
            book.genre()
        ));
    }
    output.trim_end().to_string()
}

// =============================================================================
// Tests
// =============================================================================
