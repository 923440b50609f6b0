use crate::domain::model::book::Book;

/// Base of the "buy online" search link shown on the detail page.
pub const PURCHASE_SEARCH_BASE: &str = "https://www.amazon.it/s?k=";

/// 書名＋著者名で検索するURLを作る。片道のリンクで、戻り値の契約はない。
pub fn purchase_search_url(book: &Book) -> String {
    let terms = format!("{} {}", book.title(), book.author());
    format!("{PURCHASE_SEARCH_BASE}{}", urlencoding::encode(&terms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_title_and_author() {
        let book = Book::new("1", "Il Nome della Rosa", "Umberto Eco", "Romanzo storico");
        assert_eq!(
            purchase_search_url(&book),
            "https://www.amazon.it/s?k=Il%20Nome%20della%20Rosa%20Umberto%20Eco"
        );
    }

    #[test]
    fn escapes_reserved_characters() {
        let book = Book::new("4", "La donna della domenica", "Fruttero & Lucentini", "Giallo");
        let url = purchase_search_url(&book);
        assert!(url.contains("Fruttero%20%26%20Lucentini"));
        assert!(!url[PURCHASE_SEARCH_BASE.len()..].contains('&'));
    }
}
