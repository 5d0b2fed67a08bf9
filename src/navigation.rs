use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};
use url::Url;

/// Encodes inline markup so it can be loaded like any other address.
pub fn html_to_data_uri(html: &str) -> String {
    format!("data:text/html;base64,{}", STANDARD.encode(html.as_bytes()))
}

/// What a new browser loads first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
    Url(Url),
    Html(String),
}

impl NavigationTarget {
    pub fn parse(url: &str) -> Result<Self, url::ParseError> {
        Url::parse(url).map(NavigationTarget::Url)
    }
}

impl fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationTarget::Url(url) => write!(f, "{url}"),
            NavigationTarget::Html(html) => write!(f, "{}", html_to_data_uri(html)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_utf8_markup() {
        assert_eq!(
            html_to_data_uri("<h1>héllo</h1>"),
            "data:text/html;base64,PGgxPmjDqWxsbzwvaDE+"
        );
    }

    #[test]
    fn inline_markup_becomes_data_uri() {
        let target = NavigationTarget::Html("<p>hi</p>".to_owned());
        assert!(target.to_string().starts_with("data:text/html;base64,"));
    }

    #[test]
    fn rejects_relative_urls() {
        assert!(NavigationTarget::parse("index.html").is_err());
        assert_eq!(
            NavigationTarget::parse("about:blank").unwrap().to_string(),
            "about:blank"
        );
    }
}
