//! Website search page fallback.
//!
//! Used when the structured API returns nothing for an obscure title: the
//! public search page sometimes still lists it. Only the first result link is
//! read; its record ID is then looked up through the API.

use regex::Regex;
use scraper::{Html, Selector};
use shirabe_core::MediaKind;

use crate::error::{ProviderError, ProviderResult};

/// Extracts record IDs from the provider's HTML search page.
#[derive(Debug, Clone)]
pub struct SearchPageParser {
    result_link: Selector,
    re_tv: Regex,
    re_movie: Regex,
}

impl SearchPageParser {
    /// Compiles the result selector and link patterns.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Scrape` if the selector or a pattern fails to compile.
    pub fn new() -> ProviderResult<Self> {
        let compile = |p: &str| Regex::new(p).map_err(|e| ProviderError::Scrape(e.to_string()));
        Ok(Self {
            result_link: Selector::parse("a.result")
                .map_err(|e| ProviderError::Scrape(e.to_string()))?,
            re_tv: compile(r"/tv/(\d+)")?,
            re_movie: compile(r"/movie/(\d+)")?,
        })
    }

    /// URL of the search page for `kind`.
    pub fn search_url(site_base_url: &str, kind: MediaKind) -> String {
        format!("{site_base_url}/search/{}", kind.path_segment())
    }

    /// ID from the first `a.result` link whose `href` points at a `kind` record.
    #[must_use]
    pub fn first_result(&self, html: &str, kind: MediaKind) -> Option<u64> {
        let document = Html::parse_document(html);

        let pattern = match kind {
            MediaKind::Tv => &self.re_tv,
            MediaKind::Movie => &self.re_movie,
        };

        document
            .select(&self.result_link)
            .filter_map(|a| a.value().attr("href"))
            .find_map(|href| {
                pattern
                    .captures(href)
                    .and_then(|c| c[1].parse::<u64>().ok())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="search_results">
            <a class="result" href="/person/17419-bryan-cranston">Bryan Cranston</a>
            <a class="result" href="/tv/1396-breaking-bad?language=en-US">Breaking Bad</a>
            <a class="result" href="/movie/559969-el-camino">El Camino</a>
          </div>
        </body></html>
    "#;

    #[test]
    fn finds_first_matching_link() {
        let parser = SearchPageParser::new().unwrap();
        assert_eq!(parser.first_result(PAGE, MediaKind::Tv), Some(1396));
        assert_eq!(parser.first_result(PAGE, MediaKind::Movie), Some(559969));
        assert_eq!(parser.first_result(PAGE, MediaKind::Tv), Some(1396));
    }

    #[test]
    fn empty_page_yields_nothing() {
        let parser = SearchPageParser::new().unwrap();
        assert_eq!(parser.first_result("<html></html>", MediaKind::Tv), None);
    }

    #[test]
    fn search_url_per_kind() {
        assert_eq!(
            SearchPageParser::search_url("https://www.themoviedb.org", MediaKind::Tv),
            "https://www.themoviedb.org/search/tv"
        );
    }
}
