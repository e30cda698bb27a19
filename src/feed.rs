use std::fmt;
use std::str::FromStr;

use tracing::{info, warn};

use crate::card::{PostCard, ViewContext};
use crate::error::ActionError;
use crate::models::PostQuery;
use crate::notice::Notice;

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LanguageFilter {
    #[default]
    All,
    Language(String),
}

impl LanguageFilter {
    pub fn matches(&self, language: &str) -> bool {
        match self {
            LanguageFilter::All => true,
            LanguageFilter::Language(l) => l == language,
        }
    }

    fn apply(&self, query: PostQuery) -> PostQuery {
        match self {
            LanguageFilter::All => query,
            LanguageFilter::Language(l) => query.language(l.clone()),
        }
    }
}

impl FromStr for LanguageFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(LanguageFilter::All)
        } else {
            Ok(LanguageFilter::Language(s.to_string()))
        }
    }
}

impl fmt::Display for LanguageFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageFilter::All => f.write_str("all"),
            LanguageFilter::Language(l) => f.write_str(l),
        }
    }
}

pub struct FeedList {
    ctx: ViewContext,
    filter: LanguageFilter,
    page_size: usize,
    posts: Vec<PostCard>,
    languages: Vec<String>,
    loading: bool,
}

impl FeedList {
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            filter: LanguageFilter::All,
            page_size: DEFAULT_PAGE_SIZE,
            posts: Vec::new(),
            languages: Vec::new(),
            loading: false,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn filter(&self) -> &LanguageFilter { &self.filter }
    pub fn posts(&self) -> &[PostCard] { &self.posts }
    pub fn posts_mut(&mut self) -> &mut [PostCard] { &mut self.posts }
    pub fn is_loading(&self) -> bool { self.loading }

    /// Options for the filter dropdown: "all" followed by every language in
    /// the catalog, independent of the active filter.
    pub fn filter_options(&self) -> Vec<LanguageFilter> {
        std::iter::once(LanguageFilter::All)
            .chain(self.languages.iter().cloned().map(LanguageFilter::Language))
            .collect()
    }

    pub async fn set_filter(&mut self, filter: LanguageFilter) -> Result<(), ActionError> {
        self.filter = filter;
        self.load().await
    }

    /// Fetch the newest page for the active filter and the language catalog.
    /// On failure the previously loaded cards stay in place.
    pub async fn load(&mut self) -> Result<(), ActionError> {
        self.loading = true;
        let query = self.filter.apply(PostQuery::default().limit(self.page_size));
        let (posts, languages) = tokio::join!(
            self.ctx.gateway.list_posts(query),
            self.ctx.gateway.list_languages(),
        );
        self.loading = false;

        match languages {
            Ok(l) => self.languages = l,
            Err(e) => warn!("failed to load language catalog: {e}"),
        }
        let records = match posts {
            Ok(r) => r,
            Err(e) => {
                warn!(filter = %self.filter, "failed to load feed: {e}");
                self.ctx.notify(Notice::error("Error", "Failed to load posts"));
                return Err(e.into());
            }
        };
        info!(filter = %self.filter, count = records.len(), "feed loaded");

        self.posts = records.into_iter().map(|r| PostCard::from_record(r, &self.ctx)).collect();
        for card in &self.posts {
            // lookup failures keep the aggregate count; nothing to show the user
            let _ = card.engagement.mount().await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_filter() {
        assert_eq!("all".parse::<LanguageFilter>().unwrap(), LanguageFilter::All);
        assert_eq!("ALL".parse::<LanguageFilter>().unwrap(), LanguageFilter::All);
        assert_eq!("".parse::<LanguageFilter>().unwrap(), LanguageFilter::All);
        assert_eq!(
            "python".parse::<LanguageFilter>().unwrap(),
            LanguageFilter::Language("python".into())
        );
        assert_eq!(LanguageFilter::Language("rust".into()).to_string(), "rust");
    }
}
