//! Defines [`ArticleStore`], the in-memory, append-only collection of
//! [`Article`]s, along with its [`Stats`] and [`Error`] types.
//!
//! The store keeps articles in insertion order and sorts on the way out:
//! [`ArticleStore::all`] returns the most recent article first, with articles
//! sharing a date left in the order they were inserted.

use crate::article::{link_for, Article, NewArticle};
use crate::config::Config;
use crate::date::{Clock, Error as DateError, SystemClock};
use crate::slug::{generate_slug, slugify};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Aggregate figures over a store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// The number of articles.
    pub total: usize,

    /// Every distinct tag, in order of first appearance.
    pub tags: Vec<String>,

    /// The most recent article date, if there are any articles.
    pub latest_date: Option<NaiveDate>,
}

/// An owned, in-memory collection of [`Article`]s. There is no shared
/// instance: whoever needs a store builds one and passes it along. `add`
/// takes `&mut self`, so sharing a store across threads is the caller's
/// business (wrap it in a lock, or clone it per request).
#[derive(Clone)]
pub struct ArticleStore {
    articles: Vec<Article>,
    config: Config,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for ArticleStore {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ArticleStore")
            .field("articles", &self.articles)
            .field("config", &self.config)
            .finish()
    }
}

impl Default for ArticleStore {
    fn default() -> Self {
        ArticleStore::new()
    }
}

impl ArticleStore {
    /// Creates an empty store with the default [`Config`] and the system
    /// clock.
    pub fn new() -> ArticleStore {
        ArticleStore {
            articles: Vec::new(),
            config: Config::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Creates a store pre-loaded with seed articles. The seed must already
    /// satisfy the store's invariants: positive, unique ids; unique slugs;
    /// and `link == {slug}.html`.
    pub fn from_seed(seed: Vec<Article>) -> Result<ArticleStore> {
        let mut ids = HashSet::with_capacity(seed.len());
        let mut slugs = HashSet::with_capacity(seed.len());
        for article in &seed {
            if article.id == 0 {
                return Err(Error::InvalidId(article.id));
            }
            if !ids.insert(article.id) {
                return Err(Error::DuplicateId(article.id));
            }
            if !slugs.insert(article.slug.as_str()) {
                return Err(Error::DuplicateSlug(article.slug.clone()));
            }
            if article.link != link_for(&article.slug) {
                return Err(Error::LinkMismatch {
                    slug: article.slug.clone(),
                    link: article.link.clone(),
                });
            }
        }

        tracing::debug!(count = seed.len(), "seeded article store");
        Ok(ArticleStore {
            articles: seed,
            ..ArticleStore::new()
        })
    }

    /// Replaces the store's configuration.
    pub fn with_config(mut self, config: Config) -> ArticleStore {
        self.config = config;
        self
    }

    /// Replaces the store's clock.
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> ArticleStore {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Returns every article, most recent first. Articles with the same date
    /// keep their insertion order.
    pub fn all(&self) -> Vec<&Article> {
        let mut articles: Vec<&Article> = self.articles.iter().collect();
        articles.sort_by(|a, b| b.date.cmp(&a.date));
        articles
    }

    /// Returns the articles carrying `tag`, most recent first.
    pub fn by_tag(&self, tag: &str) -> Vec<&Article> {
        self.all().into_iter().filter(|a| a.has_tag(tag)).collect()
    }

    pub fn get_by_id(&self, id: u64) -> Option<&Article> {
        self.articles.iter().find(|a| a.id == id)
    }

    pub fn get_by_slug(&self, slug: &str) -> Option<&Article> {
        self.articles.iter().find(|a| a.slug == slug)
    }

    /// The id the next added article will receive.
    pub fn next_id(&self) -> u64 {
        self.articles.iter().map(|a| a.id).max().unwrap_or(0) + 1
    }

    /// Builds an [`Article`] from `input`, appends it, and returns the stored
    /// record. See [`NewArticle`] for the defaults applied to omitted fields.
    ///
    /// Fails if the title is blank, or if an explicitly supplied slug isn't
    /// already in slug form (lowercase ASCII words joined by single hyphens)
    /// or is already taken. A slug derived from the title that collides with an
    /// existing one gets a numeric suffix (`-2`, `-3`, ...) instead.
    pub fn add(&mut self, input: NewArticle) -> Result<&Article> {
        if input.title.trim().is_empty() {
            return Err(Error::MissingTitle);
        }

        let slug = match input.slug.filter(|s| !s.is_empty()) {
            Some(slug) => {
                if slugify(&slug).as_deref() != Some(slug.as_str()) {
                    return Err(Error::InvalidSlug(slug));
                }
                if self.get_by_slug(&slug).is_some() {
                    return Err(Error::DuplicateSlug(slug));
                }
                slug
            }
            None => self.unique_slug(generate_slug(&input.title, &*self.clock)),
        };

        let date = input.date.unwrap_or_else(|| self.clock.today());
        let date_display = input
            .date_display
            .unwrap_or_else(|| self.config.date_format.format(date));

        let article = Article {
            id: self.next_id(),
            title: input.title,
            link: link_for(&slug),
            slug,
            summary: input.summary.unwrap_or_default(),
            date,
            date_display,
            tags: input.tags.unwrap_or_default(),
            author: input.author.unwrap_or_else(|| self.config.author.clone()),
        };

        tracing::debug!(id = article.id, slug = %article.slug, "added article");
        let index = self.articles.len();
        self.articles.push(article);
        Ok(&self.articles[index])
    }

    /// Converts `title` into a slug using the store's clock for the fallback
    /// path. Doesn't check the slug against existing articles.
    pub fn generate_slug(&self, title: &str) -> String {
        generate_slug(title, &*self.clock)
    }

    /// Renders an optional ISO date string with the configured format. `None`
    /// renders today's date.
    pub fn format_date(&self, date: Option<&str>) -> Result<String> {
        Ok(self.config.date_format.format_text(date, &*self.clock)?)
    }

    pub fn stats(&self) -> Stats {
        let mut seen = HashSet::new();
        let tags = self
            .articles
            .iter()
            .flat_map(|a| a.tags.iter())
            .filter(|t| seen.insert(t.as_str()))
            .cloned()
            .collect();

        Stats {
            total: self.articles.len(),
            tags,
            latest_date: self.articles.iter().map(|a| a.date).max(),
        }
    }

    fn unique_slug(&self, base: String) -> String {
        if self.get_by_slug(&base).is_none() {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if self.get_by_slug(&candidate).is_none() {
                tracing::warn!(base = %base, slug = %candidate, "slug taken, added suffix");
                return candidate;
            }
            n += 1;
        }
    }
}

/// Represents the result of a store operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error building or adding to an [`ArticleStore`]. Lookups
/// never fail; they return `None`.
#[derive(Debug)]
pub enum Error {
    /// Returned by [`ArticleStore::add`] when the input has no title.
    MissingTitle,

    /// Returned when a slug is supplied that another article already uses.
    DuplicateSlug(String),

    /// Returned when a supplied slug isn't URL-safe, i.e. it isn't what
    /// [`slugify`] would make of it.
    InvalidSlug(String),

    /// Returned when seed data contains the same id twice.
    DuplicateId(u64),

    /// Returned when seed data contains an id of zero.
    InvalidId(u64),

    /// Returned when a seed article's link isn't `{slug}.html`.
    LinkMismatch { slug: String, link: String },

    /// Returned by [`ArticleStore::format_date`] for unparsable dates.
    Date(DateError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingTitle => write!(f, "article title is required"),
            Error::DuplicateSlug(slug) => {
                write!(f, "slug `{}` is already in use", slug)
            }
            Error::InvalidSlug(slug) => {
                write!(f, "slug `{}` is not URL-safe", slug)
            }
            Error::DuplicateId(id) => write!(f, "duplicate article id {}", id),
            Error::InvalidId(id) => {
                write!(f, "article ids must be positive, got {}", id)
            }
            Error::LinkMismatch { slug, link } => write!(
                f,
                "article `{}` has link `{}`, wanted `{}`",
                slug,
                link,
                link_for(slug)
            ),
            Error::Date(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Date(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DateError> for Error {
    /// Converts a [`DateError`] into an [`Error`]. It allows us to use the
    /// `?` operator for date parsing.
    fn from(err: DateError) -> Error {
        Error::Date(err)
    }
}
