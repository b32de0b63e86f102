//! Defines the [`Article`] record and the [`NewArticle`] input from which the
//! store builds new records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The extension appended to a slug to form an article's link.
pub const LINK_EXTENSION: &str = ".html";

/// A single blog post as the front-end sees it. Articles are only ever built
/// by [`crate::store::ArticleStore`] (either from seed data or via
/// [`crate::store::ArticleStore::add`]) and are never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Unique, positive. Assigned as `max + 1` on insertion.
    pub id: u64,

    pub title: String,

    /// URL-safe token, unique within a store.
    pub slug: String,

    /// Always `{slug}.html`.
    pub link: String,

    #[serde(default)]
    pub summary: String,

    /// The publication date. Serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,

    /// The human-readable rendition of `date`, e.g. `2023年10月15日`.
    pub date_display: String,

    /// Labels in the order they were given.
    #[serde(default)]
    pub tags: Vec<String>,

    pub author: String,
}

impl Article {
    /// Returns whether the article carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Builds the link for a slug.
pub fn link_for(slug: &str) -> String {
    format!("{}{}", slug, LINK_EXTENSION)
}

/// The input to [`crate::store::ArticleStore::add`]. Only `title` is
/// required; every other field falls back to a store-computed default:
///
/// * `slug` -> [`crate::slug::generate_slug`] of the title
/// * `summary` -> empty
/// * `date` -> today, per the store's clock
/// * `date_display` -> the store's date format applied to `date`
/// * `tags` -> empty
/// * `author` -> the configured default author
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub slug: Option<String>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub date: Option<NaiveDate>,

    #[serde(default)]
    pub date_display: Option<String>,

    #[serde(default)]
    pub tags: Option<Vec<String>>,

    #[serde(default)]
    pub author: Option<String>,
}

impl NewArticle {
    pub fn new<S: Into<String>>(title: S) -> NewArticle {
        NewArticle {
            title: title.into(),
            ..NewArticle::default()
        }
    }

    pub fn slug<S: Into<String>>(mut self, slug: S) -> NewArticle {
        self.slug = Some(slug.into());
        self
    }

    pub fn summary<S: Into<String>>(mut self, summary: S) -> NewArticle {
        self.summary = Some(summary.into());
        self
    }

    pub fn date(mut self, date: NaiveDate) -> NewArticle {
        self.date = Some(date);
        self
    }

    pub fn date_display<S: Into<String>>(mut self, display: S) -> NewArticle {
        self.date_display = Some(display.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> NewArticle
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn author<S: Into<String>>(mut self, author: S) -> NewArticle {
        self.author = Some(author.into());
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_link_for() {
        assert_eq!("ice-demo.html", link_for("ice-demo"));
    }

    #[test]
    fn test_deserialize_seed_record() -> serde_json::Result<()> {
        let article: Article = serde_json::from_str(
            r#"{
                "id": 1,
                "title": "博客改造",
                "slug": "article-1758785688708",
                "link": "article-1758785688708.html",
                "summary": "",
                "date": "2025-09-25",
                "dateDisplay": "2025年09月25日",
                "author": "Sept3rd",
                "tags": []
            }"#,
        )?;
        assert_eq!(1, article.id);
        assert_eq!(NaiveDate::from_ymd_opt(2025, 9, 25), Some(article.date));
        assert_eq!("2025年09月25日", article.date_display);
        assert!(article.tags.is_empty());
        Ok(())
    }

    #[test]
    fn test_new_article_builder() {
        let input = NewArticle::new("Ice Demo")
            .tags(vec!["physics", "water"])
            .author("someone");
        assert_eq!("Ice Demo", input.title);
        assert_eq!(
            Some(vec!["physics".to_owned(), "water".to_owned()]),
            input.tags
        );
        assert_eq!(Some("someone".to_owned()), input.author);
        assert_eq!(None, input.slug);
    }
}
