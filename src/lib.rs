//! The library code for `postdex`, the article store behind a small static
//! blog. Everything revolves around [`store::ArticleStore`], an owned,
//! append-only, in-memory collection of [`article::Article`]s that a rendering
//! layer reads from:
//!
//! 1. Build a store, either empty or from seed data ([`seed`]).
//! 2. Optionally add articles, by hand ([`article::NewArticle`]) or from a
//!    Markdown post ([`markdown`]).
//! 3. Read it back: all articles newest first, lookups by id or slug, and
//!    aggregate [`store::Stats`].
//!
//! Slugs come from [`slug`] and display dates from [`date`]; both can be
//! tuned through [`config::Config`].
//!
//! ```
//! use chrono::NaiveDate;
//! use postdex::article::NewArticle;
//! use postdex::store::ArticleStore;
//!
//! let mut store = ArticleStore::new();
//! let date = NaiveDate::from_ymd_opt(2023, 10, 15).unwrap();
//! let article = store.add(NewArticle::new("Ice Demo").date(date)).unwrap();
//! assert_eq!("ice-demo.html", article.link);
//! assert_eq!("2023年10月15日", article.date_display);
//! ```

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod article;
pub mod config;
pub mod date;
pub mod markdown;
pub mod seed;
pub mod slug;
pub mod store;
