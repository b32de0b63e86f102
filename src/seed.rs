//! Reads seed articles. Seeds come either as a plain JSON array or embedded in
//! the front-end script as `const articles = [ ... ];`, which is how the
//! published site ships them. Nothing here ever writes seeds back out.

use crate::article::Article;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

const SCRIPT_EXTENSION: &str = "js";

lazy_static! {
    static ref ARTICLES_LITERAL: Regex =
        Regex::new(r"(?s)const\s+articles\s*=\s*(\[.*?\])\s*;").unwrap();
}

/// Parses a JSON array of articles.
pub fn parse_json(input: &str) -> Result<Vec<Article>> {
    Ok(serde_json::from_str(input)?)
}

/// Finds the `const articles = [...];` declaration in a script and parses
/// its array as JSON. Comments inside the array aren't supported.
pub fn parse_script(input: &str) -> Result<Vec<Article>> {
    match ARTICLES_LITERAL.captures(input).and_then(|c| c.get(1)) {
        Some(array) => parse_json(array.as_str()),
        None => Err(Error::MissingArticlesArray),
    }
}

/// Reads seed articles from `path`. Files ending in `.js` are treated as
/// scripts (see [`parse_script`]); anything else as JSON.
pub fn load(path: &Path) -> Result<Vec<Article>> {
    let mut contents = String::new();
    File::open(path)
        .and_then(|mut f| f.read_to_string(&mut contents))
        .map_err(|err| Error::Io {
            path: path.to_owned(),
            err,
        })?;

    let is_script = path
        .extension()
        .map_or(false, |ext| ext == SCRIPT_EXTENSION);
    let articles = if is_script {
        parse_script(&contents)
    } else {
        parse_json(&contents)
    }
    .map_err(|e| Error::Annotated(format!("loading seed `{}`", path.display()), Box::new(e)))?;

    tracing::debug!(path = %path.display(), count = articles.len(), "loaded seed");
    Ok(articles)
}

/// Represents the result of loading seed data.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading seed data.
#[derive(Debug)]
pub enum Error {
    /// Returned when the seed file can't be read.
    Io { path: PathBuf, err: std::io::Error },

    /// Returned when the seed array isn't valid article JSON.
    DeserializeJson(serde_json::Error),

    /// Returned when a script has no `const articles = [...];` declaration.
    MissingArticlesArray,

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io { path, err } => {
                write!(f, "Reading seed file `{}`: {}", path.display(), err)
            }
            Error::DeserializeJson(err) => err.fmt(f),
            Error::MissingArticlesArray => {
                write!(f, "no `const articles = [...];` declaration found")
            }
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { path: _, err } => Some(err),
            Error::DeserializeJson(err) => Some(err),
            Error::MissingArticlesArray => None,
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for Error {
    /// Converts a [`serde_json::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_json`] deserialization functions.
    fn from(err: serde_json::Error) -> Error {
        Error::DeserializeJson(err)
    }
}
