//! Turns a Markdown post into a [`NewArticle`] ready for
//! [`crate::store::ArticleStore::add`]. Only metadata is extracted; rendering
//! the body is somebody else's job.
//!
//! A post may open with YAML front matter between `---` fences:
//!
//! ```md
//! ---
//! title: 矿泉水晃一下就结冰
//! date: 2023-10-15
//! tags: science, water
//! ---
//! > 解释了矿泉水晃动后结冰的科学原理。
//!
//! Body text...
//! ```
//!
//! Fields missing from the front matter are recovered from the body where
//! possible (see [`parse_article`]).

use crate::article::NewArticle;
use crate::date::parse_iso_date;
use pulldown_cmark::{Event, Parser, Tag};
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Used when a post has no usable summary anywhere.
pub const DEFAULT_SUMMARY: &str = "暂无摘要";

/// Paragraph summaries longer than this many characters are cut short and
/// suffixed with `...`.
pub const SUMMARY_MAX_CHARS: usize = 100;

#[derive(Deserialize, Default)]
struct Frontmatter {
    #[serde(default)]
    title: Option<String>,

    #[serde(default)]
    summary: Option<String>,

    #[serde(default)]
    description: Option<String>,

    #[serde(default)]
    date: Option<String>,

    #[serde(default)]
    tags: Option<Tags>,

    #[serde(default)]
    author: Option<String>,
}

impl Frontmatter {
    /// Parses front matter as YAML. Hand-written front matter often isn't
    /// valid YAML (`title: Rust: A Story`), so when that fails each line is
    /// read as `key: value`, split at the first colon, with one pair of
    /// surrounding quotes dropped.
    fn parse(yaml: &str, file_name: &str) -> Frontmatter {
        match serde_yaml::from_str(yaml) {
            Ok(frontmatter) => frontmatter,
            Err(e) => {
                tracing::debug!(file_name, error = %e, "front matter isn't YAML, reading it line by line");
                Frontmatter::from_lines(yaml)
            }
        }
    }

    fn from_lines(text: &str) -> Frontmatter {
        let mut frontmatter = Frontmatter::default();
        for line in text.lines() {
            let (key, value) = match line.find(':') {
                Some(i) => (line[..i].trim(), unquote(line[i + 1..].trim())),
                None => continue,
            };
            let value = Some(value.to_owned());
            match key {
                "title" => frontmatter.title = value,
                "summary" => frontmatter.summary = value,
                "description" => frontmatter.description = value,
                "date" => frontmatter.date = value,
                "tags" => frontmatter.tags = value.map(Tags::Text),
                "author" => frontmatter.author = value,
                _ => {}
            }
        }
        frontmatter
    }
}

fn unquote(value: &str) -> &str {
    let is_quote = |c: char| c == '"' || c == '\'';
    let value = value.strip_prefix(is_quote).unwrap_or(value);
    value.strip_suffix(is_quote).unwrap_or(value)
}

/// Tags may be written as a YAML sequence or as one `,`/`;`-separated string
/// (optionally wrapped in brackets).
#[derive(Deserialize)]
#[serde(untagged)]
enum Tags {
    List(Vec<String>),
    Text(String),
}

impl Tags {
    fn into_vec(self) -> Vec<String> {
        let tags: Vec<String> = match self {
            Tags::List(tags) => tags,
            Tags::Text(text) => text
                .replace(|c: char| c == '[' || c == ']', "")
                .split(|c: char| c == ',' || c == ';')
                .map(str::to_owned)
                .collect(),
        };
        tags.into_iter()
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Reads and parses the post at `path`. The file name feeds the title
/// fallback.
pub fn parse_file(path: &Path) -> Result<NewArticle> {
    use std::io::Read;
    let mut contents = String::new();
    File::open(path)
        .and_then(|mut f| f.read_to_string(&mut contents))
        .map_err(|err| Error::Io {
            path: path.to_owned(),
            err,
        })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_article(&contents, &file_name).map_err(|e| {
        Error::Annotated(format!("parsing post `{}`", path.display()), Box::new(e))
    })
}

/// Extracts a [`NewArticle`] from a Markdown post.
///
/// * title: front matter `title`, else the first level-1 heading, else
///   `file_name` without its extension and with `-`/`_` turned into spaces
/// * summary: front matter `summary`, else `description`, else the first line
///   of the first block quote, else the first paragraph (truncated to
///   [`SUMMARY_MAX_CHARS`]), else [`DEFAULT_SUMMARY`]
/// * date: front matter `date` as `YYYY-MM-DD`; an unparsable date is logged
///   and dropped so the store falls back to today
/// * tags, author: front matter only
///
/// The slug is never taken from the post; the store derives it from the
/// title.
pub fn parse_article(input: &str, file_name: &str) -> Result<NewArticle> {
    let (yaml, body) = split_frontmatter(input)?;
    let frontmatter = match yaml {
        Some(yaml) if !yaml.trim().is_empty() => Frontmatter::parse(yaml, file_name),
        _ => Frontmatter::default(),
    };
    let Outline {
        heading,
        quote,
        paragraph,
    } = Outline::of(body);

    let title = frontmatter
        .title
        .filter(|t| !t.trim().is_empty())
        .or(heading)
        .unwrap_or_else(|| title_from_file_name(file_name));

    let summary = frontmatter
        .summary
        .or(frontmatter.description)
        .or(quote)
        .or_else(|| paragraph.map(|p| truncate(&p)))
        .unwrap_or_else(|| DEFAULT_SUMMARY.to_owned());

    let date = frontmatter.date.and_then(|text| match parse_iso_date(&text) {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::warn!(file_name, error = %e, "ignoring front matter date");
            None
        }
    });

    Ok(NewArticle {
        title,
        summary: Some(summary),
        date,
        tags: Some(frontmatter.tags.map(Tags::into_vec).unwrap_or_default()),
        author: frontmatter.author,
        ..NewArticle::default()
    })
}

/// Splits `input` into its YAML front matter (if any) and the body. Front
/// matter must start on the first line with a lone `---` and end with
/// another lone `---` line.
fn split_frontmatter(input: &str) -> Result<(Option<&str>, &str)> {
    const FENCE: &str = "---";
    let rest = match input.strip_prefix(FENCE) {
        Some(rest) => rest,
        None => return Ok((None, input)),
    };
    let line_end = match rest.find('\n') {
        Some(i) => i,
        None => return Ok((None, input)),
    };
    if !rest[..line_end].trim().is_empty() {
        // e.g. `----` or `--- foo`; not a fence
        return Ok((None, input));
    }

    let yaml_start = FENCE.len() + line_end + 1;
    let mut offset = yaml_start;
    for line in input[yaml_start..].split_inclusive('\n') {
        if line.trim_end() == FENCE {
            return Ok((
                Some(&input[yaml_start..offset]),
                &input[offset + line.len()..],
            ));
        }
        offset += line.len();
    }
    Err(Error::FrontmatterMissingEndFence)
}

fn title_from_file_name(file_name: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(i) if i > 0 => &file_name[..i],
        _ => file_name,
    };
    stem.replace(|c: char| c == '-' || c == '_', " ")
}

fn truncate(paragraph: &str) -> String {
    match paragraph.char_indices().nth(SUMMARY_MAX_CHARS) {
        Some((i, _)) => format!("{}...", &paragraph[..i]),
        None => paragraph.to_owned(),
    }
}

/// The bits of a post body the metadata can be recovered from, as plain
/// text.
#[derive(Debug, Default, PartialEq)]
struct Outline {
    /// The first level-1 heading outside of block quotes.
    heading: Option<String>,

    /// The first line of the first block quote.
    quote: Option<String>,

    /// The first paragraph outside of block quotes.
    paragraph: Option<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum Capture {
    Nothing,
    Heading,
    Quote,
    Paragraph,
}

impl Outline {
    fn of(body: &str) -> Outline {
        let mut outline = Outline::default();
        let mut capture = Capture::Nothing;
        let mut quote_depth = 0usize;
        let mut buf = String::new();

        for ev in Parser::new(body) {
            match ev {
                Event::Start(Tag::BlockQuote) => quote_depth += 1,
                Event::End(Tag::BlockQuote) => {
                    quote_depth = quote_depth.saturating_sub(1);
                    outline.finish(&mut capture, &mut buf);
                }
                Event::Start(Tag::Heading(1))
                    if quote_depth == 0 && outline.heading.is_none() =>
                {
                    capture = Capture::Heading;
                }
                Event::Start(Tag::Paragraph) if capture == Capture::Nothing => {
                    if quote_depth > 0 && outline.quote.is_none() {
                        capture = Capture::Quote;
                    } else if quote_depth == 0 && outline.paragraph.is_none() {
                        capture = Capture::Paragraph;
                    }
                }
                Event::End(Tag::Heading(_)) | Event::End(Tag::Paragraph) => {
                    outline.finish(&mut capture, &mut buf);
                }
                Event::Text(text) | Event::Code(text) if capture != Capture::Nothing => {
                    buf.push_str(&text);
                }
                Event::SoftBreak | Event::HardBreak => match capture {
                    Capture::Quote => outline.finish(&mut capture, &mut buf),
                    Capture::Nothing => {}
                    _ => buf.push(' '),
                },
                _ => {}
            }
        }
        outline
    }

    fn finish(&mut self, capture: &mut Capture, buf: &mut String) {
        let text = buf.trim().to_owned();
        buf.clear();
        let slot = match *capture {
            Capture::Nothing => return,
            Capture::Heading => &mut self.heading,
            Capture::Quote => &mut self.quote,
            Capture::Paragraph => &mut self.paragraph,
        };
        *capture = Capture::Nothing;
        if !text.is_empty() && slot.is_none() {
            *slot = Some(text);
        }
    }
}

/// Represents the result of parsing a post.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a post.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post opens a front matter fence (`---`) but never
    /// closes it.
    FrontmatterMissingEndFence,

    /// Returned when the post file can't be read.
    Io { path: PathBuf, err: std::io::Error },

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::Io { path, err } => {
                write!(f, "Reading post `{}`: {}", path.display(), err)
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
            Error::FrontmatterMissingEndFence => None,
            Error::Io { path: _, err } => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_frontmatter_fields() -> Result<()> {
        let input = "---\n\
                     title: 矿泉水晃一下就结冰\n\
                     date: 2023-10-15\n\
                     summary: 过冷现象\n\
                     tags: [science, water]\n\
                     author: Guest\n\
                     ---\n\
                     # Ignored heading\n\nBody.\n";
        let article = parse_article(input, "page1.md")?;
        assert_eq!("矿泉水晃一下就结冰", article.title);
        assert_eq!(Some("过冷现象".to_owned()), article.summary);
        assert_eq!(NaiveDate::from_ymd_opt(2023, 10, 15), article.date);
        assert_eq!(
            Some(vec!["science".to_owned(), "water".to_owned()]),
            article.tags
        );
        assert_eq!(Some("Guest".to_owned()), article.author);
        assert_eq!(None, article.slug);
        Ok(())
    }

    #[test]
    fn test_colon_inside_value() -> Result<()> {
        let input = "---\n\
                     title: Rust: A Story\n\
                     date: 2023-10-15\n\
                     summary: \"Part 1: setup\"\n\
                     tags: rust; story\n\
                     ---\n\
                     Body.\n";
        let article = parse_article(input, "x.md")?;
        assert_eq!("Rust: A Story", article.title);
        assert_eq!(NaiveDate::from_ymd_opt(2023, 10, 15), article.date);
        assert_eq!(Some("Part 1: setup".to_owned()), article.summary);
        assert_eq!(
            Some(vec!["rust".to_owned(), "story".to_owned()]),
            article.tags
        );
        Ok(())
    }

    #[test]
    fn test_line_fallback_strips_quotes() {
        let frontmatter = Frontmatter::from_lines("title: 'a: b'\nauthor: \"Guest\"\nnot a field\n");
        assert_eq!(Some("a: b".to_owned()), frontmatter.title);
        assert_eq!(Some("Guest".to_owned()), frontmatter.author);
        assert_eq!(None, frontmatter.summary);
    }

    #[test]
    fn test_tags_as_text() -> Result<()> {
        let article = parse_article("---\ntags: \"a, b; ;c\"\n---\nbody\n", "x.md")?;
        assert_eq!(
            Some(vec!["a".to_owned(), "b".to_owned(), "c".to_owned()]),
            article.tags
        );
        Ok(())
    }

    #[test]
    fn test_description_as_summary() -> Result<()> {
        let article = parse_article("---\ndescription: short\n---\n> quote\n", "x.md")?;
        assert_eq!(Some("short".to_owned()), article.summary);
        Ok(())
    }

    #[test]
    fn test_title_and_summary_from_body() -> Result<()> {
        let input = "Intro paragraph.\n\n# Ice *Demo*\n\n> first line\n> second line\n";
        let article = parse_article(input, "x.md")?;
        assert_eq!("Ice Demo", article.title);
        assert_eq!(Some("first line".to_owned()), article.summary);
        Ok(())
    }

    #[test]
    fn test_summary_from_first_paragraph() -> Result<()> {
        let input = "# Title\n\nSome **bold** text\nwith `code`.\n\nSecond.\n";
        let article = parse_article(input, "x.md")?;
        assert_eq!(Some("Some bold text with code.".to_owned()), article.summary);
        Ok(())
    }

    #[test]
    fn test_long_paragraph_is_truncated() -> Result<()> {
        let input = "字".repeat(150);
        let article = parse_article(&input, "x.md")?;
        let summary = article.summary.unwrap_or_default();
        assert_eq!(SUMMARY_MAX_CHARS + 3, summary.chars().count());
        assert!(summary.ends_with("..."));
        Ok(())
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let article = parse_article("", "my-first_post.md")?;
        assert_eq!("my first post", article.title);
        assert_eq!(Some(DEFAULT_SUMMARY.to_owned()), article.summary);
        assert_eq!(None, article.date);
        assert_eq!(Some(Vec::new()), article.tags);
        assert_eq!(None, article.author);
        Ok(())
    }

    #[test]
    fn test_bad_date_is_dropped() -> Result<()> {
        let article = parse_article("---\ndate: yesterday\n---\n", "x.md")?;
        assert_eq!(None, article.date);
        Ok(())
    }

    #[test]
    fn test_empty_frontmatter() -> Result<()> {
        let article = parse_article("---\n---\n# Hello\n", "x.md")?;
        assert_eq!("Hello", article.title);
        Ok(())
    }

    #[test]
    fn test_unclosed_frontmatter() {
        assert!(matches!(
            parse_article("---\ntitle: x\n", "x.md"),
            Err(Error::FrontmatterMissingEndFence)
        ));
    }

    #[test]
    fn test_thematic_break_is_not_frontmatter() -> Result<()> {
        let article = parse_article("----\n\nHello\n", "x.md")?;
        assert_eq!(Some("Hello".to_owned()), article.summary);
        Ok(())
    }

    #[test]
    fn test_parse_file() -> std::result::Result<(), Box<dyn std::error::Error>> {
        use std::io::Write;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("ice-demo.md");
        File::create(&path)?.write_all("---\ndate: 2023-10-15\n---\nBody.\n".as_bytes())?;

        let article = parse_file(&path)?;
        assert_eq!("ice demo", article.title);
        assert_eq!(Some("Body.".to_owned()), article.summary);

        assert!(matches!(
            parse_file(&dir.path().join("missing.md")),
            Err(Error::Io { .. })
        ));
        Ok(())
    }
}
