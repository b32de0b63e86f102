//! Title-to-slug conversion. This is deliberately naive: a handful of known
//! Chinese phrases are transliterated via [`TRANSLITERATIONS`] and everything
//! else that isn't ASCII-alphanumeric gets dropped. Titles that leave nothing
//! behind fall back to `article-{unix millis}`.

use crate::date::Clock;
use lazy_static::lazy_static;
use regex::Regex;

/// The prefix of fallback slugs.
pub const FALLBACK_PREFIX: &str = "article-";

/// Phrase -> pinyin substitutions applied after lowercasing. No key is a
/// substring of another and every value is ASCII, so order doesn't matter.
pub const TRANSLITERATIONS: &[(&str, &str)] = &[
    ("矿泉水", "kuangquanshui"),
    ("结冰", "jiebbing"),
    ("晃", "huang"),
    ("一下", "yixia"),
    ("就", "jiu"),
    ("的", "de"),
    ("和", "he"),
    ("与", "yu"),
    ("或", "huo"),
];

lazy_static! {
    // Word characters, whitespace and hyphens are ASCII-only here, so any
    // untransliterated CJK text is removed.
    static ref DISALLOWED: Regex = Regex::new(r"[^A-Za-z0-9_ \t\n\x0B\x0C\r-]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"[ \t\n\x0B\x0C\r]+").unwrap();
    static ref HYPHENS: Regex = Regex::new(r"-{2,}").unwrap();
}

/// Converts `title` into a slug, or returns `None` if nothing survives.
pub fn slugify(title: &str) -> Option<String> {
    let mut slug = title.to_lowercase();
    for &(phrase, pinyin) in TRANSLITERATIONS {
        if slug.contains(phrase) {
            slug = slug.replace(phrase, pinyin);
        }
    }

    let slug = DISALLOWED.replace_all(&slug, "");
    let slug = WHITESPACE.replace_all(&slug, "-");
    let slug = HYPHENS.replace_all(&slug, "-");
    let slug = slug.trim_matches('-');

    if slug.is_empty() {
        None
    } else {
        Some(slug.to_owned())
    }
}

/// Converts `title` into a slug, falling back to `article-{millis}` (per
/// `clock`) when the title yields nothing usable.
pub fn generate_slug(title: &str, clock: &dyn Clock) -> String {
    slugify(title).unwrap_or_else(|| fallback_slug(clock))
}

fn fallback_slug(clock: &dyn Clock) -> String {
    format!("{}{}", FALLBACK_PREFIX, clock.timestamp_millis())
}
