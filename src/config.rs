//! Loads the store's configuration from a `postdex.yaml` file. Every field is
//! optional and an empty file means [`Config::default`]; a missing file isn't
//! an error for [`Config::from_directory`] either.

use crate::date::{DateFormat, Error as DateError, DEFAULT_DATE_FORMAT};
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// The name of the configuration file searched for by
/// [`Config::from_directory`].
pub const CONFIG_FILE_NAME: &str = "postdex.yaml";

/// The author assigned to articles added without one.
pub const DEFAULT_AUTHOR: &str = "Sept3rd";

#[derive(Deserialize)]
struct Author(String);
impl Default for Author {
    fn default() -> Self {
        Author(DEFAULT_AUTHOR.to_owned())
    }
}

#[derive(Deserialize)]
struct Pattern(String);
impl Default for Pattern {
    fn default() -> Self {
        Pattern(DEFAULT_DATE_FORMAT.to_owned())
    }
}

/// The on-disk shape of `postdex.yaml`.
#[derive(Deserialize)]
struct Project {
    #[serde(default)]
    author: Author,

    #[serde(default)]
    date_format: Pattern,
}

/// The store's configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// The author given to articles that don't name one.
    pub author: String,

    /// How `date_display` is rendered from `date`.
    pub date_format: DateFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            author: DEFAULT_AUTHOR.to_owned(),
            date_format: DateFormat::default(),
        }
    }
}

impl Config {
    /// Parses a configuration from YAML. Empty (or all-whitespace) input
    /// yields the defaults.
    pub fn from_reader<R: Read>(mut r: R) -> Result<Config> {
        let mut contents = String::new();
        r.read_to_string(&mut contents)?;
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        let project: Project = serde_yaml::from_str(&contents)?;
        Ok(Config {
            author: project.author.0,
            date_format: DateFormat::new(project.date_format.0)?,
        })
    }

    /// Opens and parses the configuration file at `path`.
    pub fn from_file(path: &Path) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        Config::from_reader(file).map_err(|e| {
            Error::Annotated(format!("loading `{}`", path.display()), Box::new(e))
        })
    }

    /// Loads `{dir}/postdex.yaml` if it exists, or the defaults otherwise.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Config::from_file(&path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Config::default())
        }
    }
}

/// Represents the result of loading a [`Config`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`Config`].
#[derive(Debug)]
pub enum Error {
    /// Returned when the config file can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the file isn't valid YAML or has the wrong shape.
    DeserializeYaml(serde_yaml::Error),

    /// Returned for I/O errors while reading the configuration.
    Io(std::io::Error),

    /// Returned when `date_format` isn't a valid strftime pattern.
    DateFormat(DateError),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Open { path, err } => {
                write!(f, "Opening config file `{}`: {}", path.display(), err)
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::DateFormat(err) => err.fmt(f),
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
            Error::Open { path: _, err } => Some(err),
            Error::DeserializeYaml(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::DateFormat(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<DateError> for Error {
    fn from(err: DateError) -> Error {
        Error::DateFormat(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_uses_defaults() -> Result<()> {
        let config = Config::from_reader("{}".as_bytes())?;
        assert_eq!(Config::default(), config);
        Ok(())
    }

    #[test]
    fn test_overrides() -> Result<()> {
        let config = Config::from_reader(
            "author: Someone Else\ndate_format: \"%Y-%m-%d\"\n".as_bytes(),
        )?;
        assert_eq!("Someone Else", config.author);
        assert_eq!("%Y-%m-%d", config.date_format.pattern());
        Ok(())
    }

    #[test]
    fn test_empty_file_uses_defaults() -> Result<()> {
        assert_eq!(Config::default(), Config::from_reader("".as_bytes())?);
        assert_eq!(Config::default(), Config::from_reader("\n  \n".as_bytes())?);
        Ok(())
    }

    #[test]
    fn test_time_in_date_format() {
        match Config::from_reader("date_format: \"%Y %H:%M\"\n".as_bytes()) {
            Err(Error::DateFormat(_)) => {}
            other => panic!("expected DateFormat error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_date_format() {
        match Config::from_reader("date_format: \"%Q\"\n".as_bytes()) {
            Err(Error::DateFormat(_)) => {}
            other => panic!("expected DateFormat error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_directory() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        assert_eq!(Config::default(), Config::from_directory(dir.path())?);

        let mut file = File::create(dir.path().join(CONFIG_FILE_NAME))?;
        writeln!(file, "author: Guest")?;
        let config = Config::from_directory(dir.path())?;
        assert_eq!("Guest", config.author);
        assert_eq!(DateFormat::default(), config.date_format);
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        match Config::from_file(Path::new("/nonexistent/postdex.yaml")) {
            Err(Error::Open { path, .. }) => {
                assert_eq!(PathBuf::from("/nonexistent/postdex.yaml"), path)
            }
            other => panic!("expected Open error, got {:?}", other),
        }
    }
}
