//!
//! # Markup Files
//!
//! Technologies, libraries and rendering preferences are all stored as markup,
//! in whichever of the [SerializationFormat]s their file extension names.
//!

// Std-Lib
use std::path::Path;

// Crates.io
use serde::de::DeserializeOwned;
use serde::Serialize;
use textwrap::dedent;

/// # Markup Formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationFormat {
    Json,
    Yaml,
    Toml,
}
impl SerializationFormat {
    /// Get the format named `name`, one of ("json", "yaml", "yml", "toml"), ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
    /// Infer the format from the extension of path `fname`
    pub fn from_path(fname: impl AsRef<Path>) -> Result<Self, Error> {
        let fname = fname.as_ref();
        fname
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_name)
            .ok_or_else(|| Error::msg(format!("Cannot infer markup format of {:?}", fname)))
    }
    /// Render `data` as markup text
    pub fn to_string(&self, data: &impl Serialize) -> Result<String, Error> {
        let text = match self {
            Self::Json => serde_json::to_string_pretty(data)?,
            Self::Yaml => serde_yaml::to_string(data)?,
            Self::Toml => toml::to_string(data)?,
        };
        Ok(text)
    }
    /// Parse markup text `s`. Indentation common to every line is stripped first,
    /// so that markup can be written inline in indented source.
    pub fn from_str<T: DeserializeOwned>(&self, s: &str) -> Result<T, Error> {
        let s = dedent(s);
        let data = match self {
            Self::Json => serde_json::from_str(&s)?,
            Self::Yaml => serde_yaml::from_str(&s)?,
            Self::Toml => toml::from_str(&s)?,
        };
        Ok(data)
    }
    /// Write `data` to file `fname`
    pub fn save(&self, data: &impl Serialize, fname: impl AsRef<Path>) -> Result<(), Error> {
        std::fs::write(fname, self.to_string(data)?)?;
        Ok(())
    }
    /// Read file `fname`
    pub fn open<T: DeserializeOwned>(&self, fname: impl AsRef<Path>) -> Result<T, Error> {
        let text = std::fs::read_to_string(fname)?;
        self.from_str(&text)
    }
}

/// # Markup File Trait
///
/// Default-implemented for any [serde] round-trippable type.
/// The markup format always follows the file extension.
pub trait SerdeFile: Serialize + DeserializeOwned {
    fn save_as(&self, fname: impl AsRef<Path>) -> Result<(), Error> {
        SerializationFormat::from_path(&fname)?.save(self, fname)
    }
    fn load(fname: impl AsRef<Path>) -> Result<Self, Error> {
        SerializationFormat::from_path(&fname)?.open(fname)
    }
}

/// Markup or file-system failure
#[derive(Debug)]
pub struct Error(Box<dyn std::error::Error + Send + Sync>);
impl Error {
    pub fn msg(s: impl Into<String>) -> Self {
        Self(s.into().into())
    }
}
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
impl std::error::Error for Error {}

/// Wrap each of the listed error types
macro_rules! wraps {
    ($($t:ty),*) => {
        $(impl From<$t> for Error {
            fn from(e: $t) -> Self {
                Self(Box::new(e))
            }
        })*
    };
}
wraps!(
    serde_json::Error,
    serde_yaml::Error,
    toml::ser::Error,
    toml::de::Error,
    std::io::Error
);
