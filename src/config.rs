use std::{
    fmt::{self, Display},
    fs::File,
    io::{self, Read},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{scope::ResolveOptions, session::AnswerPolicy};

/// Engine settings, decided once per application.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How a question answered before enough verses were read is scored.
    pub answer_policy: AnswerPolicy,
    pub resolve: ResolveOptions,
    pub limits: Limits,
}

/// Bounds on test parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_question_count: usize,
    pub max_verses_to_read: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_question_count: 100,
            max_verses_to_read: 20,
        }
    }
}

impl EngineConfig {
    /// Loads settings from a YAML file.
    pub fn load(file: impl AsRef<Path>) -> Result<Self> {
        Self::load_from_reader(File::open(file)?)
    }

    pub fn load_from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_yaml::from_reader(reader)?)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }
}

#[derive(Debug)]
pub enum Error {
    /// Error opening file or reading from reader.
    Io(io::Error),
    /// Settings are not valid YAML or have fields of the wrong type.
    Yaml(serde_yaml::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {e}"),
            Error::Yaml(e) => write!(f, "Invalid settings: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Yaml(e) => Some(e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Yaml(value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
