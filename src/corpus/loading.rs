use std::{
    fmt::{self, Display},
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

use super::{Corpus, VerseRecord};

impl Corpus {
    /// Loads a corpus from a JSON file.
    pub fn load(file: impl AsRef<Path>) -> Result<Self> {
        Self::load_from_reader(File::open(file)?)
    }

    /// Constructs a corpus by reading a JSON array of verse records from the
    /// given reader.
    pub fn load_from_reader<R: Read>(reader: R) -> Result<Self> {
        let records: Vec<VerseRecord> = serde_json::from_reader(BufReader::new(reader))?;
        log::debug!("loaded {} verse records", records.len());
        Ok(Self::new(records))
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(s)?))
    }
}

#[derive(Debug)]
pub enum Error {
    /// Error opening file or reading from reader.
    Io(io::Error),
    /// Input is not a valid array of verse records.
    Json(serde_json::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {e}"),
            Error::Json(e) => write!(f, "Invalid corpus data: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Json(e) => Some(e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
