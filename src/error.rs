use std::fmt::{self, Display};

use crate::index::IntegrityDefect;

/// Reasons a test cannot be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The scope resolved to no verses at all.
    EmptyScope,
    /// No verse in the scope has enough following verses in its surah.
    InsufficientVerses { verses_to_read: usize },
    /// The scope touches corpus data that failed validation at index build
    /// time.
    CorpusIntegrity(IntegrityDefect),
    /// The question spec is outside the accepted limits.
    InvalidSpec(SpecViolation),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyScope => write!(f, "The selected scope contains no verses"),
            Error::InsufficientVerses { verses_to_read } => write!(
                f,
                "No verse in the selected scope is followed by {verses_to_read} verses of \
                 the same surah; read fewer verses or widen the scope"
            ),
            Error::CorpusIntegrity(defect) => write!(f, "Corpus integrity defect: {defect}"),
            Error::InvalidSpec(violation) => write!(f, "Invalid test parameters: {violation}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<IntegrityDefect> for Error {
    fn from(value: IntegrityDefect) -> Self {
        Self::CorpusIntegrity(value)
    }
}

impl From<SpecViolation> for Error {
    fn from(value: SpecViolation) -> Self {
        Self::InvalidSpec(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecViolation {
    /// No surah, page range or hizb was selected.
    EmptySelection,
    QuestionCount { requested: usize, max: usize },
    VersesToRead { requested: usize, max: usize },
    SurahOutOfRange(u16),
    HizbOutOfRange(u8),
    PageRange { from: u16, to: u16 },
}

impl Display for SpecViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecViolation::EmptySelection => write!(f, "nothing selected"),
            SpecViolation::QuestionCount { requested, max } => {
                write!(f, "question count {requested} must be between 1 and {max}")
            }
            SpecViolation::VersesToRead { requested, max } => {
                write!(f, "verses to read {requested} must be between 1 and {max}")
            }
            SpecViolation::SurahOutOfRange(surah) => write!(f, "no surah number {surah}"),
            SpecViolation::HizbOutOfRange(hizb) => write!(f, "no hizb number {hizb}"),
            SpecViolation::PageRange { from, to } => {
                write!(f, "page range {from}-{to} must satisfy 1 <= from <= to <= 604")
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
