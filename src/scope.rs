use std::{borrow::Borrow, collections::HashSet};

use serde::{Deserialize, Serialize};
use smallvec::{Array, SmallVec};

use crate::{
    corpus::{VerseKey, VerseRecord},
    error::Result,
    index::{Category, CorpusIndex},
};

/// Inclusive page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub from: u16,
    pub to: u16,
}

impl PageRange {
    pub fn new(from: u16, to: u16) -> Self {
        Self { from, to }
    }
}

/// The part of the corpus a test draws from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScopeDescriptor {
    /// Whole surahs, in selection order.
    Surahs { surah_numbers: SmallVec<[u16; 4]> },
    /// Page ranges, in selection order.
    Pages { ranges: SmallVec<[PageRange; 2]> },
    /// Whole hizbs, in selection order.
    Hizbs { hizb_numbers: SmallVec<[u8; 4]> },
    /// Several scopes concatenated.
    Combined { parts: Vec<ScopeDescriptor> },
}

impl ScopeDescriptor {
    /// Keeps the first occurrence of each surah number.
    pub fn surahs(numbers: impl IntoIterator<Item = u16>) -> Self {
        Self::Surahs {
            surah_numbers: distinct(numbers),
        }
    }

    pub fn pages(ranges: impl IntoIterator<Item = PageRange>) -> Self {
        Self::Pages {
            ranges: ranges.into_iter().collect(),
        }
    }

    /// Keeps the first occurrence of each hizb number.
    pub fn hizbs(numbers: impl IntoIterator<Item = u8>) -> Self {
        Self::Hizbs {
            hizb_numbers: distinct(numbers),
        }
    }

    pub fn combined(parts: impl IntoIterator<Item = ScopeDescriptor>) -> Self {
        Self::Combined {
            parts: parts.into_iter().collect(),
        }
    }
}

fn distinct<A: Array>(numbers: impl IntoIterator<Item = A::Item>) -> SmallVec<A>
where
    A::Item: PartialEq,
{
    let mut list = SmallVec::new();
    for number in numbers {
        if !list.contains(&number) {
            list.push(number);
        }
    }
    list
}

/// A verse as seen by the question generator, borrowed from the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerseEntry<'a> {
    pub surah_number: u16,
    pub surah_name: &'a str,
    pub verse_number: u16,
    pub text: &'a str,
    pub page: u16,
    pub juz: u8,
}

impl<'a> VerseEntry<'a> {
    pub fn key(&self) -> VerseKey {
        VerseKey::new(self.surah_number, self.verse_number)
    }
}

impl<'a> From<&'a VerseRecord> for VerseEntry<'a> {
    fn from(record: &'a VerseRecord) -> Self {
        Self {
            surah_number: record.surah_number,
            surah_name: &record.surah_name_arabic,
            verse_number: record.verse_number,
            text: &record.text,
            page: record.page,
            juz: record.juz,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Whether a verse reached twice (overlapping page ranges, or parts of a
    /// combined scope) is kept only at its first occurrence.
    pub dedupe_overlaps: bool,
}

impl ResolveOptions {
    pub const DEDUPE: Self = Self {
        dedupe_overlaps: true,
    };

    pub const KEEP_DUPLICATES: Self = Self {
        dedupe_overlaps: false,
    };
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self::DEDUPE
    }
}

impl CorpusIndex {
    /// Expands a scope into a flat verse list.
    ///
    /// Verses come in selection order, each selection in corpus order. The
    /// result may be empty; see [`crate::error::Error::EmptyScope`].
    pub fn resolve_scope(
        &self,
        scope: &ScopeDescriptor,
        options: impl Borrow<ResolveOptions>,
    ) -> Result<Vec<VerseEntry<'_>>> {
        let mut verses = Vec::new();
        self.resolve_into(scope, &mut verses)?;

        if options.borrow().dedupe_overlaps {
            let mut seen = HashSet::with_capacity(verses.len());
            verses.retain(|verse: &VerseEntry<'_>| seen.insert(verse.key()));
        }
        Ok(verses)
    }

    fn resolve_into<'a>(
        &'a self,
        scope: &ScopeDescriptor,
        verses: &mut Vec<VerseEntry<'a>>,
    ) -> Result<()> {
        // Descriptors built through serde may repeat numbers; the
        // constructors already drop them.
        match scope {
            ScopeDescriptor::Surahs { surah_numbers } => {
                for (i, &surah) in surah_numbers.iter().enumerate() {
                    if surah_numbers[..i].contains(&surah) {
                        continue;
                    }
                    self.check(Category::Surah(surah))?;
                    verses.extend(self.surah_verses(surah).map(VerseEntry::from));
                }
            }
            ScopeDescriptor::Pages { ranges } => {
                for range in ranges {
                    for page in range.from..=range.to {
                        self.check(Category::Page(page))?;
                        verses.extend(self.page_verses(page).map(VerseEntry::from));
                    }
                }
            }
            ScopeDescriptor::Hizbs { hizb_numbers } => {
                for (i, &hizb) in hizb_numbers.iter().enumerate() {
                    if hizb_numbers[..i].contains(&hizb) {
                        continue;
                    }
                    self.check(Category::Hizb(hizb))?;
                    verses.extend(self.hizb_verses(hizb).map(VerseEntry::from));
                }
            }
            ScopeDescriptor::Combined { parts } => {
                for part in parts {
                    self.resolve_into(part, verses)?;
                }
            }
        }
        Ok(())
    }
}
