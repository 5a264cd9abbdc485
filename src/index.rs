//! Lookup structures derived once from the corpus.
//!
//! [`CorpusIndex::build`] makes a single ordered pass over the records and
//! groups them by surah, by page and by hizb. Hizb membership always comes
//! from the boundary table in [`crate::corpus::hizb`]; the `hizb` field of a
//! record is only checked against it.
//!
//! Malformed records do not fail the build. They are reported as
//! [`IntegrityDefect`]s and every category they would have been indexed under
//! is marked tainted, so scopes touching those categories are refused instead
//! of silently returning partial data.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{self, Display},
};

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use smartstring::alias::String;

use crate::{
    corpus::{hizb, Corpus, VerseKey, VerseRecord, PAGE_COUNT},
    error::{Error, Result},
};

/// Surahs revealed in Medina; all others are Meccan.
pub const MEDINAN_SURAHS: [u16; 25] = [
    2, 3, 4, 5, 8, 9, 22, 24, 33, 47, 48, 49, 57, 58, 59, 60, 61, 62, 63, 64, 65, 66, 76, 98, 110,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevelationType {
    Meccan,
    Medinan,
}

impl RevelationType {
    pub fn of_surah(surah: u16) -> Self {
        if MEDINAN_SURAHS.contains(&surah) {
            Self::Medinan
        } else {
            Self::Meccan
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurahMeta {
    pub number: u16,
    pub name_arabic: String,
    pub name_english: String,
    pub verse_count: usize,
    pub first_page: u16,
    pub first_juz: u8,
    pub revelation_type: RevelationType,
}

/// A lookup category a record is indexed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Surah(u16),
    Page(u16),
    Hizb(u8),
    /// Some page listing is incomplete, but which one is unknown.
    AllPages,
    /// Some hizb listing is incomplete, but which one is unknown.
    AllHizbs,
}

impl Category {
    fn covers(self, other: Category) -> bool {
        match (self, other) {
            (Category::AllPages, Category::Page(_)) => true,
            (Category::AllHizbs, Category::Hizb(_)) => true,
            _ => self == other,
        }
    }
}

/// A record that could not be indexed as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityDefect {
    /// The record has no hizb and the boundary table does not cover it.
    MissingHizb { key: VerseKey },
    /// The recorded hizb disagrees with the boundary table.
    HizbMismatch {
        key: VerseKey,
        recorded: u8,
        expected: Option<u8>,
    },
    /// The record does not come strictly after the previous one in
    /// recitation order. Duplicates are reported this way too.
    OutOfOrder {
        key: VerseKey,
        previous: VerseKey,
        page: u16,
    },
    PageOutOfRange { key: VerseKey, page: u16 },
}

impl IntegrityDefect {
    pub fn key(&self) -> VerseKey {
        match *self {
            IntegrityDefect::MissingHizb { key }
            | IntegrityDefect::HizbMismatch { key, .. }
            | IntegrityDefect::OutOfOrder { key, .. }
            | IntegrityDefect::PageOutOfRange { key, .. } => key,
        }
    }

    /// Categories whose listings can no longer be trusted.
    pub fn categories(&self) -> SmallVec<[Category; 3]> {
        match *self {
            IntegrityDefect::MissingHizb { .. } => smallvec![Category::AllHizbs],
            IntegrityDefect::HizbMismatch {
                recorded, expected, ..
            } => match expected {
                Some(expected) => smallvec![Category::Hizb(recorded), Category::Hizb(expected)],
                None => smallvec![Category::Hizb(recorded), Category::AllHizbs],
            },
            IntegrityDefect::OutOfOrder { key, page, .. } => {
                let mut categories: SmallVec<[Category; 3]> =
                    smallvec![Category::Surah(key.surah), Category::Page(page)];
                categories.push(hizb::hizb_of(key).map_or(Category::AllHizbs, Category::Hizb));
                categories
            }
            IntegrityDefect::PageOutOfRange { key, .. } => {
                smallvec![Category::Surah(key.surah), Category::AllPages]
            }
        }
    }
}

impl Display for IntegrityDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityDefect::MissingHizb { key } => {
                write!(f, "verse {key} has no hizb and is outside every hizb range")
            }
            IntegrityDefect::HizbMismatch {
                key,
                recorded,
                expected: Some(expected),
                ..
            } => write!(
                f,
                "verse {key} is tagged hizb {recorded} but belongs to hizb {expected}"
            ),
            IntegrityDefect::HizbMismatch {
                key,
                recorded,
                expected: None,
                ..
            } => write!(
                f,
                "verse {key} is tagged hizb {recorded} but is outside every hizb range"
            ),
            IntegrityDefect::OutOfOrder { key, previous, .. } => {
                write!(f, "verse {key} follows {previous} out of order")
            }
            IntegrityDefect::PageOutOfRange { key, page } => {
                write!(f, "verse {key} is on page {page}, outside 1-{PAGE_COUNT}")
            }
        }
    }
}

/// The corpus together with its by-surah, by-page and by-hizb indexes.
///
/// Built once at startup and read-only afterwards. Index entries are
/// positions into the record list, kept in corpus order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusIndex {
    records: Vec<VerseRecord>,
    surahs: Vec<SurahMeta>,
    by_surah: BTreeMap<u16, Vec<usize>>,
    by_page: BTreeMap<u16, Vec<usize>>,
    by_hizb: BTreeMap<u8, Vec<usize>>,
    defects: Vec<IntegrityDefect>,
    tainted: BTreeSet<Category>,
}

impl CorpusIndex {
    pub fn build(corpus: Corpus) -> Self {
        let records = corpus.into_records();
        let mut index = Self {
            records: Vec::new(),
            surahs: Vec::new(),
            by_surah: BTreeMap::new(),
            by_page: BTreeMap::new(),
            by_hizb: BTreeMap::new(),
            defects: Vec::new(),
            tainted: BTreeSet::new(),
        };

        let mut previous: Option<VerseKey> = None;
        for record in records {
            let key = record.key();
            if let Some(previous) = previous.filter(|&previous| key <= previous) {
                index.report(IntegrityDefect::OutOfOrder {
                    key,
                    previous,
                    page: record.page,
                });
                continue;
            }
            previous = Some(key);
            index.insert(record);
        }

        log::debug!(
            "indexed {} verses: {} surahs, {} pages, {} hizbs, {} defects",
            index.records.len(),
            index.surahs.len(),
            index.by_page.len(),
            index.by_hizb.len(),
            index.defects.len()
        );
        index
    }

    fn insert(&mut self, record: VerseRecord) {
        let key = record.key();
        let position = self.records.len();

        match self.surahs.last_mut() {
            Some(meta) if meta.number == record.surah_number => meta.verse_count += 1,
            _ => self.surahs.push(SurahMeta {
                number: record.surah_number,
                name_arabic: record.surah_name_arabic.clone(),
                name_english: record.surah_name_english.clone(),
                verse_count: 1,
                first_page: record.page,
                first_juz: record.juz,
                revelation_type: RevelationType::of_surah(record.surah_number),
            }),
        }
        self.by_surah.entry(key.surah).or_default().push(position);

        if (1..=PAGE_COUNT).contains(&record.page) {
            self.by_page.entry(record.page).or_default().push(position);
        } else {
            self.report(IntegrityDefect::PageOutOfRange {
                key,
                page: record.page,
            });
        }

        let expected = hizb::hizb_of(key);
        match (record.hizb, expected) {
            (None, None) => self.report(IntegrityDefect::MissingHizb { key }),
            (Some(recorded), expected) if Some(recorded) != expected => {
                self.report(IntegrityDefect::HizbMismatch {
                    key,
                    recorded,
                    expected,
                })
            }
            _ => {}
        }
        if let Some(hizb) = expected {
            self.by_hizb.entry(hizb).or_default().push(position);
        }

        self.records.push(record);
    }

    fn report(&mut self, defect: IntegrityDefect) {
        log::warn!("corpus integrity defect: {defect}");
        self.tainted.extend(defect.categories());
        self.defects.push(defect);
    }

    /// Every record that made it into the index, in corpus order.
    pub fn records(&self) -> &[VerseRecord] {
        &self.records
    }

    pub fn surahs(&self) -> &[SurahMeta] {
        &self.surahs
    }

    pub fn surah(&self, number: u16) -> Option<&SurahMeta> {
        self.surahs
            .binary_search_by_key(&number, |meta| meta.number)
            .ok()
            .map(|position| &self.surahs[position])
    }

    /// Case-insensitive lookup by English name, e.g. `"al-baqarah"`.
    pub fn surah_by_english_name(&self, name: &str) -> Option<&SurahMeta> {
        let name = name.trim();
        self.surahs
            .iter()
            .find(|meta| unicase::eq(meta.name_english.as_str(), name))
    }

    pub fn surah_verses(&self, surah: u16) -> impl Iterator<Item = &VerseRecord> + '_ {
        self.lookup(self.by_surah.get(&surah))
    }

    pub fn page_verses(&self, page: u16) -> impl Iterator<Item = &VerseRecord> + '_ {
        self.lookup(self.by_page.get(&page))
    }

    pub fn hizb_verses(&self, hizb: u8) -> impl Iterator<Item = &VerseRecord> + '_ {
        self.lookup(self.by_hizb.get(&hizb))
    }

    fn lookup<'a>(
        &'a self,
        positions: Option<&'a Vec<usize>>,
    ) -> impl Iterator<Item = &'a VerseRecord> + 'a {
        positions
            .into_iter()
            .flatten()
            .map(move |&position| &self.records[position])
    }

    pub fn verse(&self, key: VerseKey) -> Option<&VerseRecord> {
        self.verse_after(key, 0)
    }

    pub fn verse_text(&self, key: VerseKey) -> Option<&str> {
        self.verse(key).map(|record| record.text.as_str())
    }

    /// The verse `steps` places after `key` within the same surah.
    pub fn verse_after(&self, key: VerseKey, steps: usize) -> Option<&VerseRecord> {
        let positions = self.by_surah.get(&key.surah)?;
        let offset = positions
            .binary_search_by_key(&key.verse, |&position| {
                self.records[position].verse_number
            })
            .ok()?;
        let position = *positions.get(offset.checked_add(steps)?)?;
        Some(&self.records[position])
    }

    /// Distinct surah numbers present on pages `from..=to`, ascending.
    pub fn surahs_in_page_range(&self, from: u16, to: u16) -> Vec<u16> {
        if from > to {
            return Vec::new();
        }
        let surahs: BTreeSet<u16> = self
            .by_page
            .range(from..=to)
            .flat_map(|(_, positions)| positions)
            .map(|&position| self.records[position].surah_number)
            .collect();
        surahs.into_iter().collect()
    }

    pub fn defects(&self) -> &[IntegrityDefect] {
        &self.defects
    }

    /// Fails with the first defect found at build time, if any.
    pub fn validate(&self) -> Result<()> {
        match self.defects.first() {
            Some(defect) => Err(Error::CorpusIntegrity(defect.clone())),
            None => Ok(()),
        }
    }

    /// Fails if a defect taints the given category.
    pub fn check(&self, category: Category) -> Result<()> {
        if !self.tainted.iter().any(|tainted| tainted.covers(category)) {
            return Ok(());
        }
        let defect = self
            .defects
            .iter()
            .find(|defect| defect.categories().iter().any(|c| c.covers(category)));
        match defect {
            Some(defect) => Err(Error::CorpusIntegrity(defect.clone())),
            None => Ok(()),
        }
    }
}
