use std::fmt::{self, Display};

use serde::{de, Deserialize, Deserializer, Serialize};
use smartstring::alias::String;

pub mod hizb;
pub mod loading;
pub mod saving;

/// Number of surahs in the corpus.
pub const SURAH_COUNT: u16 = 114;
/// Number of pages in the reference print edition.
pub const PAGE_COUNT: u16 = 604;

/// Identifies a verse by surah and verse number.
///
/// Ordering is canonical recitation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VerseKey {
    pub surah: u16,
    pub verse: u16,
}

impl VerseKey {
    pub const fn new(surah: u16, verse: u16) -> Self {
        Self { surah, verse }
    }
}

impl Display for VerseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.surah, self.verse)
    }
}

/// One verse as stored in the source dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRecord {
    #[serde(rename = "sura_no")]
    pub surah_number: u16,
    #[serde(rename = "sura_name_ar")]
    pub surah_name_arabic: String,
    #[serde(rename = "sura_name_en")]
    pub surah_name_english: String,
    #[serde(rename = "aya_no")]
    pub verse_number: u16,
    #[serde(rename = "aya_text")]
    pub text: String,
    #[serde(deserialize_with = "page_number")]
    pub page: u16,
    #[serde(rename = "jozz")]
    pub juz: u8,
    /// Missing in datasets that predate hizb tagging; see
    /// [`Corpus::assign_hizbs`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hizb: Option<u8>,
    pub line_start: u8,
    pub line_end: u8,
}

impl VerseRecord {
    pub fn key(&self) -> VerseKey {
        VerseKey::new(self.surah_number, self.verse_number)
    }
}

// Some exports store the page as a string.
fn page_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Page {
        Number(u16),
        Text(std::string::String),
    }

    match Page::deserialize(deserializer)? {
        Page::Number(page) => Ok(page),
        Page::Text(text) => text.trim().parse().map_err(de::Error::custom),
    }
}

/// The raw verse collection, in canonical recitation order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Corpus {
    records: Vec<VerseRecord>,
}

impl Corpus {
    pub fn new(records: Vec<VerseRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[VerseRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<VerseRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fills in every missing `hizb` field from the boundary table.
    ///
    /// Records that already carry a hizb are left untouched, even if it
    /// disagrees with the table; index building reports those. Returns the
    /// number of records that were updated.
    pub fn assign_hizbs(&mut self) -> usize {
        let mut assigned = 0;
        for record in self.records.iter_mut().filter(|r| r.hizb.is_none()) {
            record.hizb = hizb::hizb_of(record.key());
            if record.hizb.is_some() {
                assigned += 1;
            }
        }
        assigned
    }
}

impl FromIterator<VerseRecord> for Corpus {
    fn from_iter<T: IntoIterator<Item = VerseRecord>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Verse counts of the test corpus; chosen so the hizb boundary table covers
/// it exactly.
#[cfg(test)]
pub(crate) const EXAMPLE_VERSE_COUNTS: [u16; SURAH_COUNT as usize] = [
    7, 286, 200, 176, 120, 167, 206, 75, 129, 109, 123, 111, 43, 54, 99, 128, 111, 110, 98, 134,
    111, 76, 118, 64, 77, 227, 93, 88, 69, 60, 34, 30, 73, 54, 45, 83, 182, 88, 75, 85, 54, 53,
    89, 59, 36, 35, 38, 29, 18, 45, 60, 49, 62, 55, 78, 96, 28, 22, 24, 13, 14, 11, 11, 18, 12,
    12, 30, 52, 52, 44, 30, 28, 20, 56, 40, 31, 50, 40, 46, 42, 29, 19, 36, 25, 22, 16, 19, 26,
    30, 20, 15, 21, 11, 8, 8, 19, 5, 8, 8, 11, 11, 8, 3, 9, 5, 4, 7, 3, 6, 3, 5, 4, 5, 6,
];

impl Corpus {
    /// Synthetic full corpus.
    ///
    /// Pages and juz are spread evenly over the verses, so pages 1 and 2
    /// hold Al-Fatihah and the opening of Al-Baqarah like the real edition.
    #[cfg(test)]
    pub(crate) fn example() -> Corpus {
        let total: usize = EXAMPLE_VERSE_COUNTS.iter().map(|&c| usize::from(c)).sum();
        let mut records = Vec::with_capacity(total);

        for (surah, &count) in (1u16..).zip(EXAMPLE_VERSE_COUNTS.iter()) {
            let (name_arabic, name_english): (String, String) = match surah {
                1 => ("الفاتحة".into(), "Al-Fatihah".into()),
                2 => ("البقرة".into(), "Al-Baqarah".into()),
                114 => ("الناس".into(), "An-Nas".into()),
                _ => (format!("سورة {surah}").into(), format!("Surah {surah}").into()),
            };

            for verse in 1..=count {
                let position = records.len();
                let key = VerseKey::new(surah, verse);
                records.push(VerseRecord {
                    surah_number: surah,
                    surah_name_arabic: name_arabic.clone(),
                    surah_name_english: name_english.clone(),
                    verse_number: verse,
                    text: format!("text {key}").into(),
                    page: (1 + position * usize::from(PAGE_COUNT) / total) as u16,
                    juz: (1 + position * 30 / total) as u8,
                    hizb: hizb::hizb_of(key),
                    line_start: (position % 15 + 1) as u8,
                    line_end: (position % 15 + 1) as u8,
                });
            }
        }

        Corpus::new(records)
    }
}
