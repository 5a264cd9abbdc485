//! The hizb boundary table.
//!
//! Each of the 60 hizbs spans a contiguous run of verses. The ranges cover
//! the whole corpus in order, without gaps or overlaps, and are the single
//! source of truth for hizb membership.

use super::VerseKey;

pub const HIZB_COUNT: u8 = 60;

/// Inclusive verse range of one hizb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HizbRange {
    pub hizb: u8,
    pub start: VerseKey,
    pub end: VerseKey,
}

impl HizbRange {
    pub fn contains(&self, key: VerseKey) -> bool {
        self.start <= key && key <= self.end
    }
}

const fn range(hizb: u8, start: (u16, u16), end: (u16, u16)) -> HizbRange {
    HizbRange {
        hizb,
        start: VerseKey::new(start.0, start.1),
        end: VerseKey::new(end.0, end.1),
    }
}

pub const BOUNDARIES: [HizbRange; HIZB_COUNT as usize] = [
    range(1, (1, 1), (2, 74)),
    range(2, (2, 75), (2, 141)),
    range(3, (2, 142), (2, 202)),
    range(4, (2, 203), (2, 250)),
    range(5, (2, 251), (3, 14)),
    range(6, (3, 15), (3, 90)),
    range(7, (3, 91), (3, 170)),
    range(8, (3, 171), (4, 23)),
    range(9, (4, 24), (4, 85)),
    range(10, (4, 86), (4, 146)),
    range(11, (4, 147), (5, 24)),
    range(12, (5, 25), (5, 83)),
    range(13, (5, 84), (6, 36)),
    range(14, (6, 37), (6, 111)),
    range(15, (6, 112), (6, 167)),
    range(16, (7, 1), (7, 86)),
    range(17, (7, 87), (7, 170)),
    range(18, (7, 171), (8, 40)),
    range(19, (8, 41), (9, 33)),
    range(20, (9, 34), (9, 93)),
    range(21, (9, 94), (10, 25)),
    range(22, (10, 26), (11, 5)),
    range(23, (11, 6), (11, 82)),
    range(24, (11, 83), (12, 52)),
    range(25, (12, 53), (13, 20)),
    range(26, (13, 21), (14, 54)),
    range(27, (15, 1), (16, 50)),
    range(28, (16, 51), (16, 128)),
    range(29, (17, 1), (17, 98)),
    range(30, (17, 99), (18, 73)),
    range(31, (18, 74), (19, 98)),
    range(32, (20, 1), (20, 134)),
    range(33, (21, 1), (21, 111)),
    range(34, (22, 1), (22, 76)),
    range(35, (23, 1), (24, 20)),
    range(36, (24, 21), (25, 20)),
    range(37, (25, 21), (26, 111)),
    range(38, (26, 112), (27, 57)),
    range(39, (27, 58), (28, 50)),
    range(40, (28, 51), (29, 45)),
    range(41, (29, 46), (31, 20)),
    range(42, (31, 21), (33, 34)),
    range(43, (33, 35), (34, 23)),
    range(44, (34, 24), (36, 26)),
    range(45, (36, 27), (37, 144)),
    range(46, (37, 145), (39, 30)),
    range(47, (39, 31), (40, 40)),
    range(48, (40, 41), (41, 45)),
    range(49, (41, 46), (43, 22)),
    range(50, (43, 23), (45, 36)),
    range(51, (46, 1), (48, 17)),
    range(52, (48, 18), (51, 30)),
    range(53, (51, 31), (54, 55)),
    range(54, (55, 1), (57, 28)),
    range(55, (58, 1), (61, 14)),
    range(56, (62, 1), (66, 12)),
    range(57, (67, 1), (71, 30)),
    range(58, (72, 1), (77, 50)),
    range(59, (78, 1), (86, 16)),
    range(60, (87, 1), (114, 6)),
];

/// Looks up the hizb a verse belongs to.
///
/// Returns `None` for keys outside the table.
pub fn hizb_of(key: VerseKey) -> Option<u8> {
    let position = BOUNDARIES.partition_point(|range| range.end < key);
    BOUNDARIES
        .get(position)
        .filter(|range| range.contains(key))
        .map(|range| range.hizb)
}

/// Returns the boundary range for a hizb number in `1..=60`.
pub fn range_of(hizb: u8) -> Option<&'static HizbRange> {
    BOUNDARIES.get(usize::from(hizb).checked_sub(1)?)
}
