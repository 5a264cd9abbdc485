use std::{collections::HashSet, num::NonZeroUsize, ops::Deref};

use serde::{Deserialize, Serialize};

use crate::{
    config::{EngineConfig, Limits},
    corpus::{hizb::HIZB_COUNT, PAGE_COUNT, SURAH_COUNT},
    error::{Error, Result, SpecViolation},
    index::CorpusIndex,
    random::{shuffle, RandomSource},
    scope::{ScopeDescriptor, VerseEntry},
    OrderingMode,
};

/// Parameters of one test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub scope: ScopeDescriptor,
    #[serde(default)]
    pub ordering: OrderingMode,
    /// Upper bound on the number of questions.
    pub question_count: NonZeroUsize,
    /// How many verses the user reads on from each starting verse.
    pub verses_to_read: NonZeroUsize,
}

impl QuestionSpec {
    /// Checks the spec against the limits and the corpus dimensions.
    pub fn validate(&self, limits: &Limits) -> Result<()> {
        let requested = self.question_count.get();
        if requested > limits.max_question_count {
            return Err(SpecViolation::QuestionCount {
                requested,
                max: limits.max_question_count,
            }
            .into());
        }
        let requested = self.verses_to_read.get();
        if requested > limits.max_verses_to_read {
            return Err(SpecViolation::VersesToRead {
                requested,
                max: limits.max_verses_to_read,
            }
            .into());
        }
        validate_scope(&self.scope)
    }
}

fn validate_scope(scope: &ScopeDescriptor) -> Result<()> {
    match scope {
        ScopeDescriptor::Surahs { surah_numbers } => {
            if surah_numbers.is_empty() {
                return Err(SpecViolation::EmptySelection.into());
            }
            if let Some(&surah) = surah_numbers
                .iter()
                .find(|&&s| !(1..=SURAH_COUNT).contains(&s))
            {
                return Err(SpecViolation::SurahOutOfRange(surah).into());
            }
        }
        ScopeDescriptor::Pages { ranges } => {
            if ranges.is_empty() {
                return Err(SpecViolation::EmptySelection.into());
            }
            if let Some(range) = ranges
                .iter()
                .find(|r| r.from < 1 || r.from > r.to || r.to > PAGE_COUNT)
            {
                return Err(SpecViolation::PageRange {
                    from: range.from,
                    to: range.to,
                }
                .into());
            }
        }
        ScopeDescriptor::Hizbs { hizb_numbers } => {
            if hizb_numbers.is_empty() {
                return Err(SpecViolation::EmptySelection.into());
            }
            if let Some(&hizb) = hizb_numbers
                .iter()
                .find(|&&h| !(1..=HIZB_COUNT).contains(&h))
            {
                return Err(SpecViolation::HizbOutOfRange(hizb).into());
            }
        }
        ScopeDescriptor::Combined { parts } => {
            if parts.is_empty() {
                return Err(SpecViolation::EmptySelection.into());
            }
            parts.iter().try_for_each(validate_scope)?;
        }
    }
    Ok(())
}

/// The starting verse of one test item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question<'a> {
    verse: VerseEntry<'a>,
}

impl<'a> Question<'a> {
    pub fn verse(&self) -> VerseEntry<'a> {
        self.verse
    }
}

impl<'a> Deref for Question<'a> {
    type Target = VerseEntry<'a>;

    fn deref(&self) -> &Self::Target {
        &self.verse
    }
}

/// Whether the verse at `position` is directly followed by its next `needed`
/// verses in surah order.
///
/// Only entries that continue the surah verse by verse count, so the last
/// verse of a surah, or of a selection that stops mid-surah, never qualifies.
pub fn has_enough_following_verses(
    verses: &[VerseEntry<'_>],
    position: usize,
    needed: usize,
) -> bool {
    let Some(verse) = verses.get(position) else {
        return false;
    };
    let mut previous = verse.key();
    verses[position + 1..]
        .iter()
        .take_while(|next| {
            let follows = next.surah_number == previous.surah
                && u32::from(next.verse_number) == u32::from(previous.verse) + 1;
            previous = next.key();
            follows
        })
        .take(needed)
        .count()
        == needed
}

/// Distinct eligible starting verses of a resolved scope.
///
/// In [`OrderingMode::Sequential`] the list is sorted into corpus order
/// first; in [`OrderingMode::Random`] selection order is kept. Repeated
/// verses yield one starting point.
pub fn starting_points<'a>(
    mut verses: Vec<VerseEntry<'a>>,
    ordering: OrderingMode,
    verses_to_read: usize,
) -> Vec<VerseEntry<'a>> {
    if ordering == OrderingMode::Sequential {
        verses.sort_by_key(VerseEntry::key);
        verses.dedup_by_key(|verse| verse.key());
    }
    let mut seen = HashSet::new();
    (0..verses.len())
        .filter(|&i| has_enough_following_verses(&verses, i, verses_to_read))
        .map(|i| verses[i])
        .filter(|verse| seen.insert(verse.key()))
        .collect()
}

/// Picks up to `question_count` starting verses from a resolved scope.
///
/// Only verses followed by `verses_to_read` verses of the same surah are
/// eligible. In [`OrderingMode::Sequential`] the list is first sorted into
/// corpus order and the picked questions are presented in that order; in
/// [`OrderingMode::Random`] they are presented as drawn.
pub fn generate_questions<'a, R: RandomSource + ?Sized>(
    verses: Vec<VerseEntry<'a>>,
    ordering: OrderingMode,
    question_count: NonZeroUsize,
    verses_to_read: NonZeroUsize,
    rng: &mut R,
) -> Result<Vec<Question<'a>>> {
    if verses.is_empty() {
        return Err(Error::EmptyScope);
    }
    let needed = verses_to_read.get();

    let mut candidates = starting_points(verses, ordering, needed);
    if candidates.is_empty() {
        return Err(Error::InsufficientVerses {
            verses_to_read: needed,
        });
    }
    log::debug!("{} {ordering:?} starting points", candidates.len());

    shuffle(&mut candidates, rng);
    candidates.truncate(question_count.get());
    if ordering == OrderingMode::Sequential {
        candidates.sort_unstable_by_key(VerseEntry::key);
    }

    log::debug!(
        "generated {} of {} requested questions",
        candidates.len(),
        question_count
    );
    Ok(candidates
        .into_iter()
        .map(|verse| Question { verse })
        .collect())
}

impl CorpusIndex {
    /// Validates the spec, resolves its scope and generates the questions.
    pub fn generate_test<R: RandomSource + ?Sized>(
        &self,
        spec: &QuestionSpec,
        config: &EngineConfig,
        rng: &mut R,
    ) -> Result<Vec<Question<'_>>> {
        spec.validate(&config.limits)?;
        let verses = self.resolve_scope(&spec.scope, &config.resolve)?;
        generate_questions(
            verses,
            spec.ordering,
            spec.question_count,
            spec.verses_to_read,
            rng,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;

    use crate::{
        corpus::{Corpus, VerseKey},
        random::tests::FixedRng,
        scope::{PageRange, ResolveOptions},
    };

    use super::*;

    fn example_index() -> CorpusIndex {
        CorpusIndex::build(Corpus::example())
    }

    fn n(value: usize) -> NonZeroUsize {
        NonZeroUsize::new(value).unwrap()
    }

    fn spec(scope: ScopeDescriptor, ordering: OrderingMode, count: usize, read: usize) -> QuestionSpec {
        QuestionSpec {
            scope,
            ordering,
            question_count: n(count),
            verses_to_read: n(read),
        }
    }

    fn seeded() -> rand_chacha::ChaCha8Rng {
        rand_chacha::ChaCha8Rng::from_seed(Default::default())
    }

    /// Entries for consecutive surahs with the given verse counts.
    fn runs(counts: &[u16]) -> Vec<VerseEntry<'static>> {
        (1u16..)
            .zip(counts)
            .flat_map(|(surah, &count)| {
                (1..=count).map(move |verse| VerseEntry {
                    surah_number: surah,
                    surah_name: "",
                    verse_number: verse,
                    text: "",
                    page: 1,
                    juz: 1,
                })
            })
            .collect()
    }

    #[test]
    fn look_ahead_stops_at_surah_end() {
        let verses = runs(&[3, 4]);
        // Last verse of each surah.
        assert!(!has_enough_following_verses(&verses, 2, 1));
        assert!(!has_enough_following_verses(&verses, 6, 1));
        // First verse of the second surah has exactly 3 after it.
        assert!(has_enough_following_verses(&verses, 3, 3));
        assert!(!has_enough_following_verses(&verses, 3, 4));
        assert!(has_enough_following_verses(&verses, 0, 2));
        assert!(!has_enough_following_verses(&verses, 0, 3));
        assert!(!has_enough_following_verses(&verses, 7, 0));
    }

    #[test]
    fn look_ahead_needs_consecutive_verses() {
        let mut verses = runs(&[5]);
        verses.remove(2);
        // 1:1, 1:2, 1:4, 1:5
        assert!(has_enough_following_verses(&verses, 0, 1));
        assert!(!has_enough_following_verses(&verses, 0, 2));
        assert!(!has_enough_following_verses(&verses, 1, 1));
        assert!(has_enough_following_verses(&verses, 2, 1));

        let repeated = [verses[0], verses[0], verses[1]];
        assert!(!has_enough_following_verses(&repeated, 0, 1));
        assert!(has_enough_following_verses(&repeated, 1, 1));
    }

    #[test]
    fn selection_out_of_corpus_order() {
        let index = example_index();
        let scope = ScopeDescriptor::hizbs([15, 14]);
        for (ordering, expected) in [(OrderingMode::Random, 129), (OrderingMode::Sequential, 130)] {
            let verses = index.resolve_scope(&scope, ResolveOptions::DEDUPE).unwrap();
            let questions =
                generate_questions(verses, ordering, n(1000), n(1), &mut FixedRng(u32::MAX))
                    .unwrap();
            assert_eq!(questions.len(), expected);
            assert!(questions.iter().all(|q| q.key() != VerseKey::new(6, 167)));
            assert!(questions
                .iter()
                .all(|q| index.verse_after(q.key(), 1).is_some()));
        }
    }

    #[test]
    fn duplicates_yield_one_question() {
        let index = example_index();
        let scope = ScopeDescriptor::combined([
            ScopeDescriptor::surahs([114]),
            ScopeDescriptor::hizbs([60]),
        ]);
        for ordering in [OrderingMode::Random, OrderingMode::Sequential] {
            let verses = index
                .resolve_scope(&scope, ResolveOptions::KEEP_DUPLICATES)
                .unwrap();
            let questions =
                generate_questions(verses, ordering, n(10_000), n(1), &mut seeded()).unwrap();

            let distinct: HashSet<VerseKey> = questions.iter().map(|q| q.key()).collect();
            assert_eq!(distinct.len(), questions.len());
            assert!(!distinct.contains(&VerseKey::new(114, 6)));
            assert!(distinct.contains(&VerseKey::new(114, 5)));
            if ordering == OrderingMode::Sequential {
                assert!(questions.windows(2).all(|pair| pair[0].key() < pair[1].key()));
            }
        }
    }

    #[test]
    fn single_surah_random() {
        let index = example_index();
        let questions = index
            .generate_test(
                &spec(ScopeDescriptor::surahs([2]), OrderingMode::Random, 5, 3),
                &EngineConfig::default(),
                &mut seeded(),
            )
            .unwrap();

        assert_eq!(questions.len(), 5);
        let distinct: HashSet<VerseKey> = questions.iter().map(|q| q.key()).collect();
        assert_eq!(distinct.len(), 5);
        for question in &questions {
            assert_eq!(question.surah_number, 2);
            assert!(question.verse_number + 3 <= 286);
        }
    }

    #[test]
    fn page_range_sequential() {
        let index = example_index();
        let questions = index
            .generate_test(
                &spec(
                    ScopeDescriptor::pages([PageRange::new(1, 2)]),
                    OrderingMode::Sequential,
                    3,
                    2,
                ),
                &EngineConfig::default(),
                &mut seeded(),
            )
            .unwrap();

        assert_eq!(questions.len(), 3);
        assert!(questions.windows(2).all(|pair| pair[0].key() < pair[1].key()));
        for question in &questions {
            let last_eligible = if question.surah_number == 1 { 5 } else { 12 };
            assert!(question.verse_number <= last_eligible);
        }
    }

    #[test]
    fn sequential_presents_picks_in_corpus_order() {
        let index = example_index();
        let verses = index
            .resolve_scope(&ScopeDescriptor::surahs([2, 1]), ResolveOptions::DEDUPE)
            .unwrap();
        // The lowest draw rotates the candidate list left by one.
        let questions =
            generate_questions(verses, OrderingMode::Sequential, n(3), n(2), &mut FixedRng(0))
                .unwrap();
        let keys: Vec<_> = questions.iter().map(|q| q.key()).collect();
        assert_eq!(
            keys,
            [VerseKey::new(1, 2), VerseKey::new(1, 3), VerseKey::new(1, 4)]
        );
    }

    #[test]
    fn random_keeps_draw_order() {
        let index = example_index();
        let verses = index
            .resolve_scope(&ScopeDescriptor::surahs([2, 1]), ResolveOptions::DEDUPE)
            .unwrap();
        let questions = generate_questions(
            verses,
            OrderingMode::Random,
            n(2),
            n(2),
            &mut FixedRng(u32::MAX),
        )
        .unwrap();
        let keys: Vec<_> = questions.iter().map(|q| q.key()).collect();
        assert_eq!(keys, [VerseKey::new(2, 1), VerseKey::new(2, 2)]);
    }

    #[test]
    fn infeasible_request() {
        let index = example_index();
        let result = index.generate_test(
            &spec(ScopeDescriptor::surahs([114]), OrderingMode::Random, 1, 6),
            &EngineConfig::default(),
            &mut seeded(),
        );
        assert_eq!(result, Err(Error::InsufficientVerses { verses_to_read: 6 }));

        let questions = index
            .generate_test(
                &spec(ScopeDescriptor::surahs([114]), OrderingMode::Sequential, 1, 5),
                &EngineConfig::default(),
                &mut seeded(),
            )
            .unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].key(), VerseKey::new(114, 1));
    }

    #[test]
    fn infeasible_is_deterministic() {
        let index = example_index();
        let spec = spec(ScopeDescriptor::surahs([108]), OrderingMode::Sequential, 4, 3);
        for _ in 0..3 {
            assert_eq!(
                index.generate_test(&spec, &EngineConfig::default(), &mut seeded()),
                Err(Error::InsufficientVerses { verses_to_read: 3 })
            );
        }
    }

    #[test]
    fn count_is_capped_by_candidates() {
        let index = example_index();
        let questions = index
            .generate_test(
                &spec(ScopeDescriptor::surahs([114]), OrderingMode::Random, 100, 1),
                &EngineConfig::default(),
                &mut seeded(),
            )
            .unwrap();
        assert_eq!(questions.len(), 5);
    }

    #[test]
    fn empty_scope() {
        let index = example_index();
        let verses = index
            .resolve_scope(
                &ScopeDescriptor::pages([PageRange::new(700, 700)]),
                ResolveOptions::DEDUPE,
            )
            .unwrap();
        let result = generate_questions(verses, OrderingMode::Random, n(1), n(1), &mut seeded());
        assert_eq!(result, Err(Error::EmptyScope));
    }

    #[test]
    fn spec_validation() {
        let limits = Limits::default();
        let too_many = spec(ScopeDescriptor::surahs([1]), OrderingMode::Random, 101, 1);
        assert_eq!(
            too_many.validate(&limits),
            Err(Error::InvalidSpec(SpecViolation::QuestionCount {
                requested: 101,
                max: 100
            }))
        );

        let too_deep = spec(ScopeDescriptor::surahs([1]), OrderingMode::Random, 1, 21);
        assert!(matches!(
            too_deep.validate(&limits),
            Err(Error::InvalidSpec(SpecViolation::VersesToRead { .. }))
        ));

        for (scope, violation) in [
            (ScopeDescriptor::surahs([]), SpecViolation::EmptySelection),
            (ScopeDescriptor::surahs([115]), SpecViolation::SurahOutOfRange(115)),
            (ScopeDescriptor::hizbs([0]), SpecViolation::HizbOutOfRange(0)),
            (
                ScopeDescriptor::pages([PageRange::new(9, 3)]),
                SpecViolation::PageRange { from: 9, to: 3 },
            ),
            (
                ScopeDescriptor::pages([PageRange::new(600, 605)]),
                SpecViolation::PageRange { from: 600, to: 605 },
            ),
            (ScopeDescriptor::combined([]), SpecViolation::EmptySelection),
            (
                ScopeDescriptor::combined([ScopeDescriptor::hizbs([61])]),
                SpecViolation::HizbOutOfRange(61),
            ),
        ] {
            let spec = spec(scope, OrderingMode::Random, 1, 1);
            assert_eq!(spec.validate(&limits), Err(Error::InvalidSpec(violation)));
        }

        let index = example_index();
        let result = index.generate_test(&too_many, &EngineConfig::default(), &mut seeded());
        assert!(matches!(result, Err(Error::InvalidSpec(_))));
    }

    #[test]
    fn spec_from_yaml() {
        let parsed: QuestionSpec = serde_yaml::from_str(
            "scope:
  type: surahs
  surah_numbers:
  - 2
ordering: sequential
question_count: 5
verses_to_read: 3
",
        )
        .unwrap();
        assert_eq!(
            parsed,
            spec(ScopeDescriptor::surahs([2]), OrderingMode::Sequential, 5, 3)
        );

        let zero = serde_yaml::from_str::<QuestionSpec>(
            "scope: {type: hizbs, hizb_numbers: [1]}\nquestion_count: 0\nverses_to_read: 1\n",
        );
        assert!(zero.is_err());
    }

    mod properties {
        use std::collections::HashSet;

        use proptest::prelude::*;
        use rand::SeedableRng;

        use super::{example_index, n, runs};
        use crate::{
            corpus::VerseKey,
            error::Error,
            question::{generate_questions, has_enough_following_verses, starting_points},
            scope::{PageRange, ResolveOptions, ScopeDescriptor},
            OrderingMode,
        };

        fn ordering_strategy() -> impl Strategy<Value = OrderingMode> {
            prop_oneof![Just(OrderingMode::Sequential), Just(OrderingMode::Random)]
        }

        fn options_strategy() -> impl Strategy<Value = ResolveOptions> {
            prop_oneof![Just(ResolveOptions::DEDUPE), Just(ResolveOptions::KEEP_DUPLICATES)]
        }

        /// Selections in arbitrary order, overlapping or combined.
        fn scope_strategy() -> impl Strategy<Value = ScopeDescriptor> {
            let single = prop_oneof![
                prop::collection::vec(1u16..=114, 1..4).prop_map(|numbers| ScopeDescriptor::surahs(numbers)),
                prop::collection::vec(1u8..=60, 1..3).prop_map(|numbers| ScopeDescriptor::hizbs(numbers)),
                prop::collection::vec((1u16..=604, 0u16..4), 1..3).prop_map(|ranges| {
                    ScopeDescriptor::pages(
                        ranges
                            .into_iter()
                            .map(|(from, len)| PageRange::new(from, (from + len).min(604))),
                    )
                }),
            ];
            prop_oneof![
                3 => single.clone(),
                1 => prop::collection::vec(single, 2..4).prop_map(|parts| ScopeDescriptor::combined(parts)),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            /// The predicate holds exactly when enough verses remain in the surah.
            #[test]
            fn prop_look_ahead_law(counts in prop::collection::vec(1u16..12, 1..6), needed in 0usize..14) {
                let verses = runs(&counts);
                for (position, verse) in verses.iter().enumerate() {
                    let count = counts[usize::from(verse.surah_number) - 1];
                    let remaining = usize::from(count - verse.verse_number);
                    prop_assert_eq!(
                        has_enough_following_verses(&verses, position, needed),
                        needed <= remaining
                    );
                }
            }

            /// Generated questions are feasible, distinct, bounded and, in
            /// sequential mode, strictly ascending, whatever the selection order.
            #[test]
            fn prop_generated_questions(
                scope in scope_strategy(),
                options in options_strategy(),
                ordering in ordering_strategy(),
                count in 1usize..30,
                read in 1usize..10,
                seed in any::<u64>(),
            ) {
                let index = example_index();
                let verses = index.resolve_scope(&scope, options).unwrap();
                let listed: HashSet<VerseKey> = verses.iter().map(|v| v.key()).collect();
                let feasible = starting_points(verses.clone(), ordering, read).len();

                let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
                match generate_questions(verses, ordering, n(count), n(read), &mut rng) {
                    Ok(questions) => {
                        prop_assert!(!questions.is_empty());
                        prop_assert_eq!(questions.len(), count.min(feasible));
                        for question in &questions {
                            for steps in 1..=read {
                                let next = index.verse_after(question.key(), steps);
                                prop_assert!(next.is_some_and(|r| listed.contains(&r.key())));
                            }
                        }
                        let distinct: HashSet<VerseKey> = questions.iter().map(|q| q.key()).collect();
                        prop_assert_eq!(distinct.len(), questions.len());
                        if ordering == OrderingMode::Sequential {
                            prop_assert!(questions.windows(2).all(|p| p[0].key() < p[1].key()));
                        }
                    }
                    Err(error) => {
                        prop_assert_eq!(feasible, 0);
                        prop_assert_eq!(error, Error::InsufficientVerses { verses_to_read: read });
                    }
                }
            }
        }
    }
}
