//! The state of one running test.
//!
//! A session walks the generated questions in order. For each question the
//! user reads forward verse by verse from the starting verse, then records a
//! self-graded answer. Quitting early counts every unanswered question as an
//! error.

use std::{
    fmt::{self, Display},
    num::NonZeroUsize,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};

use crate::{index::CorpusIndex, question::Question, scope::VerseEntry};

/// How an answer recorded before enough verses were read is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerPolicy {
    /// A correct answer is refused until enough verses were read.
    #[serde(rename = "strict")]
    Strict,
    /// A correct answer is counted as an error and the test moves on.
    #[serde(rename = "lenient auto error")]
    LenientAutoError,
    /// The user's own judgment is recorded as given.
    #[serde(rename = "manual judgment")]
    ManualJudgment,
}

impl Default for AnswerPolicy {
    fn default() -> Self {
        Self::LenientAutoError
    }
}

/// The user's self-assessment of one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Judgment {
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    AwaitingStart,
    InProgress {
        current_index: usize,
        verses_advanced: usize,
    },
    Completed(TestResult),
}

/// Outcome of stepping to the next verse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance<'a> {
    /// The verse now displayed.
    Verse(VerseEntry<'a>),
    /// Enough verses were already read for this question; nothing changed.
    RequirementMet,
    /// The surah has no further verse; nothing changed.
    EndOfSurah,
}

/// Outcome of recording an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// Moved on to the question at this index.
    Next(usize),
    Completed(TestResult),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub score: usize,
    pub errors: usize,
    pub total_questions: usize,
    pub duration_seconds: u64,
}

impl TestResult {
    /// Score as a rounded percentage of the question count.
    pub fn percentage(&self) -> u32 {
        if self.total_questions == 0 {
            return 0;
        }
        (self.score as f64 * 100.0 / self.total_questions as f64).round() as u32
    }

    pub fn performance(&self) -> Performance {
        match self.percentage() {
            90..=u32::MAX => Performance::Excellent,
            70..=89 => Performance::VeryGood,
            50..=69 => Performance::Good,
            _ => Performance::KeepGoing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Performance {
    Excellent,
    VeryGood,
    Good,
    KeepGoing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A session needs at least one question.
    NoQuestions,
    NotStarted,
    AlreadyStarted,
    AlreadyCompleted,
    /// Refused under [`AnswerPolicy::Strict`].
    NotEnoughVersesRead { read: usize, required: usize },
}

impl Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NoQuestions => write!(f, "A test needs at least one question"),
            SessionError::NotStarted => write!(f, "The test has not started"),
            SessionError::AlreadyStarted => write!(f, "The test has already started"),
            SessionError::AlreadyCompleted => write!(f, "The test is already completed"),
            SessionError::NotEnoughVersesRead { read, required } => write!(
                f,
                "Read {required} verses before moving on ({read} read so far)"
            ),
        }
    }
}

impl std::error::Error for SessionError {}

#[derive(Debug, Clone)]
pub struct TestSession<'a> {
    index: &'a CorpusIndex,
    questions: Vec<Question<'a>>,
    verses_to_read: usize,
    policy: AnswerPolicy,
    state: SessionState,
    score: usize,
    errors: usize,
    started_at: Option<Instant>,
}

impl<'a> TestSession<'a> {
    pub fn new(
        index: &'a CorpusIndex,
        questions: Vec<Question<'a>>,
        verses_to_read: NonZeroUsize,
        policy: AnswerPolicy,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::NoQuestions);
        }
        Ok(Self {
            index,
            questions,
            verses_to_read: verses_to_read.get(),
            policy,
            state: SessionState::AwaitingStart,
            score: 0,
            errors: 0,
            started_at: None,
        })
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        self.start_at(Instant::now())
    }

    /// Starts the session with the clock already running since `started_at`.
    pub fn start_at(&mut self, started_at: Instant) -> Result<(), SessionError> {
        match self.state {
            SessionState::AwaitingStart => {
                self.started_at = Some(started_at);
                self.state = SessionState::InProgress {
                    current_index: 0,
                    verses_advanced: 0,
                };
                Ok(())
            }
            SessionState::InProgress { .. } => Err(SessionError::AlreadyStarted),
            SessionState::Completed(_) => Err(SessionError::AlreadyCompleted),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn questions(&self) -> &[Question<'a>] {
        &self.questions
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn errors(&self) -> usize {
        self.errors
    }

    pub fn result(&self) -> Option<&TestResult> {
        match &self.state {
            SessionState::Completed(result) => Some(result),
            _ => None,
        }
    }

    /// Time since the session started.
    pub fn elapsed(&self) -> Duration {
        self.started_at
            .map(|started_at| started_at.elapsed())
            .unwrap_or_default()
    }

    pub fn current_question(&self) -> Option<&Question<'a>> {
        match self.state {
            SessionState::InProgress { current_index, .. } => self.questions.get(current_index),
            _ => None,
        }
    }

    /// The verse on display: the current question's starting verse, moved
    /// forward by the verses read so far.
    pub fn current_verse(&self) -> Option<VerseEntry<'a>> {
        let SessionState::InProgress {
            current_index,
            verses_advanced,
        } = self.state
        else {
            return None;
        };
        let question = self.questions.get(current_index)?;
        if verses_advanced == 0 {
            return Some(question.verse());
        }
        self.index
            .verse_after(question.key(), verses_advanced)
            .map(VerseEntry::from)
    }

    /// Steps to the next verse of the current question's surah.
    pub fn advance_verse(&mut self) -> Result<Advance<'a>, SessionError> {
        let index = self.index;
        let (current_index, verses_advanced) = match &mut self.state {
            SessionState::InProgress {
                current_index,
                verses_advanced,
            } => (*current_index, verses_advanced),
            SessionState::AwaitingStart => return Err(SessionError::NotStarted),
            SessionState::Completed(_) => return Err(SessionError::AlreadyCompleted),
        };
        if *verses_advanced >= self.verses_to_read {
            return Ok(Advance::RequirementMet);
        }

        let anchor = self.questions[current_index].key();
        match index.verse_after(anchor, *verses_advanced + 1) {
            Some(record) => {
                *verses_advanced += 1;
                Ok(Advance::Verse(VerseEntry::from(record)))
            }
            None => {
                log::warn!(
                    "surah {} ends {} verses after {anchor}",
                    anchor.surah,
                    verses_advanced
                );
                Ok(Advance::EndOfSurah)
            }
        }
    }

    /// Records the answer to the current question and moves on.
    pub fn answer(&mut self, judgment: Judgment) -> Result<Progress, SessionError> {
        let (current_index, verses_advanced) = match self.state {
            SessionState::InProgress {
                current_index,
                verses_advanced,
            } => (current_index, verses_advanced),
            SessionState::AwaitingStart => return Err(SessionError::NotStarted),
            SessionState::Completed(_) => return Err(SessionError::AlreadyCompleted),
        };
        let read_enough = verses_advanced >= self.verses_to_read;

        let correct = match (judgment, self.policy) {
            (Judgment::Incorrect, _) => false,
            (Judgment::Correct, AnswerPolicy::ManualJudgment) => true,
            (Judgment::Correct, AnswerPolicy::LenientAutoError) => read_enough,
            (Judgment::Correct, AnswerPolicy::Strict) => {
                if !read_enough {
                    return Err(SessionError::NotEnoughVersesRead {
                        read: verses_advanced,
                        required: self.verses_to_read,
                    });
                }
                true
            }
        };
        if correct {
            self.score += 1;
        } else {
            self.errors += 1;
        }

        let next = current_index + 1;
        if next < self.questions.len() {
            self.state = SessionState::InProgress {
                current_index: next,
                verses_advanced: 0,
            };
            Ok(Progress::Next(next))
        } else {
            Ok(Progress::Completed(self.finish()))
        }
    }

    /// Ends the test early, counting every unanswered question as an error.
    pub fn quit(&mut self) -> Result<TestResult, SessionError> {
        let unanswered = match self.state {
            SessionState::AwaitingStart => self.questions.len(),
            SessionState::InProgress { current_index, .. } => self.questions.len() - current_index,
            SessionState::Completed(_) => return Err(SessionError::AlreadyCompleted),
        };
        self.errors += unanswered;
        Ok(self.finish())
    }

    fn finish(&mut self) -> TestResult {
        let result = TestResult {
            score: self.score,
            errors: self.errors,
            total_questions: self.questions.len(),
            duration_seconds: self.elapsed().as_secs(),
        };
        log::info!(
            "test completed: {}/{} correct, {} errors, {}s",
            result.score,
            result.total_questions,
            result.errors,
            result.duration_seconds
        );
        self.state = SessionState::Completed(result.clone());
        result
    }
}
