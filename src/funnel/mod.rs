pub mod content;
pub mod render;
pub mod scoring;
pub mod session;

use std::sync::Arc;

use content::{QuizContent, Question};
pub use scoring::{Category, ScoreState};

/// Per-chat funnel state.
///
/// `generation` counts how many times the chat has been reset. It tags the
/// delayed reveal so a reveal scheduled before a restart is recognised as
/// stale.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum FunnelState {
    Landing {
        generation: u64,
    },
    Quiz {
        generation: u64,
        index: usize,
        scores: ScoreState,
    },
    Analyzing {
        generation: u64,
        scores: ScoreState,
        diagnosis: Category,
    },
    Result {
        generation: u64,
        scores: ScoreState,
        diagnosis: Category,
    },
}

impl Default for FunnelState {
    fn default() -> Self {
        FunnelState::Landing { generation: 0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Landing,
    Quiz,
    Analyzing,
    Result,
}

impl FunnelState {
    pub fn generation(&self) -> u64 {
        match *self {
            FunnelState::Landing { generation }
            | FunnelState::Quiz { generation, .. }
            | FunnelState::Analyzing { generation, .. }
            | FunnelState::Result { generation, .. } => generation,
        }
    }

    pub fn step(&self) -> Step {
        match self {
            FunnelState::Landing { .. } => Step::Landing,
            FunnelState::Quiz { .. } => Step::Quiz,
            FunnelState::Analyzing { .. } => Step::Analyzing,
            FunnelState::Result { .. } => Step::Result,
        }
    }

    pub fn diagnosis(&self) -> Option<Category> {
        match *self {
            FunnelState::Analyzing { diagnosis, .. } | FunnelState::Result { diagnosis, .. } => {
                Some(diagnosis)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Back to the landing page, dropping the current attempt.
    Home,
    /// Begin a fresh attempt at the first question.
    Start,
    /// Answer the current question with an option crediting this category.
    Answer(Category),
    /// Delayed end of the analyzing pause, tagged with the generation it was
    /// scheduled from.
    Reveal { generation: u64 },
}

/// Position inside the quiz.
///
/// The fraction counts questions completed *before* the current one, so on a
/// five-question deck it tops out at 80% while the last question is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub index: usize,
    pub total: usize,
}

impl Progress {
    pub fn question_number(&self) -> usize {
        self.index + 1
    }

    pub fn fraction(&self) -> f64 {
        self.index as f64 / self.total as f64
    }

    pub fn percent(&self) -> u32 {
        (self.fraction() * 100.0).round() as u32
    }
}

pub struct FunnelController {
    content: Arc<QuizContent>,
}

impl FunnelController {
    pub fn new(content: Arc<QuizContent>) -> Self {
        Self { content }
    }

    pub fn content(&self) -> &QuizContent {
        &self.content
    }

    /// Computes the state that follows `state` under `action`, or `None` when
    /// the action does not apply to the current step.
    pub fn apply(&self, state: &FunnelState, action: Action) -> Option<FunnelState> {
        match (state, action) {
            (_, Action::Home) => Some(FunnelState::Landing {
                generation: state.generation() + 1,
            }),
            (_, Action::Start) => Some(FunnelState::Quiz {
                generation: state.generation() + 1,
                index: 0,
                scores: ScoreState::default(),
            }),
            (
                &FunnelState::Quiz {
                    generation,
                    index,
                    scores,
                },
                Action::Answer(points_to),
            ) => {
                let scores = scores.credit(points_to);
                // Last-question check uses the index before the increment.
                if index + 1 < self.content.question_count() {
                    Some(FunnelState::Quiz {
                        generation,
                        index: index + 1,
                        scores,
                    })
                } else {
                    Some(FunnelState::Analyzing {
                        generation,
                        scores,
                        diagnosis: scores.resolve(),
                    })
                }
            }
            (
                &FunnelState::Analyzing {
                    generation,
                    scores,
                    diagnosis,
                },
                Action::Reveal {
                    generation: scheduled,
                },
            ) if generation == scheduled => Some(FunnelState::Result {
                generation,
                scores,
                diagnosis,
            }),
            _ => None,
        }
    }

    pub fn current_question(&self, state: &FunnelState) -> Option<(&Question, Progress)> {
        let FunnelState::Quiz { index, .. } = *state else {
            return None;
        };
        let question = self.content.question(index)?;
        let progress = Progress {
            index,
            total: self.content.question_count(),
        };
        Some((question, progress))
    }

    /// Maps the text of a pressed option button to the category it credits.
    pub fn answer_for(&self, index: usize, text: &str) -> Option<Category> {
        self.content
            .question(index)?
            .option_by_text(text)
            .map(|option| option.points_to)
    }
}
