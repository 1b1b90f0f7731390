//! Vote bookkeeping for the current session.
//!
//! The ledger only remembers what was voted on in this process. It cannot be rebuilt from the
//! server, which does not expose per-user vote history.

use crate::constants::SCORE_EPSILON;
use crate::profile::VoteKind;
use crate::transform::CaseView;
use std::collections::HashSet;

/// What a vote is cast on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteTarget {
    Case { case_id: String },
    Answer { case_id: String, answer_id: String },
}

impl VoteTarget {
    pub fn case(case_id: impl Into<String>) -> Self {
        VoteTarget::Case {
            case_id: case_id.into(),
        }
    }

    pub fn answer(case_id: impl Into<String>, answer_id: impl Into<String>) -> Self {
        VoteTarget::Answer {
            case_id: case_id.into(),
            answer_id: answer_id.into(),
        }
    }

    pub fn case_id(&self) -> &str {
        match self {
            VoteTarget::Case { case_id } | VoteTarget::Answer { case_id, .. } => case_id,
        }
    }

    pub fn kind(&self) -> VoteKind {
        match self {
            VoteTarget::Case { .. } => VoteKind::Case,
            VoteTarget::Answer { .. } => VoteKind::Answer,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum VoteOutcome {
    /// The id was already voted on in this session. Nothing was sent.
    AlreadyVoted,
    /// The server accepted the vote. `case` is the re-transformed authoritative case and
    /// `score_delta` is the change applied to the viewer's own score, if any.
    Applied {
        case: CaseView,
        score_delta: Option<f64>,
    },
}

/// Ids voted on in this session. Case and answer ids are kept apart.
#[derive(Clone, Debug, Default)]
pub struct VoteLedger {
    cases: HashSet<String>,
    answers: HashSet<String>,
}

impl VoteLedger {
    pub fn has_voted(&self, target: &VoteTarget) -> bool {
        match target {
            VoteTarget::Case { case_id } => self.cases.contains(case_id),
            VoteTarget::Answer { answer_id, .. } => self.answers.contains(answer_id),
        }
    }

    pub fn record(&mut self, target: &VoteTarget) {
        match target {
            VoteTarget::Case { case_id } => self.cases.insert(case_id.clone()),
            VoteTarget::Answer { answer_id, .. } => self.answers.insert(answer_id.clone()),
        };
    }
}

/// Score change the viewer should see after a vote on their own post.
///
/// `previous` is the case as held before the vote, if it was held at all. Returns `None` when the
/// post is someone else's or the change is negligible.
pub fn own_score_delta(
    target: &VoteTarget,
    previous: Option<&CaseView>,
    updated: &CaseView,
    viewer_id: &str,
) -> Option<f64> {
    let (author_id, before, after) = match target {
        VoteTarget::Case { .. } => (
            updated.author_id.as_deref(),
            previous.map(|c| c.author_score).unwrap_or(0.0),
            updated.author_score,
        ),
        VoteTarget::Answer { answer_id, .. } => {
            let answer = updated.answer(answer_id)?;
            let before = previous
                .and_then(|c| c.answer(answer_id))
                .map(|a| a.author_score)
                .unwrap_or(answer.author_score);
            (answer.author_id.as_deref(), before, answer.author_score)
        }
    };

    if author_id != Some(viewer_id) {
        return None;
    }
    let delta = after - before;
    (delta.abs() > SCORE_EPSILON).then_some(delta)
}
