//! The case board: feed, open case, leaderboard and votes in one place.
//!
//! Every mutation of a case goes through here and always replaces the held copy with the
//! server's authoritative version, so the feed entry and the open case cannot drift apart.
//!
//! Operations that need a signed-in user take the viewer's [`Profile`] as an argument. The
//! session owns the profile; the board only adjusts its score after votes.

use crate::authoring::{is_case_author, CaseDraft, CaseEdit};
use crate::constants::LEADERBOARD_LIMIT;
use crate::error::{ApiError, ApiResult};
use crate::feed::{FeedController, FeedFilters, FeedTab};
use crate::gateway::CaseGateway;
use crate::profile::Profile;
use crate::resources::AnswerDraft;
use crate::transform::{display_name, to_answer_view, to_case_view, AnswerView, CaseView};
use crate::votes::{own_score_delta, VoteLedger, VoteOutcome, VoteTarget};
use chrono::{DateTime, Utc};
use medconnect_api_shared::LeaderEntry;

/// One leaderboard row.
#[derive(Clone, Debug, PartialEq)]
pub struct LeaderRow {
    pub name: String,
    pub score: f64,
}

impl From<&LeaderEntry> for LeaderRow {
    fn from(entry: &LeaderEntry) -> Self {
        Self {
            name: display_name(entry.first_name.as_deref(), entry.last_name.as_deref()),
            score: entry.score.unwrap_or(0.0),
        }
    }
}

pub struct CaseBoard<G> {
    gateway: G,
    feed: FeedController,
    selected: Option<CaseView>,
    leaders: Vec<LeaderRow>,
    ledger: VoteLedger,
    leaderboard_limit: u32,
}

impl<G: CaseGateway> CaseBoard<G> {
    pub fn new(gateway: G, page_size: u32) -> Self {
        Self {
            gateway,
            feed: FeedController::new(page_size),
            selected: None,
            leaders: Vec::new(),
            ledger: VoteLedger::default(),
            leaderboard_limit: LEADERBOARD_LIMIT,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.feed = self.feed.with_clock(clock);
        self
    }

    pub fn with_leaderboard_limit(mut self, limit: u32) -> Self {
        self.leaderboard_limit = limit;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn feed(&self) -> &FeedController {
        &self.feed
    }

    pub fn selected(&self) -> Option<&CaseView> {
        self.selected.as_ref()
    }

    pub fn leaders(&self) -> &[LeaderRow] {
        &self.leaders
    }

    pub fn ledger(&self) -> &VoteLedger {
        &self.ledger
    }

    pub fn visible_cases(&self, tab: FeedTab) -> Vec<&CaseView> {
        self.feed.visible_cases(tab)
    }

    pub fn all_tags(&self) -> Vec<String> {
        self.feed.all_tags()
    }

    pub async fn refresh_feed(&mut self) -> ApiResult<()> {
        self.feed.refresh(&self.gateway).await
    }

    pub async fn set_filters(&mut self, filters: FeedFilters) -> ApiResult<()> {
        self.feed.set_filters(&self.gateway, filters).await
    }

    pub async fn load_more(&mut self) -> ApiResult<bool> {
        self.feed.load_more(&self.gateway).await
    }

    /// The held case with this id: the feed entry first, then the open case.
    pub fn lookup(&self, case_id: &str) -> Option<&CaseView> {
        self.feed
            .find(case_id)
            .or_else(|| self.selected.as_ref().filter(|c| c.id == case_id))
    }

    /// Swap in the server's copy of a case wherever it is held.
    fn reconcile(&mut self, view: &CaseView) {
        self.feed.replace(view.clone());
        if let Some(selected) = self.selected.as_mut().filter(|c| c.id == view.id) {
            *selected = view.clone();
        }
    }

    fn update_held(&mut self, case_id: &str, mut f: impl FnMut(&mut CaseView)) {
        if let Some(entry) = self.feed.find_mut(case_id) {
            f(entry);
        }
        if let Some(selected) = self.selected.as_mut().filter(|c| c.id == case_id) {
            f(selected);
        }
    }

    /// Fetch a case and open it.
    pub async fn open_case(&mut self, case_id: &str) -> ApiResult<&CaseView> {
        let record = self.gateway.get_case(case_id).await?;
        let view = to_case_view(&record, self.feed.now());
        self.feed.replace(view.clone());
        Ok(&*self.selected.insert(view))
    }

    pub fn close_detail(&mut self) {
        self.selected = None;
    }

    /// Fetch the top scores and replace the held leaderboard. A payload that is not a list
    /// leaves the current rows alone.
    pub async fn refresh_leaderboard(&mut self) -> ApiResult<&[LeaderRow]> {
        if let Some(entries) = self.gateway.leaderboard(self.leaderboard_limit).await? {
            self.leaders = entries.iter().map(LeaderRow::from).collect();
        }
        Ok(&self.leaders)
    }

    /// Upvote a case or an answer.
    ///
    /// Rejected locally, without a request, when nobody is signed in or the case is closed.
    /// A second vote on the same id in this session is a no-op.
    pub async fn vote(
        &mut self,
        target: VoteTarget,
        viewer: Option<&mut Profile>,
    ) -> ApiResult<VoteOutcome> {
        let viewer = viewer.ok_or(ApiError::AuthRequired)?;
        if self.ledger.has_voted(&target) {
            return Ok(VoteOutcome::AlreadyVoted);
        }

        let case_id = target.case_id().to_string();
        let previous = self.lookup(&case_id).cloned();
        if previous.as_ref().is_some_and(|c| c.closed) {
            return Err(ApiError::CaseClosed);
        }

        let record = match &target {
            VoteTarget::Case { case_id } => self.gateway.vote_case(case_id).await?,
            VoteTarget::Answer { case_id, answer_id } => {
                self.gateway.vote_answer(case_id, answer_id).await?
            }
        };
        let updated = to_case_view(&record, self.feed.now());

        self.reconcile(&updated);

        let score_delta = own_score_delta(&target, previous.as_ref(), &updated, &viewer.id);
        if let Some(delta) = score_delta {
            viewer.apply_vote_delta(target.kind(), delta);
            tracing::info!(score = viewer.score, "own score changed after vote");
        }

        self.ledger.record(&target);

        if let Err(err) = self.refresh_leaderboard().await {
            tracing::warn!("leaderboard refresh after vote failed: {err}");
        }

        Ok(VoteOutcome::Applied {
            case: updated,
            score_delta,
        })
    }

    /// Post a new case. It goes to the top of the feed and is opened.
    pub async fn create_case(
        &mut self,
        draft: CaseDraft,
        viewer: Option<&Profile>,
    ) -> ApiResult<&CaseView> {
        viewer.ok_or(ApiError::AuthRequired)?;
        let request = draft.into_request()?;
        let record = self.gateway.create_case(&request).await?;
        let view = to_case_view(&record, self.feed.now());
        self.feed.prepend(view.clone());
        Ok(&*self.selected.insert(view))
    }

    fn require_author(&self, case_id: &str, viewer: Option<&Profile>) -> ApiResult<()> {
        let viewer = viewer.ok_or(ApiError::AuthRequired)?;
        match self.lookup(case_id) {
            Some(case) if !is_case_author(case, viewer) => Err(ApiError::InvalidInput(
                "Only the author can change this case".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Resubmit title, description and urgency. The server's copy replaces the held one.
    pub async fn edit_case(
        &mut self,
        case_id: &str,
        edit: CaseEdit,
        viewer: Option<&Profile>,
    ) -> ApiResult<CaseView> {
        self.require_author(case_id, viewer)?;
        let update = edit.into_request()?;
        let record = self.gateway.update_case(case_id, &update).await?;
        let view = to_case_view(&record, self.feed.now());
        self.reconcile(&view);
        Ok(view)
    }

    /// Close a case. There is no way back.
    pub async fn close_case(&mut self, case_id: &str, viewer: Option<&Profile>) -> ApiResult<()> {
        self.require_author(case_id, viewer)?;
        self.gateway.close_case(case_id).await?;
        self.update_held(case_id, |c| c.closed = true);
        Ok(())
    }

    /// Answer a case. The new answer is slotted into the held case by votes.
    pub async fn submit_answer(
        &mut self,
        case_id: &str,
        draft: AnswerDraft,
        viewer: Option<&Profile>,
    ) -> ApiResult<AnswerView> {
        viewer.ok_or(ApiError::AuthRequired)?;
        if self.lookup(case_id).is_some_and(|c| c.closed) {
            return Err(ApiError::CaseClosed);
        }
        if draft.is_empty() {
            return Err(ApiError::InvalidInput(
                "Please write an answer or attach a file".into(),
            ));
        }

        let record = self.gateway.create_answer(case_id, draft).await?;
        let answer = to_answer_view(&record);
        self.update_held(case_id, |c| c.push_answer(answer.clone()));
        Ok(answer)
    }
}
