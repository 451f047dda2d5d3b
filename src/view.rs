//! State of one repository screen: the one-time initial load, the issue
//! filter, and the page cursor.
//!
//! Every issue fetch is tagged with a sequence number. Only the response to
//! the most recently issued request is applied, so a slow response for an
//! older filter or page can never overwrite a newer one.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ErrorKind;
use crate::types::{Issue, IssueFilter, IssueQuery, RepoId, RepositorySummary};

/// One-time initial load of the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Loading,
    Ready,
    Failed(ErrorKind),
}

/// State of the latest issue list refresh after the initial load.
/// `Pending` is tracked but never shown as a loading indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStatus {
    Idle,
    Pending,
    Failed(ErrorKind),
}

/// A fetch the caller must run on behalf of the view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRequest {
    pub seq: u64,
    pub repo: RepoId,
    pub query: IssueQuery,
}

#[derive(Debug)]
pub struct RepositoryView {
    id: u64,
    repo: RepoId,
    repository: Option<RepositorySummary>,
    issues: Vec<Issue>,
    lifecycle: Lifecycle,
    list_status: ListStatus,
    filter: IssueFilter,
    page: u32,
    latest_seq: u64,
    pub selected: usize,
    cancel: CancellationToken,
}

impl RepositoryView {
    /// Create the view and the request for its first page (all issues, page 1).
    /// The repository metadata is fetched alongside it by the caller.
    pub fn open(id: u64, repo: RepoId) -> (Self, IssueRequest) {
        let mut view = Self {
            id,
            repo,
            repository: None,
            issues: Vec::new(),
            lifecycle: Lifecycle::Loading,
            list_status: ListStatus::Idle,
            filter: IssueFilter::default(),
            page: 1,
            latest_seq: 0,
            selected: 0,
            cancel: CancellationToken::new(),
        };
        let request = view.issue_request();
        (view, request)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    pub fn repository(&self) -> Option<&RepositorySummary> {
        self.repository.as_ref()
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn list_status(&self) -> ListStatus {
        self.list_status
    }

    pub fn filter(&self) -> IssueFilter {
        self.filter
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle == Lifecycle::Ready
    }

    pub fn can_go_back(&self) -> bool {
        self.page > 1
    }

    pub fn selected_issue(&self) -> Option<&Issue> {
        self.issues.get(self.selected)
    }

    /// Token cancelled when the view is closed; fetches spawned for this view
    /// watch it.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Tear the view down. In-flight fetches stop and their results are dropped.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    fn issue_request(&mut self) -> IssueRequest {
        self.latest_seq += 1;
        IssueRequest {
            seq: self.latest_seq,
            repo: self.repo.clone(),
            query: IssueQuery {
                filter: self.filter,
                page: self.page,
            },
        }
    }

    /// Select a filter: page goes back to 1 and the list is refetched.
    pub fn select_filter(&mut self, filter: IssueFilter) -> Option<IssueRequest> {
        if self.lifecycle != Lifecycle::Ready {
            return None;
        }
        self.filter = filter;
        self.page = 1;
        self.list_status = ListStatus::Pending;
        Some(self.issue_request())
    }

    /// Move to `page`. Page 0 (previous from the first page) is a no-op.
    /// There is no upper bound; a page past the end yields an empty list.
    pub fn paginate(&mut self, page: u32) -> Option<IssueRequest> {
        if page == 0 || self.lifecycle != Lifecycle::Ready {
            return None;
        }
        self.page = page;
        self.list_status = ListStatus::Pending;
        Some(self.issue_request())
    }

    pub fn next_page(&mut self) -> Option<IssueRequest> {
        self.paginate(self.page.saturating_add(1))
    }

    pub fn previous_page(&mut self) -> Option<IssueRequest> {
        self.paginate(self.page - 1)
    }

    /// Apply the joined result of the initial repository + first page fetch.
    pub fn apply_initial(
        &mut self,
        seq: u64,
        result: std::result::Result<(RepositorySummary, Vec<Issue>), ErrorKind>,
    ) -> bool {
        if self.lifecycle != Lifecycle::Loading || seq != self.latest_seq {
            debug!(view = self.id, seq, "ignoring initial load result");
            return false;
        }
        match result {
            Ok((repository, issues)) => {
                self.repository = Some(repository);
                self.issues = issues;
                self.selected = 0;
                self.lifecycle = Lifecycle::Ready;
            }
            Err(kind) => {
                self.lifecycle = Lifecycle::Failed(kind);
            }
        }
        true
    }

    /// Apply an issue list response. Responses to anything but the latest
    /// request are stale and dropped. Returns whether the state changed.
    pub fn apply_issues(
        &mut self,
        seq: u64,
        result: std::result::Result<Vec<Issue>, ErrorKind>,
    ) -> bool {
        if seq != self.latest_seq || self.lifecycle != Lifecycle::Ready {
            debug!(
                view = self.id,
                seq,
                latest = self.latest_seq,
                "dropping stale issue response"
            );
            return false;
        }
        match result {
            Ok(issues) => {
                self.issues = issues;
                self.selected = 0;
                self.list_status = ListStatus::Idle;
            }
            Err(kind) => {
                self.list_status = ListStatus::Failed(kind);
            }
        }
        true
    }

    pub fn select_next(&mut self) {
        if !self.issues.is_empty() && self.selected < self.issues.len() - 1 {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}
