use crate::error::ErrorKind;
use crate::types::{Issue, IssueFilter, RepoId, RepositorySummary};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    Back,
    ScrollUp,
    ScrollDown,
    Select,

    // Navigation
    OpenRepo(RepoId),

    // Repository view controls
    SetFilter(IssueFilter),
    CycleFilter,
    NextPage,
    PrevPage,
    OpenInBrowser,
    YankUrl,

    // Fetch completions, tagged with the view and request they belong to
    RepositoryLoaded {
        view_id: u64,
        seq: u64,
        repository: Box<RepositorySummary>,
        issues: Vec<Issue>,
    },
    RepositoryFailed {
        view_id: u64,
        seq: u64,
        kind: ErrorKind,
    },
    IssuesLoaded {
        view_id: u64,
        seq: u64,
        issues: Vec<Issue>,
    },
    IssuesFailed {
        view_id: u64,
        seq: u64,
        kind: ErrorKind,
    },

    Tick,
    None,
}

impl Action {
    /// View a fetch completion belongs to, if this is one.
    pub fn view_id(&self) -> Option<u64> {
        match self {
            Action::RepositoryLoaded { view_id, .. }
            | Action::RepositoryFailed { view_id, .. }
            | Action::IssuesLoaded { view_id, .. }
            | Action::IssuesFailed { view_id, .. } => Some(*view_id),
            _ => None,
        }
    }
}
