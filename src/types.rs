use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LensError, Result};

/// Issues requested per page.
pub const ISSUES_PER_PAGE: u8 = 5;

/// Repository identifier in "owner/name" form, decoded from a
/// percent-encoded path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId(String);

impl RepoId {
    /// Percent-decode a raw segment such as `facebook%2Freact`.
    ///
    /// The shape is not checked here; a malformed identifier is forwarded
    /// to the API as-is and fails there.
    pub fn decode(raw: &str) -> Result<Self> {
        urlencoding::decode(raw)
            .map(|decoded| RepoId(decoded.into_owned()))
            .map_err(|e| LensError::InvalidIdentifier(format!("{}: {}", raw, e)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Owner and name, when the identifier has exactly that shape.
    pub fn parts(&self) -> Option<(&str, &str)> {
        let (owner, name) = self.0.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some((owner, name))
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// GitHub user or organisation as embedded in other payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub login: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub name: String,
    pub description: Option<String>,
    pub owner: Account,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: u64,
    pub name: String,
}

/// GitHub Issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub state: IssueState,
    pub user: Account,
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Present when the entry is a pull request; the issues endpoint lists both.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl Issue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueState::Open => write!(f, "Open"),
            IssueState::Closed => write!(f, "Closed"),
        }
    }
}

/// Issue-state constraint applied to the issue list query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IssueFilter {
    #[default]
    All,
    Open,
    Closed,
}

impl IssueFilter {
    pub const ALL: [IssueFilter; 3] = [IssueFilter::All, IssueFilter::Open, IssueFilter::Closed];

    /// Value of the `state` query parameter. `all` is GitHub's own literal.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            IssueFilter::All => "all",
            IssueFilter::Open => "open",
            IssueFilter::Closed => "closed",
        }
    }

    pub fn next(self) -> Self {
        match self {
            IssueFilter::All => IssueFilter::Open,
            IssueFilter::Open => IssueFilter::Closed,
            IssueFilter::Closed => IssueFilter::All,
        }
    }

    pub fn index(self) -> usize {
        match self {
            IssueFilter::All => 0,
            IssueFilter::Open => 1,
            IssueFilter::Closed => 2,
        }
    }
}

impl fmt::Display for IssueFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

/// One page of the issue list under a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueQuery {
    pub filter: IssueFilter,
    pub page: u32,
}
