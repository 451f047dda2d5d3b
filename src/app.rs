use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::event::Event;
use crate::source::IssueSource;
use crate::types::{IssueFilter, RepoId};
use crate::view::{IssueRequest, RepositoryView};

/// Ticks a notice stays on the status bar (250ms each)
const NOTICE_TICKS: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    RepoList, // Repositories to pick from
    RepoView, // One repository with its issues
}

pub struct App {
    pub screen: Screen,
    pub repos: Vec<RepoId>,
    pub repo_index: usize,
    pub view: Option<RepositoryView>,
    pub notice: Option<(String, u8)>,
    pub should_quit: bool,
    initial_repo: Option<RepoId>,
    next_view_id: u64,
    source: Arc<dyn IssueSource>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl App {
    pub fn new(
        source: Arc<dyn IssueSource>,
        repos: Vec<RepoId>,
        initial_repo: Option<RepoId>,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            screen: Screen::RepoList,
            repos,
            repo_index: 0,
            view: None,
            notice: None,
            should_quit: false,
            initial_repo,
            next_view_id: 0,
            source,
            action_tx,
        }
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Init => self
                .initial_repo
                .clone()
                .map(Action::OpenRepo)
                .unwrap_or(Action::None),
            Event::Tick => Action::Tick,
            Event::Key(key) => self.handle_key(key),
            Event::Render => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        match self.screen {
            Screen::RepoList => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
                KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
                KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
                KeyCode::Enter => Action::Select,
                _ => Action::None,
            },
            Screen::RepoView => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => Action::Back,
                KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
                KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
                KeyCode::Char('a') => Action::SetFilter(IssueFilter::All),
                KeyCode::Char('o') => Action::SetFilter(IssueFilter::Open),
                KeyCode::Char('c') => Action::SetFilter(IssueFilter::Closed),
                KeyCode::Char('f') | KeyCode::Tab => Action::CycleFilter,
                KeyCode::Char('n') | KeyCode::Right => Action::NextPage,
                KeyCode::Char('p') | KeyCode::Left => Action::PrevPage,
                KeyCode::Enter => Action::OpenInBrowser,
                KeyCode::Char('y') => Action::YankUrl,
                _ => Action::None,
            },
        }
    }

    pub fn update(&mut self, action: Action) {
        if let Some(view_id) = action.view_id() {
            if self.view.as_ref().map(RepositoryView::id) != Some(view_id) {
                debug!(view_id, "dropping result for a closed view");
                return;
            }
        }

        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::Back => match self.screen {
                Screen::RepoList => {
                    self.should_quit = true;
                }
                Screen::RepoView => {
                    if let Some(view) = self.view.take() {
                        view.close();
                    }
                    self.screen = Screen::RepoList;
                }
            },
            Action::ScrollUp => match self.screen {
                Screen::RepoList => {
                    self.repo_index = self.repo_index.saturating_sub(1);
                }
                Screen::RepoView => {
                    if let Some(view) = self.view.as_mut() {
                        view.select_previous();
                    }
                }
            },
            Action::ScrollDown => match self.screen {
                Screen::RepoList => {
                    if !self.repos.is_empty() && self.repo_index < self.repos.len() - 1 {
                        self.repo_index += 1;
                    }
                }
                Screen::RepoView => {
                    if let Some(view) = self.view.as_mut() {
                        view.select_next();
                    }
                }
            },
            Action::Select => {
                if self.screen == Screen::RepoList {
                    if let Some(repo) = self.repos.get(self.repo_index).cloned() {
                        self.open_repo(repo);
                    }
                }
            }
            Action::OpenRepo(repo) => self.open_repo(repo),

            Action::SetFilter(filter) => {
                let request = self.view.as_mut().and_then(|v| v.select_filter(filter));
                self.spawn_load_issues(request);
            }
            Action::CycleFilter => {
                let request = self
                    .view
                    .as_mut()
                    .and_then(|v| v.select_filter(v.filter().next()));
                self.spawn_load_issues(request);
            }
            Action::NextPage => {
                let request = self.view.as_mut().and_then(RepositoryView::next_page);
                self.spawn_load_issues(request);
            }
            Action::PrevPage => {
                let request = self.view.as_mut().and_then(RepositoryView::previous_page);
                self.spawn_load_issues(request);
            }
            Action::OpenInBrowser => {
                if let Some(url) = self.selected_url() {
                    if let Err(e) = open::that(&url) {
                        warn!(%url, error = %e, "failed to open browser");
                        self.set_notice(format!("Could not open browser: {}", e));
                    }
                }
            }
            Action::YankUrl => {
                if let Some(url) = self.selected_url() {
                    let copied = arboard::Clipboard::new().and_then(|mut cb| cb.set_text(url));
                    match copied {
                        Ok(()) => self.set_notice("Copied issue URL".to_string()),
                        Err(e) => self.set_notice(format!("Could not copy URL: {}", e)),
                    }
                }
            }

            Action::RepositoryLoaded {
                seq,
                repository,
                issues,
                ..
            } => {
                if let Some(view) = self.view.as_mut() {
                    view.apply_initial(seq, Ok((*repository, issues)));
                }
            }
            Action::RepositoryFailed { seq, kind, .. } => {
                if let Some(view) = self.view.as_mut() {
                    view.apply_initial(seq, Err(kind));
                }
            }
            Action::IssuesLoaded { seq, issues, .. } => {
                if let Some(view) = self.view.as_mut() {
                    view.apply_issues(seq, Ok(issues));
                }
            }
            Action::IssuesFailed { seq, kind, .. } => {
                if let Some(view) = self.view.as_mut() {
                    view.apply_issues(seq, Err(kind));
                }
            }

            Action::Tick => {
                if let Some((_, ticks)) = self.notice.as_mut() {
                    *ticks = ticks.saturating_sub(1);
                    if *ticks == 0 {
                        self.notice = None;
                    }
                }
            }
            Action::None => {}
        }
    }

    fn set_notice(&mut self, msg: String) {
        self.notice = Some((msg, NOTICE_TICKS));
    }

    fn selected_url(&self) -> Option<String> {
        self.view
            .as_ref()
            .and_then(RepositoryView::selected_issue)
            .map(|issue| issue.html_url.clone())
    }

    fn open_repo(&mut self, repo: RepoId) {
        if let Some(view) = self.view.take() {
            view.close();
        }

        self.repo_index = match self.repos.iter().position(|r| r == &repo) {
            Some(index) => index,
            None => {
                self.repos.push(repo.clone());
                self.repos.len() - 1
            }
        };

        if repo.parts().is_none() {
            warn!(%repo, "identifier is not owner/name, the API will likely reject it");
        }

        self.next_view_id += 1;
        let (view, request) = RepositoryView::open(self.next_view_id, repo);
        info!(repo = %request.repo, view_id = view.id(), "opening repository");

        self.spawn_initial_load(view.id(), view.cancel_token(), request);
        self.view = Some(view);
        self.screen = Screen::RepoView;
    }

    /// Fetch the repository and its first issue page together; the view only
    /// becomes ready once both have arrived.
    fn spawn_initial_load(&self, view_id: u64, cancel: CancellationToken, request: IssueRequest) {
        let tx = self.action_tx.clone();
        let source = Arc::clone(&self.source);
        tokio::spawn(async move {
            let IssueRequest { seq, repo, query } = request;
            let load = async {
                tokio::join!(
                    source.get_repository(&repo),
                    source.list_issues(&repo, query)
                )
            };

            let action = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(view_id, "initial load cancelled");
                    return;
                }
                result = load => match result {
                    (Ok(repository), Ok(issues)) => Action::RepositoryLoaded {
                        view_id,
                        seq,
                        repository: Box::new(repository),
                        issues,
                    },
                    (Err(e), _) | (_, Err(e)) => {
                        warn!(%repo, error = %e, "initial load failed");
                        Action::RepositoryFailed {
                            view_id,
                            seq,
                            kind: e.kind(),
                        }
                    }
                },
            };
            tx.send(action).ok();
        });
    }

    fn spawn_load_issues(&self, request: Option<IssueRequest>) {
        let Some(IssueRequest { seq, repo, query }) = request else {
            return;
        };
        let Some((view_id, cancel)) = self.view.as_ref().map(|v| (v.id(), v.cancel_token()))
        else {
            return;
        };

        let tx = self.action_tx.clone();
        let source = Arc::clone(&self.source);
        tokio::spawn(async move {
            let action = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(view_id, seq, "issue fetch cancelled");
                    return;
                }
                result = source.list_issues(&repo, query) => match result {
                    Ok(issues) => Action::IssuesLoaded { view_id, seq, issues },
                    Err(e) => {
                        warn!(%repo, page = query.page, error = %e, "issue fetch failed");
                        Action::IssuesFailed {
                            view_id,
                            seq,
                            kind: e.kind(),
                        }
                    }
                },
            };
            tx.send(action).ok();
        });
    }
}
