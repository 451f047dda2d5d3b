use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Frame;

use super::truncate;
use crate::types::{IssueFilter, IssueState};
use crate::view::{Lifecycle, ListStatus, RepositoryView};

pub fn render(frame: &mut Frame, view: &RepositoryView, area: Rect) {
    match view.lifecycle() {
        Lifecycle::Loading => render_loading(frame, area),
        Lifecycle::Failed(kind) => {
            let lines = vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("Could not load {}: {}", view.repo(), kind),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "q: Go back to repositories",
                    Style::default().fg(Color::Gray),
                )),
            ];
            let failed = Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(failed, area);
        }
        Lifecycle::Ready => render_ready(frame, view, area),
    }
}

fn render_loading(frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    let loading = Paragraph::new(Span::styled(
        "Loading...",
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    frame.render_widget(loading, chunks[1]);
}

fn render_ready(frame: &mut Frame, view: &RepositoryView, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_owner(frame, view, chunks[0]);
    render_filter(frame, view, chunks[1]);
    render_issues(frame, view, chunks[2]);
    render_pager(frame, view, chunks[3]);
}

fn render_owner(frame: &mut Frame, view: &RepositoryView, area: Rect) {
    let Some(repository) = view.repository() else {
        return;
    };
    let w = area.width.saturating_sub(2) as usize;

    let description = repository
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or("No description");

    let lines = vec![
        Line::from(Span::styled(
            "< q: Go back to repositories",
            Style::default().fg(Color::Gray),
        )),
        Line::from(Span::styled(
            repository.name.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(truncate(description, w)),
        Line::from(vec![
            Span::styled(
                format!("@{}", repository.owner.login),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw("  "),
            Span::styled(
                truncate(&repository.owner.avatar_url, w.saturating_sub(20)),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
    ];

    let owner = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    frame.render_widget(owner, area);
}

fn render_filter(frame: &mut Frame, view: &RepositoryView, area: Rect) {
    let titles: Vec<String> = IssueFilter::ALL
        .iter()
        .map(|filter| {
            let key = filter.as_api_str().chars().next().unwrap_or(' ');
            format!("[{}] {}", key, filter)
        })
        .collect();

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(" Filter "))
        .select(view.filter().index())
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

fn render_issues(frame: &mut Frame, view: &RepositoryView, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Issues - {} ", view.filter()));

    if view.issues().is_empty() {
        let empty = Paragraph::new("No issues on this page")
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    }

    let w = area.width.saturating_sub(2) as usize;
    let fixed = 44; // marker(2) + #num(7) + space(1) + labels(16) + space(1) + @author(17)
    let flex = w.saturating_sub(fixed).max(10);

    let items: Vec<ListItem> = view
        .issues()
        .iter()
        .enumerate()
        .map(|(i, issue)| {
            let style = if i == view.selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let (marker, marker_color) = match (issue.is_pull_request(), issue.state) {
                (true, _) => ("⇄", Color::Magenta),
                (false, IssueState::Open) => ("●", Color::Green),
                (false, IssueState::Closed) => ("✓", Color::Red),
            };

            let labels = if issue.labels.is_empty() {
                String::new()
            } else {
                let joined = issue
                    .labels
                    .iter()
                    .map(|l| l.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("[{}]", truncate(&joined, 14))
            };

            let line = Line::from(vec![
                Span::styled(format!("{} ", marker), Style::default().fg(marker_color)),
                Span::styled(
                    format!("#{:<6}", issue.number),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(" "),
                Span::styled(format!("{:<flex$}", truncate(&issue.title, flex)), style),
                Span::raw(" "),
                Span::styled(format!("{:<16}", labels), Style::default().fg(Color::Magenta)),
                Span::raw(" "),
                Span::styled(
                    format!("@{}", truncate(&issue.user.login, 16)),
                    Style::default().fg(Color::Gray),
                ),
            ]);

            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(Some(view.selected));

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_pager(frame: &mut Frame, view: &RepositoryView, area: Rect) {
    // "Previous" is disabled on the first page; "Next" never is.
    let previous_style = if view.can_go_back() {
        Style::default().fg(Color::White)
    } else {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM)
    };

    let mut spans = vec![
        Span::styled("[p] Previous page", previous_style),
        Span::raw("   "),
        Span::styled(
            format!("Page {}", view.page()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled("[n] Next page", Style::default().fg(Color::White)),
    ];

    if let ListStatus::Failed(kind) = view.list_status() {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(
            format!("Error: {}", kind),
            Style::default().fg(Color::Red),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
