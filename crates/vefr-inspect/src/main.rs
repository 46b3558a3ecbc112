//! vefr-inspect — TUI viewer for exported scene documents.
//!
//! Shows the node tree of a `.gltf` scene written by `vefr`, with the
//! selected node's local matrix and component payloads alongside.
//!
//! `cargo run -p vefr-inspect -- path/to/scene.gltf`

use std::collections::HashSet;
use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use vefr::gltf::SceneDocument;

// ── Tabs ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq)]
enum Tab {
    Nodes,
    Document,
}

impl Tab {
    const ALL: [Tab; 2] = [Tab::Nodes, Tab::Document];

    fn next(self) -> Self {
        match self {
            Tab::Nodes => Tab::Document,
            Tab::Document => Tab::Nodes,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Tab::Nodes => "Nodes",
            Tab::Document => "Document",
        }
    }
}

// ── Tree data model ─────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
struct TreeRow {
    node: usize,
    depth: usize,
    has_children: bool,
}

struct App {
    path: String,
    document: SceneDocument,
    /// `Err` text from [`SceneDocument::validate`], shown in the header.
    problem: Option<String>,
    active_tab: Tab,
    expanded: HashSet<usize>,
    cursor: usize,
    doc_scroll: u16,
}

impl App {
    fn new(path: String, document: SceneDocument) -> Self {
        let problem = document.validate().err().map(|e| e.to_string());
        let expanded = document.root_nodes().iter().copied().collect();
        Self {
            path,
            document,
            problem,
            active_tab: Tab::Nodes,
            expanded,
            cursor: 0,
            doc_scroll: 0,
        }
    }

    /// Visible rows in pre-order. Out-of-range or repeated indices are
    /// skipped.
    fn build_tree_rows(&self) -> Vec<TreeRow> {
        let nodes = &self.document.nodes;
        let mut rows = Vec::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<(usize, usize)> = self
            .document
            .root_nodes()
            .iter()
            .rev()
            .map(|&n| (n, 0))
            .collect();

        while let Some((node, depth)) = stack.pop() {
            if node >= nodes.len() || !seen.insert(node) {
                continue;
            }
            let children = &nodes[node].children;
            rows.push(TreeRow {
                node,
                depth,
                has_children: !children.is_empty(),
            });
            if self.expanded.contains(&node) {
                stack.extend(children.iter().rev().map(|&c| (c, depth + 1)));
            }
        }
        rows
    }

    fn selected(&self) -> Option<usize> {
        self.build_tree_rows().get(self.cursor).map(|r| r.node)
    }

    fn node_label(&self, index: usize) -> String {
        match &self.document.nodes[index].name {
            Some(name) => format!("{name} #{index}"),
            None => format!("#{index}"),
        }
    }
}

fn main() -> io::Result<()> {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: vefr-inspect <scene.gltf>");
        std::process::exit(2);
    };
    let bytes = std::fs::read(&path)?;
    let document = SceneDocument::from_json(&bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(path, document);

    loop {
        terminal.draw(|f| ui(f, &app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if handle_key(&mut app, key) {
                    break;
                }
            }
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

// ── Key handling ─────────────────────────────────────────────────────────

/// Returns `true` if the app should quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Tab => app.active_tab = app.active_tab.next(),
        KeyCode::Char('1') => app.active_tab = Tab::Nodes,
        KeyCode::Char('2') => app.active_tab = Tab::Document,
        _ => match app.active_tab {
            Tab::Nodes => handle_tree_key(app, key.code),
            Tab::Document => match key.code {
                KeyCode::Up => app.doc_scroll = app.doc_scroll.saturating_sub(1),
                KeyCode::Down => app.doc_scroll = app.doc_scroll.saturating_add(1),
                _ => {}
            },
        },
    }
    false
}

fn handle_tree_key(app: &mut App, code: KeyCode) {
    let rows = app.build_tree_rows();
    if rows.is_empty() {
        return;
    }
    match code {
        KeyCode::Up => app.cursor = app.cursor.saturating_sub(1),
        KeyCode::Down => app.cursor = (app.cursor + 1).min(rows.len() - 1),
        KeyCode::Enter | KeyCode::Right => {
            let row = &rows[app.cursor];
            if row.has_children && !app.expanded.insert(row.node) && code == KeyCode::Enter {
                app.expanded.remove(&row.node);
            }
        }
        KeyCode::Left => collapse_or_parent(app, &rows),
        _ => {}
    }
}

fn collapse_or_parent(app: &mut App, rows: &[TreeRow]) {
    let node = rows[app.cursor].node;
    if app.expanded.remove(&node) {
        return;
    }
    // Jump to parent node.
    if let Some(parent) = app.document.parent_of(node) {
        if let Some(i) = rows.iter().position(|r| r.node == parent) {
            app.cursor = i;
        }
    }
}

// ── UI rendering ─────────────────────────────────────────────────────────

fn ui(f: &mut ratatui::Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(1), // tab bar
            Constraint::Min(6),    // tab content
            Constraint::Length(1), // help bar
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    draw_tab_bar(f, app, chunks[1]);
    match app.active_tab {
        Tab::Nodes => draw_nodes_tab(f, app, chunks[2]),
        Tab::Document => draw_document_tab(f, app, chunks[2]),
    }
    draw_help_bar(f, app, chunks[3]);
}

fn draw_header(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let doc = &app.document;
    let (status, status_color) = match &app.problem {
        Some(_) => (" INVALID ", Color::Red),
        None => (" OK ", Color::Green),
    };

    let mut spans = vec![
        Span::styled(status, Style::default().bg(status_color).fg(Color::Black)),
        Span::raw("  "),
        Span::styled("Nodes: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            doc.nodes.len().to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled("glTF ", Style::default().fg(Color::DarkGray)),
        Span::styled(doc.asset.version.clone(), Style::default().fg(Color::White)),
        Span::raw("  |  "),
        Span::styled("Generator: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            doc.asset.generator.clone().unwrap_or_else(|| "-".to_string()),
            Style::default().fg(Color::White),
        ),
    ];
    if let Some(problem) = &app.problem {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(problem.clone(), Style::default().fg(Color::Red)));
    }

    let block = Block::default()
        .title(format!(" vefr-inspect: {} ", app.path))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_tab_bar(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in Tab::ALL.iter().enumerate() {
        let num = format!(" {} ", i + 1);
        let label = format!("{} ", tab.label());
        if *tab == app.active_tab {
            spans.push(Span::styled(
                num,
                Style::default().bg(Color::Cyan).fg(Color::Black).add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                label,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(num, Style::default().fg(Color::DarkGray)));
            spans.push(Span::styled(label, Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::raw("  "));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ── Nodes Tab ────────────────────────────────────────────────────────────

fn draw_nodes_tab(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);
    draw_tree(f, app, cols[0]);
    draw_node_details(f, app, cols[1]);
}

fn draw_tree(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Tree ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = app.build_tree_rows();
    if rows.is_empty() {
        let p = Paragraph::new("  No nodes").style(Style::default().fg(Color::DarkGray));
        f.render_widget(p, inner);
        return;
    }

    let visible_height = inner.height as usize;
    // Scroll: keep cursor centered.
    let scroll_offset = if app.cursor >= visible_height / 2 {
        let offset = app.cursor - visible_height / 2;
        offset.min(rows.len().saturating_sub(visible_height))
    } else {
        0
    };

    let lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_height)
        .map(|(i, row)| {
            let is_cursor = i == app.cursor;
            let arrow = match (row.has_children, app.expanded.contains(&row.node)) {
                (false, _) => " ",
                (true, true) => "\u{25BC}",
                (true, false) => "\u{25B6}",
            };
            let ext_count = app.document.nodes[row.node].extensions.len();
            Line::from(vec![
                Span::styled(
                    if is_cursor { "> " } else { "  " },
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::raw("  ".repeat(row.depth)),
                Span::styled(format!("{arrow} "), Style::default().fg(Color::Yellow)),
                Span::styled(
                    app.node_label(row.node),
                    if is_cursor {
                        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::White)
                    },
                ),
                Span::styled(
                    if ext_count > 0 { format!("  +{ext_count}") } else { String::new() },
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_node_details(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Node ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let Some(index) = app.selected() else {
        f.render_widget(block, area);
        return;
    };
    let node = &app.document.nodes[index];
    let mut lines = vec![Line::from(vec![
        Span::styled(
            app.node_label(index),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            match app.document.parent_of(index) {
                Some(p) => format!("  parent #{p}"),
                None => "  root".to_string(),
            },
            Style::default().fg(Color::DarkGray),
        ),
    ])];

    lines.push(Line::from(""));
    lines.push(Line::styled("matrix", Style::default().fg(Color::Yellow)));
    // Printed row by row; storage is column-major.
    let m = node.local_matrix().to_cols_array_2d();
    for row in 0..4 {
        lines.push(Line::raw(format!(
            "  {:>9.4} {:>9.4} {:>9.4} {:>9.4}",
            m[0][row], m[1][row], m[2][row], m[3][row]
        )));
    }

    for (id, payload) in &node.extensions {
        lines.push(Line::from(""));
        lines.push(Line::styled(id.clone(), Style::default().fg(Color::Yellow)));
        let text = serde_json::to_string_pretty(payload).unwrap_or_default();
        lines.extend(text.lines().map(|l| Line::raw(format!("  {l}"))));
    }

    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

// ── Document Tab ─────────────────────────────────────────────────────────

fn draw_document_tab(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Document ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let doc = &app.document;
    let mut lines = vec![Line::styled("extensionsUsed", Style::default().fg(Color::Yellow))];
    if doc.extensions_used.is_empty() {
        lines.push(Line::styled("  (none)", Style::default().fg(Color::DarkGray)));
    }
    for id in &doc.extensions_used {
        let count = doc.nodes.iter().filter(|n| n.extensions.contains_key(id)).count();
        lines.push(Line::from(vec![
            Span::raw(format!("  {id}")),
            Span::styled(format!("  {count} nodes"), Style::default().fg(Color::DarkGray)),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::styled(
        format!("scenes[{}].nodes = {:?}", doc.scene, doc.root_nodes()),
        Style::default().fg(Color::Yellow),
    ));

    for (id, payload) in &doc.extensions {
        lines.push(Line::from(""));
        lines.push(Line::styled(id.clone(), Style::default().fg(Color::Yellow)));
        let text = serde_json::to_string_pretty(payload).unwrap_or_default();
        lines.extend(text.lines().map(|l| Line::raw(format!("  {l}"))));
    }

    f.render_widget(
        Paragraph::new(lines).block(block).scroll((app.doc_scroll, 0)),
        area,
    );
}

fn draw_help_bar(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(" [1-2]", Style::default().fg(Color::Cyan)),
        Span::raw(" tab  "),
        Span::styled("[Tab]", Style::default().fg(Color::Cyan)),
        Span::raw(" next  "),
    ];
    match app.active_tab {
        Tab::Nodes => {
            spans.push(Span::styled("[\u{2191}\u{2193}]", Style::default().fg(Color::Cyan)));
            spans.push(Span::raw(" navigate  "));
            spans.push(Span::styled("[Enter/\u{2192}]", Style::default().fg(Color::Cyan)));
            spans.push(Span::raw(" expand  "));
            spans.push(Span::styled("[\u{2190}]", Style::default().fg(Color::Cyan)));
            spans.push(Span::raw(" collapse  "));
        }
        Tab::Document => {
            spans.push(Span::styled("[\u{2191}\u{2193}]", Style::default().fg(Color::Cyan)));
            spans.push(Span::raw(" scroll  "));
        }
    }
    spans.push(Span::styled("[q]", Style::default().fg(Color::Cyan)));
    spans.push(Span::raw(" quit"));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
