use std::collections::HashSet;
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Padding, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use textwrap::{wrap, Options as WrapOptions};
use tracing::debug;
use unicode_width::UnicodeWidthStr;

use crate::dispatch::{Key, KeyOutcome, KeyPress, Session, Target};
use crate::feed::PostId;
use crate::page::Focus;
use crate::render::{FeedView, PostView};

const COLOR_BG: Color = Color::Rgb(30, 30, 46);
const COLOR_PANEL_BG: Color = Color::Rgb(24, 24, 36);
const COLOR_PANEL_FOCUSED_BG: Color = Color::Rgb(49, 50, 68);
const COLOR_PANEL_SELECTED_BG: Color = Color::Rgb(69, 71, 90);
const COLOR_BORDER_IDLE: Color = Color::Rgb(49, 50, 68);
const COLOR_BORDER_FOCUSED: Color = Color::Rgb(137, 180, 250);
const COLOR_TEXT_PRIMARY: Color = Color::Rgb(205, 214, 244);
const COLOR_TEXT_SECONDARY: Color = Color::Rgb(166, 173, 200);
const COLOR_ACCENT: Color = Color::Rgb(137, 180, 250);
const COLOR_LIKED: Color = Color::Rgb(243, 139, 168);
const COLOR_RETWEETED: Color = Color::Rgb(166, 227, 161);

const ICON_REPLIES: &str = "💬";
const ICON_LIKE: &str = "♥";
const ICON_RETWEET: &str = "⟳";
const REPLY_INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Browse,
    Compose,
    Reply(PostId),
}

pub struct Options {
    pub session: Session,
    pub tick_rate: Duration,
    pub status_message: String,
}

pub struct Model {
    session: Session,
    mode: Mode,
    selected: usize,
    status_message: String,
    tick_rate: Duration,
    needs_redraw: bool,
}

impl Model {
    pub fn new(options: Options) -> Self {
        Self {
            session: options.session,
            mode: Mode::Browse,
            selected: 0,
            status_message: options.status_message,
            tick_rate: options.tick_rate,
            needs_redraw: true,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();

        loop {
            if self.needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                self.needs_redraw = false;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(16));

            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        match self.handle_key(key) {
                            Ok(true) => break,
                            Ok(false) => {}
                            Err(err) => {
                                self.status_message = format!("Error: {}", err);
                                self.mark_dirty();
                            }
                        }
                    }
                    Event::Resize(_, _) => self.mark_dirty(),
                    _ => {}
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                last_tick = Instant::now();
            }
        }

        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    fn selected_id(&self) -> Option<PostId> {
        self.session
            .feed()
            .posts()
            .get(self.selected)
            .map(|post| post.id.clone())
    }

    fn clamp_selection(&mut self) {
        let len = self.session.feed().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.session.feed().len();
        if len == 0 {
            return;
        }
        let next = self.selected as isize + delta;
        self.selected = next.clamp(0, len as isize - 1) as usize;
    }

    /// Returns `Ok(true)` when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        let quit = match self.mode.clone() {
            Mode::Browse => self.handle_browse_key(key.code),
            Mode::Compose => {
                self.handle_compose_key(key.code);
                false
            }
            Mode::Reply(id) => {
                self.handle_reply_key(&id, key);
                false
            }
        };
        self.clamp_selection();
        self.mark_dirty();
        Ok(quit)
    }

    fn handle_browse_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.session.feed().len().saturating_sub(1),
            KeyCode::Char('n') | KeyCode::Char('i') => {
                self.session.page_mut().focus_composer();
                self.mode = Mode::Compose;
                self.status_message =
                    "Compose: type your post, Enter to publish, Esc to cancel.".to_string();
            }
            KeyCode::Char('l') => self.click_selected(Target::like, "Toggled like."),
            KeyCode::Char('t') => self.click_selected(Target::retweet, "Toggled retweet."),
            KeyCode::Char('c') | KeyCode::Tab => {
                self.click_selected(Target::reply_toggle, "Toggled replies.")
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                self.click_selected(Target::remove, "Removed post.")
            }
            KeyCode::Char('r') => {
                if let Some(id) = self.selected_id() {
                    if !self.session.page().replies_shown(&id) {
                        self.session.click(&Target::reply_toggle(&id));
                    }
                    self.session.page_mut().focus_reply(&id);
                    self.mode = Mode::Reply(id);
                    self.status_message =
                        "Reply: Enter to send, Shift+Enter for a new line, Esc to cancel."
                            .to_string();
                }
            }
            _ => {}
        }
        false
    }

    fn click_selected(&mut self, target: fn(&str) -> Target, message: &str) {
        let Some(id) = self.selected_id() else {
            self.status_message = "The feed is empty. Press n to post.".to_string();
            return;
        };
        if self.session.click(&target(&id)) {
            self.status_message = message.to_string();
        }
    }

    fn handle_compose_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.session.page_mut().blur();
                self.mode = Mode::Browse;
                self.status_message = "Draft kept. Press n to continue.".to_string();
            }
            KeyCode::Enter => {
                let before = self.session.feed().len();
                self.session.click(&Target::submit());
                if self.session.feed().len() > before {
                    self.selected = 0;
                    self.session.page_mut().blur();
                    self.mode = Mode::Browse;
                    self.status_message = "Posted.".to_string();
                } else {
                    self.status_message = "Nothing to post yet.".to_string();
                }
            }
            KeyCode::Backspace => {
                self.session.page_mut().composer_mut().pop();
            }
            KeyCode::Char(ch) => self.session.page_mut().composer_mut().push(ch),
            _ => {}
        }
    }

    fn handle_reply_key(&mut self, id: &str, key: KeyEvent) {
        let press = KeyPress {
            key: match key.code {
                KeyCode::Enter => Key::Enter,
                KeyCode::Char(ch) => Key::Char(ch),
                KeyCode::Backspace => Key::Backspace,
                _ => Key::Other,
            },
            shift: key.modifiers.contains(KeyModifiers::SHIFT),
        };
        if key.code == KeyCode::Esc {
            self.session.page_mut().blur();
            self.mode = Mode::Browse;
            self.status_message = "Reply cancelled.".to_string();
            return;
        }

        match self.session.key_down(&Target::reply_input(id), press) {
            KeyOutcome::PreventDefault => {
                debug!(post = %id, "reply sent");
                self.session.page_mut().blur();
                self.mode = Mode::Browse;
                self.status_message = "Reply sent.".to_string();
            }
            KeyOutcome::Default => {
                if !self.session.feed().contains(id) {
                    self.mode = Mode::Browse;
                    return;
                }
                let draft = self.session.page_mut().reply_draft_mut(id);
                match press.key {
                    Key::Enter => draft.push('\n'),
                    Key::Char(ch) => draft.push(ch),
                    Key::Backspace => {
                        draft.pop();
                    }
                    Key::Other => {}
                }
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame<'_>) {
        let full = frame.size();
        frame.render_widget(Block::default().style(Style::default().bg(COLOR_BG)), full);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(full);

        let status_line = Paragraph::new(self.status_message.clone()).style(
            Style::default()
                .fg(COLOR_TEXT_PRIMARY)
                .bg(COLOR_PANEL_FOCUSED_BG)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(status_line, layout[0]);

        self.draw_composer(frame, layout[1]);
        self.draw_feed(frame, layout[2]);

        let footer = Paragraph::new(self.footer_text())
            .style(
                Style::default()
                    .fg(COLOR_TEXT_SECONDARY)
                    .bg(COLOR_PANEL_BG)
                    .add_modifier(Modifier::ITALIC),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(footer, layout[3]);
    }

    fn panel_block(&self, title: &str, focused: bool) -> Block<'static> {
        let border = if focused {
            COLOR_BORDER_FOCUSED
        } else {
            COLOR_BORDER_IDLE
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(Span::styled(
                title.to_string(),
                Style::default().fg(COLOR_ACCENT).add_modifier(Modifier::BOLD),
            ))
            .padding(Padding::horizontal(1))
            .style(Style::default().bg(COLOR_PANEL_BG))
    }

    fn draw_composer(&self, frame: &mut Frame<'_>, area: Rect) {
        let page = self.session.page();
        let focused = page.focus() == Some(&Focus::Composer);
        let text = if page.composer().is_empty() && !focused {
            Span::styled(
                "What's happening?",
                Style::default().fg(COLOR_TEXT_SECONDARY),
            )
        } else {
            Span::styled(
                format!("{}{}", page.composer(), if focused { "▏" } else { "" }),
                Style::default().fg(COLOR_TEXT_PRIMARY),
            )
        };
        let title = format!("{} says", page.viewer().handle);
        let widget = Paragraph::new(Line::from(text))
            .block(self.panel_block(&title, focused))
            .wrap(Wrap { trim: false });
        frame.render_widget(widget, area);
    }

    fn draw_feed(&self, frame: &mut Frame<'_>, area: Rect) {
        let block = self.panel_block(
            &format!("Feed ({})", self.session.feed().len()),
            self.mode != Mode::Compose,
        );
        let inner = block.inner(area);
        let (lines, selected_top, selected_bottom) = self.feed_lines(inner.width as usize);

        let height = inner.height as usize;
        let offset = if selected_bottom > height {
            selected_top.min(selected_bottom - height)
        } else {
            0
        };

        let widget = Paragraph::new(Text::from(lines))
            .block(block)
            .scroll((offset.min(u16::MAX as usize) as u16, 0));
        frame.render_widget(widget, area);
    }

    /// Feed lines for `width` columns plus the line span of the selected post.
    fn feed_lines(&self, width: usize) -> (Vec<Line<'static>>, usize, usize) {
        let page = self.session.page();
        let view = FeedView::new(self.session.feed(), page.viewer());
        let shown: HashSet<&str> = view
            .posts
            .iter()
            .filter(|post| page.replies_shown(&post.id))
            .map(|post| post.id.as_str())
            .collect();

        let mut lines = Vec::new();
        let mut selected_span = (0, 0);
        if view.posts.is_empty() {
            lines.push(Line::from(Span::styled(
                "Nothing here yet. Press n to write the first post.",
                Style::default().fg(COLOR_TEXT_SECONDARY),
            )));
        }
        for (index, post) in view.posts.iter().enumerate() {
            let selected = index == self.selected;
            let start = lines.len();
            let replies_shown = shown.contains(post.id.as_str());
            let mut block = post_lines(post, width, replies_shown);
            if replies_shown {
                let replying = self.mode == Mode::Reply(post.id.clone());
                block.extend(reply_input_lines(
                    page.reply_draft(&post.id),
                    replying,
                    width,
                ));
                block.extend(reply_lines(post, width));
            }
            if selected {
                pad_lines_to_width(&mut block, width as u16);
                for line in block.iter_mut() {
                    for span in line.spans.iter_mut() {
                        span.style = span.style.bg(COLOR_PANEL_SELECTED_BG);
                    }
                }
            }
            lines.extend(block);
            lines.push(Line::default());
            if selected {
                selected_span = (start, lines.len());
            }
        }
        (lines, selected_span.0, selected_span.1)
    }

    fn footer_text(&self) -> String {
        match self.mode {
            Mode::Browse => "j/k move · l like · t retweet · c replies · r reply · n post · x remove · q quit"
                .to_string(),
            Mode::Compose => "Enter publish · Esc cancel".to_string(),
            Mode::Reply(_) => "Enter send · Shift+Enter newline · Esc cancel".to_string(),
        }
    }
}

fn post_lines(post: &PostView, width: usize, replies_shown: bool) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(vec![
        Span::styled(
            post.handle.clone(),
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", post.avatar),
            Style::default().fg(COLOR_TEXT_SECONDARY),
        ),
    ])];
    lines.extend(wrap_plain(
        &post.text,
        width,
        "",
        Style::default().fg(COLOR_TEXT_PRIMARY),
    ));

    let counter = |active: bool, color: Color| {
        if active {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(COLOR_TEXT_SECONDARY)
        }
    };
    lines.push(Line::from(vec![
        Span::styled(
            format!("{ICON_REPLIES} {}", post.reply_count),
            counter(replies_shown, COLOR_ACCENT),
        ),
        Span::raw("   "),
        Span::styled(
            format!("{ICON_LIKE} {}", post.likes),
            counter(post.liked, COLOR_LIKED),
        ),
        Span::raw("   "),
        Span::styled(
            format!("{ICON_RETWEET} {}", post.retweets),
            counter(post.retweeted, COLOR_RETWEETED),
        ),
    ]));

    lines
}

fn reply_lines(post: &PostView, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for reply in &post.replies {
        lines.push(Line::from(Span::styled(
            format!("{REPLY_INDENT}{}", reply.handle),
            Style::default().fg(COLOR_ACCENT),
        )));
        lines.extend(wrap_plain(
            &reply.text,
            width,
            REPLY_INDENT,
            Style::default().fg(COLOR_TEXT_PRIMARY),
        ));
    }
    lines
}

fn reply_input_lines(draft: &str, active: bool, width: usize) -> Vec<Line<'static>> {
    let style = if active {
        Style::default().fg(COLOR_TEXT_PRIMARY)
    } else {
        Style::default().fg(COLOR_TEXT_SECONDARY)
    };
    let text = if draft.is_empty() && !active {
        "Write your reply...".to_string()
    } else if active {
        format!("{draft}▏")
    } else {
        draft.to_string()
    };
    wrap_plain(&text, width, &format!("{REPLY_INDENT}› "), style)
}

fn wrap_plain(text: &str, width: usize, prefix: &str, style: Style) -> Vec<Line<'static>> {
    let available = width.saturating_sub(UnicodeWidthStr::width(prefix)).max(1);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let wrapped = wrap(paragraph, WrapOptions::new(available));
        if wrapped.is_empty() {
            lines.push(Line::from(Span::styled(prefix.to_string(), style)));
            continue;
        }
        for piece in wrapped {
            lines.push(Line::from(Span::styled(format!("{prefix}{piece}"), style)));
        }
    }
    lines
}

fn pad_lines_to_width(lines: &mut [Line<'static>], width: u16) {
    let target = width as usize;
    for line in lines.iter_mut() {
        let current: usize = line
            .spans
            .iter()
            .map(|span| UnicodeWidthStr::width(span.content.as_ref()))
            .sum();
        if current < target {
            line.spans.push(Span::raw(" ".repeat(target - current)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Reducer;
    use crate::feed::{Author, Feed, SequentialIds};

    fn model() -> Model {
        let reducer = Reducer::new(Author::default(), Box::new(SequentialIds::default()));
        Model::new(Options {
            session: Session::new(Feed::seed(), reducer),
            tick_rate: Duration::from_millis(250),
            status_message: String::new(),
        })
    }

    fn press(model: &mut Model, code: KeyCode) -> bool {
        model
            .handle_key(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    fn type_text(model: &mut Model, text: &str) {
        for ch in text.chars() {
            press(model, KeyCode::Char(ch));
        }
    }

    fn total_width(line: &Line<'_>) -> usize {
        line.spans
            .iter()
            .map(|span| UnicodeWidthStr::width(span.content.as_ref()))
            .sum()
    }

    #[test]
    fn like_key_toggles_selected_post() {
        let mut model = model();
        press(&mut model, KeyCode::Char('j'));
        press(&mut model, KeyCode::Char('l'));
        let post = &model.session().feed().posts()[1];
        assert!(post.liked);
        assert_eq!(post.likes, 6501);
    }

    #[test]
    fn compose_and_publish() {
        let mut model = model();
        press(&mut model, KeyCode::Char('n'));
        type_text(&mut model, "hello");
        press(&mut model, KeyCode::Backspace);
        press(&mut model, KeyCode::Enter);
        let feed = model.session().feed();
        assert_eq!(feed.len(), 4);
        assert_eq!(feed.posts()[0].text, "hell");
        assert_eq!(model.mode, Mode::Browse);
        assert_eq!(model.session().page().composer(), "");
    }

    #[test]
    fn empty_publish_keeps_composer_focused() {
        let mut model = model();
        press(&mut model, KeyCode::Char('n'));
        press(&mut model, KeyCode::Enter);
        assert_eq!(model.session().feed().len(), 3);
        assert_eq!(model.mode, Mode::Compose);
        assert_eq!(model.session().page().focus(), Some(&Focus::Composer));
    }

    #[test]
    fn reply_flow_adds_reply_and_collapses() {
        let mut model = model();
        press(&mut model, KeyCode::Char('r'));
        let id = model.session().feed().posts()[0].id.clone();
        assert!(model.session().page().replies_shown(&id));
        type_text(&mut model, "hi");
        model
            .handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT))
            .unwrap();
        type_text(&mut model, "there");
        press(&mut model, KeyCode::Enter);

        let replies = &model.session().feed().posts()[0].replies;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text, "hi\nthere");
        assert!(!model.session().page().replies_shown(&id));
        assert_eq!(model.mode, Mode::Browse);
    }

    #[test]
    fn remove_keeps_selection_in_bounds() {
        let mut model = model();
        press(&mut model, KeyCode::End);
        press(&mut model, KeyCode::Char('x'));
        assert_eq!(model.session().feed().len(), 2);
        assert_eq!(model.selected, 1);
    }

    #[test]
    fn quit_from_browse() {
        let mut model = model();
        assert!(press(&mut model, KeyCode::Char('q')));
    }

    #[test]
    fn feed_lines_cover_selected_post() {
        let mut model = model();
        press(&mut model, KeyCode::Char('j'));
        let (lines, top, bottom) = model.feed_lines(40);
        assert!(top > 0 && bottom > top && bottom <= lines.len());
        assert!(lines[top..bottom]
            .iter()
            .all(|line| line.spans.is_empty() || total_width(line) >= 40));
    }

    #[test]
    fn open_replies_show_input_and_replies() {
        let mut model = model();
        press(&mut model, KeyCode::Char('j'));
        press(&mut model, KeyCode::Char('c'));
        let (lines, _, _) = model.feed_lines(60);
        let text: Vec<String> = lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        let input = text
            .iter()
            .position(|line| line.contains("Write your reply..."))
            .unwrap();
        let reply = text
            .iter()
            .position(|line| line.contains("@TomCruise"))
            .unwrap();
        assert!(input < reply);
    }

    #[test]
    fn wrap_plain_keeps_prefix() {
        let lines = wrap_plain("one two three", 8, "> ", Style::default());
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.spans[0].content.starts_with("> "));
        }
    }
}
