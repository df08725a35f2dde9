//! Overlay dialog for creating a tag.
//!
//! The slug preview under the title is recomputed from the title on every
//! render. While a submission is in flight the dialog ignores further input;
//! the result is fed back through [`CreateDialog::finish`].

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use tagboard_core::error::{ApiError, CreateError};
use tagboard_core::model::{CreateTagRequest, Tag};
use tagboard_core::mutation::CreateTagForm;
use tagboard_core::QueryCache;

/// The action the dialog wants the caller to take.
#[derive(Debug)]
pub enum DialogAction {
    /// Send this request to the tag service.
    Submit(CreateTagRequest),
    /// The user cancelled; close the dialog.
    Cancel,
}

pub struct CreateDialog {
    form: CreateTagForm,
}

impl CreateDialog {
    pub const fn new(min_title_len: usize) -> Self {
        Self {
            form: CreateTagForm::new(min_title_len),
        }
    }

    pub const fn is_busy(&self) -> bool {
        self.form.is_busy()
    }

    /// Feed a key event to the dialog.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<DialogAction> {
        if self.form.is_busy() {
            return None;
        }
        match key.code {
            KeyCode::Esc => Some(DialogAction::Cancel),
            KeyCode::Enter => self.form.begin_submit().ok().map(DialogAction::Submit),
            KeyCode::Backspace => {
                self.form.pop_char();
                None
            }
            KeyCode::Char(c) => {
                self.form.push_char(c);
                None
            }
            _ => None,
        }
    }

    /// Settle the submission. On success the cache is invalidated and the
    /// caller should close the dialog.
    pub fn finish(
        &mut self,
        result: Result<Tag, ApiError>,
        cache: &mut QueryCache,
    ) -> Result<Tag, CreateError> {
        self.form.finish(result, cache)
    }

    /// Render the dialog as a centered overlay on top of `area`.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let dialog_w: u16 = 60.min(area.width.saturating_sub(4));
        let dialog_h: u16 = 10.min(area.height.saturating_sub(2));
        let dialog_area = Rect {
            x: area.x + area.width.saturating_sub(dialog_w) / 2,
            y: area.y + area.height.saturating_sub(dialog_h) / 2,
            width: dialog_w,
            height: dialog_h,
        };

        frame.render_widget(Clear, dialog_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" New Tag ")
            .title_style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
            .style(Style::default().bg(Color::Black));
        let inner = block.inner(dialog_area);
        frame.render_widget(block, dialog_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(inner);

        let border = if self.form.field_error().is_some() {
            Color::Red
        } else {
            Color::Yellow
        };
        let title_para = Paragraph::new(format!("{}_", self.form.title()))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Title ")
                    .border_style(Style::default().fg(border)),
            )
            .style(Style::default().fg(Color::White));
        frame.render_widget(title_para, chunks[0]);

        let slug = Line::from(vec![
            Span::styled("slug: ", Style::default().fg(Color::DarkGray)),
            Span::styled(self.form.slug(), Style::default().fg(Color::Cyan)),
        ]);
        frame.render_widget(Paragraph::new(slug), chunks[1]);

        if let Some(message) = self.message() {
            frame.render_widget(
                Paragraph::new(message).style(Style::default().fg(Color::Red)),
                chunks[2],
            );
        }

        let hints = if self.form.is_busy() {
            Line::from(Span::styled("Saving…", Style::default().fg(Color::Yellow)))
        } else {
            Line::from(vec![
                Span::styled("Enter", Style::default().fg(Color::Yellow)),
                Span::raw(" save  "),
                Span::styled("Esc", Style::default().fg(Color::Yellow)),
                Span::raw(" cancel"),
            ])
        };
        frame.render_widget(Paragraph::new(hints), chunks[4]);
    }

    fn message(&self) -> Option<String> {
        self.form.error().map(|err| match err {
            CreateError::Validation(v) => v.to_string(),
            other => format!("Could not save: {other}"),
        })
    }

    #[cfg(test)]
    pub fn title(&self) -> &str {
        self.form.title()
    }
}
