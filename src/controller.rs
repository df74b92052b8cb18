use std::sync::mpsc::Receiver;
use std::time::Duration;

use ratatui::crossterm::event::{self, Event, KeyCode};
use tracing::trace;

use crate::domain::{Message, RechnikError, ViewerConfig};
use crate::model::Model;

pub struct Controller {
    event_poll_time: u64,
    outcomes: Receiver<Message>,
}

impl Controller {
    pub fn new(cfg: &ViewerConfig, outcomes: Receiver<Message>) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
            outcomes,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, RechnikError> {
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            return Ok(self.handle_key(model, key));
        }
        Ok(None)
    }

    /// Next fetch outcome from the worker, if one has arrived.
    pub fn poll_outcome(&self) -> Option<Message> {
        self.outcomes.try_recv().ok()
    }

    fn handle_key(&self, model: &Model, key: event::KeyEvent) -> Option<Message> {
        if model.raw_keyevents() {
            return Some(Message::RawKey(key));
        }
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Left | KeyCode::Char('p') => Some(Message::PrevPage),
            KeyCode::Right | KeyCode::Char('n') => Some(Message::NextPage),
            KeyCode::Up | KeyCode::Char('k') => Some(Message::MoveUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Message::MoveDown),
            KeyCode::PageUp => Some(Message::MovePageUp),
            KeyCode::PageDown => Some(Message::MovePageDown),
            KeyCode::Home | KeyCode::Char('g') => Some(Message::MoveBeginning),
            KeyCode::End | KeyCode::Char('G') => Some(Message::MoveEnd),
            KeyCode::Char('/') => Some(Message::EnterSearch),
            KeyCode::Char('d') => Some(Message::CycleDataset),
            KeyCode::Char('r') => Some(Message::Reload),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Esc => Some(Message::Exit),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
