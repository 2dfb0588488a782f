use std::time::Duration;
use tracing::trace;

use ratatui::crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crate::config::AppConfig;
use crate::domain::{AppError, Message};
use crate::model::Model;

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &AppConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, AppError> {
        if event::poll(Duration::from_millis(self.event_poll_time))? {
            match event::read()? {
                Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                    return Ok(self.handle_key(key, model.raw_keyevents()));
                }
                Event::Resize(width, height) => {
                    return Ok(Some(Message::Resize(width as usize, height as usize)));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn handle_key(&self, key: event::KeyEvent, raw: bool) -> Option<Message> {
        let message = if raw {
            match (key.code, key.modifiers) {
                (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
                _ => Some(Message::RawKey(key)),
            }
        } else {
            match key.code {
                KeyCode::Char('q') => Some(Message::Quit),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    Some(Message::Quit)
                }
                KeyCode::Up | KeyCode::Char('k') => Some(Message::MoveUp),
                KeyCode::Down | KeyCode::Char('j') => Some(Message::MoveDown),
                KeyCode::Left | KeyCode::Char('h') => Some(Message::MoveLeft),
                KeyCode::Right | KeyCode::Char('l') => Some(Message::MoveRight),
                KeyCode::PageDown | KeyCode::Char('n') => Some(Message::NextPage),
                KeyCode::PageUp | KeyCode::Char('p') => Some(Message::PrevPage),
                KeyCode::Home | KeyCode::Char('g') => Some(Message::FirstPage),
                KeyCode::End | KeyCode::Char('G') => Some(Message::LastPage),
                KeyCode::Char('+') => Some(Message::LargerPages),
                KeyCode::Char('-') => Some(Message::SmallerPages),
                KeyCode::Char('s') => Some(Message::SortAscending),
                KeyCode::Char('S') => Some(Message::SortDescending),
                KeyCode::Char('c') => Some(Message::ClearSort),
                KeyCode::Enter | KeyCode::Char('v') => Some(Message::Activate),
                KeyCode::Char('y') => Some(Message::CopyRow),
                KeyCode::Char('r') => Some(Message::Retry),
                KeyCode::Char('L') => Some(Message::Logout),
                KeyCode::Char('?') => Some(Message::Help),
                KeyCode::Esc => Some(Message::Exit),
                _ => None,
            }
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputter::key;

    fn controller() -> Controller {
        Controller::new(&AppConfig::default())
    }

    #[test]
    fn dashboard_keys() {
        let c = controller();
        assert!(matches!(c.handle_key(key(KeyCode::Char('n')), false), Some(Message::NextPage)));
        assert!(matches!(c.handle_key(key(KeyCode::PageUp), false), Some(Message::PrevPage)));
        assert!(matches!(c.handle_key(key(KeyCode::Enter), false), Some(Message::Activate)));
        assert!(matches!(c.handle_key(key(KeyCode::Esc), false), Some(Message::Exit)));
        assert!(matches!(c.handle_key(key(KeyCode::Char('q')), false), Some(Message::Quit)));
        assert!(c.handle_key(key(KeyCode::F(5)), false).is_none());
    }

    #[test]
    fn raw_mode_forwards_keys_except_ctrl_c() {
        let c = controller();
        assert!(matches!(
            c.handle_key(key(KeyCode::Char('q')), true),
            Some(Message::RawKey(_))
        ));
        let ctrl_c = event::KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(matches!(c.handle_key(ctrl_c, true), Some(Message::Quit)));
    }
}
