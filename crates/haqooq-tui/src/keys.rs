use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use haqooq_core::Trigger;

/// What a key press asks the app to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Trigger(Trigger),
    Insert(char),
    Backspace,
    ClearInput,
    ScrollUp(usize),
    ScrollDown(usize),
    ScrollTop,
    ScrollBottom,
}

const PAGE: usize = 10;

/// Map a terminal key event to an action.
///
/// Shift+Enter inserts a newline. When the terminal cannot report shift on
/// Enter (`shift_reported` is false), Alt+Enter stands in for it.
pub fn map_key(key: KeyEvent, shift_reported: bool) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let action = match key.code {
        KeyCode::Char('c') if ctrl => Action::Quit,
        KeyCode::Char('s') if ctrl => Action::Trigger(Trigger::Activate),
        KeyCode::Char('u') if ctrl => Action::ClearInput,
        KeyCode::Char('j') if ctrl => Action::Trigger(Trigger::Enter { shift: true }),
        KeyCode::Esc => Action::Quit,
        KeyCode::Enter => {
            let line_break = if shift_reported {
                KeyModifiers::SHIFT
            } else {
                KeyModifiers::SHIFT | KeyModifiers::ALT
            };
            let shift = key.modifiers.intersects(line_break);
            Action::Trigger(Trigger::Enter { shift })
        }
        KeyCode::Char(c) if !ctrl => Action::Insert(c),
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Up => Action::ScrollUp(1),
        KeyCode::Down => Action::ScrollDown(1),
        KeyCode::PageUp => Action::ScrollUp(PAGE),
        KeyCode::PageDown => Action::ScrollDown(PAGE),
        KeyCode::Home => Action::ScrollTop,
        KeyCode::End => Action::ScrollBottom,
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_enter_submits() {
        assert_eq!(
            map_key(press(KeyCode::Enter, KeyModifiers::NONE), true),
            Some(Action::Trigger(Trigger::Enter { shift: false }))
        );
    }

    #[test]
    fn test_shift_enter_is_line_break() {
        for shift_reported in [true, false] {
            assert_eq!(
                map_key(press(KeyCode::Enter, KeyModifiers::SHIFT), shift_reported),
                Some(Action::Trigger(Trigger::Enter { shift: true }))
            );
        }
    }

    #[test]
    fn test_alt_enter_is_line_break_only_without_shift_reporting() {
        assert_eq!(
            map_key(press(KeyCode::Enter, KeyModifiers::ALT), true),
            Some(Action::Trigger(Trigger::Enter { shift: false }))
        );
        assert_eq!(
            map_key(press(KeyCode::Enter, KeyModifiers::ALT), false),
            Some(Action::Trigger(Trigger::Enter { shift: true }))
        );
    }

    #[test]
    fn test_control_keys() {
        assert_eq!(
            map_key(press(KeyCode::Char('c'), KeyModifiers::CONTROL), true),
            Some(Action::Quit)
        );
        assert_eq!(
            map_key(press(KeyCode::Char('s'), KeyModifiers::CONTROL), true),
            Some(Action::Trigger(Trigger::Activate))
        );
        assert_eq!(
            map_key(press(KeyCode::Char('x'), KeyModifiers::CONTROL), true),
            None
        );
    }

    #[test]
    fn test_characters_are_inserted() {
        assert_eq!(
            map_key(press(KeyCode::Char('A'), KeyModifiers::SHIFT), true),
            Some(Action::Insert('A'))
        );
    }

    #[test]
    fn test_release_events_are_ignored() {
        let release = KeyEvent {
            code: KeyCode::Enter,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(map_key(release, true), None);
    }

    #[test]
    fn test_scroll_keys() {
        assert_eq!(
            map_key(press(KeyCode::PageUp, KeyModifiers::NONE), true),
            Some(Action::ScrollUp(PAGE))
        );
        assert_eq!(
            map_key(press(KeyCode::End, KeyModifiers::NONE), true),
            Some(Action::ScrollBottom)
        );
    }
}
