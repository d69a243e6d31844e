use crate::session::{PendingRequest, Session};

/// Input gestures that may submit the draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Explicit send control
    Activate,
    /// Enter key; with shift it inserts a line break instead of sending
    Enter { shift: bool },
}

/// Result of feeding a trigger to the composer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A line break was inserted into the draft
    LineBreak,
    /// Nothing happened: empty draft or a request is in flight
    Ignored,
    /// The draft was taken and submitted
    Submitted(PendingRequest),
}

/// The input buffer the user types into
#[derive(Debug, Clone, Default)]
pub struct Composer {
    draft: String,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_blank(&self) -> bool {
        self.draft.trim().is_empty()
    }

    pub fn push(&mut self, c: char) {
        self.draft.push(c);
    }

    pub fn push_str(&mut self, s: &str) {
        self.draft.push_str(s);
    }

    pub fn pop(&mut self) {
        self.draft.pop();
    }

    pub fn clear(&mut self) {
        self.draft.clear();
    }

    pub fn line_count(&self) -> usize {
        self.draft.split('\n').count()
    }

    /// Whether a send gesture would do anything right now
    pub fn can_send(&self, session: &Session) -> bool {
        session.can_submit(&self.draft)
    }

    /// Apply a trigger against `session`.
    ///
    /// On submission the draft is cleared in the same step, so a second
    /// trigger cannot resend the same text.
    pub fn trigger(&mut self, trigger: Trigger, session: &mut Session) -> TriggerOutcome {
        match trigger {
            Trigger::Enter { shift: true } => {
                self.draft.push('\n');
                TriggerOutcome::LineBreak
            }
            Trigger::Enter { shift: false } | Trigger::Activate => {
                if !self.can_send(session) {
                    return TriggerOutcome::Ignored;
                }
                let text = std::mem::take(&mut self.draft);
                match session.submit(&text) {
                    Ok(request) => TriggerOutcome::Submitted(request),
                    Err(_) => {
                        self.draft = text;
                        TriggerOutcome::Ignored
                    }
                }
            }
        }
    }
}
