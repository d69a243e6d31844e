use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::message::{Message, MessageId, Origin};

/// Assistant text used when the service answered without a usable answer
pub const NO_ANSWER_FALLBACK: &str = "Sorry, I couldn't get a response.";

/// Assistant text used when the request itself failed
pub const TRANSPORT_FAILURE_FALLBACK: &str = "Error connecting to backend. Please try again later.";

/// Correlates an outbound request with its completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// A request the caller must hand to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub token: RequestToken,
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Awaiting(RequestToken),
}

/// Inputs to the session state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The user asked something
    Submit(String),
    /// The service replied; `answer` is the raw answer field, if any
    Answered {
        token: RequestToken,
        answer: Option<String>,
    },
    /// The request failed before a usable reply arrived
    TransportFailed { token: RequestToken },
}

/// Why an event was rejected. A rejected event leaves the session untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("input is empty")]
    EmptyInput,

    #[error("a request is already in flight ({0})")]
    Busy(RequestToken),

    #[error("no request is in flight")]
    NotAwaiting,

    #[error("completion for {got} does not match outstanding {expected}")]
    StaleToken {
        expected: RequestToken,
        got: RequestToken,
    },
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Client-side conversation state for one program run.
///
/// Messages are append-only. At most one request is outstanding at a time;
/// completions carrying any other token are discarded.
#[derive(Debug, Clone)]
pub struct Session {
    messages: Vec<Message>,
    state: SessionState,
    next_token: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            state: SessionState::Idle,
            next_token: 1,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, SessionState::Awaiting(_))
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    /// Token of the outstanding request, if any
    pub fn in_flight(&self) -> Option<RequestToken> {
        match self.state {
            SessionState::Awaiting(token) => Some(token),
            SessionState::Idle => None,
        }
    }

    /// Whether `submit(text)` would be accepted right now
    pub fn can_submit(&self, text: &str) -> bool {
        self.is_idle() && !text.trim().is_empty()
    }

    /// Dispatch an event. Returns the request to issue for an accepted `Submit`.
    pub fn apply(&mut self, event: SessionEvent) -> SessionResult<Option<PendingRequest>> {
        match event {
            SessionEvent::Submit(text) => self.submit(&text).map(Some),
            SessionEvent::Answered { token, answer } => {
                self.on_result(token, answer.as_deref()).map(|_| None)
            }
            SessionEvent::TransportFailed { token } => {
                self.on_transport_failure(token).map(|_| None)
            }
        }
    }

    /// Append the trimmed text as a user message and move to `Awaiting`.
    pub fn submit(&mut self, text: &str) -> SessionResult<PendingRequest> {
        if let SessionState::Awaiting(token) = self.state {
            return Err(SessionError::Busy(token));
        }
        let query = text.trim();
        if query.is_empty() {
            return Err(SessionError::EmptyInput);
        }

        let token = RequestToken(self.next_token);
        self.next_token += 1;

        self.push(Origin::User, query.to_string());
        self.state = SessionState::Awaiting(token);
        debug!(%token, len = query.len(), "session awaiting answer");

        Ok(PendingRequest {
            token,
            query: query.to_string(),
        })
    }

    /// Append the service's answer, or the no-answer fallback when it is
    /// missing or empty, and return to `Idle`.
    pub fn on_result(&mut self, token: RequestToken, answer: Option<&str>) -> SessionResult<MessageId> {
        self.settle(token)?;
        let text = match answer {
            Some(answer) if !answer.is_empty() => answer.to_string(),
            _ => NO_ANSWER_FALLBACK.to_string(),
        };
        Ok(self.push(Origin::Assistant, text))
    }

    /// Append the transport-failure fallback and return to `Idle`.
    pub fn on_transport_failure(&mut self, token: RequestToken) -> SessionResult<MessageId> {
        self.settle(token)?;
        Ok(self.push(Origin::Assistant, TRANSPORT_FAILURE_FALLBACK.to_string()))
    }

    fn settle(&mut self, token: RequestToken) -> SessionResult<()> {
        match self.state {
            SessionState::Idle => Err(SessionError::NotAwaiting),
            SessionState::Awaiting(expected) if expected != token => {
                debug!(%expected, got = %token, "discarding stale completion");
                Err(SessionError::StaleToken { expected, got: token })
            }
            SessionState::Awaiting(_) => {
                self.state = SessionState::Idle;
                Ok(())
            }
        }
    }

    fn push(&mut self, origin: Origin, text: String) -> MessageId {
        let id = self.messages.last().map_or(1, |m| m.id + 1);
        let message = match origin {
            Origin::User => Message::user(id, text),
            Origin::Assistant => Message::assistant(id, text),
        };
        self.messages.push(message);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_idle_and_empty() {
        let session = Session::new();
        assert!(session.is_idle());
        assert!(!session.is_pending());
        assert!(session.is_empty());
        assert_eq!(session.in_flight(), None);
    }

    #[test]
    fn test_submit_appends_user_message_and_awaits() {
        let mut session = Session::new();
        let request = session.submit("  What is Section 302 PPC?  ").unwrap();

        assert_eq!(request.query, "What is Section 302 PPC?");
        assert_eq!(session.len(), 1);
        assert_eq!(session.messages()[0].text, "What is Section 302 PPC?");
        assert!(session.messages()[0].is_user());
        assert!(session.is_pending());
        assert_eq!(session.in_flight(), Some(request.token));
    }

    #[test]
    fn test_submit_blank_is_noop() {
        let mut session = Session::new();
        for blank in ["", "   ", "\n\t  \n"] {
            assert_eq!(session.submit(blank), Err(SessionError::EmptyInput));
        }
        assert!(session.is_empty());
        assert!(session.is_idle());
    }

    #[test]
    fn test_submit_while_awaiting_is_rejected() {
        let mut session = Session::new();
        let first = session.submit("first").unwrap();
        let err = session.submit("second").unwrap_err();

        assert_eq!(err, SessionError::Busy(first.token));
        assert_eq!(session.len(), 1);
        assert_eq!(session.in_flight(), Some(first.token));
    }

    #[test]
    fn test_on_result_appends_answer() {
        let mut session = Session::new();
        let request = session.submit("q").unwrap();
        let id = session
            .on_result(request.token, Some("It defines murder. Source: PPC 1860"))
            .unwrap();

        assert_eq!(id, 2);
        assert!(session.is_idle());
        let reply = &session.messages()[1];
        assert!(reply.is_assistant());
        let parts = reply.parts();
        assert_eq!(parts.body, "It defines murder.");
        assert_eq!(parts.citation, Some("PPC 1860"));
    }

    #[test]
    fn test_empty_or_missing_answer_uses_fallback() {
        let mut session = Session::new();
        let request = session.submit("q1").unwrap();
        session.on_result(request.token, Some("")).unwrap();
        assert_eq!(session.messages()[1].text, NO_ANSWER_FALLBACK);

        let request = session.submit("q2").unwrap();
        session.on_result(request.token, None).unwrap();
        assert_eq!(session.messages()[3].text, NO_ANSWER_FALLBACK);
    }

    #[test]
    fn test_transport_failure_uses_fallback() {
        let mut session = Session::new();
        let request = session.submit("q").unwrap();
        session.on_transport_failure(request.token).unwrap();

        assert!(session.is_idle());
        assert_eq!(session.messages()[1].text, TRANSPORT_FAILURE_FALLBACK);
        assert!(session.messages()[1].is_assistant());
    }

    #[test]
    fn test_completion_without_request_is_rejected() {
        let mut session = Session::new();
        let request = session.submit("q").unwrap();
        session.on_result(request.token, Some("a")).unwrap();

        assert_eq!(
            session.on_result(request.token, Some("again")),
            Err(SessionError::NotAwaiting)
        );
        assert_eq!(
            session.on_transport_failure(request.token),
            Err(SessionError::NotAwaiting)
        );
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn test_stale_token_is_discarded() {
        let mut session = Session::new();
        let first = session.submit("first").unwrap();
        session.on_transport_failure(first.token).unwrap();
        let second = session.submit("second").unwrap();

        let err = session.on_result(first.token, Some("late answer")).unwrap_err();
        assert_eq!(
            err,
            SessionError::StaleToken {
                expected: second.token,
                got: first.token
            }
        );
        assert!(session.is_pending());
        assert_eq!(session.len(), 3);

        session.on_result(second.token, Some("on time")).unwrap();
        assert_eq!(session.messages()[3].text, "on time");
    }

    #[test]
    fn test_tokens_and_ids_increase() {
        let mut session = Session::new();
        let a = session.submit("a").unwrap();
        session.on_result(a.token, Some("x")).unwrap();
        let b = session.submit("b").unwrap();

        assert!(b.token.value() > a.token.value());
        let ids: Vec<_> = session.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_alternation_after_round_trips() {
        let mut session = Session::new();
        for n in 0..5 {
            let request = session.submit(&format!("question {}", n)).unwrap();
            if n % 2 == 0 {
                session.on_result(request.token, Some("answer")).unwrap();
            } else {
                session.on_transport_failure(request.token).unwrap();
            }
        }

        assert_eq!(session.len(), 10);
        for (idx, msg) in session.messages().iter().enumerate() {
            let expected = if idx % 2 == 0 { Origin::User } else { Origin::Assistant };
            assert_eq!(msg.origin, expected, "message {} out of order", idx);
        }
    }

    #[test]
    fn test_apply_dispatches_events() {
        let mut session = Session::new();
        let request = session
            .apply(SessionEvent::Submit("hello".to_string()))
            .unwrap()
            .expect("submit yields a request");

        let done = session
            .apply(SessionEvent::Answered {
                token: request.token,
                answer: Some("hi".to_string()),
            })
            .unwrap();
        assert!(done.is_none());
        assert!(session.is_idle());

        assert_eq!(
            session.apply(SessionEvent::TransportFailed { token: request.token }),
            Err(SessionError::NotAwaiting)
        );
    }

    #[test]
    fn test_pending_tracks_outstanding_request() {
        let mut session = Session::new();
        assert!(!session.is_pending());
        let request = session.submit("q").unwrap();
        assert!(session.is_pending());
        assert!(!session.can_submit("another"));
        session.on_result(request.token, Some("a")).unwrap();
        assert!(!session.is_pending());
        assert!(session.can_submit("another"));
        assert!(!session.can_submit("   "));
    }
}
