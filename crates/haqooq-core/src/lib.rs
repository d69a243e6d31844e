pub mod citation;
pub mod composer;
pub mod message;
pub mod session;

pub use citation::{extract, AnswerParts, CITATION_MARKER};
pub use composer::{Composer, Trigger, TriggerOutcome};
pub use message::{Message, MessageId, Origin};
pub use session::{
    PendingRequest, RequestToken, Session, SessionError, SessionEvent, SessionResult, SessionState,
    NO_ANSWER_FALLBACK, TRANSPORT_FAILURE_FALLBACK,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
