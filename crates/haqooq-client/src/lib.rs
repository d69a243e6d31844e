pub mod client;
pub mod error;

pub use client::{completion_event, AnswerClient, AnswerService, AskRequest, AskResponse, DEFAULT_ENDPOINT};
pub use error::{ClientError, ClientResult};
