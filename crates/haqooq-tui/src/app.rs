use std::sync::Arc;

use haqooq_client::{completion_event, AnswerService, AskResponse, ClientResult};
use haqooq_config::UiConfig;
use haqooq_core::{Composer, PendingRequest, RequestToken, Session, Trigger, TriggerOutcome};
use haqooq_observability::request_span;
use tokio::sync::mpsc;
use tracing::{debug, info, Instrument};

use crate::keys::Action;

/// A finished request, delivered back to the UI loop
#[derive(Debug)]
pub struct Completion {
    pub token: RequestToken,
    pub result: ClientResult<AskResponse>,
}

pub struct App {
    service: Arc<dyn AnswerService>,
    pub session: Session,
    pub composer: Composer,
    pub ui: UiConfig,
    pub endpoint: String,
    /// Lines scrolled up from the bottom of the transcript; 0 follows the latest message
    pub scroll_offset: usize,
    /// Largest useful scroll offset, refreshed on every draw
    pub max_scroll: usize,
    pub tick: u64,
    seen_messages: usize,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    should_quit: bool,
}

impl App {
    pub fn new(service: Arc<dyn AnswerService>, ui: UiConfig, endpoint: &str) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            service,
            session: Session::new(),
            composer: Composer::new(),
            ui,
            endpoint: endpoint.to_string(),
            scroll_offset: 0,
            max_scroll: 0,
            tick: 0,
            seen_messages: 0,
            completion_tx,
            completion_rx,
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn is_pending(&self) -> bool {
        self.session.is_pending()
    }

    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Trigger(trigger) => self.trigger(trigger),
            Action::Insert(c) => self.composer.push(c),
            Action::Backspace => self.composer.pop(),
            Action::ClearInput => self.composer.clear(),
            Action::ScrollUp(n) => self.scroll_up(n),
            Action::ScrollDown(n) => self.scroll_down(n),
            Action::ScrollTop => self.scroll_offset = self.max_scroll,
            Action::ScrollBottom => self.scroll_offset = 0,
        }
    }

    /// Insert pasted text into the draft. Pasted line breaks never send.
    pub fn paste(&mut self, text: &str) {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        self.composer.push_str(&normalized);
    }

    /// Feed a send/newline gesture to the composer and dispatch any request it produces.
    pub fn trigger(&mut self, trigger: Trigger) {
        match self.composer.trigger(trigger, &mut self.session) {
            TriggerOutcome::Submitted(request) => {
                self.follow_latest();
                self.dispatch(request);
            }
            TriggerOutcome::LineBreak => {}
            TriggerOutcome::Ignored => {
                debug!(pending = self.session.is_pending(), "send ignored");
            }
        }
    }

    fn dispatch(&self, request: PendingRequest) {
        let service = Arc::clone(&self.service);
        let tx = self.completion_tx.clone();
        let span = request_span(&request.token.to_string());
        info!(token = %request.token, len = request.query.len(), "sending question");

        tokio::spawn(
            async move {
                let result = service.ask(&request.query).await;
                if tx
                    .send(Completion {
                        token: request.token,
                        result,
                    })
                    .is_err()
                {
                    debug!("ui loop gone, dropping completion");
                }
            }
            .instrument(span),
        );
    }

    /// Apply every completion that has arrived since the last frame.
    pub fn process_completions(&mut self) {
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.apply_completion(completion);
        }
    }

    pub(crate) fn apply_completion(&mut self, completion: Completion) {
        let event = completion_event(completion.token, completion.result);
        if let Err(e) = self.session.apply(event) {
            debug!(error = %e, "completion discarded");
        }
        self.follow_latest();
    }

    /// Jump back to the bottom whenever the transcript grew
    fn follow_latest(&mut self) {
        if self.session.len() != self.seen_messages {
            self.seen_messages = self.session.len();
            self.scroll_offset = 0;
        }
    }

    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = (self.scroll_offset + lines).min(self.max_scroll);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use haqooq_client::ClientError;
    use haqooq_core::{NO_ANSWER_FALLBACK, TRANSPORT_FAILURE_FALLBACK};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Answer service that replays canned results and records queries
    struct MockAnswerService {
        results: Mutex<VecDeque<ClientResult<AskResponse>>>,
        queries: Mutex<Vec<String>>,
    }

    impl MockAnswerService {
        fn new(results: Vec<ClientResult<AskResponse>>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results.into()),
                queries: Mutex::new(Vec::new()),
            })
        }

        fn answering(answer: &str) -> Arc<Self> {
            Self::new(vec![Ok(AskResponse {
                status: Some("success".to_string()),
                answer: Some(answer.to_string()),
                message: None,
            })])
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AnswerService for MockAnswerService {
        async fn ask(&self, query: &str) -> ClientResult<AskResponse> {
            self.queries.lock().unwrap().push(query.to_string());
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(AskResponse::default()))
        }
    }

    fn app_with(service: Arc<MockAnswerService>) -> App {
        App::new(service, UiConfig::default(), "http://test/ask/")
    }

    async fn settle(app: &mut App) {
        let completion = app.completion_rx.recv().await.expect("completion");
        app.apply_completion(completion);
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_action(Action::Insert(c));
        }
    }

    #[tokio::test]
    async fn test_round_trip_with_citation() {
        let service = MockAnswerService::answering("It defines murder. Source: PPC 1860");
        let mut app = app_with(service.clone());

        type_text(&mut app, "What is Section 302 PPC?");
        app.handle_action(Action::Trigger(Trigger::Enter { shift: false }));

        assert!(app.is_pending());
        assert!(app.composer.draft().is_empty());
        assert_eq!(app.session.len(), 1);

        settle(&mut app).await;

        assert!(!app.is_pending());
        assert_eq!(service.queries(), vec!["What is Section 302 PPC?".to_string()]);
        let parts = app.session.messages()[1].parts();
        assert_eq!(parts.body, "It defines murder.");
        assert_eq!(parts.citation, Some("PPC 1860"));
    }

    #[tokio::test]
    async fn test_shift_enter_does_not_send() {
        let service = MockAnswerService::answering("unused");
        let mut app = app_with(service.clone());

        type_text(&mut app, "line one");
        app.handle_action(Action::Trigger(Trigger::Enter { shift: true }));

        assert!(app.session.is_empty());
        assert!(!app.is_pending());
        assert_eq!(app.composer.draft(), "line one\n");
        tokio::task::yield_now().await;
        assert!(service.queries().is_empty());
    }

    #[tokio::test]
    async fn test_blank_input_does_not_send() {
        let service = MockAnswerService::answering("unused");
        let mut app = app_with(service.clone());

        type_text(&mut app, "   ");
        app.handle_action(Action::Trigger(Trigger::Activate));

        assert!(app.session.is_empty());
        tokio::task::yield_now().await;
        assert!(service.queries().is_empty());
    }

    #[tokio::test]
    async fn test_second_send_while_pending_is_ignored() {
        let service = MockAnswerService::answering("first answer");
        let mut app = app_with(service.clone());

        type_text(&mut app, "first");
        app.handle_action(Action::Trigger(Trigger::Activate));
        type_text(&mut app, "second");
        app.handle_action(Action::Trigger(Trigger::Activate));

        assert_eq!(app.session.len(), 1);
        assert_eq!(app.composer.draft(), "second");

        settle(&mut app).await;
        assert_eq!(service.queries(), vec!["first".to_string()]);
        assert_eq!(app.session.len(), 2);
    }

    #[tokio::test]
    async fn test_failures_become_fallback_messages() {
        let service = MockAnswerService::new(vec![
            Err(ClientError::Status {
                status: 502,
                body: "Bad Gateway".to_string(),
            }),
            Ok(AskResponse {
                status: Some("success".to_string()),
                answer: Some(String::new()),
                message: None,
            }),
        ]);
        let mut app = app_with(service);

        type_text(&mut app, "q1");
        app.handle_action(Action::Trigger(Trigger::Activate));
        settle(&mut app).await;
        assert_eq!(app.session.messages()[1].text, TRANSPORT_FAILURE_FALLBACK);

        type_text(&mut app, "q2");
        app.handle_action(Action::Trigger(Trigger::Activate));
        settle(&mut app).await;
        assert_eq!(app.session.messages()[3].text, NO_ANSWER_FALLBACK);
    }

    #[tokio::test]
    async fn test_every_append_scrolls_to_bottom() {
        let service = MockAnswerService::answering("answer");
        let mut app = app_with(service);
        app.max_scroll = 50;
        app.scroll_up(20);
        assert_eq!(app.scroll_offset, 20);

        type_text(&mut app, "question");
        app.handle_action(Action::Trigger(Trigger::Activate));
        assert_eq!(app.scroll_offset, 0, "user message should scroll");

        app.scroll_up(5);
        settle(&mut app).await;
        assert_eq!(app.scroll_offset, 0, "assistant message should scroll");
    }

    #[tokio::test]
    async fn test_process_completions_drains_channel() {
        let service = MockAnswerService::answering("done");
        let mut app = app_with(service);

        type_text(&mut app, "q");
        app.handle_action(Action::Trigger(Trigger::Activate));

        for _ in 0..100 {
            app.process_completions();
            if !app.is_pending() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert!(!app.is_pending());
        assert_eq!(app.session.messages()[1].text, "done");
    }

    #[tokio::test]
    async fn test_multiline_paste_stays_in_draft() {
        let service = MockAnswerService::answering("unused");
        let mut app = app_with(service.clone());

        app.paste("first line\r\nsecond line\rthird");

        assert_eq!(app.composer.draft(), "first line\nsecond line\nthird");
        assert!(app.session.is_empty());
        assert!(!app.is_pending());

        app.handle_action(Action::Trigger(Trigger::Activate));
        settle(&mut app).await;
        assert_eq!(
            service.queries(),
            vec!["first line\nsecond line\nthird".to_string()]
        );
    }

    #[test]
    fn test_scroll_is_clamped() {
        let service = MockAnswerService::answering("unused");
        let mut app = app_with(service);
        app.max_scroll = 3;
        app.scroll_up(10);
        assert_eq!(app.scroll_offset, 3);
        app.scroll_down(10);
        assert_eq!(app.scroll_offset, 0);
        app.handle_action(Action::ScrollTop);
        assert_eq!(app.scroll_offset, 3);
        app.handle_action(Action::Quit);
        assert!(app.should_quit());
    }
}
