use super::*;

#[test]
fn test_section_302_round_trip() {
    let mut session = Session::new();
    let mut composer = Composer::new();
    composer.push_str("What is Section 302 PPC?");

    let request = match composer.trigger(Trigger::Enter { shift: false }, &mut session) {
        TriggerOutcome::Submitted(request) => request,
        other => panic!("expected submission, got {:?}", other),
    };
    assert_eq!(request.query, "What is Section 302 PPC?");
    assert_eq!(session.messages()[0].text, "What is Section 302 PPC?");
    assert!(session.is_pending());

    session
        .apply(SessionEvent::Answered {
            token: request.token,
            answer: Some("It defines murder. Source: PPC 1860".to_string()),
        })
        .unwrap();

    let reply = session.messages().last().unwrap();
    let parts = reply.parts();
    assert_eq!(parts.body, "It defines murder.");
    assert_eq!(parts.citation, Some("PPC 1860"));
    assert!(!session.is_pending());
}

#[test]
fn test_empty_answer_scenario() {
    let mut session = Session::new();
    let request = session.submit("anything").unwrap();
    session.on_result(request.token, Some("")).unwrap();
    assert_eq!(session.messages()[1].text, "Sorry, I couldn't get a response.");
}

#[test]
fn test_transport_failure_scenario() {
    let mut session = Session::new();
    let request = session.submit("anything").unwrap();
    session
        .apply(SessionEvent::TransportFailed { token: request.token })
        .unwrap();
    assert_eq!(
        session.messages()[1].text,
        "Error connecting to backend. Please try again later."
    );
}

#[test]
fn test_shift_enter_scenario() {
    let mut session = Session::new();
    let mut composer = Composer::new();
    composer.push_str("Is bail available?");

    let outcome = composer.trigger(Trigger::Enter { shift: true }, &mut session);
    assert_eq!(outcome, TriggerOutcome::LineBreak);
    assert!(session.is_empty());
    assert!(session.is_idle());
}

#[test]
fn test_fallback_texts_have_no_citation() {
    for text in [NO_ANSWER_FALLBACK, TRANSPORT_FAILURE_FALLBACK] {
        assert!(!extract(text).has_citation());
    }
}
