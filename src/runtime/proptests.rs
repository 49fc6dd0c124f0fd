//! Property-based tests for speech exchanges

use super::testing::{sample_config, MockLlm};
use super::{TurnEngine, TurnOutcome};
use crate::session::{Role, SessionStore};
use proptest::prelude::*;
use std::sync::Arc;

/// Recognized speech with at least one visible character, padded and
/// broken across lines the way recognizers sometimes return it
fn arb_speech() -> impl Strategy<Value = String> {
    prop_oneof![
        "[ \t\n]{0,3}\\PC{0,12}[^\\s]\\PC{0,12}[ \t\n]{0,3}",
        "[a-zé日本😀]{1,6}\n[a-z]{0,6}\n[0-9 ]{0,4}[a-z]",
        "\\x{00A0}{0,2}[^\\s]{1,8}\\x{3000}{0,2}",
    ]
}

fn arb_blank() -> impl Strategy<Value = String> {
    "[ \t\r\n\\x{00A0}\\x{2003}\\x{3000}]{0,12}"
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn setup(llm: Arc<MockLlm>) -> (Arc<SessionStore>, TurnEngine, String) {
    let store = Arc::new(SessionStore::default());
    let id = store.create(sample_config()).session_id;
    store.ensure_greeting_captured(&id, "Hi, this is Aurora").unwrap();
    (store.clone(), TurnEngine::new(store, llm), id)
}

proptest! {
    #[test]
    fn prop_speech_appends_user_then_assistant(speech in arb_speech()) {
        let llm = Arc::new(MockLlm::new());
        llm.queue_text("Thanks for telling me");
        let (store, engine, id) = setup(llm);
        let before = store.get(&id).unwrap().transcript;

        let reply = runtime().block_on(engine.handle(&id, &speech)).unwrap();
        prop_assert_eq!(reply.outcome, TurnOutcome::Model);

        let after = store.get(&id).unwrap().transcript;
        prop_assert_eq!(&after[..before.len()], &before[..]);
        let added: Vec<_> = after[before.len()..].iter().map(|t| t.role).collect();
        prop_assert_eq!(added, vec![Role::User, Role::Assistant]);
        prop_assert_eq!(after[before.len()].content.as_str(), speech.trim());
    }

    #[test]
    fn prop_blank_speech_appends_nothing(speech in arb_blank()) {
        let llm = Arc::new(MockLlm::new());
        let (store, engine, id) = setup(llm.clone());
        let before = store.get(&id).unwrap();

        let reply = runtime().block_on(engine.handle(&id, &speech)).unwrap();
        prop_assert_eq!(reply.outcome, TurnOutcome::Reprompt);
        prop_assert!(reply.reply_text.starts_with(super::turn::REPROMPT_LINE));

        prop_assert_eq!(store.get(&id).unwrap().transcript, before.transcript);
        prop_assert!(llm.recorded_requests().is_empty());
    }
}
