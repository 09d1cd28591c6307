//! Property-based tests for the registry reducer
//!
//! Random action sequences must never break the selection invariant.

use super::*;
use proptest::prelude::*;
use uuid::Uuid;

// ============================================================================
// Strategies
// ============================================================================

/// Actions that refer to chats by index so they usually hit a real chat
#[derive(Debug, Clone)]
enum Step {
    New,
    Delete(usize),
    DeleteUnknown,
    Select(usize),
    User(usize, String),
    Reply(usize, String),
    Ensure,
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::New),
        (0usize..8).prop_map(Step::Delete),
        Just(Step::DeleteUnknown),
        (0usize..8).prop_map(Step::Select),
        ((0usize..8), "[a-zA-Z ?!]{0,30}").prop_map(|(i, t)| Step::User(i, t)),
        ((0usize..8), "[a-zA-Z ]{1,30}").prop_map(|(i, t)| Step::Reply(i, t)),
        Just(Step::Ensure),
    ]
}

fn pick(history: &ChatHistory, index: usize) -> ChatId {
    if history.is_empty() {
        Uuid::new_v4()
    } else {
        history.chats[index % history.len()].id
    }
}

fn to_action(history: &ChatHistory, step: &Step) -> Action {
    match step {
        Step::New => Action::NewChat,
        Step::Delete(i) => Action::DeleteChat {
            id: pick(history, *i),
        },
        Step::DeleteUnknown => Action::DeleteChat { id: Uuid::new_v4() },
        Step::Select(i) => Action::SelectChat {
            id: pick(history, *i),
        },
        Step::User(i, text) => Action::UserMessage {
            chat_id: pick(history, *i),
            text: text.clone(),
        },
        Step::Reply(i, text) => Action::AssistantReply {
            chat_id: pick(history, *i),
            text: text.clone(),
        },
        Step::Ensure => Action::EnsureChat,
    }
}

fn run(steps: &[Step]) -> Vec<(ChatHistory, Action, Result<Reduction, ReduceError>)> {
    let mut history = ChatHistory::default();
    let mut trace = Vec::new();
    for step in steps {
        let action = to_action(&history, step);
        let result = reduce(&history, &ReduceContext::random(), action.clone());
        let before = history.clone();
        if let Ok(reduction) = &result {
            history = reduction.history.clone();
        }
        trace.push((before, action, result));
    }
    trace
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_selection_always_consistent(steps in proptest::collection::vec(arb_step(), 1..40)) {
        for (_, _, result) in run(&steps) {
            if let Ok(reduction) = result {
                prop_assert!(reduction.history.is_consistent());
            }
        }
    }

    #[test]
    fn prop_delete_never_leaves_registry_empty(steps in proptest::collection::vec(arb_step(), 1..40)) {
        for (before, action, result) in run(&steps) {
            if let (Action::DeleteChat { .. }, Ok(reduction)) = (&action, result) {
                if !before.is_empty() {
                    prop_assert!(!reduction.history.is_empty());
                    prop_assert!(reduction.history.current().is_some());
                }
            }
        }
    }

    #[test]
    fn prop_delete_non_current_keeps_selection(steps in proptest::collection::vec(arb_step(), 1..40)) {
        for (before, action, result) in run(&steps) {
            if let (Action::DeleteChat { id }, Ok(reduction)) = (&action, result) {
                if before.current_chat.is_some() && before.current_chat != Some(*id) {
                    prop_assert_eq!(reduction.history.current_chat, before.current_chat);
                }
            }
        }
    }

    #[test]
    fn prop_messages_are_append_only(steps in proptest::collection::vec(arb_step(), 1..40)) {
        for (before, _, result) in run(&steps) {
            let Ok(reduction) = result else { continue };
            for old in &before.chats {
                if let Some(new) = reduction.history.get(old.id) {
                    prop_assert!(new.messages.len() >= old.messages.len());
                    prop_assert_eq!(&new.messages[..old.messages.len()], &old.messages[..]);
                }
            }
        }
    }

    #[test]
    fn prop_reply_context_is_bounded(steps in proptest::collection::vec(arb_step(), 1..60)) {
        for (_, _, result) in run(&steps) {
            let Ok(reduction) = result else { continue };
            for effect in &reduction.effects {
                if let Effect::RequestReply { context, .. } = effect {
                    prop_assert!(context.len() <= crate::reply::CONTEXT_TURNS);
                }
            }
        }
    }
}
