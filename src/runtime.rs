//! Runtime for the chat session
//!
//! Owns the one [`ChatHistory`], applies reducer actions, and executes their
//! effects: saving to the store, notifying browsers, and generating replies.

pub mod traits;

#[cfg(test)]
pub mod testing;

pub use traits::HistoryStore;

use crate::registry::{
    reduce, Action, Chat, ChatHistory, ChatId, ChatMessage, Effect, ReduceContext, ReduceError,
};
use crate::reply::ResponseGenerator;
use crate::store::StoreError;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard};

/// Shown when a save fails; the session keeps going in memory
const SAVE_FAILED_NOTICE: &str =
    "We couldn't save your chats just now. You can keep talking, but recent messages may not be there next time.";

/// Shown when saves are held because the saved chats could not be read
const SAVES_HELD_NOTICE: &str =
    "Your saved chats couldn't be loaded, so nothing new is being saved. Your old chats are left as they were.";

// ============================================================================
// Client-facing views
// ============================================================================

/// One sidebar entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatSummary {
    pub id: ChatId,
    pub name: String,
    pub message_count: usize,
}

/// Everything the page needs to draw the sidebar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistorySnapshot {
    /// Newest first
    pub chats: Vec<ChatSummary>,
    pub current_chat: Option<ChatId>,
}

impl HistorySnapshot {
    pub fn of(history: &ChatHistory) -> Self {
        Self {
            chats: history
                .chats
                .iter()
                .rev()
                .map(|c| ChatSummary {
                    id: c.id,
                    name: c.name.clone(),
                    message_count: c.messages.len(),
                })
                .collect(),
            current_chat: history.current_chat,
        }
    }
}

/// A full transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatView {
    pub id: ChatId,
    pub name: String,
    pub messages: Vec<ChatMessage>,
}

impl From<&Chat> for ChatView {
    fn from(chat: &Chat) -> Self {
        Self {
            id: chat.id,
            name: chat.name.clone(),
            messages: chat.messages.clone(),
        }
    }
}

/// Events pushed to connected browsers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// State changed; re-render from this
    Snapshot(HistorySnapshot),
    /// A reply is being generated for `chat_id`
    Thinking { chat_id: ChatId, thinking: bool },
    /// Something the user should know about, e.g. a failed save
    Notice { message: String },
}

// ============================================================================
// Outcomes
// ============================================================================

/// Result of applying one action
#[derive(Debug)]
pub struct Dispatched {
    pub snapshot: HistorySnapshot,
    /// Set when the save after this action failed
    pub notice: Option<String>,
    reply_request: Option<ReplyRequest>,
}

#[derive(Debug)]
struct ReplyRequest {
    chat_id: ChatId,
    context: Vec<ChatMessage>,
    prompt: String,
}

/// Result of a full user/assistant exchange
#[derive(Debug)]
pub struct Exchange {
    pub reply: ChatMessage,
    /// The chat after the reply; `None` if it was deleted meanwhile
    pub chat: Option<ChatView>,
    pub notice: Option<String>,
}

// ============================================================================
// Runtime
// ============================================================================

pub struct ChatRuntime {
    history: Mutex<ChatHistory>,
    store: Arc<dyn HistoryStore>,
    generator: ResponseGenerator,
    broadcast_tx: broadcast::Sender<ClientEvent>,
    startup_notice: Option<String>,
    /// False when the saved file exists but could not be read; saving would
    /// replace it with this session's history
    persist_enabled: bool,
    /// One exchange at a time per chat
    exchanges: Mutex<HashMap<ChatId, Arc<Mutex<()>>>>,
}

/// How startup loading went
struct Loaded {
    history: ChatHistory,
    notice: Option<String>,
    persist_enabled: bool,
}

impl ChatRuntime {
    /// Load saved chats and make sure one is selected.
    ///
    /// Load failures never stop the session: a corrupt file is set aside and
    /// the session starts empty, with a notice for the user. A file that
    /// can't be read at all is left in place and saves are held.
    pub async fn start(store: Arc<dyn HistoryStore>, generator: ResponseGenerator) -> Self {
        let loaded = Self::load_or_recover(store.as_ref()).await;
        let (broadcast_tx, _) = broadcast::channel(64);

        let runtime = Self {
            history: Mutex::new(loaded.history),
            store,
            generator,
            broadcast_tx,
            startup_notice: loaded.notice,
            persist_enabled: loaded.persist_enabled,
            exchanges: Mutex::new(HashMap::new()),
        };

        tracing::info!(model = %runtime.generator.model_id(), "Chat runtime started");

        if let Err(e) = runtime.dispatch(Action::EnsureChat).await {
            // EnsureChat has no failure path
            tracing::error!(error = %e, "Failed to ensure a current chat");
        }

        runtime
    }

    async fn load_or_recover(store: &dyn HistoryStore) -> Loaded {
        match store.load().await {
            Ok(history) => {
                tracing::info!(chats = history.len(), "Loaded chat history");
                Loaded {
                    history,
                    notice: None,
                    persist_enabled: true,
                }
            }
            Err(e @ StoreError::Corrupt { .. }) => {
                tracing::error!(error = %e, "Chat history is unreadable, starting fresh");
                let notice = match store.quarantine().await {
                    Ok(moved_to) => {
                        tracing::warn!(path = %moved_to.display(), "Moved unreadable history aside");
                        "Your old chats couldn't be opened, so we started a fresh history. The old file was kept.".to_string()
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to move unreadable history aside");
                        "Your old chats couldn't be opened, so we started a fresh history.".to_string()
                    }
                };
                Loaded {
                    history: ChatHistory::default(),
                    notice: Some(notice),
                    persist_enabled: true,
                }
            }
            Err(e @ StoreError::Io { .. }) => {
                tracing::error!(error = %e, "Failed to read chat history, holding saves for this session");
                Loaded {
                    history: ChatHistory::default(),
                    notice: Some(SAVES_HELD_NOTICE.to_string()),
                    persist_enabled: false,
                }
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.broadcast_tx.subscribe()
    }

    pub fn startup_notice(&self) -> Option<&str> {
        self.startup_notice.as_deref()
    }

    pub async fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot::of(&*self.history.lock().await)
    }

    pub async fn chat(&self, id: ChatId) -> Option<ChatView> {
        self.history.lock().await.get(id).map(ChatView::from)
    }

    /// Apply one action and run its effects.
    ///
    /// Saves happen while the history lock is held, so the file always
    /// reflects actions in the order they were applied.
    pub async fn dispatch(&self, action: Action) -> Result<Dispatched, ReduceError> {
        let action_name = action.name();
        let mut history = self.history.lock().await;

        let reduction = reduce(&history, &ReduceContext::random(), action)?;
        *history = reduction.history;

        let mut notice = None;
        let mut reply_request = None;
        for effect in reduction.effects {
            match effect {
                Effect::PersistHistory if !self.persist_enabled => {
                    tracing::debug!(action = action_name, "Saves held, skipping");
                    notice = Some(SAVES_HELD_NOTICE.to_string());
                }
                Effect::PersistHistory => {
                    if let Err(e) = self.store.save(&history).await {
                        tracing::error!(error = %e, action = action_name, "Failed to save chat history");
                        self.notify(ClientEvent::Notice {
                            message: SAVE_FAILED_NOTICE.to_string(),
                        });
                        notice = Some(SAVE_FAILED_NOTICE.to_string());
                    }
                }
                Effect::NotifyClients => {
                    self.notify(ClientEvent::Snapshot(HistorySnapshot::of(&history)));
                }
                Effect::RequestReply {
                    chat_id,
                    context,
                    prompt,
                } => {
                    reply_request = Some(ReplyRequest {
                        chat_id,
                        context,
                        prompt,
                    });
                }
            }
        }

        tracing::debug!(action = action_name, chats = history.len(), "Applied action");

        Ok(Dispatched {
            snapshot: HistorySnapshot::of(&history),
            notice,
            reply_request,
        })
    }

    /// Record a user message, generate the reply, and record that too.
    ///
    /// The history lock is released while the reply is generated. A second
    /// send to the same chat waits for the first exchange to finish, so each
    /// reply directly follows its message.
    pub async fn send_message(&self, chat_id: ChatId, text: String) -> Result<Exchange, ReduceError> {
        let guard = self.begin_exchange(chat_id).await;
        let result = self.run_exchange(chat_id, text).await;
        drop(guard);
        self.end_exchange(chat_id).await;
        result
    }

    async fn begin_exchange(&self, chat_id: ChatId) -> OwnedMutexGuard<()> {
        let lock = self
            .exchanges
            .lock()
            .await
            .entry(chat_id)
            .or_default()
            .clone();
        lock.lock_owned().await
    }

    async fn end_exchange(&self, chat_id: ChatId) {
        let mut exchanges = self.exchanges.lock().await;
        // Only the map holds it once nobody is running or waiting
        if exchanges
            .get(&chat_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            exchanges.remove(&chat_id);
        }
    }

    async fn run_exchange(&self, chat_id: ChatId, text: String) -> Result<Exchange, ReduceError> {
        let dispatched = self.dispatch(Action::UserMessage { chat_id, text }).await?;
        let mut notice = dispatched.notice;

        let Some(request) = dispatched.reply_request else {
            return Err(ReduceError::UnknownChat(chat_id));
        };

        self.notify(ClientEvent::Thinking {
            chat_id,
            thinking: true,
        });
        let reply_text = self
            .generator
            .generate_response(&request.context, &request.prompt)
            .await;
        self.notify(ClientEvent::Thinking {
            chat_id,
            thinking: false,
        });

        let reply = ChatMessage::assistant(reply_text.clone());
        let chat = match self
            .dispatch(Action::AssistantReply {
                chat_id: request.chat_id,
                text: reply_text,
            })
            .await
        {
            Ok(dispatched) => {
                notice = notice.or(dispatched.notice);
                self.chat(chat_id).await
            }
            Err(ReduceError::UnknownChat(id)) => {
                tracing::warn!(chat_id = %id, "Chat deleted before its reply arrived, dropping reply");
                None
            }
            Err(e) => return Err(e),
        };

        Ok(Exchange {
            reply,
            chat,
            notice,
        })
    }

    fn notify(&self, event: ClientEvent) {
        // No subscribers is fine
        let _ = self.broadcast_tx.send(event);
    }
}
