//! Server-Sent Events support

use crate::runtime::{ClientEvent, HistorySnapshot};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Current snapshot first, then every broadcast event
pub fn sse_stream(
    initial: HistorySnapshot,
    startup_notice: Option<String>,
    broadcast_rx: tokio::sync::broadcast::Receiver<ClientEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut init = vec![ClientEvent::Snapshot(initial)];
    if let Some(message) = startup_notice {
        init.push(ClientEvent::Notice { message });
    }
    let init = futures::stream::iter(init.into_iter().map(|e| Ok(client_event_to_axum(e))));

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(client_event_to_axum(event))),
        // Lagged; the next snapshot catches the page up
        Err(_) => None,
    });

    Sse::new(init.chain(broadcasts)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn client_event_to_axum(event: ClientEvent) -> Event {
    let (event_type, data) = match event {
        ClientEvent::Snapshot(snapshot) => (
            "snapshot",
            json!({
                "type": "snapshot",
                "chats": snapshot.chats,
                "current_chat": snapshot.current_chat,
            }),
        ),
        ClientEvent::Thinking { chat_id, thinking } => (
            "thinking",
            json!({
                "type": "thinking",
                "chat_id": chat_id,
                "thinking": thinking,
            }),
        ),
        ClientEvent::Notice { message } => (
            "notice",
            json!({
                "type": "notice",
                "message": message,
            }),
        ),
    };

    Event::default().event(event_type).data(data.to_string())
}
