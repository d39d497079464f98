//! Collects the messages of tracing events emitted during a closure.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

#[derive(Clone, Default)]
struct Messages(Arc<Mutex<Vec<String>>>);

#[derive(Default)]
struct Message {
    text: String,
    fields: String,
}

impl Visit for Message {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.text = format!("{value:?}");
        } else {
            self.fields.push_str(&format!(" {}={value:?}", field.name()));
        }
    }
}

impl<S: Subscriber> Layer<S> for Messages {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut message = Message::default();
        event.record(&mut message);
        self.0
            .lock()
            .unwrap()
            .push(format!("{}{}", message.text, message.fields));
    }
}

/// Runs `f` and returns every event it emitted, message first, then fields.
pub(crate) fn events<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
    let messages = Messages::default();
    let subscriber = tracing_subscriber::registry().with(messages.clone());
    let value = tracing::subscriber::with_default(subscriber, f);
    let collected = messages.0.lock().unwrap().clone();
    (value, collected)
}
