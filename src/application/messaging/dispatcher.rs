//! Event dispatcher - delivers protocol events to every plugin.

use std::sync::Arc;

use tracing::warn;

use crate::domain::entities::Event;
use crate::domain::traits::Bot;
use crate::plugins::Registry;

/// Notifies registered plugins about protocol events.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Delivers `event` to every plugin in registration order.
    ///
    /// For the `command` event the non-`None` replies are collected in
    /// order; an empty aggregate comes back as `None`, meaning no plugin
    /// claimed the command and the registry lookup should proceed. For any
    /// other event the return values are discarded.
    ///
    /// A fault in one plugin is logged with its identity and never stops
    /// the notification of the plugins after it.
    pub fn notify(&self, bot: &dyn Bot, event: &Event) -> Option<Vec<String>> {
        let mut replies = Vec::new();
        for plugin in self.registry.plugins() {
            match plugin.handle(bot, event) {
                Ok(Some(reply)) if event.is_command() => reply.append_to(&mut replies),
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        "Error while notifying plugin '{}' of {}: {}",
                        plugin.name(),
                        event.name(),
                        e
                    );
                }
            }
        }

        if event.is_command() && !replies.is_empty() {
            Some(replies)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::application::errors::BotError;
    use crate::plugins::trait_def::{Plugin, Reply};

    struct NullBot;

    impl Bot for NullBot {
        fn nickname(&self) -> &str {
            "parley"
        }

        fn send_message(&self, _target: &str, _text: &str) -> Result<(), BotError> {
            Ok(())
        }
    }

    struct Answering(&'static str);

    impl Plugin for Answering {
        fn name(&self) -> &str {
            "answering"
        }

        fn handle(&self, _bot: &dyn Bot, event: &Event) -> Result<Option<Reply>, BotError> {
            Ok(event.is_command().then(|| Reply::Text(self.0.to_string())))
        }
    }

    struct Silent;

    impl Plugin for Silent {
        fn name(&self) -> &str {
            "silent"
        }

        fn handle(&self, _bot: &dyn Bot, _event: &Event) -> Result<Option<Reply>, BotError> {
            Ok(None)
        }
    }

    struct Faulty;

    impl Plugin for Faulty {
        fn name(&self) -> &str {
            "faulty"
        }

        fn handle(&self, _bot: &dyn Bot, _event: &Event) -> Result<Option<Reply>, BotError> {
            Err(BotError::Plugin("boom".into()))
        }
    }

    struct Recording(Mutex<Vec<String>>);

    impl Plugin for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        fn handle(&self, _bot: &dyn Bot, event: &Event) -> Result<Option<Reply>, BotError> {
            self.0
                .lock()
                .map_err(|_| BotError::Internal("poisoned".into()))?
                .push(event.name().to_string());
            Ok(None)
        }
    }

    fn command_event() -> Event {
        Event::Command {
            channel: None,
            user: "joe".into(),
            cmd: "roll".into(),
            args: None,
        }
    }

    #[test]
    fn single_claimant_is_the_sole_aggregate_element() {
        let mut registry = Registry::new();
        registry.register_plugin(Arc::new(Silent));
        registry.register_plugin(Arc::new(Answering("claimed")));
        let dispatcher = Dispatcher::new(Arc::new(registry));

        let replies = dispatcher.notify(&NullBot, &command_event());
        assert_eq!(replies, Some(vec!["claimed".to_string()]));
    }

    #[test]
    fn all_null_replies_mean_no_claim() {
        let mut registry = Registry::new();
        registry.register_plugin(Arc::new(Silent));
        registry.register_plugin(Arc::new(Silent));
        let dispatcher = Dispatcher::new(Arc::new(registry));

        assert_eq!(dispatcher.notify(&NullBot, &command_event()), None);
    }

    #[test]
    fn multiple_claimants_all_contribute_in_order() {
        let mut registry = Registry::new();
        registry.register_plugin(Arc::new(Answering("first")));
        registry.register_plugin(Arc::new(Answering("second")));
        let dispatcher = Dispatcher::new(Arc::new(registry));

        let replies = dispatcher.notify(&NullBot, &command_event());
        assert_eq!(
            replies,
            Some(vec!["first".to_string(), "second".to_string()])
        );
    }

    #[test]
    fn fault_does_not_block_later_plugins() {
        let recording = Arc::new(Recording(Mutex::new(Vec::new())));
        let mut registry = Registry::new();
        registry.register_plugin(Arc::new(Faulty));
        registry.register_plugin(recording.clone());
        let dispatcher = Dispatcher::new(Arc::new(registry));

        dispatcher.notify(
            &NullBot,
            &Event::Join {
                channel: "#chan".into(),
                user: "joe".into(),
            },
        );
        assert_eq!(*recording.0.lock().unwrap(), vec!["join".to_string()]);
    }

    #[test]
    fn non_command_replies_are_discarded() {
        let mut registry = Registry::new();
        registry.register_plugin(Arc::new(Answering("ignored")));
        let dispatcher = Dispatcher::new(Arc::new(registry));

        assert_eq!(dispatcher.notify(&NullBot, &Event::Tick), None);
    }
}
