//! Console adapter for development/testing
//!
//! Reads lines from stdin as private messages from a local user and prints
//! outgoing messages, so the whole pipeline can be exercised without a
//! protocol connection.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use crate::application::errors::BotError;
use crate::application::services::BotService;
use crate::domain::entities::{Event, MessageKind};
use crate::domain::traits::Bot;

const CONSOLE_USER: &str = "you!local@console";

pub struct ConsoleAdapter {
    nickname: String,
}

impl ConsoleAdapter {
    pub fn new(nickname: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
        }
    }

    /// Runs the read-dispatch-print loop until stdin closes.
    pub async fn run(&self, service: &BotService) -> Result<(), BotError> {
        info!("Starting console bot (dev mode)");
        service.handle_event(self, &Event::Init);
        service.handle_event(
            self,
            &Event::Connect {
                host: "console".to_string(),
            },
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut tick = tokio::time::interval(Duration::from_secs(1));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    service.handle_event(self, &Event::Tick);
                }
                line = lines.next_line() => {
                    match line {
                        Ok(Some(text)) => {
                            let event = Event::Message {
                                channel: None,
                                user: CONSOLE_USER.to_string(),
                                text,
                                kind: MessageKind::Say,
                            };
                            service.handle_event(self, &event);
                        }
                        Ok(None) => break, // EOF
                        Err(e) => {
                            error!("Failed to read console input: {}", e);
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl Bot for ConsoleAdapter {
    fn nickname(&self) -> &str {
        &self.nickname
    }

    fn send_message(&self, target: &str, text: &str) -> Result<(), BotError> {
        println!("[{target}] {text}");
        Ok(())
    }
}
