//! Greetings plugin.
//!
//! Users set a personal greeting with the `greet` command and the bot says
//! it whenever they enter a channel.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::application::errors::BotError;
use crate::domain::entities::user::get_nick;
use crate::domain::entities::Event;
use crate::domain::traits::Bot;
use crate::plugins::trait_def::{Plugin, Reply};

pub struct Greetings {
    file: PathBuf,
    greets: Mutex<HashMap<String, String>>,
}

impl Greetings {
    pub fn new(storage_dir: &Path) -> Self {
        let file = storage_dir.join("greets.json");
        let greets = std::fs::read_to_string(&file)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        Self {
            file,
            greets: Mutex::new(greets),
        }
    }

    fn save(&self, greets: &HashMap<String, String>) -> Result<(), BotError> {
        let content =
            serde_json::to_string(greets).map_err(|e| BotError::Plugin(e.to_string()))?;
        std::fs::write(&self.file, content)?;
        Ok(())
    }
}

impl Plugin for Greetings {
    fn name(&self) -> &str {
        "greet"
    }

    fn commands(&self) -> Vec<(&str, &str)> {
        vec![(
            "greet",
            "Sets a greeting that bot will say when you enter the channel",
        )]
    }

    fn handle(&self, bot: &dyn Bot, event: &Event) -> Result<Option<Reply>, BotError> {
        match event {
            Event::Join { channel, user } => {
                let Some(nick) = get_nick(user) else {
                    return Ok(None);
                };
                // Only interested in others joining
                if nick == bot.nickname() {
                    return Ok(None);
                }
                let greets = self
                    .greets
                    .lock()
                    .map_err(|_| BotError::Internal("greet state poisoned".into()))?;
                if let Some(greet) = greets.get(&nick) {
                    bot.send_message(channel, greet)?;
                }
                Ok(None)
            }
            Event::Command {
                user, cmd, args, ..
            } if cmd == "greet" => {
                let nick = get_nick(user).unwrap_or_else(|| user.clone());
                let mut greets = self
                    .greets
                    .lock()
                    .map_err(|_| BotError::Internal("greet state poisoned".into()))?;
                let action = match args {
                    Some(text) => {
                        greets.insert(nick.clone(), text.clone());
                        "set"
                    }
                    None => {
                        greets.remove(&nick);
                        "reset"
                    }
                };
                self.save(&greets)?;
                Ok(Some(Reply::Text(format!(
                    "Greeting {action} for user '{nick}'"
                ))))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct CapturingBot {
        sent: StdMutex<Vec<(String, String)>>,
    }

    impl CapturingBot {
        fn new() -> Self {
            Self {
                sent: StdMutex::new(Vec::new()),
            }
        }
    }

    impl Bot for CapturingBot {
        fn nickname(&self) -> &str {
            "parley"
        }

        fn send_message(&self, target: &str, text: &str) -> Result<(), BotError> {
            self.sent
                .lock()
                .map_err(|_| BotError::Internal("poisoned".into()))?
                .push((target.to_string(), text.to_string()));
            Ok(())
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("parley-greet-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn set_greeting_then_serve_it_on_join() {
        let dir = temp_dir("serve");
        let plugin = Greetings::new(&dir);
        let bot = CapturingBot::new();

        let reply = plugin
            .handle(
                &bot,
                &Event::Command {
                    channel: Some("#chan".into()),
                    user: "joe!id@host".into(),
                    cmd: "greet".into(),
                    args: Some("hello world".into()),
                },
            )
            .unwrap();
        assert_eq!(
            reply,
            Some(Reply::Text("Greeting set for user 'joe'".into()))
        );

        plugin
            .handle(
                &bot,
                &Event::Join {
                    channel: "#chan".into(),
                    user: "joe!id@host".into(),
                },
            )
            .unwrap();
        assert_eq!(
            *bot.sent.lock().unwrap(),
            vec![("#chan".to_string(), "hello world".to_string())]
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn own_join_is_ignored() {
        let dir = temp_dir("own");
        let plugin = Greetings::new(&dir);
        let bot = CapturingBot::new();

        plugin
            .handle(
                &bot,
                &Event::Join {
                    channel: "#chan".into(),
                    user: "parley!bot@host".into(),
                },
            )
            .unwrap();
        assert!(bot.sent.lock().unwrap().is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }
}
