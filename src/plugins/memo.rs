//! Memo plugin.
//!
//! Users leave messages for each other with the `msg` command; the bot
//! delivers them when the recipient next speaks in a channel.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::errors::BotError;
use crate::domain::entities::user::get_nick;
use crate::domain::entities::Event;
use crate::domain::traits::Bot;
use crate::plugins::trait_def::{Plugin, Reply};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Memo {
    from: String,
    message: String,
    timestamp: DateTime<Utc>,
}

type MemoStore = HashMap<String, Vec<Memo>>;

pub struct Memos {
    file: PathBuf,
    memos: Mutex<MemoStore>,
}

impl Memos {
    pub fn new(storage_dir: &Path) -> Self {
        let file = storage_dir.join("memos.json");
        let memos = std::fs::read_to_string(&file)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        Self {
            file,
            memos: Mutex::new(memos),
        }
    }

    fn save(&self, memos: &MemoStore) -> Result<(), BotError> {
        let content = serde_json::to_string(memos).map_err(|e| BotError::Plugin(e.to_string()))?;
        std::fs::write(&self.file, content)?;
        Ok(())
    }

    /// Stores a memo and acknowledges it.
    fn leave_memo(&self, bot: &dyn Bot, user: &str, args: Option<&str>) -> Result<String, BotError> {
        let sender = get_nick(user).unwrap_or_else(|| user.to_string());
        let Some((recipient, message)) = args
            .and_then(|args| args.split_once(char::is_whitespace))
            .map(|(recipient, message)| (recipient, message.trim()))
            .filter(|(_, message)| !message.is_empty())
        else {
            return Ok("Message shall not be empty.".to_string());
        };

        if recipient == bot.nickname() {
            return Ok("I'm here, y'know.".to_string());
        }

        let mut memos = self
            .memos
            .lock()
            .map_err(|_| BotError::Internal("memo state poisoned".into()))?;
        memos.entry(recipient.to_string()).or_default().push(Memo {
            from: sender,
            message: message.to_string(),
            timestamp: Utc::now(),
        });
        self.save(&memos)?;

        Ok(format!("I will notify {recipient} should they appear."))
    }

    /// Hands out any memos waiting for the speaker.
    fn deliver(&self, bot: &dyn Bot, channel: &str, user: &str) -> Result<(), BotError> {
        let Some(nick) = get_nick(user) else {
            return Ok(());
        };
        let mut memos = self
            .memos
            .lock()
            .map_err(|_| BotError::Internal("memo state poisoned".into()))?;
        let Some(pending) = memos.remove(&nick) else {
            return Ok(());
        };
        self.save(&memos)?;
        drop(memos);

        for memo in pending {
            let when = memo.timestamp.format("%Y-%m-%d %H:%M:%S");
            bot.send_message(
                channel,
                &format!("{when} <{}> {nick}: {}", memo.from, memo.message),
            )?;
        }
        Ok(())
    }
}

impl Plugin for Memos {
    fn name(&self) -> &str {
        "memo"
    }

    fn commands(&self) -> Vec<(&str, &str)> {
        vec![(
            "msg",
            "Leave a message for particular user, e.g.: #cmd# some_one You owe me $10!",
        )]
    }

    fn handle(&self, bot: &dyn Bot, event: &Event) -> Result<Option<Reply>, BotError> {
        match event {
            Event::Message {
                channel: Some(channel),
                user,
                ..
            } => {
                // Only channel messages trigger delivery
                self.deliver(bot, channel, user)?;
                Ok(None)
            }
            Event::Command {
                user, cmd, args, ..
            } if cmd == "msg" => self
                .leave_memo(bot, user, args.as_deref())
                .map(|line| Some(line.into())),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::MessageKind;
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
        let dir = std::env::temp_dir().join(format!("parley-memo-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn memo_is_delivered_once_when_recipient_speaks() {
        let dir = temp_dir("deliver");
        let plugin = Memos::new(&dir);
        let bot = CapturingBot::new();

        let reply = plugin
            .handle(
                &bot,
                &Event::Command {
                    channel: Some("#chan".into()),
                    user: "joe!id@host".into(),
                    cmd: "msg".into(),
                    args: Some("bob You owe me $10!".into()),
                },
            )
            .unwrap();
        assert_eq!(
            reply,
            Some(Reply::Text("I will notify bob should they appear.".into()))
        );

        let speak = Event::Message {
            channel: Some("#chan".into()),
            user: "bob!id@host".into(),
            text: "hi all".into(),
            kind: MessageKind::Say,
        };
        plugin.handle(&bot, &speak).unwrap();

        let sent = bot.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "#chan");
        assert!(sent[0].1.contains("<joe> bob: You owe me $10!"), "{}", sent[0].1);
        drop(sent);

        // Second time around there is nothing left to deliver.
        plugin.handle(&bot, &speak).unwrap();
        assert_eq!(bot.sent.lock().unwrap().len(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn memo_to_the_bot_is_refused() {
        let dir = temp_dir("self");
        let plugin = Memos::new(&dir);
        let bot = CapturingBot::new();

        let reply = plugin
            .handle(
                &bot,
                &Event::Command {
                    channel: None,
                    user: "joe!id@host".into(),
                    cmd: "msg".into(),
                    args: Some("parley hello".into()),
                },
            )
            .unwrap();
        assert_eq!(reply, Some(Reply::Text("I'm here, y'know.".into())));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_message_is_rejected() {
        let dir = temp_dir("empty");
        let plugin = Memos::new(&dir);
        let bot = CapturingBot::new();

        for args in [None, Some("bob".to_string()), Some("bob   ".to_string())] {
            let reply = plugin
                .handle(
                    &bot,
                    &Event::Command {
                        channel: None,
                        user: "joe!id@host".into(),
                        cmd: "msg".into(),
                        args,
                    },
                )
                .unwrap();
            assert_eq!(reply, Some(Reply::Text("Message shall not be empty.".into())));
        }

        std::fs::remove_dir_all(&dir).ok();
    }
}
