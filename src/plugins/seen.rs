//! Seen plugin - answers "when was this person last active".
//!
//! Every user-attributable event is recorded as a line of activity text
//! per channel; the `seen` command reports the most recent one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::errors::BotError;
use crate::domain::entities::user::get_nick;
use crate::domain::entities::{Event, MessageKind};
use crate::domain::traits::Bot;
use crate::plugins::trait_def::{Plugin, Reply};

/// Key under which channel-less activity (nick changes, quits) is filed.
const GLOBAL_CHANNEL: &str = "(global)";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Activity {
    text: String,
    timestamp: DateTime<Utc>,
}

type ActivityLog = HashMap<String, HashMap<String, Activity>>;

pub struct Seen {
    file: PathBuf,
    log: Mutex<ActivityLog>,
}

impl Seen {
    pub fn new(storage_dir: &Path) -> Self {
        let file = storage_dir.join("seen.json");
        let log = std::fs::read_to_string(&file)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        Self {
            file,
            log: Mutex::new(log),
        }
    }

    fn save(&self, log: &ActivityLog) -> Result<(), BotError> {
        let content = serde_json::to_string(log).map_err(|e| BotError::Plugin(e.to_string()))?;
        std::fs::write(&self.file, content)?;
        Ok(())
    }

    fn answer(&self, bot: &dyn Bot, asker: &str, target: &str) -> Result<String, BotError> {
        if target.is_empty() {
            return Ok("You haven't said who you're looking for.".to_string());
        }
        if get_nick(asker).as_deref() == Some(target) {
            return Ok("You might wanna look in the mirror...".to_string());
        }
        if target == bot.nickname() {
            return Ok("Looking for me?".to_string());
        }

        let log = self
            .log
            .lock()
            .map_err(|_| BotError::Internal("seen state poisoned".into()))?;
        let Some(channels) = log.get(target) else {
            return Ok(format!("Sorry, I have never heard of '{target}'."));
        };
        let Some((channel, last)) = channels
            .iter()
            .max_by_key(|(_, activity)| activity.timestamp)
        else {
            return Ok(format!("Sorry, I have never heard of '{target}'."));
        };

        let channel_part = if channel == GLOBAL_CHANNEL {
            String::new()
        } else {
            format!(" on {channel}")
        };
        let when = last.timestamp.format("%Y-%m-%d %H:%M:%S");
        Ok(format!(
            "{target} was last seen{channel_part} at {when}: {}",
            last.text
        ))
    }

    fn record(&self, users: &[&str], channel: Option<&str>, text: String) -> Result<(), BotError> {
        let mut log = self
            .log
            .lock()
            .map_err(|_| BotError::Internal("seen state poisoned".into()))?;
        let channel = channel.unwrap_or(GLOBAL_CHANNEL);
        for user in users {
            let Some(nick) = get_nick(user) else { continue };
            log.entry(nick).or_default().insert(
                channel.to_string(),
                Activity {
                    text: text.clone(),
                    timestamp: Utc::now(),
                },
            );
        }
        self.save(&log)
    }

    fn track(&self, event: &Event) -> Result<(), BotError> {
        let nick = |mask: &str| get_nick(mask).unwrap_or_else(|| mask.to_string());
        match event {
            Event::Message {
                channel,
                user,
                text,
                kind,
            } => {
                let line = match kind {
                    MessageKind::Action => format!("* {} {}", nick(user), text),
                    _ => format!("<{}> {}", nick(user), text),
                };
                self.record(&[user.as_str()], channel.as_deref(), line)
            }
            Event::Join { channel, user } => self.record(
                &[user.as_str()],
                Some(channel),
                format!("* {} joins {}.", nick(user), channel),
            ),
            Event::Part { channel, user } => self.record(
                &[user.as_str()],
                Some(channel),
                format!("* {} leaves {}.", nick(user), channel),
            ),
            Event::Kick {
                channel,
                kicker,
                kickee,
                ..
            } => self.record(
                &[kicker.as_str(), kickee.as_str()],
                Some(channel),
                format!(
                    "* {} has been kicked from {} by {}.",
                    nick(kickee),
                    channel,
                    nick(kicker)
                ),
            ),
            Event::Nick { old, new } => self.record(
                &[old.as_str(), new.as_str()],
                None,
                format!("* {} changes nick to {}.", nick(old), nick(new)),
            ),
            Event::Mode {
                channel,
                user,
                set,
                modes,
                args,
            } => {
                let sign = if *set { "+" } else { "-" };
                let mode_args = if args.is_empty() {
                    String::new()
                } else {
                    format!(" {}", args.join(" "))
                };
                self.record(
                    &[user.as_str()],
                    Some(channel),
                    format!("* {} sets mode {sign}{modes}{mode_args}", nick(user)),
                )
            }
            Event::Topic {
                channel,
                user,
                topic,
            } => self.record(
                &[user.as_str()],
                Some(channel),
                format!("* {} sets topic of {} to '{}'.", nick(user), channel, topic),
            ),
            Event::Quit { user, message } => self.record(
                &[user.as_str()],
                None,
                format!("* {} quits IRC ({}).", nick(user), message),
            ),
            _ => Ok(()),
        }
    }
}

impl Plugin for Seen {
    fn name(&self) -> &str {
        "seen"
    }

    fn commands(&self) -> Vec<(&str, &str)> {
        vec![("seen", "Reports last time when user was seen")]
    }

    fn handle(&self, bot: &dyn Bot, event: &Event) -> Result<Option<Reply>, BotError> {
        match event {
            Event::Init | Event::Tick => Ok(None),
            Event::Command {
                user, cmd, args, ..
            } => {
                if cmd != "seen" {
                    return Ok(None);
                }
                let target = args.as_deref().unwrap_or("").trim();
                self.answer(bot, user, target).map(|line| Some(line.into()))
            }
            _ => {
                self.track(event)?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullBot;

    impl Bot for NullBot {
        fn nickname(&self) -> &str {
            "parley"
        }

        fn send_message(&self, _target: &str, _text: &str) -> Result<(), BotError> {
            Ok(())
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("parley-seen-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn seen_command(asker: &str, target: &str) -> Event {
        Event::Command {
            channel: Some("#chan".into()),
            user: asker.to_string(),
            cmd: "seen".into(),
            args: Some(target.to_string()),
        }
    }

    #[test]
    fn tracked_activity_is_reported() {
        let dir = temp_dir("report");
        let plugin = Seen::new(&dir);

        plugin
            .handle(
                &NullBot,
                &Event::Message {
                    channel: Some("#chan".into()),
                    user: "joe!id@host".into(),
                    text: "good morning".into(),
                    kind: MessageKind::Say,
                },
            )
            .unwrap();

        let reply = plugin
            .handle(&NullBot, &seen_command("bob!id@host", "joe"))
            .unwrap();
        match reply {
            Some(Reply::Text(line)) => {
                assert!(line.starts_with("joe was last seen on #chan at "), "{line}");
                assert!(line.ends_with(": <joe> good morning"), "{line}");
            }
            other => panic!("unexpected reply: {other:?}"),
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn special_lookups() {
        let dir = temp_dir("special");
        let plugin = Seen::new(&dir);

        let mirror = plugin
            .handle(&NullBot, &seen_command("joe!id@host", "joe"))
            .unwrap();
        assert_eq!(
            mirror,
            Some(Reply::Text("You might wanna look in the mirror...".into()))
        );

        let bot = plugin
            .handle(&NullBot, &seen_command("joe!id@host", "parley"))
            .unwrap();
        assert_eq!(bot, Some(Reply::Text("Looking for me?".into())));

        let unknown = plugin
            .handle(&NullBot, &seen_command("joe!id@host", "nobody"))
            .unwrap();
        assert_eq!(
            unknown,
            Some(Reply::Text("Sorry, I have never heard of 'nobody'.".into()))
        );

        std::fs::remove_dir_all(&dir).ok();
    }
}
