use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tracing::{info, warn};

use common::{Error, Notification, Notifier, Result};

/// Delivers signal notifications as Telegram messages.
///
/// Recipients that parse as chat ids are messaged directly; anything else
/// (push device tokens from other front ends) is ignored. Without any
/// usable recipient the configured default chats are used.
pub struct TelegramNotifier {
    bot: Bot,
    default_chats: Vec<ChatId>,
}

impl TelegramNotifier {
    pub fn new(token: String, default_chat_ids: &[i64]) -> Self {
        info!(chats = default_chat_ids.len(), "Telegram notifier ready");
        Self {
            bot: Bot::new(token),
            default_chats: default_chat_ids.iter().map(|&id| ChatId(id)).collect(),
        }
    }

    fn targets(&self, recipients: &[String]) -> Vec<ChatId> {
        let parsed = chat_ids(recipients);
        if parsed.is_empty() {
            self.default_chats.clone()
        } else {
            parsed
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, recipients: &[String], notification: &Notification) -> Result<()> {
        let targets = self.targets(recipients);
        if targets.is_empty() {
            return Err(Error::Notification("no Telegram chat to deliver to".into()));
        }
        let text = render(notification);
        let delivered = send_alert(&self.bot, &targets, &text).await;
        if delivered == 0 {
            return Err(Error::Notification(format!(
                "all {} Telegram deliveries failed",
                targets.len()
            )));
        }
        Ok(())
    }
}

/// Send `message` to every chat. Returns how many deliveries succeeded.
pub async fn send_alert(bot: &Bot, chat_ids: &[ChatId], message: &str) -> usize {
    let mut delivered = 0;
    for &chat_id in chat_ids {
        match bot.send_message(chat_id, message).await {
            Ok(_) => delivered += 1,
            Err(e) => warn!(chat_id = ?chat_id, error = %e, "Failed to send Telegram alert"),
        }
    }
    delivered
}

fn chat_ids(recipients: &[String]) -> Vec<ChatId> {
    recipients
        .iter()
        .filter_map(|r| r.trim().parse::<i64>().ok())
        .map(ChatId)
        .collect()
}

fn render(notification: &Notification) -> String {
    let mut text = format!("{}\n{}", notification.title, notification.body);
    for (key, value) in &notification.data {
        text.push_str(&format!("\n{key}: {value}"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn numeric_recipients_become_chats() {
        let ids = chat_ids(&["12345".into(), "device-token".into(), " -100200 ".into()]);
        assert_eq!(ids, vec![ChatId(12345), ChatId(-100200)]);
    }

    #[test]
    fn falls_back_to_default_chats() {
        let n = TelegramNotifier::new("123:abc".into(), &[42]);
        assert_eq!(n.targets(&["fcm-token".into()]), vec![ChatId(42)]);
        assert_eq!(n.targets(&["7".into()]), vec![ChatId(7)]);
    }

    #[test]
    fn render_lists_data_fields() {
        let mut data = BTreeMap::new();
        data.insert("action".to_string(), "CALL".to_string());
        data.insert("instrument".to_string(), "EURUSD-OTC".to_string());
        let text = render(&Notification {
            title: "CALL signal detected".into(),
            body: "EURUSD-OTC: CALL with 85.0% confidence.".into(),
            data,
        });
        assert_eq!(
            text,
            "CALL signal detected\nEURUSD-OTC: CALL with 85.0% confidence.\naction: CALL\ninstrument: EURUSD-OTC"
        );
    }
}
