use crate::client::{ReplyMessage, Sender};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static ACCOUNT_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4,}\b").expect("Account id regex is valid."));

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct CommentRecord {
    pub author: String,
    pub account_id: Option<String>,
    pub text: String,
}

impl CommentRecord {
    /// Builds a record from a reply, or `None` if the reply has no text or no known sender.
    #[must_use]
    pub fn from_reply(message: ReplyMessage) -> Option<Self> {
        let text = message.text.filter(|text| !text.is_empty())?;
        let sender = message.sender?;

        Some(Self {
            author: sender.display_name(),
            account_id: account_id(&text).map(str::to_owned),
            text,
        })
    }
}

impl Sender {
    #[must_use]
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default(),
        )
        .trim()
        .to_owned()
    }
}

/// First word-bounded run of at least four digits in `text`.
#[must_use]
pub fn account_id(text: &str) -> Option<&str> {
    ACCOUNT_ID_REGEX.find(text).map(|found| found.as_str())
}
