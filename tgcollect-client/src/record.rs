use grammers_tl_types as tl;
use std::collections::HashMap;
use tgcollect_common::client::{ReplyMessage, Sender};

#[derive(Clone, Debug)]
pub struct ReplyRecord {
    pub id: i32,
    pub text: Option<String>,
    pub from_id: Option<tl::enums::Peer>,
}

/// One page of `messages.getReplies` with the users it references.
#[derive(Clone, Debug, Default)]
pub struct ReplyPageRecord {
    pub replies: Vec<ReplyRecord>,
    pub senders: HashMap<i64, Sender>,
}

impl From<tl::enums::Message> for ReplyRecord {
    fn from(value: tl::enums::Message) -> Self {
        match value {
            tl::enums::Message::Message(message) => Self {
                id: message.id,
                text: Some(message.message),
                from_id: message.from_id,
            },
            tl::enums::Message::Service(service) => Self {
                id: service.id,
                text: None,
                from_id: service.from_id,
            },
            tl::enums::Message::Empty(empty) => Self {
                id: empty.id,
                text: None,
                from_id: None,
            },
        }
    }
}

impl From<tl::enums::messages::Messages> for ReplyPageRecord {
    fn from(value: tl::enums::messages::Messages) -> Self {
        let (messages, users) = match value {
            tl::enums::messages::Messages::Messages(page) => (page.messages, page.users),
            tl::enums::messages::Messages::Slice(page) => (page.messages, page.users),
            tl::enums::messages::Messages::ChannelMessages(page) => (page.messages, page.users),
            tl::enums::messages::Messages::NotModified(_) => (Vec::new(), Vec::new()),
        };

        let senders = users
            .into_iter()
            .filter_map(|user| match user {
                tl::enums::User::User(user) => Some((
                    user.id,
                    Sender {
                        first_name: user.first_name,
                        last_name: user.last_name,
                    },
                )),
                tl::enums::User::Empty(_) => None,
            })
            .collect();

        Self {
            replies: messages.into_iter().map(ReplyRecord::from).collect(),
            senders,
        }
    }
}

impl ReplyPageRecord {
    /// Smallest message id on the page, the offset for fetching the next (older) page.
    #[must_use]
    pub fn min_id(&self) -> Option<i32> {
        self.replies.iter().map(|reply| reply.id).min()
    }

    #[must_use]
    pub fn into_replies(self) -> Vec<ReplyMessage> {
        let senders = self.senders;

        self.replies
            .into_iter()
            .map(|reply| ReplyMessage {
                sender: sender(reply.from_id.as_ref(), &senders),
                text: reply.text,
            })
            .collect()
    }
}

/// Channels and groups posting anonymously have no personal name.
fn sender(from_id: Option<&tl::enums::Peer>, senders: &HashMap<i64, Sender>) -> Option<Sender> {
    match from_id? {
        tl::enums::Peer::User(peer) => senders.get(&peer.user_id).cloned(),
        tl::enums::Peer::Chat(_) | tl::enums::Peer::Channel(_) => Some(Sender::default()),
    }
}
