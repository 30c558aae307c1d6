use crate::model::post::ChannelEntity;
use futures::stream::BoxStream;
use thiserror::Error;

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("The channel is private or the user is not a member of it")]
    ChannelPrivate,
    #[error("No channel with username {0} was found")]
    UnknownChannel(String),
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct Sender {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct ReplyMessage {
    pub text: Option<String>,
    pub sender: Option<Sender>,
}

/// Read access to a messaging platform on behalf of an already authorized user.
pub trait MessagingClient: Send + Sync {
    /// All messages replying to `post_id` in `channel`, in the order the platform delivers them.
    ///
    /// The stream is fetched lazily and cannot be restarted.
    fn replies(&self, channel: ChannelEntity, post_id: i32) -> BoxStream<'_, Result<ReplyMessage>>;
}
