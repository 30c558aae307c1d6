use crate::{
    client::{ClientError, MessagingClient},
    model::{comment::CommentRecord, post::ChannelEntity},
};
use futures::TryStreamExt;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Cannot access channel. Make sure you are a member and the channel is not private.")]
    ChannelAccessDenied,
    #[error("{0}")]
    ExtractionFailed(String),
}

impl From<ClientError> for CollectError {
    fn from(value: ClientError) -> Self {
        match value {
            ClientError::ChannelPrivate => CollectError::ChannelAccessDenied,
            other => CollectError::ExtractionFailed(other.to_string()),
        }
    }
}

/// Fetches every reply to `post_id` and keeps those that carry text and a sender.
///
/// Either all comments are returned or none.
pub async fn collect_comments<C>(
    client: &C,
    channel: ChannelEntity,
    post_id: i32,
) -> Result<Vec<CommentRecord>, CollectError>
where
    C: MessagingClient + ?Sized,
{
    info!(post_id, %channel, "Collecting comments");

    let comments: Vec<CommentRecord> = client
        .replies(channel, post_id)
        .try_filter_map(|message| async move { Ok(CommentRecord::from_reply(message)) })
        .try_collect()
        .await?;

    info!(count = comments.len(), "Collected comments");
    Ok(comments)
}

#[cfg(test)]
mod tests {
    use crate::{
        client::{ClientError, MessagingClient, ReplyMessage, Result, Sender},
        collector::{CollectError, collect_comments},
        model::{comment::CommentRecord, post::ChannelEntity},
    };
    use futures::stream::{self, BoxStream, StreamExt};
    use std::sync::Mutex;

    /// Replays a fixed script and records what it was asked for.
    struct ScriptedClient {
        script: Mutex<Option<Vec<Result<ReplyMessage>>>>,
        requests: Mutex<Vec<(ChannelEntity, i32)>>,
    }

    impl ScriptedClient {
        fn new(script: Vec<Result<ReplyMessage>>) -> Self {
            Self {
                script: Mutex::new(Some(script)),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl MessagingClient for ScriptedClient {
        fn replies(
            &self,
            channel: ChannelEntity,
            post_id: i32,
        ) -> BoxStream<'_, Result<ReplyMessage>> {
            self.requests.lock().unwrap().push((channel, post_id));
            let script = self.script.lock().unwrap().take().unwrap_or_default();
            stream::iter(script).boxed()
        }
    }

    fn reply(text: &str, first_name: Option<&str>) -> ReplyMessage {
        ReplyMessage {
            text: Some(text.into()),
            sender: Some(Sender {
                first_name: first_name.map(Into::into),
                last_name: None,
            }),
        }
    }

    #[tokio::test]
    async fn keeps_delivery_order_and_skips_unusable_replies() {
        let client = ScriptedClient::new(vec![
            Ok(reply("first 12345", Some("Ana"))),
            Ok(ReplyMessage {
                text: None,
                sender: Some(Sender::default()),
            }),
            Ok(ReplyMessage {
                text: Some("orphan 99999".into()),
                sender: None,
            }),
            Ok(reply("second", Some("Bo"))),
        ]);

        let comments = collect_comments(&client, ChannelEntity::Handle("chan".into()), 42)
            .await
            .unwrap();

        assert_eq!(
            comments,
            [
                CommentRecord {
                    author: "Ana".into(),
                    account_id: Some("12345".into()),
                    text: "first 12345".into(),
                },
                CommentRecord {
                    author: "Bo".into(),
                    account_id: None,
                    text: "second".into(),
                },
            ]
        );
        assert_eq!(
            *client.requests.lock().unwrap(),
            [(ChannelEntity::Handle("chan".into()), 42)]
        );
    }

    #[tokio::test]
    async fn empty_thread() {
        let client = ScriptedClient::new(Vec::new());

        let comments = collect_comments(&client, ChannelEntity::Id(-100_123), 1)
            .await
            .unwrap();

        assert!(comments.is_empty());
    }

    #[tokio::test]
    async fn private_channel_is_access_denied() {
        let client = ScriptedClient::new(vec![
            Ok(reply("before the failure", Some("Ana"))),
            Err(ClientError::ChannelPrivate),
        ]);

        let result = collect_comments(&client, ChannelEntity::Id(-100_123), 1).await;

        assert!(matches!(result, Err(CollectError::ChannelAccessDenied)));
    }

    #[tokio::test]
    async fn other_failures_carry_their_message() {
        let client = ScriptedClient::new(vec![Err(ClientError::UnknownChannel("ghost".into()))]);

        let result = collect_comments(&client, ChannelEntity::Handle("ghost".into()), 1).await;

        match result {
            Err(CollectError::ExtractionFailed(message)) => {
                assert_eq!(message, "No channel with username ghost was found");
            }
            other => panic!("Expected extraction failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn works_through_trait_objects() {
        let client: Box<dyn MessagingClient> =
            Box::new(ScriptedClient::new(vec![Ok(reply("hello", None))]));

        let comments = collect_comments(client.as_ref(), ChannelEntity::Handle("c".into()), 3)
            .await
            .unwrap();

        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].author, "");
    }
}
