use crate::record::ReplyPageRecord;
use futures::stream::{self, BoxStream, StreamExt};
use grammers_client::{Client, Config, InitParams, SignInError};
use grammers_mtsender::{AuthorizationError, InvocationError};
use grammers_session::{PackedChat, PackedType, Session};
use grammers_tl_types as tl;
use serde::Deserialize;
use std::{collections::VecDeque, io, path::PathBuf};
use tgcollect_common::{
    client::{ClientError, MessagingClient, ReplyMessage, Result},
    model::post::ChannelEntity,
};
use thiserror::Error;
use tracing::{debug, info};

const REPLIES_PAGE_SIZE: i32 = 100;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Error loading session file: {0}")]
    LoadSession(io::Error),
    #[error("Error saving session file: {0}")]
    SaveSession(io::Error),
    #[error("Error connecting to Telegram: {0}")]
    Connect(#[from] AuthorizationError),
    #[error(transparent)]
    Invocation(#[from] InvocationError),
    #[error("Error logging in: {0}")]
    Login(String),
    #[error("Error reading login input: {0}")]
    Prompt(io::Error),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct TelegramConfig {
    pub api_id: i32,
    pub api_hash: String,
    pub phone_number: String,
    pub session_file: Option<PathBuf>,
}

impl TelegramConfig {
    /// Defaults to a file named after the phone number.
    #[must_use]
    pub fn session_file(&self) -> PathBuf {
        self.session_file
            .clone()
            .unwrap_or_else(|| format!("{}.session", self.phone_number).into())
    }
}

pub struct TelegramClient {
    client: Client,
    session_file: PathBuf,
}

impl TelegramClient {
    pub async fn connect(config: &TelegramConfig) -> Result<Self, TelegramError> {
        let session_file = config.session_file();
        let session =
            Session::load_file_or_create(&session_file).map_err(TelegramError::LoadSession)?;

        let client = Client::connect(Config {
            session,
            api_id: config.api_id,
            api_hash: config.api_hash.clone(),
            params: InitParams::default(),
        })
        .await?;

        info!(session_file = %session_file.display(), "Connected to Telegram");

        Ok(Self {
            client,
            session_file,
        })
    }

    pub async fn is_authorized(&self) -> Result<bool, TelegramError> {
        Ok(self.client.is_authorized().await?)
    }

    /// Interactive login. `prompt` shows its argument and returns the user's answer.
    ///
    /// Returns the id of the logged in user.
    pub async fn log_in<P>(&self, phone_number: &str, mut prompt: P) -> Result<i64, TelegramError>
    where
        P: FnMut(&str) -> io::Result<String>,
    {
        let token = self
            .client
            .request_login_code(phone_number)
            .await
            .map_err(|err| TelegramError::Login(err.to_string()))?;
        let code = prompt("Enter the code you received: ").map_err(TelegramError::Prompt)?;

        let user = match self.client.sign_in(&token, code.trim()).await {
            Ok(user) => user,
            Err(SignInError::PasswordRequired(password_token)) => {
                let hint = password_token.hint().unwrap_or("none").to_owned();
                let password = prompt(&format!("Enter your password (hint: {hint}): "))
                    .map_err(TelegramError::Prompt)?;

                self.client
                    .check_password(password_token, password.trim())
                    .await
                    .map_err(|err| TelegramError::Login(err.to_string()))?
            }
            Err(err) => return Err(TelegramError::Login(err.to_string())),
        };

        self.save_session()?;
        Ok(user.id())
    }

    pub fn save_session(&self) -> Result<(), TelegramError> {
        self.client
            .session()
            .save_to_file(&self.session_file)
            .map_err(TelegramError::SaveSession)
    }

    /// Persists the session; the connection closes once the client is dropped.
    pub fn disconnect(&self) -> Result<(), TelegramError> {
        self.save_session()?;
        info!("Disconnected from Telegram");
        Ok(())
    }
}

impl MessagingClient for TelegramClient {
    fn replies(&self, channel: ChannelEntity, post_id: i32) -> BoxStream<'_, Result<ReplyMessage>> {
        let pages = ReplyPages {
            client: self.client.clone(),
            channel,
            post_id,
            peer: None,
            cursor: ReplyCursor::default(),
        };

        stream::try_unfold(pages, ReplyPages::next_reply).boxed()
    }
}

/// Paging position in a reply thread, newest replies first.
#[derive(Clone, Debug, Default)]
struct ReplyCursor {
    buffered: VecDeque<ReplyMessage>,
    offset_id: i32,
    exhausted: bool,
}

impl ReplyCursor {
    /// Buffers a fetched page. A page shorter than the requested size is the last one.
    fn advance(&mut self, page: ReplyPageRecord) {
        let full_page = i32::try_from(page.replies.len()).is_ok_and(|len| len >= REPLIES_PAGE_SIZE);
        match page.min_id() {
            Some(min_id) if full_page => self.offset_id = min_id,
            _ => self.exhausted = true,
        }

        self.buffered.extend(page.into_replies());
    }
}

struct ReplyPages {
    client: Client,
    channel: ChannelEntity,
    post_id: i32,
    peer: Option<tl::enums::InputPeer>,
    cursor: ReplyCursor,
}

impl ReplyPages {
    async fn next_reply(mut self) -> Result<Option<(ReplyMessage, Self)>> {
        loop {
            if let Some(reply) = self.cursor.buffered.pop_front() {
                return Ok(Some((reply, self)));
            }
            if self.cursor.exhausted {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    async fn fetch_page(&mut self) -> Result<()> {
        let peer = match &self.peer {
            Some(peer) => peer.clone(),
            None => {
                let peer = resolve_channel(&self.client, &self.channel).await?;
                self.peer = Some(peer.clone());
                peer
            }
        };

        let request = tl::functions::messages::GetReplies {
            peer,
            msg_id: self.post_id,
            offset_id: self.cursor.offset_id,
            offset_date: 0,
            add_offset: 0,
            limit: REPLIES_PAGE_SIZE,
            max_id: 0,
            min_id: 0,
            hash: 0,
        };
        let page = ReplyPageRecord::from(
            self.client
                .invoke(&request)
                .await
                .map_err(invocation_error)?,
        );

        debug!(
            post_id = self.post_id,
            offset_id = self.cursor.offset_id,
            fetched = page.replies.len(),
            "Fetched page of replies"
        );

        self.cursor.advance(page);
        Ok(())
    }
}

async fn resolve_channel(client: &Client, channel: &ChannelEntity) -> Result<tl::enums::InputPeer> {
    match channel {
        ChannelEntity::Handle(handle) => client
            .resolve_username(handle)
            .await
            .map_err(invocation_error)?
            .map(|chat| chat.pack().to_input_peer())
            .ok_or_else(|| ClientError::UnknownChannel(handle.clone())),
        ChannelEntity::Id(id) => {
            let bare_id = channel.bare_id().unwrap_or(*id);
            let mut joined = Vec::new();
            let mut dialogs = client.iter_dialogs();

            while let Some(dialog) = dialogs.next().await.map_err(invocation_error)? {
                joined.push(dialog.chat().pack());
            }

            joined_channel(joined, bare_id).map(|chat| chat.to_input_peer())
        }
    }
}

/// Finds a broadcast channel or supergroup among the user's chats.
///
/// Only joined channels carry a usable access hash, and users and basic groups
/// live in their own id spaces.
fn joined_channel(
    chats: impl IntoIterator<Item = PackedChat>,
    bare_id: i64,
) -> Result<PackedChat> {
    chats
        .into_iter()
        .find(|chat| {
            matches!(
                chat.ty,
                PackedType::Broadcast | PackedType::Megagroup | PackedType::Gigagroup
            ) && chat.id == bare_id
        })
        .ok_or(ClientError::ChannelPrivate)
}

fn invocation_error(error: InvocationError) -> ClientError {
    if let InvocationError::Rpc(rpc) = &error
        && rpc.name == "CHANNEL_PRIVATE"
    {
        return ClientError::ChannelPrivate;
    }

    ClientError::Other(Box::new(error))
}
