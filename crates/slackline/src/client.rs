//! The top-level client.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::future::join_all;
use slackline_core::logging::targets;
use slackline_core::{ClientConfig, ClientSettings, Result};
use slackline_net::{IncomingWebhook, ResourceGroup, combine_drains};
use tokio::runtime::Handle;

use crate::groups::*;

/// A Slack Web API client.
///
/// Owns one resource group per API namespace plus the incoming webhook, all
/// sharing one [`ClientConfig`]. Close it with [`close_all`](Self::close_all)
/// when done, or run it inside [`scope`](Self::scope).
///
/// ```ignore
/// let config = ClientConfig::builder(Handle::current()).token("xoxb-...").build()?;
/// let slack = SlackClient::new(config)?;
///
/// slack.chat.post_message("C1", "hello").await?;
/// slack.close_all().await?;
/// ```
#[derive(Debug)]
pub struct SlackClient {
    config: Arc<ClientConfig>,
    /// `im.*`
    pub im: Im,
    /// `api.*`
    pub api: Api,
    /// `dnd.*`
    pub dnd: Dnd,
    /// `rtm.*`
    pub rtm: Rtm,
    /// `auth.*`
    pub auth: Auth,
    /// `bots.*`
    pub bots: Bots,
    /// `chat.*`
    pub chat: Chat,
    /// `team.*` and `team.profile.*`
    pub team: Team,
    /// `pins.*`
    pub pins: Pins,
    /// `mpim.*`
    pub mpim: Mpim,
    /// `users.*` and `users.profile.*`
    pub users: Users,
    /// `files.*` and `files.comments.*`
    pub files: Files,
    /// `stars.*`
    pub stars: Stars,
    /// `emoji.*`
    pub emoji: Emoji,
    /// `search.*`
    pub search: Search,
    /// `groups.*`
    pub groups: Groups,
    /// `channels.*`
    pub channels: Channels,
    /// `presence.*`
    pub presence: Presence,
    /// `reminders.*`
    pub reminders: Reminders,
    /// `reactions.*`
    pub reactions: Reactions,
    /// `idpgroups.*`
    pub idpgroups: IdpGroups,
    /// `usergroups.*` and `usergroups.users.*`
    pub usergroups: UserGroups,
    /// The incoming webhook.
    pub incoming_webhook: IncomingWebhook,
    closed: AtomicBool,
}

impl SlackClient {
    /// Create a client and all its resource groups.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let config = Arc::new(config);
        let client = Self {
            im: Im::new(&config)?,
            api: Api::new(&config)?,
            dnd: Dnd::new(&config)?,
            rtm: Rtm::new(&config)?,
            auth: Auth::new(&config)?,
            bots: Bots::new(&config)?,
            chat: Chat::new(&config)?,
            team: Team::new(&config)?,
            pins: Pins::new(&config)?,
            mpim: Mpim::new(&config)?,
            users: Users::new(&config)?,
            files: Files::new(&config)?,
            stars: Stars::new(&config)?,
            emoji: Emoji::new(&config)?,
            search: Search::new(&config)?,
            groups: Groups::new(&config)?,
            channels: Channels::new(&config)?,
            presence: Presence::new(&config)?,
            reminders: Reminders::new(&config)?,
            reactions: Reactions::new(&config)?,
            idpgroups: IdpGroups::new(&config)?,
            usergroups: UserGroups::new(&config)?,
            incoming_webhook: IncomingWebhook::new(Arc::clone(&config))?,
            closed: AtomicBool::new(false),
            config,
        };
        tracing::debug!(
            target: targets::CLIENT,
            groups = client.resource_groups().len(),
            "client created"
        );
        Ok(client)
    }

    /// Create a client from a TOML settings file.
    pub fn from_settings_file(path: impl AsRef<Path>, runtime: Handle) -> Result<Self> {
        let settings = ClientSettings::from_file(path)?;
        Self::new(ClientConfig::from_settings(settings, runtime)?)
    }

    /// The shared configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Every resource group and sub-group.
    pub fn resource_groups(&self) -> Vec<&ResourceGroup> {
        let mut groups = Vec::new();
        groups.extend(self.im.resource_groups());
        groups.extend(self.api.resource_groups());
        groups.extend(self.dnd.resource_groups());
        groups.extend(self.rtm.resource_groups());
        groups.extend(self.auth.resource_groups());
        groups.extend(self.bots.resource_groups());
        groups.extend(self.chat.resource_groups());
        groups.extend(self.team.resource_groups());
        groups.extend(self.pins.resource_groups());
        groups.extend(self.mpim.resource_groups());
        groups.extend(self.users.resource_groups());
        groups.extend(self.files.resource_groups());
        groups.extend(self.stars.resource_groups());
        groups.extend(self.emoji.resource_groups());
        groups.extend(self.search.resource_groups());
        groups.extend(self.groups.resource_groups());
        groups.extend(self.channels.resource_groups());
        groups.extend(self.presence.resource_groups());
        groups.extend(self.reminders.resource_groups());
        groups.extend(self.reactions.resource_groups());
        groups.extend(self.idpgroups.resource_groups());
        groups.extend(self.usergroups.resource_groups());
        groups
    }

    /// Calls in flight across all groups and the webhook.
    pub fn outstanding(&self) -> usize {
        self.resource_groups()
            .into_iter()
            .map(ResourceGroup::outstanding)
            .sum::<usize>()
            + self.incoming_webhook.registry().len()
    }

    /// Check if [`close_all`](Self::close_all) has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close every group, sub-group and the webhook concurrently.
    ///
    /// Completes once all of them have drained their calls in flight and
    /// released their pools. Failures of drained calls are collected into one
    /// [`slackline_core::Error::Drain`]. Safe to call more than once.
    pub async fn close_all(&self) -> Result<()> {
        let groups = self.resource_groups();
        tracing::debug!(
            target: targets::CLIENT,
            groups = groups.len(),
            outstanding = self.outstanding(),
            "closing client"
        );

        let (drained, webhook) = tokio::join!(
            join_all(groups.into_iter().map(|g| g.close())),
            self.incoming_webhook.close(),
        );
        self.closed.store(true, Ordering::Release);

        combine_drains(drained.into_iter().chain(std::iter::once(webhook)))
    }

    /// Run `body` with a fresh client and close it afterwards.
    ///
    /// The client is closed whether or not `body` fails. An error from
    /// `body` takes precedence over one from closing.
    pub async fn scope<F, Fut, T>(config: ClientConfig, body: F) -> Result<T>
    where
        F: FnOnce(Arc<SlackClient>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let client = Arc::new(Self::new(config)?);
        let result = body(Arc::clone(&client)).await;
        let closed = client.close_all().await;

        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                tracing::warn!(
                    target: targets::CLIENT,
                    error = %close_err,
                    "closing client after a failed scope also failed"
                );
                Err(err)
            }
        }
    }
}

impl Drop for SlackClient {
    fn drop(&mut self) {
        if !self.is_closed() {
            tracing::warn!(
                target: targets::CLIENT,
                outstanding = self.outstanding(),
                "client dropped without close_all; calls in flight are detached"
            );
        }
    }
}
