//! The named resource groups of the Web API.
//!
//! Each group holds a [`ResourceGroup`] and exposes its endpoints as thin
//! methods that format an API method name and parameters and dispatch them.
//! Groups with nested methods (`team.profile.*`, `users.profile.*`,
//! `files.comments.*`, `usergroups.users.*`) own a sub-group with its own
//! pool and registry; closing the parent closes both.
//!
//! Anything not covered by a typed method can go through
//! [`Endpoints::call`] with a hand-built [`ApiCall`].

use std::future::Future;
use std::sync::Arc;

use futures_util::future::join_all;
use slackline_core::{ApiCall, ClientConfig, Envelope, FileSource, Params, Result};
use slackline_net::{InFlight, ResourceGroup, combine_drains};

/// Dispatch surface shared by every resource group.
pub trait Endpoints: Send + Sync {
    /// The group calls are dispatched through.
    fn resource_group(&self) -> &ResourceGroup;

    /// This group and its sub-groups.
    fn resource_groups(&self) -> Vec<&ResourceGroup> {
        vec![self.resource_group()]
    }

    /// Dispatch an arbitrary call.
    fn call(&self, call: ApiCall) -> InFlight<Envelope> {
        self.resource_group().call(call)
    }

    /// Dispatch a GET.
    fn get(&self, method: &str, params: Params) -> InFlight<Envelope> {
        self.resource_group().get(method, params)
    }

    /// Dispatch a form-encoded POST.
    fn post(&self, method: &str, data: Params) -> InFlight<Envelope> {
        self.resource_group().post(method, data)
    }

    /// Calls in flight across this group and its sub-groups.
    fn outstanding(&self) -> usize {
        self.resource_groups()
            .into_iter()
            .map(ResourceGroup::outstanding)
            .sum()
    }

    /// Close this group and its sub-groups concurrently.
    fn close(&self) -> impl Future<Output = Result<()>> + Send + '_ {
        async move {
            let groups = self.resource_groups();
            combine_drains(join_all(groups.into_iter().map(|g| g.close())).await)
        }
    }
}

macro_rules! resource_group {
    ($(#[$meta:meta])* $ty:ident => $name:literal) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $ty {
            group: ResourceGroup,
        }

        impl $ty {
            pub(crate) fn new(config: &Arc<ClientConfig>) -> Result<Self> {
                Ok(Self {
                    group: ResourceGroup::new($name, Arc::clone(config))?,
                })
            }
        }

        impl Endpoints for $ty {
            fn resource_group(&self) -> &ResourceGroup {
                &self.group
            }
        }
    };
    ($(#[$meta:meta])* $ty:ident => $name:literal, $field:ident: $sub:ident) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $ty {
            group: ResourceGroup,
            #[doc = concat!("The `", $name, ".", stringify!($field), "` sub-group.")]
            pub $field: $sub,
        }

        impl $ty {
            pub(crate) fn new(config: &Arc<ClientConfig>) -> Result<Self> {
                Ok(Self {
                    group: ResourceGroup::new($name, Arc::clone(config))?,
                    $field: $sub::new(config)?,
                })
            }
        }

        impl Endpoints for $ty {
            fn resource_group(&self) -> &ResourceGroup {
                &self.group
            }

            fn resource_groups(&self) -> Vec<&ResourceGroup> {
                let mut groups = vec![&self.group];
                groups.extend(self.$field.resource_groups());
                groups
            }
        }
    };
}

resource_group!(
    /// `api.*`
    Api => "api"
);

impl Api {
    /// Check API calling code. `error` asks the server to fail with it.
    pub fn test(&self, error: Option<&str>) -> InFlight<Envelope> {
        self.get("api.test", Params::new().with("error", error))
    }
}

resource_group!(
    /// `auth.*`
    Auth => "auth"
);

impl Auth {
    /// Check authentication and identity.
    pub fn test(&self) -> InFlight<Envelope> {
        self.get("auth.test", Params::new())
    }

    /// Revoke the token.
    pub fn revoke(&self, test: bool) -> InFlight<Envelope> {
        self.get("auth.revoke", Params::new().with("test", test))
    }
}

resource_group!(
    /// `bots.*`
    Bots => "bots"
);

impl Bots {
    /// Information about a bot user.
    pub fn info(&self, bot: Option<&str>) -> InFlight<Envelope> {
        self.get("bots.info", Params::new().with("bot", bot))
    }
}

resource_group!(
    /// `chat.*`
    Chat => "chat"
);

impl Chat {
    /// Post a message to a channel.
    pub fn post_message(&self, channel: &str, text: &str) -> InFlight<Envelope> {
        self.post(
            "chat.postMessage",
            Params::new().with("channel", channel).with("text", text),
        )
    }

    /// Post a `/me` message.
    pub fn me_message(&self, channel: &str, text: &str) -> InFlight<Envelope> {
        self.post(
            "chat.meMessage",
            Params::new().with("channel", channel).with("text", text),
        )
    }

    /// Update a message.
    pub fn update(&self, channel: &str, ts: &str, text: &str) -> InFlight<Envelope> {
        self.post(
            "chat.update",
            Params::new()
                .with("channel", channel)
                .with("ts", ts)
                .with("text", text),
        )
    }

    /// Delete a message.
    pub fn delete(&self, channel: &str, ts: &str) -> InFlight<Envelope> {
        self.post("chat.delete", Params::new().with("channel", channel).with("ts", ts))
    }
}

resource_group!(
    /// `dnd.*`
    Dnd => "dnd"
);

impl Dnd {
    /// Do-not-disturb status of a user; the caller when `user` is `None`.
    pub fn info(&self, user: Option<&str>) -> InFlight<Envelope> {
        self.get("dnd.info", Params::new().with("user", user))
    }

    /// Do-not-disturb status of several users.
    pub fn team_info(&self, users: &[&str]) -> InFlight<Envelope> {
        self.get("dnd.teamInfo", Params::new().with("users", users.join(",")))
    }

    /// Snooze notifications for `num_minutes`.
    pub fn set_snooze(&self, num_minutes: u32) -> InFlight<Envelope> {
        self.post("dnd.setSnooze", Params::new().with("num_minutes", num_minutes))
    }

    /// End the current snooze.
    pub fn end_snooze(&self) -> InFlight<Envelope> {
        self.post("dnd.endSnooze", Params::new())
    }

    /// End the current do-not-disturb session.
    pub fn end_dnd(&self) -> InFlight<Envelope> {
        self.post("dnd.endDnd", Params::new())
    }
}

resource_group!(
    /// `im.*`
    Im => "im"
);

impl Im {
    /// List direct-message channels.
    pub fn list(&self) -> InFlight<Envelope> {
        self.get("im.list", Params::new())
    }

    /// Open a direct-message channel with a user.
    pub fn open(&self, user: &str) -> InFlight<Envelope> {
        self.post("im.open", Params::new().with("user", user))
    }

    /// Close a direct-message channel.
    pub fn close_channel(&self, channel: &str) -> InFlight<Envelope> {
        self.post("im.close", Params::new().with("channel", channel))
    }

    /// Message history of a direct-message channel.
    pub fn history(&self, channel: &str, count: Option<u32>) -> InFlight<Envelope> {
        self.get(
            "im.history",
            Params::new().with("channel", channel).with("count", count),
        )
    }
}

resource_group!(
    /// `mpim.*`
    Mpim => "mpim"
);

impl Mpim {
    /// List multiparty direct-message channels.
    pub fn list(&self) -> InFlight<Envelope> {
        self.get("mpim.list", Params::new())
    }

    /// Open a multiparty direct-message channel.
    pub fn open(&self, users: &[&str]) -> InFlight<Envelope> {
        self.post("mpim.open", Params::new().with("users", users.join(",")))
    }

    /// Message history of a multiparty channel.
    pub fn history(&self, channel: &str) -> InFlight<Envelope> {
        self.get("mpim.history", Params::new().with("channel", channel))
    }
}

resource_group!(
    /// `rtm.*`
    Rtm => "rtm"
);

impl Rtm {
    /// Start a real-time messaging session with full team state.
    pub fn start(&self) -> InFlight<Envelope> {
        self.get("rtm.start", Params::new())
    }

    /// Start a real-time messaging session with minimal state.
    pub fn connect(&self) -> InFlight<Envelope> {
        self.get("rtm.connect", Params::new())
    }
}

resource_group!(
    /// `team.profile.*`
    TeamProfile => "team.profile"
);

impl TeamProfile {
    /// The team's profile field definitions.
    pub fn fetch(&self, visibility: Option<&str>) -> InFlight<Envelope> {
        self.get(
            "team.profile.get",
            Params::new().with("visibility", visibility),
        )
    }
}

resource_group!(
    /// `team.*`
    Team => "team", profile: TeamProfile
);

impl Team {
    /// Information about the team.
    pub fn info(&self) -> InFlight<Envelope> {
        self.get("team.info", Params::new())
    }

    /// Access logs, paginated.
    pub fn access_logs(&self, count: Option<u32>, page: Option<u32>) -> InFlight<Envelope> {
        self.get(
            "team.accessLogs",
            Params::new().with("count", count).with("page", page),
        )
    }

    /// Billable status of the team's users.
    pub fn billable_info(&self, user: Option<&str>) -> InFlight<Envelope> {
        self.get("team.billableInfo", Params::new().with("user", user))
    }
}

resource_group!(
    /// `pins.*`
    Pins => "pins"
);

impl Pins {
    /// Pin a message or file to a channel.
    pub fn add(
        &self,
        channel: &str,
        file: Option<&str>,
        timestamp: Option<&str>,
    ) -> InFlight<Envelope> {
        self.post(
            "pins.add",
            Params::new()
                .with("channel", channel)
                .with("file", file)
                .with("timestamp", timestamp),
        )
    }

    /// Unpin a message or file.
    pub fn remove(
        &self,
        channel: &str,
        file: Option<&str>,
        timestamp: Option<&str>,
    ) -> InFlight<Envelope> {
        self.post(
            "pins.remove",
            Params::new()
                .with("channel", channel)
                .with("file", file)
                .with("timestamp", timestamp),
        )
    }

    /// Items pinned to a channel.
    pub fn list(&self, channel: &str) -> InFlight<Envelope> {
        self.get("pins.list", Params::new().with("channel", channel))
    }
}

resource_group!(
    /// `users.profile.*`
    UsersProfile => "users.profile"
);

impl UsersProfile {
    /// A user's profile; the caller's when `user` is `None`.
    pub fn fetch(&self, user: Option<&str>, include_labels: bool) -> InFlight<Envelope> {
        self.get(
            "users.profile.get",
            Params::new()
                .with("user", user)
                .with("include_labels", include_labels),
        )
    }

    /// Set one profile field.
    pub fn set(&self, user: Option<&str>, name: &str, value: &str) -> InFlight<Envelope> {
        self.post(
            "users.profile.set",
            Params::new()
                .with("user", user)
                .with("name", name)
                .with("value", value),
        )
    }
}

resource_group!(
    /// `users.*`
    Users => "users", profile: UsersProfile
);

impl Users {
    /// Information about a user.
    pub fn info(&self, user: &str) -> InFlight<Envelope> {
        self.get("users.info", Params::new().with("user", user))
    }

    /// List the team's users.
    pub fn list(&self, presence: bool) -> InFlight<Envelope> {
        self.get("users.list", Params::new().with("presence", presence))
    }

    /// Identity of the caller.
    pub fn identity(&self) -> InFlight<Envelope> {
        self.get("users.identity", Params::new())
    }

    /// Mark the caller as active.
    pub fn set_active(&self) -> InFlight<Envelope> {
        self.post("users.setActive", Params::new())
    }

    /// A user's presence.
    pub fn get_presence(&self, user: &str) -> InFlight<Envelope> {
        self.get("users.getPresence", Params::new().with("user", user))
    }

    /// Set the caller's presence, `auto` or `away`.
    pub fn set_presence(&self, presence: &str) -> InFlight<Envelope> {
        self.post("users.setPresence", Params::new().with("presence", presence))
    }
}

resource_group!(
    /// `files.comments.*`
    FilesComments => "files.comments"
);

impl FilesComments {
    /// Comment on a file.
    pub fn add(&self, file: &str, comment: &str) -> InFlight<Envelope> {
        self.post(
            "files.comments.add",
            Params::new().with("file", file).with("comment", comment),
        )
    }

    /// Edit a comment.
    pub fn edit(&self, file: &str, id: &str, comment: &str) -> InFlight<Envelope> {
        self.post(
            "files.comments.edit",
            Params::new()
                .with("file", file)
                .with("id", id)
                .with("comment", comment),
        )
    }

    /// Delete a comment.
    pub fn delete(&self, file: &str, id: &str) -> InFlight<Envelope> {
        self.post(
            "files.comments.delete",
            Params::new().with("file", file).with("id", id),
        )
    }
}

/// Optional fields of a file upload.
#[derive(Clone, Debug, Default)]
pub struct UploadOptions {
    /// Channels to share the file in.
    pub channels: Vec<String>,
    /// File title.
    pub title: Option<String>,
    /// File type identifier.
    pub filetype: Option<String>,
    /// Initial comment.
    pub initial_comment: Option<String>,
    /// Thread to post the file in.
    pub thread_ts: Option<String>,
}

resource_group!(
    /// `files.*`
    Files => "files", comments: FilesComments
);

impl Files {
    /// Upload a file as multipart form data.
    ///
    /// Channels are sent comma-joined; unset options are left out of the
    /// form.
    pub fn upload(&self, file: FileSource, options: UploadOptions) -> InFlight<Envelope> {
        let channels = (!options.channels.is_empty()).then(|| options.channels.join(","));
        let data = Params::new()
            .with("channels", channels)
            .with("title", options.title)
            .with("filetype", options.filetype)
            .with("initial_comment", options.initial_comment)
            .with("thread_ts", options.thread_ts);
        self.resource_group()
            .upload("files.upload", vec![("file".to_string(), file)], data)
    }

    /// Information about a file.
    pub fn info(&self, file: &str) -> InFlight<Envelope> {
        self.get("files.info", Params::new().with("file", file))
    }

    /// List files, optionally of one user or channel.
    pub fn list(&self, user: Option<&str>, channel: Option<&str>) -> InFlight<Envelope> {
        self.get(
            "files.list",
            Params::new().with("user", user).with("channel", channel),
        )
    }

    /// Delete a file.
    pub fn delete(&self, file: &str) -> InFlight<Envelope> {
        self.post("files.delete", Params::new().with("file", file))
    }
}

resource_group!(
    /// `stars.*`
    Stars => "stars"
);

impl Stars {
    /// Star a channel, file or message.
    pub fn add(
        &self,
        channel: Option<&str>,
        file: Option<&str>,
        timestamp: Option<&str>,
    ) -> InFlight<Envelope> {
        self.post(
            "stars.add",
            Params::new()
                .with("channel", channel)
                .with("file", file)
                .with("timestamp", timestamp),
        )
    }

    /// Remove a star.
    pub fn remove(
        &self,
        channel: Option<&str>,
        file: Option<&str>,
        timestamp: Option<&str>,
    ) -> InFlight<Envelope> {
        self.post(
            "stars.remove",
            Params::new()
                .with("channel", channel)
                .with("file", file)
                .with("timestamp", timestamp),
        )
    }

    /// Items starred by the caller.
    pub fn list(&self) -> InFlight<Envelope> {
        self.get("stars.list", Params::new())
    }
}

resource_group!(
    /// `emoji.*`
    Emoji => "emoji"
);

impl Emoji {
    /// Custom emoji of the team.
    pub fn list(&self) -> InFlight<Envelope> {
        self.get("emoji.list", Params::new())
    }
}

resource_group!(
    /// `search.*`
    Search => "search"
);

impl Search {
    /// Search messages and files.
    pub fn all(&self, query: &str) -> InFlight<Envelope> {
        self.get("search.all", Params::new().with("query", query))
    }

    /// Search messages.
    pub fn messages(&self, query: &str) -> InFlight<Envelope> {
        self.get("search.messages", Params::new().with("query", query))
    }

    /// Search files.
    pub fn files(&self, query: &str) -> InFlight<Envelope> {
        self.get("search.files", Params::new().with("query", query))
    }
}

resource_group!(
    /// `groups.*`, the private channels.
    Groups => "groups"
);

impl Groups {
    /// List private channels.
    pub fn list(&self, exclude_archived: bool) -> InFlight<Envelope> {
        self.get(
            "groups.list",
            Params::new().with("exclude_archived", exclude_archived),
        )
    }

    /// Create a private channel.
    pub fn create(&self, name: &str) -> InFlight<Envelope> {
        self.post("groups.create", Params::new().with("name", name))
    }

    /// Message history of a private channel.
    pub fn history(&self, channel: &str) -> InFlight<Envelope> {
        self.get("groups.history", Params::new().with("channel", channel))
    }

    /// Invite a user.
    pub fn invite(&self, channel: &str, user: &str) -> InFlight<Envelope> {
        self.post(
            "groups.invite",
            Params::new().with("channel", channel).with("user", user),
        )
    }

    /// Archive a private channel.
    pub fn archive(&self, channel: &str) -> InFlight<Envelope> {
        self.post("groups.archive", Params::new().with("channel", channel))
    }
}

resource_group!(
    /// `channels.*`
    Channels => "channels"
);

impl Channels {
    /// List public channels.
    pub fn list(&self, exclude_archived: bool) -> InFlight<Envelope> {
        self.get(
            "channels.list",
            Params::new().with("exclude_archived", exclude_archived),
        )
    }

    /// Information about a channel.
    pub fn info(&self, channel: &str) -> InFlight<Envelope> {
        self.get("channels.info", Params::new().with("channel", channel))
    }

    /// Message history of a channel.
    pub fn history(
        &self,
        channel: &str,
        latest: Option<&str>,
        count: Option<u32>,
    ) -> InFlight<Envelope> {
        self.get(
            "channels.history",
            Params::new()
                .with("channel", channel)
                .with("latest", latest)
                .with("count", count),
        )
    }

    /// Create a channel.
    pub fn create(&self, name: &str) -> InFlight<Envelope> {
        self.post("channels.create", Params::new().with("name", name))
    }

    /// Join a channel by name.
    pub fn join(&self, name: &str) -> InFlight<Envelope> {
        self.post("channels.join", Params::new().with("name", name))
    }

    /// Leave a channel.
    pub fn leave(&self, channel: &str) -> InFlight<Envelope> {
        self.post("channels.leave", Params::new().with("channel", channel))
    }

    /// Invite a user.
    pub fn invite(&self, channel: &str, user: &str) -> InFlight<Envelope> {
        self.post(
            "channels.invite",
            Params::new().with("channel", channel).with("user", user),
        )
    }

    /// Set the channel topic.
    pub fn set_topic(&self, channel: &str, topic: &str) -> InFlight<Envelope> {
        self.post(
            "channels.setTopic",
            Params::new().with("channel", channel).with("topic", topic),
        )
    }

    /// Set the channel purpose.
    pub fn set_purpose(&self, channel: &str, purpose: &str) -> InFlight<Envelope> {
        self.post(
            "channels.setPurpose",
            Params::new().with("channel", channel).with("purpose", purpose),
        )
    }

    /// Archive a channel.
    pub fn archive(&self, channel: &str) -> InFlight<Envelope> {
        self.post("channels.archive", Params::new().with("channel", channel))
    }
}

resource_group!(
    /// `presence.*`
    Presence => "presence"
);

impl Presence {
    /// Set the caller's presence, `active` or `away`.
    pub fn set(&self, presence: &str) -> InFlight<Envelope> {
        self.post("presence.set", Params::new().with("presence", presence))
    }
}

resource_group!(
    /// `reminders.*`
    Reminders => "reminders"
);

impl Reminders {
    /// Create a reminder. `time` is a timestamp or natural-language time.
    pub fn add(&self, text: &str, time: &str, user: Option<&str>) -> InFlight<Envelope> {
        self.post(
            "reminders.add",
            Params::new()
                .with("text", text)
                .with("time", time)
                .with("user", user),
        )
    }

    /// Mark a reminder complete.
    pub fn complete(&self, reminder: &str) -> InFlight<Envelope> {
        self.post("reminders.complete", Params::new().with("reminder", reminder))
    }

    /// Delete a reminder.
    pub fn delete(&self, reminder: &str) -> InFlight<Envelope> {
        self.post("reminders.delete", Params::new().with("reminder", reminder))
    }

    /// Information about a reminder.
    pub fn info(&self, reminder: &str) -> InFlight<Envelope> {
        self.get("reminders.info", Params::new().with("reminder", reminder))
    }

    /// The caller's reminders.
    pub fn list(&self) -> InFlight<Envelope> {
        self.get("reminders.list", Params::new())
    }
}

resource_group!(
    /// `reactions.*`
    Reactions => "reactions"
);

impl Reactions {
    /// Add an emoji reaction to a message.
    pub fn add(&self, name: &str, channel: &str, timestamp: &str) -> InFlight<Envelope> {
        self.post(
            "reactions.add",
            Params::new()
                .with("name", name)
                .with("channel", channel)
                .with("timestamp", timestamp),
        )
    }

    /// Reactions on a message.
    pub fn get_for(&self, channel: &str, timestamp: &str) -> InFlight<Envelope> {
        self.get(
            "reactions.get",
            Params::new().with("channel", channel).with("timestamp", timestamp),
        )
    }

    /// Items the caller reacted to.
    pub fn list(&self, user: Option<&str>) -> InFlight<Envelope> {
        self.get("reactions.list", Params::new().with("user", user))
    }

    /// Remove a reaction.
    pub fn remove(&self, name: &str, channel: &str, timestamp: &str) -> InFlight<Envelope> {
        self.post(
            "reactions.remove",
            Params::new()
                .with("name", name)
                .with("channel", channel)
                .with("timestamp", timestamp),
        )
    }
}

resource_group!(
    /// `idpgroups.*`
    IdpGroups => "idpgroups"
);

impl IdpGroups {
    /// List identity-provider groups.
    pub fn list(&self, include_users: bool) -> InFlight<Envelope> {
        self.get(
            "idpgroups.list",
            Params::new().with("include_users", include_users),
        )
    }
}

resource_group!(
    /// `usergroups.users.*`
    UserGroupsUsers => "usergroups.users"
);

impl UserGroupsUsers {
    /// Members of a user group.
    pub fn list(&self, usergroup: &str, include_disabled: bool) -> InFlight<Envelope> {
        self.get(
            "usergroups.users.list",
            Params::new()
                .with("usergroup", usergroup)
                .with("include_disabled", include_disabled),
        )
    }

    /// Replace the members of a user group.
    pub fn update(&self, usergroup: &str, users: &[&str]) -> InFlight<Envelope> {
        self.post(
            "usergroups.users.update",
            Params::new()
                .with("usergroup", usergroup)
                .with("users", users.join(",")),
        )
    }
}

resource_group!(
    /// `usergroups.*`
    UserGroups => "usergroups", users: UserGroupsUsers
);

impl UserGroups {
    /// List user groups.
    pub fn list(&self, include_disabled: bool, include_count: bool) -> InFlight<Envelope> {
        self.get(
            "usergroups.list",
            Params::new()
                .with("include_disabled", include_disabled)
                .with("include_count", include_count),
        )
    }

    /// Create a user group.
    pub fn create(
        &self,
        name: &str,
        handle: Option<&str>,
        description: Option<&str>,
    ) -> InFlight<Envelope> {
        self.post(
            "usergroups.create",
            Params::new()
                .with("name", name)
                .with("handle", handle)
                .with("description", description),
        )
    }

    /// Disable a user group.
    pub fn disable(&self, usergroup: &str) -> InFlight<Envelope> {
        self.post("usergroups.disable", Params::new().with("usergroup", usergroup))
    }

    /// Enable a user group.
    pub fn enable(&self, usergroup: &str) -> InFlight<Envelope> {
        self.post("usergroups.enable", Params::new().with("usergroup", usergroup))
    }
}
