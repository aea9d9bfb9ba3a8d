//! Command and event names understood by the peer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Command carried in the `cmd` field of every command frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    /// Unsolicited event push from the peer.
    Dispatch,
    Authorize,
    Authenticate,
    GetGuild,
    GetGuilds,
    GetChannel,
    GetChannels,
    Subscribe,
    Unsubscribe,
    SetUserVoiceSettings,
    SelectVoiceChannel,
    GetSelectedVoiceChannel,
    SelectTextChannel,
    GetVoiceSettings,
    SetVoiceSettings,
    CaptureShortcut,
    SetCertifiedDevices,
    SetActivity,
    SendActivityJoinInvite,
    CloseActivityRequest,
}

impl CommandKind {
    /// Wire name of the command.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dispatch => "DISPATCH",
            Self::Authorize => "AUTHORIZE",
            Self::Authenticate => "AUTHENTICATE",
            Self::GetGuild => "GET_GUILD",
            Self::GetGuilds => "GET_GUILDS",
            Self::GetChannel => "GET_CHANNEL",
            Self::GetChannels => "GET_CHANNELS",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::SetUserVoiceSettings => "SET_USER_VOICE_SETTINGS",
            Self::SelectVoiceChannel => "SELECT_VOICE_CHANNEL",
            Self::GetSelectedVoiceChannel => "GET_SELECTED_VOICE_CHANNEL",
            Self::SelectTextChannel => "SELECT_TEXT_CHANNEL",
            Self::GetVoiceSettings => "GET_VOICE_SETTINGS",
            Self::SetVoiceSettings => "SET_VOICE_SETTINGS",
            Self::CaptureShortcut => "CAPTURE_SHORTCUT",
            Self::SetCertifiedDevices => "SET_CERTIFIED_DEVICES",
            Self::SetActivity => "SET_ACTIVITY",
            Self::SendActivityJoinInvite => "SEND_ACTIVITY_JOIN_INVITE",
            Self::CloseActivityRequest => "CLOSE_ACTIVITY_REQUEST",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Event carried in the `evt` field of dispatches, errors and
/// subscription commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// Handshake accepted; the session is usable.
    Ready,
    /// A command failed or the peer reports a protocol error.
    Error,
    GuildStatus,
    GuildCreate,
    ChannelCreate,
    VoiceChannelSelect,
    VoiceStateCreate,
    VoiceStateUpdate,
    VoiceStateDelete,
    VoiceSettingsUpdate,
    VoiceConnectionStatus,
    SpeakingStart,
    SpeakingStop,
    MessageCreate,
    MessageUpdate,
    MessageDelete,
    NotificationCreate,
    CaptureShortcutChange,
    ActivityJoin,
    ActivitySpectate,
    ActivityJoinRequest,
}

/// Identifier an event subscription must carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriptionScope {
    /// Subscribing is not allowed.
    Forbidden,
    /// A guild id is required.
    Guild,
    /// A channel id is required.
    Channel,
    /// No id may be given.
    Global,
}

impl EventKind {
    /// Wire name of the event.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Error => "ERROR",
            Self::GuildStatus => "GUILD_STATUS",
            Self::GuildCreate => "GUILD_CREATE",
            Self::ChannelCreate => "CHANNEL_CREATE",
            Self::VoiceChannelSelect => "VOICE_CHANNEL_SELECT",
            Self::VoiceStateCreate => "VOICE_STATE_CREATE",
            Self::VoiceStateUpdate => "VOICE_STATE_UPDATE",
            Self::VoiceStateDelete => "VOICE_STATE_DELETE",
            Self::VoiceSettingsUpdate => "VOICE_SETTINGS_UPDATE",
            Self::VoiceConnectionStatus => "VOICE_CONNECTION_STATUS",
            Self::SpeakingStart => "SPEAKING_START",
            Self::SpeakingStop => "SPEAKING_STOP",
            Self::MessageCreate => "MESSAGE_CREATE",
            Self::MessageUpdate => "MESSAGE_UPDATE",
            Self::MessageDelete => "MESSAGE_DELETE",
            Self::NotificationCreate => "NOTIFICATION_CREATE",
            Self::CaptureShortcutChange => "CAPTURE_SHORTCUT_CHANGE",
            Self::ActivityJoin => "ACTIVITY_JOIN",
            Self::ActivitySpectate => "ACTIVITY_SPECTATE",
            Self::ActivityJoinRequest => "ACTIVITY_JOIN_REQUEST",
        }
    }

    /// Which identifier, if any, a subscription to this event needs.
    #[must_use]
    pub fn subscription_scope(self) -> SubscriptionScope {
        match self {
            Self::Ready | Self::Error => SubscriptionScope::Forbidden,
            Self::GuildStatus => SubscriptionScope::Guild,
            Self::VoiceStateCreate
            | Self::VoiceStateUpdate
            | Self::VoiceStateDelete
            | Self::MessageCreate
            | Self::MessageUpdate
            | Self::MessageDelete
            | Self::SpeakingStart
            | Self::SpeakingStop => SubscriptionScope::Channel,
            _ => SubscriptionScope::Global,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}
