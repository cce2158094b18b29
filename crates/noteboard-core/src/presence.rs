//! Presence notifications
//!
//! The directory service pushes presence changes as JSON messages
//! (`{"id": ..., "availability": ...}`). Each message is turned into at most
//! one in-app toast:
//!
//! - a user who becomes `Available` and is not on the board gets an invite
//!   toast;
//! - a user already on the board gets a short status toast;
//! - changes of the local user are ignored.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{BoardError, BoardResult};

/// How long a status toast stays on screen
pub const STATUS_TOAST_DURATION: Duration = Duration::from_millis(5000);

/// Availability reported by the directory service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Availability {
    Available,
    AvailableIdle,
    Away,
    BeRightBack,
    Busy,
    BusyIdle,
    DoNotDisturb,
    Offline,
    PresenceUnknown,
    /// Any value this version does not know about
    Other(String),
}

impl Availability {
    pub fn as_str(&self) -> &str {
        match self {
            Availability::Available => "Available",
            Availability::AvailableIdle => "AvailableIdle",
            Availability::Away => "Away",
            Availability::BeRightBack => "BeRightBack",
            Availability::Busy => "Busy",
            Availability::BusyIdle => "BusyIdle",
            Availability::DoNotDisturb => "DoNotDisturb",
            Availability::Offline => "Offline",
            Availability::PresenceUnknown => "PresenceUnknown",
            Availability::Other(s) => s,
        }
    }
}

impl From<String> for Availability {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Available" => Availability::Available,
            "AvailableIdle" => Availability::AvailableIdle,
            "Away" => Availability::Away,
            "BeRightBack" => Availability::BeRightBack,
            "Busy" => Availability::Busy,
            "BusyIdle" => Availability::BusyIdle,
            "DoNotDisturb" => Availability::DoNotDisturb,
            "Offline" => Availability::Offline,
            "PresenceUnknown" => Availability::PresenceUnknown,
            _ => Availability::Other(s),
        }
    }
}

impl From<Availability> for String {
    fn from(a: Availability) -> Self {
        match a {
            Availability::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A presence change pushed by the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEvent {
    /// Directory user id
    pub id: String,
    pub availability: Availability,
}

impl PresenceEvent {
    /// Parse a raw presence message
    pub fn parse(message: &str) -> BoardResult<Self> {
        serde_json::from_str(message).map_err(BoardError::MalformedPresence)
    }
}

/// What to do about a presence change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceAction {
    /// Offer to invite the user into the session
    Invite { user_id: String },
    /// Tell the session a collaborator's status changed
    StatusChanged {
        user_id: String,
        availability: Availability,
    },
    Ignore,
}

/// Decide how to react to a presence change
///
/// `me` is the local user, `roster` the users signed in to the board.
pub fn decide(event: &PresenceEvent, me: &str, roster: &[String]) -> PresenceAction {
    if event.id == me {
        return PresenceAction::Ignore;
    }

    let on_board = roster.iter().any(|id| *id == event.id);
    if on_board {
        PresenceAction::StatusChanged {
            user_id: event.id.clone(),
            availability: event.availability.clone(),
        }
    } else if event.availability == Availability::Available {
        PresenceAction::Invite {
            user_id: event.id.clone(),
        }
    } else {
        PresenceAction::Ignore
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Invite,
    StatusChanged,
}

/// An in-app notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// One toast per user: the id is the user id
    pub id: String,
    pub kind: ToastKind,
    pub message: String,
    /// `None` stays until dismissed
    pub auto_close: Option<Duration>,
}

impl Toast {
    pub fn for_action(action: &PresenceAction) -> Option<Self> {
        match action {
            PresenceAction::Invite { user_id } => Some(Self {
                id: user_id.clone(),
                kind: ToastKind::Invite,
                message: format!("{} is available. Invite them to collaborate?", user_id),
                auto_close: None,
            }),
            PresenceAction::StatusChanged {
                user_id,
                availability,
            } => Some(Self {
                id: user_id.clone(),
                kind: ToastKind::StatusChanged,
                message: format!("{}: user status changed to {}", user_id, availability),
                auto_close: Some(STATUS_TOAST_DURATION),
            }),
            PresenceAction::Ignore => None,
        }
    }
}

/// Active toasts, at most one per id
#[derive(Debug, Default)]
pub struct ToastCenter {
    toasts: Vec<Toast>,
}

impl ToastCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a toast unless one with the same id is already showing
    pub fn show(&mut self, toast: Toast) -> bool {
        if self.toasts.iter().any(|t| t.id == toast.id) {
            debug!(id = %toast.id, "Toast already showing");
            return false;
        }
        self.toasts.push(toast);
        true
    }

    pub fn dismiss(&mut self, id: &str) -> Option<Toast> {
        let pos = self.toasts.iter().position(|t| t.id == id)?;
        Some(self.toasts.remove(pos))
    }

    pub fn active(&self) -> &[Toast] {
        &self.toasts
    }
}

/// Turns presence messages into toasts for the local user
#[derive(Debug)]
pub struct PresenceNotifier {
    me: String,
    availability: HashMap<String, Availability>,
    toasts: ToastCenter,
}

impl PresenceNotifier {
    pub fn new(me: impl Into<String>) -> Self {
        Self {
            me: me.into(),
            availability: HashMap::new(),
            toasts: ToastCenter::new(),
        }
    }

    /// Handle one raw presence message
    ///
    /// The latest availability is recorded for every user, including ones
    /// that produce no toast.
    pub fn handle_message(
        &mut self,
        message: &str,
        roster: &[String],
    ) -> BoardResult<PresenceAction> {
        let event = PresenceEvent::parse(message)?;
        Ok(self.handle_event(event, roster))
    }

    pub fn handle_event(&mut self, event: PresenceEvent, roster: &[String]) -> PresenceAction {
        info!(user_id = %event.id, availability = %event.availability, "Presence changed");
        let action = decide(&event, &self.me, roster);
        self.availability.insert(event.id, event.availability);

        if let Some(toast) = Toast::for_action(&action) {
            self.toasts.show(toast);
        }
        action
    }

    /// Last known availability of a user
    pub fn availability_of(&self, user_id: &str) -> Option<&Availability> {
        self.availability.get(user_id)
    }

    pub fn toasts(&self) -> &ToastCenter {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut ToastCenter {
        &mut self.toasts
    }
}
