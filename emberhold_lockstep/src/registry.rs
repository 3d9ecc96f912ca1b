// Connected-player registry and join admission.
//
// `ClientRegistry` tracks the set of currently connected players: their
// transport identity, their assigned player-data slot, and a per-client
// info backlog. It is a plain single-threaded structure — all locking
// lives in `session.rs`, which is the only place a registry is reachable
// from two threads.
//
// Admission is deliberately thin. The registry does not know how to map
// a joining player onto a game-session slot; that depends on whether the
// session is a fresh game or a loaded one, and on bookkeeping owned by
// the game's mission description. The `MissionDirectory` trait is that
// seam: the registry dispatches on `SessionMode`, and the directory
// either returns a slot or declines. Declining is an expected outcome
// (`AdmitError::NoCompatibleSlot`), not a failure — the network layer
// notifies the rejected peer; the registry sends nothing.

use std::collections::BTreeMap;

use log::info;
use thiserror::Error;

use emberhold_commands::{ConnectionId, InfoRecord, PlayerProfile, PlayerSlot, SessionMode};

use crate::backlog::{BacklogFull, INFO_BACKLOG_CAPACITY, InfoBacklog};

/// Maps joining players onto game-session slots.
///
/// Implemented by the game's mission-description bookkeeping. Both
/// connect methods return `None` when no compatible slot exists.
/// `mark_changed` signals that the session description changed; a
/// separate persistence/broadcast path consumes that signal.
pub trait MissionDirectory {
    fn connect_new_player(
        &mut self,
        profile: &PlayerProfile,
        connection: ConnectionId,
    ) -> Option<PlayerSlot>;

    fn connect_load_player(
        &mut self,
        profile: &PlayerProfile,
        connection: ConnectionId,
    ) -> Option<PlayerSlot>;

    fn mark_changed(&mut self);
}

/// Why a join attempt was not admitted.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AdmitError {
    #[error("no compatible slot for player {name:?}")]
    NoCompatibleSlot { name: String },
    #[error("connection {0:?} is already registered")]
    AlreadyConnected(ConnectionId),
}

/// A backlog operation addressed a client that could not take it.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InfoError {
    #[error("connection {0:?} is not registered")]
    UnknownConnection(ConnectionId),
    #[error(transparent)]
    Full(#[from] BacklogFull),
}

/// A connected player.
#[derive(Debug)]
pub struct Client {
    pub connection: ConnectionId,
    pub slot: PlayerSlot,
    pub description: String,
    backlog: InfoBacklog,
}

impl Client {
    fn new(connection: ConnectionId, slot: PlayerSlot, description: String) -> Self {
        Self {
            connection,
            slot,
            description,
            backlog: InfoBacklog::new(INFO_BACKLOG_CAPACITY),
        }
    }

    /// Buffer an inbound info record for this client.
    pub fn push_info(&mut self, record: InfoRecord) -> Result<(), BacklogFull> {
        self.backlog.push(record)
    }

    /// Take the oldest buffered info record, if any.
    pub fn next_info(&mut self) -> Option<InfoRecord> {
        self.backlog.pop()
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }
}

/// The set of currently connected players.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: BTreeMap<ConnectionId, Client>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a joining player, assigning a player-data slot through the
    /// mission directory. On success the session description is marked
    /// changed and a `Client` with a pre-sized backlog joins the set; on
    /// rejection the set is untouched.
    pub fn add_client(
        &mut self,
        directory: &mut dyn MissionDirectory,
        mode: SessionMode,
        profile: &PlayerProfile,
        connection: ConnectionId,
        description: String,
    ) -> Result<PlayerSlot, AdmitError> {
        if self.clients.contains_key(&connection) {
            return Err(AdmitError::AlreadyConnected(connection));
        }

        let slot = match mode {
            SessionMode::NewGame => directory.connect_new_player(profile, connection),
            SessionMode::LoadGame => directory.connect_load_player(profile, connection),
        };

        let Some(slot) = slot else {
            info!(
                "join rejected: no compatible slot for {} on {:?}",
                profile.name, connection
            );
            return Err(AdmitError::NoCompatibleSlot {
                name: profile.name.clone(),
            });
        };

        directory.mark_changed();
        self.clients
            .insert(connection, Client::new(connection, slot, description));
        info!(
            "admitted {} on {:?} into slot {:?}",
            profile.name, connection, slot
        );
        Ok(slot)
    }

    /// Remove a single client, e.g. on disconnect.
    pub fn remove_client(&mut self, connection: ConnectionId) -> Option<Client> {
        self.clients.remove(&connection)
    }

    /// Dispose of every client. Safe on an empty set.
    pub fn clear_clients(&mut self) {
        if !self.clients.is_empty() {
            info!("clearing {} connected clients", self.clients.len());
        }
        self.clients.clear();
    }

    pub fn get(&self, connection: ConnectionId) -> Option<&Client> {
        self.clients.get(&connection)
    }

    /// Buffer an inbound info record for the given client.
    pub fn push_info(
        &mut self,
        connection: ConnectionId,
        record: InfoRecord,
    ) -> Result<(), InfoError> {
        let client = self
            .clients
            .get_mut(&connection)
            .ok_or(InfoError::UnknownConnection(connection))?;
        client.push_info(record)?;
        Ok(())
    }

    /// Take the oldest buffered info record for the given client.
    pub fn next_info(&mut self, connection: ConnectionId) -> Option<InfoRecord> {
        self.clients.get_mut(&connection)?.next_info()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
