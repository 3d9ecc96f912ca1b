// Core ID types for the lockstep synchronization core.
//
// These are lightweight newtypes used by both `command.rs` (the command
// vocabulary) and the sync core's registry and log
// (`emberhold_lockstep`). Connection ids are assigned by the transport
// layer; player slots index the game's external player-data table.
// Quantum and sequence stamps give commands their total order.

use serde::{Deserialize, Serialize};

/// Transport-assigned connection id (compact u32, not a game entity id).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub u32);

/// Index into the external player-data table, assigned at admission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerSlot(pub u32);

/// One discrete simulation time step. Every peer must apply the same
/// commands for a given quantum to stay in lockstep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quantum(pub u64);

/// Log-wide monotonic sequence number, assigned at insertion time and
/// never reused. Totally orders commands independent of quantum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GlobalSeq(pub u64);

/// How a joining player maps to a game-session slot: a fresh slot for a
/// new game, or a match against a previously saved slot for a loaded one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionMode {
    NewGame,
    LoadGame,
}

/// The player-data record a join attempt carries. The slot directory
/// matches this against fresh or saved slots; the sync core treats it as
/// opaque.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub name: String,
}
