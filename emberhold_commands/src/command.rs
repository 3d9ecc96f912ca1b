// Command vocabulary for the lockstep core.
//
// Three kinds of command flow through the core, each on its own path:
// - `GameCommand`: simulation instructions in the quantized log. These are
//   what lockstep ordering is about — every peer must apply them in
//   identical order.
// - `ControlCommand`: control-plane requests handed from the simulation
//   thread to the network thread through the command gate (tag only, no
//   payload; completion is signaled, no value is returned).
// - `InterfaceCommand`: UI-originated intents flowing into the network
//   thread's command interpreter over the interface channel.
//
// Game command payloads are opaque bytes (`Vec<u8>`) — the core never
// inspects them. This keeps the crate independent of any sim crate: the
// game serializes its action type into bytes before posting and
// deserializes after consuming. All types derive `Serialize`/`Deserialize`
// so the external transport layer can frame them on the wire.

use serde::{Deserialize, Serialize};

use crate::types::{GlobalSeq, PlayerSlot, Quantum};

/// A simulation command in the quantized log.
///
/// `quantum` and `sequence` are assigned when the command enters the log;
/// both stamps are immutable afterwards. Commands destined for the same
/// quantum are ordered by `sequence`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameCommand {
    pub quantum: Quantum,
    pub sequence: GlobalSeq,
    pub issuer: PlayerSlot,
    pub payload: Vec<u8>,
}

/// A control-plane request only the network thread may perform.
///
/// Consumed exactly once by the network thread's dispatch loop. Carries
/// no payload beyond its tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlCommand {
    /// Acknowledge a completed join so the session state can advance.
    JoinAccepted,
    /// Begin the game session (lobby to playing transition).
    StartSession,
    /// End the current session, keeping the network thread alive.
    EndSession,
    /// Tear down the network thread entirely.
    Shutdown,
}

/// A UI-originated intent, read solely by the network thread.
///
/// Each variant carries its payload as a typed field rather than an
/// untyped tag/string pair, so a mismatched interpretation cannot
/// compile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum InterfaceCommand {
    /// The local player is leaving the session.
    LeaveSession,
    /// Remove the named player from the session.
    KickPlayer { name: String },
    /// Broadcast a chat line.
    Chat { text: String },
}

/// Why a player is being removed involuntarily.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefeatReason {
    Disconnected,
    Kicked,
    Desynced,
}

/// A forced-removal command awaiting cleanup.
///
/// Produced by the network thread, freed only after the simulation has
/// applied the removal — disposing earlier would leave the simulation
/// reading a dangling entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForcedDefeat {
    pub slot: PlayerSlot,
    pub reason: DefeatReason,
}

/// An inbound game-information record buffered per client to absorb
/// bursts. Opaque to the core, like game command payloads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InfoRecord {
    pub payload: Vec<u8>,
}
