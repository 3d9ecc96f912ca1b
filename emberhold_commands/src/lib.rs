// emberhold_commands — shared command and identity types for multiplayer sync.
//
// This crate defines the vocabulary that crosses the boundary between the
// network side and the simulation side of the Emberhold lockstep core
// (`emberhold_lockstep`). It is shared by both and has no dependency on
// any sim or transport crate.
//
// Module overview:
// - `types.rs`:   Core ID types (`ConnectionId`, `PlayerSlot`, `Quantum`,
//                 `GlobalSeq`) plus `SessionMode` and `PlayerProfile`.
// - `command.rs`: The three command kinds — `GameCommand` (quantized log),
//                 `ControlCommand` (cross-thread gate), `InterfaceCommand`
//                 (UI intents) — and the forced-removal / info-record types.
//
// Design decisions:
// - **Sim payloads as opaque `Vec<u8>`.** The sync core never inspects
//   simulation commands; the game serializes its own action type. This
//   keeps the crate free of game logic.
// - **Everything derives serde.** The wire transport that carries these
//   types between peers lives outside this workspace; deriving here lets
//   it frame them without redefining them.
// - **No async runtime, no I/O.** Pure data types.

pub mod command;
pub mod types;

pub use command::{
    ControlCommand, DefeatReason, ForcedDefeat, GameCommand, InfoRecord, InterfaceCommand,
};
pub use types::{ConnectionId, GlobalSeq, PlayerProfile, PlayerSlot, Quantum, SessionMode};
