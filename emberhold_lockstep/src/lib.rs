// emberhold_lockstep — command-synchronization core for Emberhold multiplayer.
//
// This crate is the ordering heart of a peer-to-peer lockstep session: it
// accepts player joins and simulation commands from the network thread,
// assigns every command a globally ordered position, and exposes the
// resulting stream to the simulation thread one quantum at a time, in an
// order identical on every peer. It owns no sockets. The wire transport,
// peer discovery, and message framing live in the game's session layer,
// which drives this crate through the `CommandInterpreter` seam and the
// public `SyncSession` API.
//
// Module overview:
// - `session.rs`:     `SyncSession`, the one shared lock over roster, log,
//                     counters, and removal queue, plus the cross-thread
//                     control gate (submit / wait / complete rendezvous
//                     with a dead-thread fast-fail).
// - `registry.rs`:    `ClientRegistry`, `Client`, and the
//                     `MissionDirectory` admission seam.
// - `command_log.rs`: `CommandLog` / `QuantumBatch`: quantum and global
//                     sequence stamping, atomic drain-and-advance.
// - `backlog.rs`:     `InfoBacklog`, the bounded per-client burst buffer.
// - `channel.rs`:     interface command channel (UI intents, FIFO).
// - `dispatch.rs`:    network-thread harness: spawn, dispatch loop,
//                     panic-safe liveness.
//
// Design decisions:
// - **One coarse lock.** Global sequence assignment must serialize every
//   mutation of shared session state anyway; fine-grained locking would
//   add failure modes without adding legal concurrency.
// - **Unbounded command log.** A dropped simulation command desyncs every
//   peer; the log grows instead of shedding. Only the per-client info
//   backlog is bounded.
// - **Thread death as cancellation.** The gate has no timeout; a waiter
//   is released by command completion or by network-thread termination,
//   whichever comes first. Anything else is a broken protocol and
//   panics.
// - **No async runtime.** Two OS threads and std sync primitives carry
//   the whole design.

pub mod backlog;
pub mod channel;
pub mod command_log;
pub mod dispatch;
pub mod registry;
pub mod session;

pub use backlog::{BacklogFull, INFO_BACKLOG_CAPACITY, InfoBacklog};
pub use channel::{InterfacePost, interface_channel};
pub use command_log::{CommandLog, QuantumBatch};
pub use dispatch::{CommandInterpreter, NetThreadHandle, start_net_thread};
pub use registry::{AdmitError, Client, ClientRegistry, InfoError, MissionDirectory};
pub use session::{ControlTicket, NetThreadGone, SyncSession};
