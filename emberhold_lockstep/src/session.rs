// Shared synchronization state and the cross-thread control gate.
//
// `SyncSession` is what the two threads actually share: one general-purpose
// mutex over the client roster, the quantized command log, the
// deferred-removal queue, the session mode, the mission directory, and
// the control gate's pending/completed bookkeeping, paired with a
// single condvar used both for the gate rendezvous and for the network
// thread's idle wait. The single coarse lock is a correctness choice,
// not a shortcut: global sequence assignment has to serialize every
// mutation anyway, and each critical section is short. No method holds
// the lock across a blocking wait (condvar waits release it).
//
// Gate protocol, simulation side:
// - `submit_control` enqueues and returns; nobody observes completion.
// - `submit_control_wait` creates a fresh ticket, enqueues, and blocks
//   until either the ticket is completed or the network thread is gone.
//   A fresh ticket per call is what makes the rendezvous race-free: it
//   cannot have been signaled before the caller starts waiting, and two
//   concurrent waiters cannot consume each other's signal.
//
// Gate protocol, network side: `next_control` blocks (bounded) for the
// next pending command; `complete_control` signals its ticket. The
// dispatch harness (`dispatch.rs`) flips the liveness flag around the
// whole loop, so a waiter is always released when the thread exits.
//
// Poisoning: a poisoned lock means a thread died mid-mutation. That is
// the one way a gate wait can end with neither "completed" nor "thread
// gone", and it breaks the two-thread protocol itself; the core panics
// rather than let a peer keep simulating out of lockstep.

use std::collections::{BTreeSet, VecDeque};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::info;
use thiserror::Error;

use emberhold_commands::{
    ConnectionId, ControlCommand, DefeatReason, ForcedDefeat, GlobalSeq, InfoRecord,
    PlayerProfile, PlayerSlot, Quantum, SessionMode,
};

use crate::command_log::{CommandLog, QuantumBatch};
use crate::registry::{AdmitError, ClientRegistry, InfoError, MissionDirectory};

const LOCK_POISONED: &str = "sync state lock poisoned";

/// The network thread is not running; the submitted command was not
/// (and will never be) processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("network thread is not running")]
pub struct NetThreadGone;

/// Completion handle for one dispatched control command. Holds a ticket
/// only when a submitter is blocked waiting on it.
#[derive(Debug)]
pub struct ControlTicket(Option<u64>);

#[derive(Debug)]
struct PendingControl {
    command: ControlCommand,
    ticket: Option<u64>,
}

struct Shared {
    net_alive: bool,
    pending_controls: VecDeque<PendingControl>,
    completed_controls: BTreeSet<u64>,
    next_ticket: u64,
    registry: ClientRegistry,
    log: CommandLog,
    defeats: Vec<ForcedDefeat>,
    mode: SessionMode,
    directory: Box<dyn MissionDirectory + Send>,
}

/// Thread-safe core shared by the network thread and the simulation
/// thread. Wrap in an `Arc` and hand a clone to each side.
pub struct SyncSession {
    shared: Mutex<Shared>,
    progress: Condvar,
}

impl SyncSession {
    pub fn new(mode: SessionMode, directory: Box<dyn MissionDirectory + Send>) -> Self {
        Self {
            shared: Mutex::new(Shared {
                net_alive: false,
                pending_controls: VecDeque::new(),
                completed_controls: BTreeSet::new(),
                next_ticket: 0,
                registry: ClientRegistry::new(),
                log: CommandLog::new(),
                defeats: Vec::new(),
                mode,
                directory,
            }),
            progress: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().expect(LOCK_POISONED)
    }

    // --- client registry ---

    /// Admit a joining player. The whole operation (slot dispatch,
    /// description dirtying, roster insertion) runs under the general
    /// lock, serialized against every other mutation of session state.
    pub fn add_client(
        &self,
        profile: &PlayerProfile,
        connection: ConnectionId,
        description: String,
    ) -> Result<PlayerSlot, AdmitError> {
        let mut shared = self.lock();
        let shared = &mut *shared;
        shared.registry.add_client(
            shared.directory.as_mut(),
            shared.mode,
            profile,
            connection,
            description,
        )
    }

    /// Remove a client on disconnect. Returns its slot if it was known.
    pub fn remove_client(&self, connection: ConnectionId) -> Option<PlayerSlot> {
        self.lock()
            .registry
            .remove_client(connection)
            .map(|client| client.slot)
    }

    /// Dispose of every client. Safe on an empty roster.
    pub fn clear_clients(&self) {
        self.lock().registry.clear_clients();
    }

    pub fn client_count(&self) -> usize {
        self.lock().registry.len()
    }

    pub fn session_mode(&self) -> SessionMode {
        self.lock().mode
    }

    /// Buffer an inbound info record for a client.
    pub fn push_client_info(
        &self,
        connection: ConnectionId,
        record: InfoRecord,
    ) -> Result<(), InfoError> {
        self.lock().registry.push_info(connection, record)
    }

    /// Take the oldest buffered info record for a client.
    pub fn next_client_info(&self, connection: ConnectionId) -> Option<InfoRecord> {
        self.lock().registry.next_info(connection)
    }

    // --- quantized command log ---

    /// Stamp and append a simulation command. The stamp and both counter
    /// increments happen inside one critical section, so concurrent
    /// posts can never share or skip a sequence number.
    pub fn post_game_command(&self, issuer: PlayerSlot, payload: Vec<u8>) -> GlobalSeq {
        self.lock().log.enqueue(issuer, payload)
    }

    /// Simulation side: take every command for the current quantum and
    /// advance the quantum counter, atomically. A command posted while
    /// this runs is either in the returned batch or stamped for the next
    /// quantum; it cannot be lost between the two.
    pub fn consume_quantum(&self) -> QuantumBatch {
        self.lock().log.take_quantum()
    }

    pub fn current_quantum(&self) -> Quantum {
        self.lock().log.quantum()
    }

    pub fn pending_commands(&self) -> usize {
        self.lock().log.pending()
    }

    pub fn commands_this_quantum(&self) -> u64 {
        self.lock().log.stamped_this_quantum()
    }

    // --- deferred-removal queue ---

    /// Record a forced removal for the simulation to apply.
    pub fn push_forced_defeat(&self, slot: PlayerSlot, reason: DefeatReason) {
        self.lock().defeats.push(ForcedDefeat { slot, reason });
    }

    /// The removals currently awaiting application.
    pub fn forced_defeats(&self) -> Vec<ForcedDefeat> {
        self.lock().defeats.clone()
    }

    /// Dispose of every pending forced removal. Called once the
    /// simulation has applied them; calling earlier would free entries
    /// the simulation still needs to read.
    pub fn clear_applied_defeats(&self) {
        let mut shared = self.lock();
        if !shared.defeats.is_empty() {
            info!("clearing {} applied forced removals", shared.defeats.len());
        }
        shared.defeats.clear();
    }

    // --- control gate: simulation side ---

    /// Hand a control command to the network thread without observing
    /// completion. Fails immediately when that thread is not running.
    pub fn submit_control(&self, command: ControlCommand) -> Result<(), NetThreadGone> {
        let mut shared = self.lock();
        if !shared.net_alive {
            return Err(NetThreadGone);
        }
        shared.pending_controls.push_back(PendingControl {
            command,
            ticket: None,
        });
        self.progress.notify_all();
        Ok(())
    }

    /// Hand a control command to the network thread and block until it
    /// has been processed. Fails immediately when that thread is not
    /// running, and fails without hanging if it exits mid-wait.
    pub fn submit_control_wait(&self, command: ControlCommand) -> Result<(), NetThreadGone> {
        let mut shared = self.lock();
        if !shared.net_alive {
            return Err(NetThreadGone);
        }
        let ticket = shared.next_ticket;
        shared.next_ticket += 1;
        shared.pending_controls.push_back(PendingControl {
            command,
            ticket: Some(ticket),
        });
        self.progress.notify_all();
        loop {
            // Completion first: if the command was processed right as the
            // thread shut down, it still counts as processed.
            if shared.completed_controls.remove(&ticket) {
                return Ok(());
            }
            if !shared.net_alive {
                return Err(NetThreadGone);
            }
            shared = self.progress.wait(shared).expect(LOCK_POISONED);
        }
    }

    // --- control gate: network-thread side ---

    pub(crate) fn mark_net_alive(&self) {
        self.lock().net_alive = true;
    }

    pub(crate) fn mark_net_terminated(&self) {
        let mut shared = self.lock();
        shared.net_alive = false;
        // Commands still pending will never be processed; their waiters
        // observe the terminated condition instead of a completion.
        shared.pending_controls.clear();
        self.progress.notify_all();
    }

    /// Network side: wait up to `timeout` for the next pending control
    /// command. Returns the command together with its completion ticket.
    pub fn next_control(&self, timeout: Duration) -> Option<(ControlCommand, ControlTicket)> {
        let deadline = Instant::now() + timeout;
        let mut shared = self.lock();
        loop {
            if let Some(pending) = shared.pending_controls.pop_front() {
                return Some((pending.command, ControlTicket(pending.ticket)));
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, _) = self
                .progress
                .wait_timeout(shared, deadline - now)
                .expect(LOCK_POISONED);
            shared = guard;
        }
    }

    /// Network side: signal that a dispatched command has been fully
    /// processed, waking its waiter if one is blocked.
    pub fn complete_control(&self, ticket: ControlTicket) {
        let Some(ticket) = ticket.0 else {
            return;
        };
        let mut shared = self.lock();
        // Completing a command with no live network thread means two
        // threads disagree about who is running the dispatch loop; the
        // pairing protocol is broken and nothing safe can follow.
        assert!(
            shared.net_alive,
            "control command completed on a terminated network thread"
        );
        shared.completed_controls.insert(ticket);
        self.progress.notify_all();
    }
}
