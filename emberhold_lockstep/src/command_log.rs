// Quantized command log: the append-only, totally ordered command stream.
//
// Every simulation command a peer issues lands here before the
// simulation sees it. Insertion stamps the command with the current
// quantum and the next global sequence number; consumption drains the
// whole pending batch and advances the quantum counter in the same step.
// The log is a plain structure — `session.rs` serializes access, which is
// what makes "stamp + increment" atomic with respect to concurrent
// producers.
//
// The log is unbounded on purpose. Transport messages can be dropped and
// resent; a simulation command cannot, because every peer must apply the
// identical stream. If the consumer falls behind, the log grows.

use std::collections::VecDeque;

use emberhold_commands::{GameCommand, GlobalSeq, PlayerSlot, Quantum};

/// Every command consumed for one quantum, in increasing sequence order.
///
/// Ownership of the commands moves to the consumer; the consumer must
/// apply them in order and must not advance its local clock past this
/// quantum before the whole batch is applied.
#[derive(Debug)]
pub struct QuantumBatch {
    pub quantum: Quantum,
    pub commands: Vec<GameCommand>,
}

/// Append-only log of simulation commands with quantum/sequence stamping.
#[derive(Debug, Default)]
pub struct CommandLog {
    entries: VecDeque<GameCommand>,
    quantum: u64,
    next_sequence: u64,
    stamped_this_quantum: u64,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp a command with the current quantum and the next global
    /// sequence number, then append it. Returns the assigned sequence.
    pub fn enqueue(&mut self, issuer: PlayerSlot, payload: Vec<u8>) -> GlobalSeq {
        let sequence = GlobalSeq(self.next_sequence);
        self.next_sequence += 1;
        self.stamped_this_quantum += 1;
        self.entries.push_back(GameCommand {
            quantum: Quantum(self.quantum),
            sequence,
            issuer,
            payload,
        });
        sequence
    }

    /// Drain every logged command and advance the quantum counter.
    ///
    /// Because stamping uses the same counter this advances, every
    /// drained command is stamped with the returned quantum, and any
    /// command enqueued afterwards lands in the next one — a command can
    /// be late relative to wall-clock but never relative to its quantum.
    pub fn take_quantum(&mut self) -> QuantumBatch {
        let quantum = Quantum(self.quantum);
        let commands: Vec<GameCommand> = self.entries.drain(..).collect();
        self.quantum += 1;
        self.stamped_this_quantum = 0;
        QuantumBatch { quantum, commands }
    }

    /// The quantum commands are currently being stamped with.
    pub fn quantum(&self) -> Quantum {
        Quantum(self.quantum)
    }

    /// Number of commands waiting for the next consumption.
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Commands stamped since the quantum counter last advanced.
    pub fn stamped_this_quantum(&self) -> u64 {
        self.stamped_this_quantum
    }
}
