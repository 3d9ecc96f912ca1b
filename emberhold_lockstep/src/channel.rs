// Interface command channel: UI intents into the network thread.
//
// A one-way FIFO from the application's interface layer to the network
// thread's command interpreter, built on `std::sync::mpsc`. The sender
// half is cheap to clone and can live anywhere in the UI; the receiver
// is owned by the dispatch loop and drained non-blocking each
// iteration. Ordering relative to the quantized command log is
// deliberately unspecified — UI intent and simulation state are
// different concerns — but FIFO within the channel itself holds.

use std::sync::mpsc::{self, Receiver, Sender};

use emberhold_commands::InterfaceCommand;

/// Sending half of the interface channel.
#[derive(Clone)]
pub struct InterfacePost {
    tx: Sender<InterfaceCommand>,
}

impl InterfacePost {
    /// Append an intent for the network thread. Returns `false` when the
    /// receiving dispatch loop is gone and the intent was dropped.
    pub fn post(&self, command: InterfaceCommand) -> bool {
        self.tx.send(command).is_ok()
    }
}

/// Create a connected post/receive pair. Hand the receiver to
/// `start_net_thread`; keep the post on the interface side.
pub fn interface_channel() -> (InterfacePost, Receiver<InterfaceCommand>) {
    let (tx, rx) = mpsc::channel();
    (InterfacePost { tx }, rx)
}
