// Network-thread dispatch harness.
//
// Architecture: one background thread driving a `CommandInterpreter`,
// with a run flag checked every iteration.
//
// - **Dispatch loop**: wait (up to `DISPATCH_WAIT`) for one pending
//   control command from the gate, hand it to the interpreter, signal
//   completion; then drain every queued interface intent. Control
//   commands wake the wait through the core's condvar, so a
//   `submit_control_wait` caller is answered promptly; the timeout only
//   bounds how long an idle thread goes between run-flag checks.
// - **Liveness**: the gate reports the thread alive from just before the
//   spawn until the loop exits. A drop guard clears it on every exit
//   path — a panicking interpreter still releases any simulation thread
//   blocked in `submit_control_wait`, with the terminated outcome.
//
// The interpreter is the seam to the transport/session layer: it is the
// code that actually performs control requests (starting the session,
// shutting down, notifying peers) and acts on UI intents. The harness
// itself never inspects commands.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::thread;
use std::time::Duration;

use log::info;

use emberhold_commands::{ControlCommand, InterfaceCommand};

use crate::session::SyncSession;

/// How long one dispatch iteration waits for a control command before
/// re-checking the run flag and the interface channel.
const DISPATCH_WAIT: Duration = Duration::from_millis(20);

/// Interprets commands on the network thread. Implemented by the
/// transport/session layer.
pub trait CommandInterpreter: Send {
    fn handle_control(&mut self, command: ControlCommand);
    fn handle_interface(&mut self, command: InterfaceCommand);
}

/// Handle returned by `start_net_thread` to stop the running thread.
pub struct NetThreadHandle {
    keep_running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl NetThreadHandle {
    /// Signal the network thread to stop and wait for it to exit. Any
    /// control command still pending fails over to the terminated
    /// outcome for its submitter.
    pub fn stop(self) {
        self.keep_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread {
            let _ = handle.join();
        }
    }
}

/// Spawn the network thread and mark the gate live.
///
/// The liveness flag is set before the spawn so a `submit_control`
/// racing the startup cannot spuriously fast-fail.
pub fn start_net_thread<I: CommandInterpreter + 'static>(
    core: Arc<SyncSession>,
    intents: Receiver<InterfaceCommand>,
    interpreter: I,
) -> NetThreadHandle {
    let keep_running = Arc::new(AtomicBool::new(true));
    let keep_running_clone = keep_running.clone();

    core.mark_net_alive();
    let thread = thread::spawn(move || {
        run_dispatch(core, intents, interpreter, keep_running_clone);
    });

    NetThreadHandle {
        keep_running,
        thread: Some(thread),
    }
}

/// Marks the gate terminated when the dispatch loop exits, however it
/// exits.
struct LivenessGuard {
    core: Arc<SyncSession>,
}

impl Drop for LivenessGuard {
    fn drop(&mut self) {
        self.core.mark_net_terminated();
    }
}

/// Main dispatch loop. Runs until the run flag is cleared.
fn run_dispatch<I: CommandInterpreter>(
    core: Arc<SyncSession>,
    intents: Receiver<InterfaceCommand>,
    mut interpreter: I,
    keep_running: Arc<AtomicBool>,
) {
    let _liveness = LivenessGuard { core: core.clone() };

    while keep_running.load(Ordering::SeqCst) {
        if let Some((command, ticket)) = core.next_control(DISPATCH_WAIT) {
            interpreter.handle_control(command);
            core.complete_control(ticket);
        }
        while let Ok(intent) = intents.try_recv() {
            interpreter.handle_interface(intent);
        }
    }

    info!("network dispatch loop exiting");
}
