// Test-only harness for lockstep integration tests.
//
// Bundles a real `SyncSession`, a real network dispatch thread, and the
// interface channel the way the live game's session layer wires them.
// The only test-specific code is the recording interpreter and the stub
// slot directory — admission, ordering, and gate behavior all run
// through the production paths.
//
// See also: `tests/full_pipeline.rs` for the scenarios.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use emberhold_commands::{
    ConnectionId, ControlCommand, InterfaceCommand, PlayerProfile, PlayerSlot, SessionMode,
};
use emberhold_lockstep::{
    CommandInterpreter, InterfacePost, MissionDirectory, NetThreadHandle, SyncSession,
    interface_channel, start_net_thread,
};

/// Default timeout for blocking poll helpers.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Sleep between poll attempts.
pub const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Slot directory stub: ascending slots for new games, a fixed saved-slot
/// table for loaded games, and an atomically counted `mark_changed`.
pub struct StubMission {
    next_slot: u32,
    saved: Vec<(String, PlayerSlot)>,
    changed: Arc<AtomicUsize>,
}

impl StubMission {
    pub fn new() -> Self {
        Self {
            next_slot: 0,
            saved: Vec::new(),
            changed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_saved(saved: &[(&str, u32)]) -> Self {
        let mut mission = Self::new();
        mission.saved = saved
            .iter()
            .map(|(name, slot)| ((*name).to_string(), PlayerSlot(*slot)))
            .collect();
        mission
    }

    /// Shared view of how many times the session description was dirtied.
    pub fn changed_handle(&self) -> Arc<AtomicUsize> {
        self.changed.clone()
    }
}

impl Default for StubMission {
    fn default() -> Self {
        Self::new()
    }
}

impl MissionDirectory for StubMission {
    fn connect_new_player(
        &mut self,
        _profile: &PlayerProfile,
        _connection: ConnectionId,
    ) -> Option<PlayerSlot> {
        let slot = PlayerSlot(self.next_slot);
        self.next_slot += 1;
        Some(slot)
    }

    fn connect_load_player(
        &mut self,
        profile: &PlayerProfile,
        _connection: ConnectionId,
    ) -> Option<PlayerSlot> {
        self.saved
            .iter()
            .find(|(name, _)| *name == profile.name)
            .map(|(_, slot)| *slot)
    }

    fn mark_changed(&mut self) {
        self.changed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Interpreter that records everything the network thread hands it.
#[derive(Clone, Default)]
pub struct RecordingInterpreter {
    pub controls: Arc<Mutex<Vec<ControlCommand>>>,
    pub interfaces: Arc<Mutex<Vec<InterfaceCommand>>>,
}

impl CommandInterpreter for RecordingInterpreter {
    fn handle_control(&mut self, command: ControlCommand) {
        self.controls.lock().unwrap().push(command);
    }

    fn handle_interface(&mut self, command: InterfaceCommand) {
        self.interfaces.lock().unwrap().push(command);
    }
}

/// A running two-thread setup: session, network dispatch thread, and
/// interface channel.
pub struct TestRig {
    pub session: Arc<SyncSession>,
    pub post: InterfacePost,
    pub controls: Arc<Mutex<Vec<ControlCommand>>>,
    pub interfaces: Arc<Mutex<Vec<InterfaceCommand>>>,
    pub changed: Arc<AtomicUsize>,
    handle: Option<NetThreadHandle>,
}

impl TestRig {
    /// Start a rig for a new-game session with open slots.
    pub fn start() -> Self {
        let mission = StubMission::new();
        let changed = mission.changed_handle();
        let session = Arc::new(SyncSession::new(SessionMode::NewGame, Box::new(mission)));

        let (post, intents) = interface_channel();
        let interpreter = RecordingInterpreter::default();
        let controls = interpreter.controls.clone();
        let interfaces = interpreter.interfaces.clone();
        let handle = start_net_thread(session.clone(), intents, interpreter);

        Self {
            session,
            post,
            controls,
            interfaces,
            changed,
            handle: Some(handle),
        }
    }

    /// Join peer `n` with default profile/description.
    pub fn join(&self, n: u32) -> PlayerSlot {
        self.session
            .add_client(
                &PlayerProfile {
                    name: format!("peer-{n}"),
                },
                ConnectionId(n),
                format!("connection {n}"),
            )
            .expect("join failed")
    }

    /// Stop the network thread, keeping the session around for
    /// post-mortem assertions.
    pub fn stop_net_thread(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

impl Drop for TestRig {
    fn drop(&mut self) {
        self.stop_net_thread();
    }
}

/// Poll `done` until it returns true or `deadline` elapses.
pub fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if done() {
            return true;
        }
        thread::sleep(POLL_INTERVAL);
    }
    done()
}

/// Serialize a small move order as an opaque command payload, the way a
/// game serializes its own action type before posting.
pub fn order_payload(unit: u32, x: i32, y: i32) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "order": "move",
        "unit": unit,
        "to": [x, y],
    }))
    .expect("serialize payload")
}
