//! Threaded engine harness
//!
//! Wraps a [`Session`] in a mutex and drives it from background loops: one
//! tick loop advancing gravity every 20ms while the game is playing, and
//! one move-repeat loop per horizontal direction while a key is held.
//! Commands and queries lock the session briefly; listener callbacks run
//! after the lock is released, so a listener may call back into the engine
//! without deadlocking.

use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::core::session::Session;
use crate::types::{
    EngineEvent, GameStatus, PieceKind, StatusChange, FIELD_HEIGHT, FIELD_WIDTH, PREVIEW_COUNT,
    REPEAT_DEBOUNCE_FACTOR, SENSITIVITY_STEPS, TICK_MS,
};

/// Callback invoked on every status transition
pub type StatusListener = Arc<dyn Fn(StatusChange) + Send + Sync>;
/// Callback invoked whenever the visible matrix may have changed
pub type TileListener = Arc<dyn Fn() + Send + Sync>;

/// Listener registries. Registration is idempotent by callback identity;
/// the vectors are snapshotted before invocation so a callback can
/// unregister itself.
#[derive(Default)]
struct ListenerSet {
    status: Mutex<Vec<StatusListener>>,
    tile: Mutex<Vec<TileListener>>,
}

impl ListenerSet {
    fn add_status(&self, listener: &StatusListener) {
        let mut registry = lock_clean(&self.status);
        if !registry.iter().any(|known| Arc::ptr_eq(known, listener)) {
            registry.push(Arc::clone(listener));
        }
    }

    fn remove_status(&self, listener: &StatusListener) {
        lock_clean(&self.status).retain(|known| !Arc::ptr_eq(known, listener));
    }

    fn add_tile(&self, listener: &TileListener) {
        let mut registry = lock_clean(&self.tile);
        if !registry.iter().any(|known| Arc::ptr_eq(known, listener)) {
            registry.push(Arc::clone(listener));
        }
    }

    fn remove_tile(&self, listener: &TileListener) {
        lock_clean(&self.tile).retain(|known| !Arc::ptr_eq(known, listener));
    }

    fn dispatch(&self, events: &[EngineEvent]) {
        for event in events {
            match event {
                EngineEvent::StatusChanged(change) => {
                    let snapshot = lock_clean(&self.status).clone();
                    for listener in snapshot {
                        listener(*change);
                    }
                }
                EngineEvent::TileModified => {
                    let snapshot = lock_clean(&self.tile).clone();
                    for listener in snapshot {
                        listener();
                    }
                }
            }
        }
    }
}

/// Session plus listeners, shared between the engine handle and its loops
struct Shared {
    session: Mutex<Session>,
    listeners: ListenerSet,
}

impl Shared {
    /// Run `op` under the session lock, then dispatch whatever
    /// notifications it queued with the lock released
    fn with<R>(&self, op: impl FnOnce(&mut Session) -> R) -> R {
        let (result, events) = {
            let mut session = lock_clean(&self.session);
            let result = op(&mut session);
            (result, session.take_events())
        };
        self.listeners.dispatch(&events);
        result
    }
}

/// A panic while holding the lock leaves valid (if mid-game) state; keep
/// serving the inner value instead of propagating the poison
fn lock_clean<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Thread-safe game engine
///
/// Cheap to share by reference across threads; all methods take `&self`.
/// Dropping the engine stops its background loops.
pub struct Engine {
    shared: Arc<Shared>,
    tick_flag: Mutex<Arc<AtomicBool>>,
    left_flag: Mutex<Arc<AtomicBool>>,
    right_flag: Mutex<Arc<AtomicBool>>,
}

impl Engine {
    /// New engine in PREPARE, bag seeded with `seed`
    pub fn new(seed: u32) -> Self {
        Self {
            shared: Arc::new(Shared {
                session: Mutex::new(Session::new(seed)),
                listeners: ListenerSet::default(),
            }),
            tick_flag: Mutex::new(Arc::new(AtomicBool::new(false))),
            left_flag: Mutex::new(Arc::new(AtomicBool::new(false))),
            right_flag: Mutex::new(Arc::new(AtomicBool::new(false))),
        }
    }

    // --- lifecycle ------------------------------------------------------

    /// Begin a game from PREPARE; ignored in any other status
    pub fn start(&self) {
        let began = self.shared.with(|s| {
            if s.status() == GameStatus::Prepare {
                s.transition(GameStatus::Playing);
                true
            } else {
                false
            }
        });
        if began {
            self.spawn_tick_loop();
        }
    }

    /// Freeze gravity and the clock; ignored unless playing
    pub fn pause(&self) {
        stop(&self.tick_flag);
        stop(&self.left_flag);
        stop(&self.right_flag);
        self.shared.with(|s| {
            if s.status() == GameStatus::Playing {
                s.transition(GameStatus::Pause);
            }
        });
    }

    /// Continue a paused game; ignored in any other status
    pub fn resume(&self) {
        let resumed = self.shared.with(|s| {
            if s.status() == GameStatus::Pause {
                s.transition(GameStatus::Playing);
                true
            } else {
                false
            }
        });
        if resumed {
            self.spawn_tick_loop();
        }
    }

    /// Stop all loops and wipe the session back to PREPARE
    pub fn reset(&self) {
        stop(&self.tick_flag);
        stop(&self.left_flag);
        stop(&self.right_flag);
        self.shared.with(|s| s.transition(GameStatus::Prepare));
    }

    fn spawn_tick_loop(&self) {
        let alive = replace_flag(&self.tick_flag);
        let shared = Arc::clone(&self.shared);
        thread::spawn(move || tick_loop(shared, alive));
    }

    // --- piece commands -------------------------------------------------

    pub fn move_left(&self) -> bool {
        self.shared.with(|s| s.move_left())
    }

    pub fn move_right(&self) -> bool {
        self.shared.with(|s| s.move_right())
    }

    pub fn rotate_cw(&self) -> bool {
        self.shared.with(|s| s.rotate_cw())
    }

    pub fn rotate_ccw(&self) -> bool {
        self.shared.with(|s| s.rotate_ccw())
    }

    pub fn rotate_half(&self) -> bool {
        self.shared.with(|s| s.rotate_half())
    }

    /// Single-cell manual descent
    pub fn soft_drop(&self) -> bool {
        self.shared.with(|s| s.soft_drop())
    }

    /// Engage or release the soft-drop gravity boost
    pub fn set_soft_drop(&self, engaged: bool) {
        self.shared.with(|s| s.set_soft_drop(engaged));
    }

    pub fn hard_drop(&self) {
        self.shared.with(|s| s.hard_drop());
    }

    pub fn hold(&self) {
        self.shared.with(|s| s.hold());
    }

    // --- move repeat ----------------------------------------------------

    /// Start the leftward repeat loop; stops a running rightward loop.
    /// A second press while the loop is live is ignored.
    pub fn press_left(&self) {
        stop(&self.right_flag);
        if flag_live(&self.left_flag) {
            return;
        }
        let alive = replace_flag(&self.left_flag);
        let shared = Arc::clone(&self.shared);
        thread::spawn(move || repeat_loop(shared, alive, true));
    }

    pub fn release_left(&self) {
        stop(&self.left_flag);
    }

    /// Start the rightward repeat loop; stops a running leftward loop.
    /// A second press while the loop is live is ignored.
    pub fn press_right(&self) {
        stop(&self.left_flag);
        if flag_live(&self.right_flag) {
            return;
        }
        let alive = replace_flag(&self.right_flag);
        let shared = Arc::clone(&self.shared);
        thread::spawn(move || repeat_loop(shared, alive, false));
    }

    pub fn release_right(&self) {
        stop(&self.right_flag);
    }

    // --- configuration --------------------------------------------------

    pub fn set_speed_level(&self, level: usize) {
        self.shared.with(|s| s.set_speed_level(level));
    }

    pub fn speed_level(&self) -> usize {
        self.shared.with(|s| s.speed_level())
    }

    pub fn set_sensitivity_level(&self, level: usize) {
        self.shared.with(|s| s.set_sensitivity_level(level));
    }

    pub fn sensitivity_level(&self) -> usize {
        self.shared.with(|s| s.sensitivity_level())
    }

    // --- queries --------------------------------------------------------

    pub fn status(&self) -> GameStatus {
        self.shared.with(|s| s.status())
    }

    pub fn score(&self) -> u32 {
        self.shared.with(|s| s.score())
    }

    pub fn elapsed(&self) -> Duration {
        self.shared.with(|s| s.elapsed())
    }

    pub fn held(&self) -> Option<PieceKind> {
        self.shared.with(|s| s.held())
    }

    /// The preview queue (up to [`PREVIEW_COUNT`] kinds)
    pub fn upcoming(&self) -> Vec<PieceKind> {
        self.shared.with(|s| s.upcoming(PREVIEW_COUNT))
    }

    pub fn display_matrix(&self) -> [[i8; FIELD_WIDTH]; FIELD_HEIGHT] {
        self.shared.with(|s| s.display_matrix())
    }

    pub fn render_text(&self) -> String {
        self.shared.with(|s| s.render_text())
    }

    // --- listeners ------------------------------------------------------

    pub fn add_status_listener(&self, listener: &StatusListener) {
        self.shared.listeners.add_status(listener);
    }

    pub fn remove_status_listener(&self, listener: &StatusListener) {
        self.shared.listeners.remove_status(listener);
    }

    pub fn add_tile_listener(&self, listener: &TileListener) {
        self.shared.listeners.add_tile(listener);
    }

    pub fn remove_tile_listener(&self, listener: &TileListener) {
        self.shared.listeners.remove_tile(listener);
    }
}

impl Default for Engine {
    /// Engine seeded from the system clock
    fn default() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        Self::new(nanos | 1)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        stop(&self.tick_flag);
        stop(&self.left_flag);
        stop(&self.right_flag);
    }
}

/// Signal the current loop behind `slot` to stop
fn stop(slot: &Mutex<Arc<AtomicBool>>) {
    lock_clean(slot).store(false, Ordering::Relaxed);
}

fn flag_live(slot: &Mutex<Arc<AtomicBool>>) -> bool {
    lock_clean(slot).load(Ordering::Relaxed)
}

/// Install a fresh live flag for a new loop, retiring the previous one
fn replace_flag(slot: &Mutex<Arc<AtomicBool>>) -> Arc<AtomicBool> {
    let fresh = Arc::new(AtomicBool::new(true));
    let old = mem::replace(&mut *lock_clean(slot), Arc::clone(&fresh));
    old.store(false, Ordering::Relaxed);
    fresh
}

/// Gravity loop: one `progress` per tick until stopped or the game leaves
/// PLAYING (pause stops it via the flag, game over from inside `progress`
/// is caught by the status check)
fn tick_loop(shared: Arc<Shared>, alive: Arc<AtomicBool>) {
    while alive.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(TICK_MS));
        if !alive.load(Ordering::Relaxed) {
            return;
        }
        let status = shared.with(|s| {
            s.progress();
            s.status()
        });
        if status != GameStatus::Playing {
            return;
        }
    }
}

/// Horizontal move-repeat loop: one immediate move, then one per repeat
/// interval until released or the game leaves PLAYING. The first interval
/// is doubled to debounce a plain key tap; the interval tracks the current
/// sensitivity level. Retires its flag on a status exit so a later press
/// starts a fresh loop.
fn repeat_loop(shared: Arc<Shared>, alive: Arc<AtomicBool>, leftward: bool) {
    let mut first = true;
    while alive.load(Ordering::Relaxed) {
        let (status, level) = shared.with(|s| {
            if leftward {
                s.move_left();
            } else {
                s.move_right();
            }
            (s.status(), s.sensitivity_level())
        });
        if status != GameStatus::Playing {
            alive.store(false, Ordering::Relaxed);
            return;
        }
        let mut interval = SENSITIVITY_STEPS[level] * TICK_MS;
        if first {
            interval *= REPEAT_DEBOUNCE_FACTOR;
            first = false;
        }
        thread::sleep(Duration::from_millis(interval));
    }
}
