use std::collections::VecDeque;

use crate::error::EditorResult;
use crate::scene::{EntityRecord, Scene, SceneEvent};

/// One deep-cloned snapshot of the scene's top-level entity list, in
/// stacking order. Immutable once taken.
pub type Snapshot = Vec<EntityRecord>;

/// Replay state machine. Checked before acting on any change notification,
/// replacing the ad hoc `isUndoingOrRedoing` style of suppression flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HistoryState {
    #[default]
    Idle,
    Recording,
    Replaying,
}

/// Snapshot-based undo/redo over the scene.
///
/// `undo_stack` runs oldest to newest with the current state last;
/// `redo_stack` keeps the next redoable state at the front. Performing any
/// new mutation after an undo clears the redo stack; history never
/// branches.
pub struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: VecDeque<Snapshot>,
    state: HistoryState,
}

impl History {
    /// Bounded stack depth. Long sessions evict the oldest intermediate
    /// snapshot; the initial state is never evicted so a full unwind always
    /// lands on a valid floor.
    pub const MAX_DEPTH: usize = 100;

    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: VecDeque::new(),
            state: HistoryState::Idle,
        }
    }

    /// Capture the initial scene state. Called once when the editor comes
    /// up, so that the first real mutation has a state to undo back to.
    pub fn initialize(&mut self, scene: &Scene) -> EditorResult<()> {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.record_state(scene)
    }

    pub fn state(&self) -> HistoryState {
        self.state
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// React to a drained scene notification: structural changes produce a
    /// snapshot, everything else is ignored. Suppressed during replay.
    pub fn on_scene_event(&mut self, scene: &Scene, event: &SceneEvent) -> EditorResult<()> {
        if !event.is_structural() {
            return Ok(());
        }
        self.record_state(scene)
    }

    /// Snapshot the current top-level entity list and push it as the new
    /// current state. Clears the redo stack.
    ///
    /// If deep-cloning any entity fails the attempted snapshot is discarded
    /// and the existing stacks stay untouched.
    pub fn record_state(&mut self, scene: &Scene) -> EditorResult<()> {
        if self.state == HistoryState::Replaying {
            return Ok(());
        }
        self.state = HistoryState::Recording;
        let attempt = scene.to_records();
        self.state = HistoryState::Idle;

        let snapshot = attempt?;
        self.undo_stack.push(snapshot);
        if self.undo_stack.len() > Self::MAX_DEPTH {
            // Evict the oldest snapshot after the initial state.
            self.undo_stack.remove(1);
        }
        self.redo_stack.clear();
        Ok(())
    }

    /// Step back to the previously recorded state. No-op with only the
    /// initial snapshot on the stack.
    pub fn undo(&mut self, scene: &mut Scene) -> EditorResult<bool> {
        if self.undo_stack.len() <= 1 {
            return Ok(false);
        }
        let current = self.undo_stack.pop().expect("len checked above");
        self.redo_stack.push_front(current);
        let previous = self
            .undo_stack
            .last()
            .cloned()
            .expect("undo stack keeps at least the initial state");
        self.replay(scene, &previous)?;
        Ok(true)
    }

    /// Step forward to the next redoable state. No-op when nothing was
    /// undone since the last mutation.
    pub fn redo(&mut self, scene: &mut Scene) -> EditorResult<bool> {
        let Some(snapshot) = self.redo_stack.pop_front() else {
            return Ok(false);
        };
        self.undo_stack.push(snapshot.clone());
        self.replay(scene, &snapshot)?;
        Ok(true)
    }

    /// Clear the scene and repopulate it from a snapshot, in order (order
    /// is stacking order). Change notifications are muted for the entire
    /// replay and restored even if reconstruction fails part-way.
    fn replay(&mut self, scene: &mut Scene, snapshot: &Snapshot) -> EditorResult<()> {
        self.state = HistoryState::Replaying;
        let result = scene.with_muted(|scene| scene.load_records(snapshot));
        self.state = HistoryState::Idle;
        scene.request_redraw();
        result
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
