//! Simulation/render handshake.
//!
//! The simulation thread publishes a [`RenderSnapshot`] and requests a frame;
//! the render thread waits for the request, draws from the snapshot it was
//! handed, then reports the frame finished. Both sides only meet under the
//! gate's mutex, so the renderer never sees a half-updated world.

use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::math::Vec3;

/// Pose of one object as seen by the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectPose {
    pub id: i32,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    pub highlighted: bool,
}

/// Consistent copy of everything the renderer reads for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderSnapshot {
    pub frame: u64,
    pub camera_eye: Vec3,
    pub camera_target: Vec3,
    pub objects: Vec<ObjectPose>,
}

struct GateState {
    requested: u64,
    rendered: u64,
    snapshot: Option<RenderSnapshot>,
    closed: bool,
}

/// Mutex-guarded frame-readiness and frame-finished signals
pub struct FrameGate {
    state: Mutex<GateState>,
    frame_ready: Condvar,
    frame_finished: Condvar,
}

impl Default for FrameGate {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState {
                requested: 0,
                rendered: 0,
                snapshot: None,
                closed: false,
            }),
            frame_ready: Condvar::new(),
            frame_finished: Condvar::new(),
        }
    }

    /// Publishes a snapshot and requests it be rendered. Returns the frame
    /// number assigned to it.
    pub fn request_frame(&self, mut snapshot: RenderSnapshot) -> u64 {
        let mut state = self.state.lock();
        state.requested += 1;
        snapshot.frame = state.requested;
        state.snapshot = Some(snapshot);
        self.frame_ready.notify_all();
        state.requested
    }

    /// Render side: blocks until a frame newer than the last rendered one is
    /// requested. Returns `None` once the gate is closed and drained.
    pub fn wait_for_frame(&self) -> Option<RenderSnapshot> {
        let mut state = self.state.lock();
        while state.requested == state.rendered && !state.closed {
            self.frame_ready.wait(&mut state);
        }
        if state.requested == state.rendered {
            return None;
        }
        state.snapshot.clone()
    }

    /// Render side: marks `frame` as drawn
    pub fn finish_frame(&self, frame: u64) {
        let mut state = self.state.lock();
        if frame > state.rendered {
            state.rendered = frame;
        }
        self.frame_finished.notify_all();
    }

    /// Simulation side: blocks until `frame` has been drawn or the gate closes
    pub fn wait_finished(&self, frame: u64) {
        let mut state = self.state.lock();
        while state.rendered < frame && !state.closed {
            self.frame_finished.wait(&mut state);
        }
    }

    /// Like [`FrameGate::wait_finished`] with an upper bound. Returns `true`
    /// if the frame was drawn in time.
    pub fn wait_finished_timeout(&self, frame: u64, timeout: Duration) -> bool {
        let mut state = self.state.lock();
        while state.rendered < frame && !state.closed {
            if self.frame_finished.wait_for(&mut state, timeout).timed_out() {
                break;
            }
        }
        state.rendered >= frame
    }

    /// Wakes every waiter; later waits return immediately
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.frame_ready.notify_all();
        self.frame_finished.notify_all();
    }

    pub fn last_requested(&self) -> u64 {
        self.state.lock().requested
    }

    pub fn last_rendered(&self) -> u64 {
        self.state.lock().rendered
    }
}
