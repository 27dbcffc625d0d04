//! Event records, the FIFO queue and the handler contract.
//!
//! Raw input is normalized into [`Event`]s with a closed [`EventType`] set.
//! Events travel through a fixed chain of [`EventHandler`]s (application,
//! interface, orchestrator); each handler returns whether the event should
//! continue down the chain.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::math::Point;

/// Closed set of event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    Null,
    Quit,
    Frame,

    // Raw input
    KeyDown,
    KeyUp,
    TextInput,
    MouseMove,
    MouseButtonDown,
    MouseButtonUp,
    MouseWheel,

    // Mission flow
    Win,
    Lost,
    UpdateInterface,
    WriteSceneFinished,

    // Interface controls
    Cmd,
    Speed,
    ButtonOk,
    InfoOk,
    DialogOk,
    DialogCancel,
    VisitEnd,

    // Object command buttons
    ObjectDeselect,
    ObjectLimit,
    ObjectHelp,
    ObjectBigHelp,
    ObjectSoluce,
    ObjectCamera,
    ObjectCameraLeft,
    ObjectCameraRight,
    ObjectCameraNear,
    ObjectCameraAway,
    ObjectDelete,
    ObjectMovieLock,
    ObjectDeleted,
}

impl EventType {
    pub fn is_key(&self) -> bool {
        matches!(self, EventType::KeyDown | EventType::KeyUp)
    }

    pub fn is_mouse(&self) -> bool {
        matches!(
            self,
            EventType::MouseMove | EventType::MouseButtonDown | EventType::MouseButtonUp | EventType::MouseWheel
        )
    }
}

/// Key codes the runtime reacts to directly
pub mod keys {
    pub const ESCAPE: u32 = 27;
    pub const RETURN: u32 = 13;
    pub const BACKSPACE: u32 = 8;
    pub const TAB: u32 = 9;
    pub const SPACE: u32 = 32;
    pub const BACKQUOTE: u32 = 96;
    pub const C: u32 = 99;
    pub const F1: u32 = 0x4000_003A;
    pub const F11: u32 = 0x4000_0044;
    pub const F12: u32 = 0x4000_0045;
}

/// Modifier bits carried in [`Event::kmod`]
pub mod kmod {
    pub const SHIFT: u16 = 0x0001;
    pub const CTRL: u16 = 0x0040;
    pub const ALT: u16 = 0x0100;
}

/// Logical binding a key resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputSlot {
    Left,
    Right,
    Up,
    Down,
    GUp,
    GDown,
    Camera,
    Desel,
    Action,
    Near,
    Away,
    Next,
    Human,
    Quit,
    Help,
    Prog,
    Visit,
    Pause,
    CameraUp,
    CameraDown,
    Speed05,
    Speed10,
    Speed15,
    Speed20,
    Speed30,
    Speed40,
    Speed60,
}

impl InputSlot {
    /// Simulation speed selected by a speed slot
    pub fn speed(&self) -> Option<f32> {
        match self {
            InputSlot::Speed05 => Some(0.5),
            InputSlot::Speed10 => Some(1.0),
            InputSlot::Speed15 => Some(1.5),
            InputSlot::Speed20 => Some(2.0),
            InputSlot::Speed30 => Some(3.0),
            InputSlot::Speed40 => Some(4.0),
            InputSlot::Speed60 => Some(6.0),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyData {
    pub key: u32,
    pub slot: Option<InputSlot>,
    pub unicode: Option<char>,
}

/// Typed payload, one variant per event family
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EventData {
    #[default]
    None,
    Key(KeyData),
    Text(String),
    MouseButton(MouseButton),
    Wheel(i32),
}

/// One normalized event
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event_type: EventType,
    pub data: EventData,
    /// Mouse position in interface coordinates
    pub mouse_pos: Point,
    /// Modifier mask, see [`kmod`]
    pub kmod: u16,
    /// Scaled seconds since the previous frame (frame events only)
    pub rel_time: f32,
    /// Real seconds since the previous frame (frame events only)
    pub real_rel_time: f32,
}

impl Event {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            data: EventData::None,
            mouse_pos: Point::default(),
            kmod: 0,
            rel_time: 0.0,
            real_rel_time: 0.0,
        }
    }

    pub fn frame(rel_time: f32, real_rel_time: f32) -> Self {
        Self {
            rel_time,
            real_rel_time,
            ..Self::new(EventType::Frame)
        }
    }

    pub fn key_down(key: u32, slot: Option<InputSlot>) -> Self {
        Self {
            data: EventData::Key(KeyData { key, slot, unicode: None }),
            ..Self::new(EventType::KeyDown)
        }
    }

    pub fn key_up(key: u32, slot: Option<InputSlot>) -> Self {
        Self {
            data: EventData::Key(KeyData { key, slot, unicode: None }),
            ..Self::new(EventType::KeyUp)
        }
    }

    /// Key press bound to a slot with no particular key code
    pub fn slot(slot: InputSlot) -> Self {
        Self::key_down(0, Some(slot))
    }

    pub fn text(text: &str) -> Self {
        Self {
            data: EventData::Text(text.to_string()),
            ..Self::new(EventType::TextInput)
        }
    }

    pub fn mouse_move(pos: Point) -> Self {
        Self {
            mouse_pos: pos,
            ..Self::new(EventType::MouseMove)
        }
    }

    pub fn mouse_down(button: MouseButton, pos: Point) -> Self {
        Self {
            data: EventData::MouseButton(button),
            mouse_pos: pos,
            ..Self::new(EventType::MouseButtonDown)
        }
    }

    pub fn mouse_up(button: MouseButton, pos: Point) -> Self {
        Self {
            data: EventData::MouseButton(button),
            mouse_pos: pos,
            ..Self::new(EventType::MouseButtonUp)
        }
    }

    pub fn with_kmod(mut self, kmod: u16) -> Self {
        self.kmod = kmod;
        self
    }

    pub fn key(&self) -> Option<&KeyData> {
        match &self.data {
            EventData::Key(k) => Some(k),
            _ => None,
        }
    }

    pub fn key_code(&self) -> Option<u32> {
        self.key().map(|k| k.key)
    }

    pub fn input_slot(&self) -> Option<InputSlot> {
        self.key().and_then(|k| k.slot)
    }

    pub fn mouse_button(&self) -> Option<MouseButton> {
        match self.data {
            EventData::MouseButton(b) => Some(b),
            _ => None,
        }
    }
}

/// FIFO of pending events
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event(&mut self, event: Event) {
        self.events.push_back(event);
    }

    pub fn get_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn contains(&self, event_type: EventType) -> bool {
        self.events.iter().any(|e| e.event_type == event_type)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// One link of the dispatch chain
pub trait EventHandler {
    /// Handles `event`; may push follow-up events into `queue`. Returns
    /// `false` to stop propagation to the next handler.
    fn process_event(&mut self, event: &Event, queue: &mut EventQueue) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_fifo() {
        let mut queue = EventQueue::new();
        queue.add_event(Event::new(EventType::Win));
        queue.add_event(Event::new(EventType::Lost));
        assert!(queue.contains(EventType::Lost));
        assert_eq!(queue.get_event().map(|e| e.event_type), Some(EventType::Win));
        assert_eq!(queue.get_event().map(|e| e.event_type), Some(EventType::Lost));
        assert!(queue.get_event().is_none());
    }

    #[test]
    fn test_key_payload() {
        let e = Event::key_down(keys::RETURN, None).with_kmod(kmod::CTRL);
        assert_eq!(e.key_code(), Some(keys::RETURN));
        assert_eq!(e.input_slot(), None);
        assert_eq!(e.kmod & kmod::CTRL, kmod::CTRL);
        assert_eq!(Event::slot(InputSlot::Pause).input_slot(), Some(InputSlot::Pause));
        assert_eq!(Event::new(EventType::Frame).key(), None);
    }

    #[test]
    fn test_speed_slots() {
        assert_eq!(InputSlot::Speed15.speed(), Some(1.5));
        assert_eq!(InputSlot::Quit.speed(), None);
    }
}
