//! Interface layer of the dispatch chain: the command console edit box,
//! clickable controls with tooltips, modal dialogs and the speed button.
//!
//! The interface sits between the application and the orchestrator. It
//! consumes the input aimed at its own widgets and turns it into semantic
//! events (`Cmd`, `DialogOk`, control events) pushed back into the queue.

use hecs::Entity;

use botfield_logic::constants::CONSOLE_MAX_CHARS;

use crate::event::{keys, Event, EventData, EventHandler, EventQueue, EventType, MouseButton};
use crate::math::Point;

/// Rectangle in interface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub pos: Point,
    pub dim: Point,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Point::new(x, y),
            dim: Point::new(w, h),
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.pos.x && p.x <= self.pos.x + self.dim.x && p.y >= self.pos.y && p.y <= self.pos.y + self.dim.y
    }
}

/// A clickable button posting `event_type`
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub event_type: EventType,
    pub rect: Rect,
    pub tooltip: Option<String>,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DialogKind {
    /// Confirm destruction of a building
    DeleteObject(Entity),
    PauseMenu,
    Information { title: String, text: String },
}

/// Single-line command console
#[derive(Debug, Default)]
pub struct ConsoleEdit {
    visible: bool,
    text: String,
}

impl ConsoleEdit {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn show(&mut self) {
        self.visible = true;
        self.text.clear();
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.text.clear();
    }

    pub fn insert(&mut self, input: &str) {
        for c in input.chars() {
            if self.text.chars().count() >= CONSOLE_MAX_CHARS {
                break;
            }
            self.text.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }
}

#[derive(Debug)]
pub struct Interface {
    pub console: ConsoleEdit,
    /// Whether the console key opens the console
    pub console_enabled: bool,
    controls: Vec<Control>,
    dialog: Option<DialogKind>,
    /// Simulation speed shown on the speed button, `None` = hidden
    speed_button: Option<f32>,
}

impl Default for Interface {
    fn default() -> Self {
        Self::new()
    }
}

impl Interface {
    pub fn new() -> Self {
        Self {
            console: ConsoleEdit::default(),
            console_enabled: true,
            controls: Vec::new(),
            dialog: None,
            speed_button: None,
        }
    }

    /// Removes every control, the console text and any dialog
    pub fn clear(&mut self) {
        self.controls.clear();
        self.dialog = None;
        self.console.hide();
        self.speed_button = None;
    }

    pub fn add_control(&mut self, event_type: EventType, rect: Rect, tooltip: Option<&str>) {
        self.controls.retain(|c| c.event_type != event_type);
        self.controls.push(Control {
            event_type,
            rect,
            tooltip: tooltip.map(str::to_string),
            visible: true,
        });
    }

    pub fn remove_control(&mut self, event_type: EventType) {
        self.controls.retain(|c| c.event_type != event_type);
    }

    pub fn control(&self, event_type: EventType) -> Option<&Control> {
        self.controls.iter().find(|c| c.event_type == event_type)
    }

    pub fn control_at(&self, pos: Point) -> Option<&Control> {
        self.controls.iter().rev().find(|c| c.visible && c.rect.contains(pos))
    }

    /// Tooltip of the control under `pos`, if any
    pub fn tooltip_at(&self, pos: Point) -> Option<&str> {
        self.control_at(pos).and_then(|c| c.tooltip.as_deref())
    }

    pub fn show_dialog(&mut self, dialog: DialogKind) {
        self.dialog = Some(dialog);
    }

    pub fn close_dialog(&mut self) -> Option<DialogKind> {
        self.dialog.take()
    }

    pub fn dialog(&self) -> Option<&DialogKind> {
        self.dialog.as_ref()
    }

    pub fn set_speed_button(&mut self, speed: f32) {
        self.speed_button = if (speed - 1.0).abs() < f32::EPSILON { None } else { Some(speed) };
    }

    pub fn speed_button(&self) -> Option<f32> {
        self.speed_button
    }

    fn console_event(&mut self, event: &Event, queue: &mut EventQueue) -> bool {
        match event.event_type {
            EventType::KeyDown => {
                match event.key_code() {
                    Some(keys::RETURN) => {
                        let line = self.console.text().to_string();
                        self.console.hide();
                        queue.add_event(Event {
                            data: EventData::Text(line),
                            ..Event::new(EventType::Cmd)
                        });
                    }
                    Some(keys::ESCAPE) | Some(keys::BACKQUOTE) => self.console.hide(),
                    Some(keys::BACKSPACE) => self.console.backspace(),
                    _ => {}
                }
                false
            }
            EventType::KeyUp => false,
            EventType::TextInput => {
                if let EventData::Text(text) = &event.data {
                    self.console.insert(text);
                }
                false
            }
            _ => true,
        }
    }

    fn dialog_event(&mut self, event: &Event, queue: &mut EventQueue) -> bool {
        match event.event_type {
            EventType::KeyDown => {
                match event.key_code() {
                    Some(keys::RETURN) => queue.add_event(Event::new(EventType::DialogOk)),
                    Some(keys::ESCAPE) => queue.add_event(Event::new(EventType::DialogCancel)),
                    _ => {}
                }
                false
            }
            EventType::MouseButtonDown | EventType::MouseButtonUp | EventType::KeyUp => false,
            _ => true,
        }
    }
}

impl EventHandler for Interface {
    fn process_event(&mut self, event: &Event, queue: &mut EventQueue) -> bool {
        if event.event_type == EventType::Frame {
            return true;
        }
        if self.console.is_visible() {
            return self.console_event(event, queue);
        }
        if self.dialog.is_some() {
            return self.dialog_event(event, queue);
        }
        match event.event_type {
            EventType::KeyDown if event.key_code() == Some(keys::BACKQUOTE) && self.console_enabled => {
                self.console.show();
                false
            }
            EventType::MouseButtonDown if event.mouse_button() == Some(MouseButton::Left) => {
                match self.control_at(event.mouse_pos).map(|c| c.event_type) {
                    Some(clicked) => {
                        queue.add_event(Event {
                            mouse_pos: event.mouse_pos,
                            ..Event::new(clicked)
                        });
                        false
                    }
                    None => true,
                }
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_line(ui: &mut Interface, queue: &mut EventQueue, line: &str) {
        assert!(!ui.process_event(&Event::key_down(keys::BACKQUOTE, None), queue));
        assert!(!ui.process_event(&Event::text(line), queue));
        assert!(!ui.process_event(&Event::key_down(keys::RETURN, None), queue));
    }

    #[test]
    fn test_console_posts_command() {
        let mut ui = Interface::new();
        let mut queue = EventQueue::new();
        type_line(&mut ui, &mut queue, "speed 2");
        let cmd = queue.get_event().unwrap();
        assert_eq!(cmd.event_type, EventType::Cmd);
        assert_eq!(cmd.data, EventData::Text("speed 2".to_string()));
        assert!(!ui.console.is_visible());
    }

    #[test]
    fn test_console_swallows_keys_but_not_frames() {
        let mut ui = Interface::new();
        let mut queue = EventQueue::new();
        ui.process_event(&Event::key_down(keys::BACKQUOTE, None), &mut queue);
        assert!(!ui.process_event(&Event::key_down(keys::SPACE, None), &mut queue));
        assert!(ui.process_event(&Event::frame(0.1, 0.1), &mut queue));
        assert!(!ui.process_event(&Event::key_down(keys::ESCAPE, None), &mut queue));
        assert!(queue.is_empty());
        assert!(ui.process_event(&Event::key_down(keys::SPACE, None), &mut queue));
    }

    #[test]
    fn test_console_length_limit() {
        let mut edit = ConsoleEdit::default();
        edit.show();
        edit.insert(&"x".repeat(CONSOLE_MAX_CHARS + 10));
        assert_eq!(edit.text().len(), CONSOLE_MAX_CHARS);
        edit.backspace();
        assert_eq!(edit.text().len(), CONSOLE_MAX_CHARS - 1);
    }

    #[test]
    fn test_control_click_consumed() {
        let mut ui = Interface::new();
        let mut queue = EventQueue::new();
        ui.add_control(EventType::ObjectDeselect, Rect::new(0.0, 0.0, 0.1, 0.1), Some("Previous selection"));
        let click = Event::mouse_down(MouseButton::Left, Point::new(0.05, 0.05));
        assert!(!ui.process_event(&click, &mut queue));
        assert_eq!(queue.get_event().map(|e| e.event_type), Some(EventType::ObjectDeselect));
        assert_eq!(ui.tooltip_at(Point::new(0.05, 0.05)), Some("Previous selection"));

        let miss = Event::mouse_down(MouseButton::Left, Point::new(0.5, 0.5));
        assert!(ui.process_event(&miss, &mut queue));
    }

    #[test]
    fn test_dialog_keys() {
        let mut ui = Interface::new();
        let mut queue = EventQueue::new();
        ui.show_dialog(DialogKind::PauseMenu);
        assert!(!ui.process_event(&Event::key_down(keys::ESCAPE, None), &mut queue));
        assert_eq!(queue.get_event().map(|e| e.event_type), Some(EventType::DialogCancel));
        assert_eq!(ui.close_dialog(), Some(DialogKind::PauseMenu));
    }
}
