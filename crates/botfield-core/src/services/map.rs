//! Minimap settings and the highlighted dot.

use hecs::Entity;

use crate::scene::MapSettings;

#[derive(Debug, Default)]
pub struct MiniMap {
    pub settings: MapSettings,
    highlight: Option<Entity>,
}

impl MiniMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, settings: &MapSettings) {
        self.settings = settings.clone();
    }

    pub fn zoom(&self) -> f32 {
        self.settings.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.settings.zoom = zoom.clamp(1.0, 16.0);
    }

    pub fn show(&mut self, show: bool) {
        self.settings.show = show;
    }

    pub fn is_shown(&self) -> bool {
        self.settings.show && self.settings.enabled
    }

    pub fn set_highlight(&mut self, entity: Option<Entity>) {
        self.highlight = entity;
    }

    pub fn highlight(&self) -> Option<Entity> {
        self.highlight
    }

    pub fn flush(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_clamped() {
        let mut map = MiniMap::new();
        map.set_zoom(40.0);
        assert_eq!(map.zoom(), 16.0);
        map.show(false);
        assert!(!map.is_shown());
        map.flush();
        assert!(map.is_shown());
    }
}
