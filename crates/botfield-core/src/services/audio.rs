//! Music state. Playback itself belongs to the audio collaborator; the
//! runtime only decides what should be playing.

#[derive(Debug, Default)]
pub struct SoundService {
    music: Option<String>,
    repeat: bool,
    muted: bool,
    cached: Vec<String>,
    /// Music switches since start, for diagnostics
    pub changes: u32,
}

impl SoundService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `file`. Empty names stop the music.
    pub fn play_music(&mut self, file: &str, repeat: bool) -> bool {
        if file.is_empty() {
            self.stop_music();
            return false;
        }
        self.music = Some(file.to_string());
        self.repeat = repeat;
        self.changes += 1;
        true
    }

    pub fn stop_music(&mut self) {
        self.music = None;
    }

    /// Stops music and every running sound
    pub fn stop_all(&mut self) {
        self.stop_music();
    }

    pub fn mute_all(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn music(&self) -> Option<&str> {
        self.music.as_deref()
    }

    pub fn is_repeating(&self) -> bool {
        self.repeat
    }

    pub fn cache_music(&mut self, file: &str) {
        if !file.is_empty() && !self.cached.iter().any(|c| c == file) {
            self.cached.push(file.to_string());
        }
    }

    pub fn cached(&self) -> &[String] {
        &self.cached
    }

    pub fn clear_cache(&mut self) {
        self.cached.clear();
    }
}
