//! Application main loop.
//!
//! One call to [`Application::run_frame`] is one simulation tick:
//!
//! 1. mirror the orchestrator's speed and pause state onto the clock
//! 2. tick the clock and queue a stamped Frame event
//! 3. drain the queue through Application → Interface → Orchestrator
//! 4. drop loading time when a scene was just built
//! 5. publish a render snapshot through the frame gate

use std::sync::Arc;

use crate::clock::{Clock, FrameTimes};
use crate::event::{Event, EventHandler, EventQueue, EventType};
use crate::frame_gate::FrameGate;
use crate::orchestrator::MissionOrchestrator;

/// Hard cap on events handled per tick; handlers that keep posting
/// follow-ups are finished on the next tick
const MAX_EVENTS_PER_FRAME: usize = 256;

/// Top-level owner of the clock, the event queue and the orchestrator
pub struct Application {
    pub clock: Clock,
    pub orchestrator: MissionOrchestrator,
    gate: Arc<FrameGate>,
    queue: EventQueue,
    quit: bool,
    frames: u64,
}

impl Application {
    pub fn new(clock: Clock, orchestrator: MissionOrchestrator) -> Self {
        Self {
            clock,
            orchestrator,
            gate: Arc::new(FrameGate::new()),
            queue: EventQueue::new(),
            quit: false,
            frames: 0,
        }
    }

    /// Gate the render thread waits on
    pub fn frame_gate(&self) -> Arc<FrameGate> {
        Arc::clone(&self.gate)
    }

    /// Queues an input event for the next tick
    pub fn push_event(&mut self, event: Event) {
        self.queue.add_event(event);
    }

    pub fn is_quitting(&self) -> bool {
        self.quit
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Runs one tick. Returns the clock times used for it.
    pub fn run_frame(&mut self) -> FrameTimes {
        self.sync_clock();
        let times = self.clock.tick();
        let real_rel = times.real_rel_ns as f32 / 1e9;
        self.queue.add_event(Event::frame(times.rel_time, real_rel));

        let mut handled = 0;
        while let Some(event) = self.queue.get_event() {
            self.dispatch(&event);
            handled += 1;
            if handled >= MAX_EVENTS_PER_FRAME {
                log::warn!("Event budget exhausted, {} events deferred", self.queue.len());
                break;
            }
        }

        if self.orchestrator.take_time_reset() {
            self.clock.reset_time_after_loading();
        }

        self.frames += 1;
        let snapshot = self.orchestrator.render_snapshot(self.frames);
        self.gate.request_frame(snapshot);
        times
    }

    /// Ticks until a Quit event arrives or `max_frames` have run. Returns
    /// the number of frames run.
    pub fn run_until_quit(&mut self, max_frames: u64) -> u64 {
        let start = self.frames;
        while !self.quit && self.frames - start < max_frames {
            self.run_frame();
        }
        if self.quit {
            self.gate.close();
        }
        self.frames - start
    }

    fn dispatch(&mut self, event: &Event) {
        let mut follow_up = EventQueue::new();
        let mut pass = self.process_event(event, &mut follow_up);
        if pass || event.event_type == EventType::Frame {
            pass = self.orchestrator.interface.process_event(event, &mut follow_up);
        }
        // Frame ticks always reach the orchestrator
        if pass || event.event_type == EventType::Frame {
            self.orchestrator.process_event(event, &mut follow_up);
        }
        while let Some(next) = follow_up.get_event() {
            self.queue.add_event(next);
        }
    }

    fn sync_clock(&mut self) {
        let speed = self.orchestrator.speed();
        if self.clock.speed() != speed {
            self.clock.set_speed(speed);
        }
        let paused = self.orchestrator.is_simulation_paused();
        if paused && !self.clock.is_suspended() {
            self.clock.suspend();
        } else if !paused && self.clock.is_suspended() {
            self.clock.resume();
        }
    }
}

impl EventHandler for Application {
    fn process_event(&mut self, event: &Event, _queue: &mut EventQueue) -> bool {
        if event.event_type == EventType::Quit {
            log::info!("Quit requested after {} frames", self.frames);
            self.quit = true;
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualTimeSource;
    use crate::config::RuntimeConfig;
    use crate::event::{keys, InputSlot};
    use crate::level::MemoryLevelProvider;
    use crate::script::BasicScriptHost;
    use botfield_logic::mission::{LevelCategory, LevelId};
    use botfield_logic::phase::Phase;

    const LEVEL: &str = "\
Title text=\"App test\"
TerrainGenerate
TerrainCreate
BeginObject
CreateObject type=Me pos=0;0
CreateObject type=AlienAnt pos=50;50
EndMissionTake pos=0;0 dist=1000 type=AlienAnt min=0 max=0
EndMissionDelay win=0.5 lost=0.5
";

    fn app(tag: &str) -> (Application, ManualTimeSource) {
        let mission = LevelId::new(LevelCategory::Missions, 1, 1);
        let provider = MemoryLevelProvider::new().with_level(&mission, LEVEL);
        let config = RuntimeConfig {
            save_dir: std::env::temp_dir().join(format!("botfield-app-{}-{}", tag, std::process::id())),
            ..Default::default()
        };
        let mut orch = MissionOrchestrator::new(config, Box::new(provider), Box::new(BasicScriptHost::new()));
        orch.select_level(mission);
        orch.change_phase(Phase::Simul);
        let source = ManualTimeSource::new();
        let clock = Clock::new(Box::new(source.clone()));
        (Application::new(clock, orch), source)
    }

    fn cleanup(app: &Application) {
        let _ = std::fs::remove_dir_all(&app.orchestrator.config.save_dir);
    }

    #[test]
    fn test_frames_advance_game_time() {
        let (mut app, source) = app("time");
        source.advance_ms(100);
        let times = app.run_frame();
        assert!((times.rel_time - 0.1).abs() < 1e-4);
        assert!((app.orchestrator.game_time() - 0.1).abs() < 1e-4);
        assert_eq!(app.frame_count(), 1);
        assert_eq!(app.frame_gate().last_requested(), 1);
        cleanup(&app);
    }

    #[test]
    fn test_pause_suspends_clock() {
        let (mut app, source) = app("pause");
        app.push_event(Event::slot(InputSlot::Pause));
        app.run_frame();
        source.advance_ms(500);
        let times = app.run_frame();
        assert!(app.clock.is_suspended());
        assert_eq!(times.exact_rel_ns, 0);
        assert_eq!(times.real_rel_ns, 500_000_000);
        cleanup(&app);
    }

    #[test]
    fn test_speed_follows_orchestrator() {
        let (mut app, source) = app("speed");
        app.push_event(Event::slot(InputSlot::Speed20));
        app.run_frame();
        source.advance_ms(100);
        let times = app.run_frame();
        assert_eq!(app.clock.speed(), 2.0);
        assert!((times.rel_time - 0.2).abs() < 1e-4);
        cleanup(&app);
    }

    #[test]
    fn test_console_swallows_keys() {
        let (mut app, _source) = app("console");
        app.push_event(Event::key_down(keys::BACKQUOTE, None));
        app.run_frame();
        assert!(app.orchestrator.interface.console.is_visible());
        app.push_event(Event::slot(InputSlot::Pause));
        app.run_frame();
        // The open console pauses through the cheat pause, not the user one
        assert_ne!(app.orchestrator.pause(), crate::orchestrator::PauseType::User);
        cleanup(&app);
    }

    #[test]
    fn test_winning_reaches_win_phase() {
        let (mut app, source) = app("win");
        let ant = app
            .orchestrator
            .world
            .registry
            .first_of_type(botfield_logic::object_type::ObjectType::Ant)
            .unwrap();
        app.orchestrator.world.registry.destroy(ant);
        for _ in 0..10 {
            source.advance_ms(100);
            app.run_frame();
        }
        assert_eq!(app.orchestrator.phase(), Phase::Win);
        cleanup(&app);
    }

    #[test]
    fn test_quit_stops_the_loop() {
        let (mut app, source) = app("quit");
        app.push_event(Event::new(EventType::Quit));
        source.advance_ms(16);
        let ran = app.run_until_quit(100);
        assert_eq!(ran, 1);
        assert!(app.is_quitting());
        cleanup(&app);
    }
}
