//! Application state: owns the audio backend and the engine handle, maps keys
//! to engine requests.

use std::time::{Duration, Instant};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::DefaultTerminal;
use tracing::{info, warn};

use sh101_engine::{
    io::{AudioBackend, CpalBackend},
    sequencing::{Note, PitchClass, TransportState, ROWS, STEPS},
    synth::{
        params::{freq_to_slider, slider_to_freq, Unit},
        EngineEvent,
    },
    Engine, EngineConfig, EngineHandle, ParamId,
};

use crate::ui::{self, spectrum::SpectrumAnalyzer, Focus, View};

/// Terminals rarely report key releases; a key counts as held while its
/// auto-repeat keeps arriving within this window.
const KEY_HOLD: Duration = Duration::from_millis(550);

/// Fraction of a parameter's range moved per arrow press.
const PARAM_STEP: f32 = 0.02;

const TEMPO_STEP: f32 = 1.0;
const SWING_STEP: f32 = 0.05;

/// Computer keyboard, one octave from C.
const KEYBOARD: [(char, u8); 13] = [
    ('a', 0),
    ('w', 1),
    ('s', 2),
    ('e', 3),
    ('d', 4),
    ('f', 5),
    ('t', 6),
    ('g', 7),
    ('y', 8),
    ('h', 9),
    ('u', 10),
    ('j', 11),
    ('k', 12),
];

struct HeldKey {
    key: Note,
    last_seen: Instant,
}

pub struct App {
    backend: CpalBackend,
    device: String,
    handle: EngineHandle,
    spectrum: SpectrumAnalyzer,
    focus: Focus,
    /// Grid cursor: (pitch row, step).
    cursor: (usize, usize),
    selected: usize,
    held: Option<HeldKey>,
    status: String,
    should_quit: bool,
}

impl App {
    /// Open the output device, start the engine and hand it to the stream.
    pub fn start(device: Option<&str>, tempo: f32) -> EyreResult<Self> {
        let mut backend = CpalBackend::open(device).wrap_err("failed to open audio output")?;

        let config = EngineConfig::default();
        let analyzer_size = config.analyzer_size;
        let mut engine = Engine::new(config);
        let mut handle = engine
            .remote()
            .ok_or_else(|| eyre!("engine handle already taken"))?;

        engine
            .start(&mut backend)
            .wrap_err("audio engine did not start")?;
        handle.set_tempo(tempo);

        let sample_rate = backend.sample_rate();
        let device = backend.device_name();
        backend.install(engine);
        info!(%device, sample_rate, "engine running");

        Ok(Self {
            device,
            spectrum: SpectrumAnalyzer::new(analyzer_size, sample_rate),
            backend,
            handle,
            focus: Focus::Grid,
            cursor: (0, 0),
            selected: 0,
            held: None,
            status: String::new(),
            should_quit: false,
        })
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            for event in self.handle.poll() {
                self.observe(event);
            }
            self.expire_held_key();

            let samples = self.handle.waveform().to_vec();
            self.spectrum.update(&samples);

            let view = View {
                handle: &self.handle,
                samples: &samples,
                spectrum: self.spectrum.data(),
                focus: self.focus,
                cursor: self.cursor,
                selected: ParamId::ALL[self.selected],
                device: &self.device,
                sample_rate: self.backend.sample_rate(),
                live_nodes: self.backend.live_nodes(),
                status: &self.status,
            };
            terminal.draw(|frame| ui::draw(frame, &view))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    /// Take the engine back from the stream and release its graph.
    pub fn shutdown(&mut self) {
        if let Some(mut engine) = self.backend.uninstall() {
            match engine.teardown() {
                Ok(report) => info!(?report, "engine torn down"),
                Err(err) => warn!(%err, "teardown failed"),
            }
        }
        self.backend.close();
    }

    fn observe(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Rebuilt(reason) => self.status = format!("rebuilt: {reason}"),
            EngineEvent::Failed => {
                self.status = "engine failed, restart required".into();
                warn!("engine reported a failed rebuild");
            }
            EngineEvent::Octave(octave) => self.status = format!("octave {octave:+}"),
            _ => {}
        }
    }

    fn expire_held_key(&mut self) {
        if let Some(held) = &self.held {
            if held.last_seen.elapsed() > KEY_HOLD {
                self.handle.key_up(held.key);
                self.held = None;
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if let KeyCode::Char(c) = key.code {
            if let Some(note) = keyboard_note(c) {
                match key.kind {
                    KeyEventKind::Release => self.release_key(note),
                    _ => self.press_key(note),
                }
                return;
            }
        }

        if key.kind != KeyEventKind::Press {
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::Char(' ') => {
                if self.handle.transport_state() == TransportState::Stopped {
                    self.handle.play();
                } else {
                    self.handle.stop();
                }
            }
            KeyCode::Char('p') => match self.handle.transport_state() {
                TransportState::Playing => {
                    self.handle.pause();
                }
                TransportState::Paused => {
                    self.handle.resume();
                }
                TransportState::Stopped => {}
            },
            KeyCode::Char('z') => {
                self.handle.shift_octave(-1);
            }
            KeyCode::Char('x') => {
                self.handle.shift_octave(1);
            }
            KeyCode::Char('v') => {
                let next = self.handle.waveform_param().next();
                self.handle.set_waveform(next);
            }
            KeyCode::Char('l') => {
                let next = self.handle.lfo_waveform().next();
                self.handle.set_lfo_waveform(next);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.handle.set_tempo(self.handle.tempo() + TEMPO_STEP);
            }
            KeyCode::Char('-') => {
                self.handle.set_tempo(self.handle.tempo() - TEMPO_STEP);
            }
            KeyCode::Char(']') => {
                self.handle.set_swing(self.handle.swing() + SWING_STEP);
            }
            KeyCode::Char('[') => {
                self.handle.set_swing(self.handle.swing() - SWING_STEP);
            }
            KeyCode::Up => self.move_cursor(1, 0),
            KeyCode::Down => self.move_cursor(-1, 0),
            KeyCode::Left => self.move_cursor(0, -1),
            KeyCode::Right => self.move_cursor(0, 1),
            KeyCode::Enter if self.focus == Focus::Grid => self.toggle_at_cursor(),
            _ => {}
        }
    }

    fn press_key(&mut self, note: Note) {
        match &mut self.held {
            Some(held) if held.key == note => held.last_seen = Instant::now(),
            _ => {
                self.handle.key_down(note);
                self.held = Some(HeldKey {
                    key: note,
                    last_seen: Instant::now(),
                });
            }
        }
    }

    fn release_key(&mut self, note: Note) {
        if self.held.as_ref().is_some_and(|held| held.key == note) {
            self.handle.key_up(note);
            self.held = None;
        }
    }

    /// Up/down moves the grid row or the parameter selection; left/right
    /// moves the grid step or adjusts the selected parameter.
    fn move_cursor(&mut self, rows: isize, steps: isize) {
        match self.focus {
            Focus::Grid => {
                let (row, step) = self.cursor;
                self.cursor = (
                    (row as isize + rows).rem_euclid(ROWS as isize) as usize,
                    (step as isize + steps).rem_euclid(STEPS as isize) as usize,
                );
            }
            Focus::Params if rows != 0 => {
                let count = ParamId::ALL.len() as isize;
                self.selected = (self.selected as isize - rows).rem_euclid(count) as usize;
            }
            Focus::Params => {
                let id = ParamId::ALL[self.selected];
                let value = nudged(id, self.handle.param(id), steps as f32);
                self.handle.set_param(id, value);
            }
        }
    }

    fn toggle_at_cursor(&mut self) {
        let (row, step) = self.cursor;
        let pitch = PitchClass::ALL[row];
        match self.handle.toggle_step(pitch, step) {
            Ok(state) => self.status = format!("{} step {}: {state:?}", pitch.name(), step + 1),
            Err(err) => self.status = err.to_string(),
        }
    }
}

fn keyboard_note(c: char) -> Option<Note> {
    KEYBOARD
        .iter()
        .find(|(key, _)| *key == c)
        .map(|&(_, offset)| Note::C3.transpose(i32::from(offset)))
}

/// Move `value` one arrow press in `direction`, in the parameter's natural
/// scale: log for the cutoff, whole semitones for pitch, linear otherwise.
fn nudged(id: ParamId, value: f32, direction: f32) -> f32 {
    let spec = id.spec();
    match (id, spec.unit) {
        (ParamId::FilterCutoff, _) => {
            slider_to_freq((freq_to_slider(value) + direction * PARAM_STEP).clamp(0.0, 1.0))
        }
        (_, Unit::Semitones) => value + direction,
        _ => spec.min + (spec.normalize(value) + direction * PARAM_STEP) * (spec.max - spec.min),
    }
}
