//! TUI module for sh101
//!
//! Draws one frame from a [`View`] snapshot; all state lives in the app.

mod grid;
mod params;
pub mod spectrum;
mod transport;
mod waveform;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

use sh101_engine::{EngineHandle, ParamId};

use grid::render_grid;
use params::render_params;
use spectrum::render_spectrum;
use transport::{render_transport, AudioStats};
use waveform::render_waveform;

/// Which panel the arrow keys drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Grid,
    Params,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Grid => Focus::Params,
            Focus::Params => Focus::Grid,
        }
    }
}

/// Everything one frame needs.
pub struct View<'a> {
    pub handle: &'a EngineHandle,
    pub samples: &'a [f32],
    pub spectrum: &'a [(f64, f64)],
    pub focus: Focus,
    pub cursor: (usize, usize),
    pub selected: ParamId,
    pub device: &'a str,
    pub sample_rate: f32,
    pub live_nodes: usize,
    pub status: &'a str,
}

pub fn draw(frame: &mut Frame, view: &View) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Transport bar
            Constraint::Min(16),    // Grid + parameters
            Constraint::Length(10), // Scope + spectrum
            Constraint::Length(1),  // Help bar
        ])
        .split(frame.area());

    render_transport(frame, chunks[0], view, &AudioStats::from_buffer(view.samples));

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(56), Constraint::Min(30)])
        .split(chunks[1]);
    render_grid(frame, middle[0], view);
    render_params(frame, middle[1], view);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);
    render_waveform(frame, bottom[0], view.samples);
    render_spectrum(frame, bottom[1], view.spectrum);

    let help = if view.status.is_empty() {
        " [Q] Quit  [Space] Play/Stop  [P] Pause  [Tab] Focus  [Enter] Step  \
         [A-K] Keys  [Z/X] Octave  [V] Wave  [L] LFO  [+/-] Tempo  [[/]] Swing"
            .to_string()
    } else {
        format!(" {}", view.status)
    };
    let help = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[3]);
}
