//! Transport bar widget - tempo, play state, step, voice and output level

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use sh101_engine::{sequencing::TransportState, synth::VoiceState};

use super::View;

/// Level of the scope buffer
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

pub fn render_transport(frame: &mut Frame, area: Rect, view: &View, stats: &AudioStats) {
    let block = Block::default().title(" sh101 ").borders(Borders::ALL);
    let handle = view.handle;

    let (symbol, color) = match handle.transport_state() {
        TransportState::Playing => ("▶", Color::Green),
        TransportState::Paused => ("⏸", Color::Yellow),
        TransportState::Stopped => ("■", Color::DarkGray),
    };

    let step = match handle.current_step() {
        Some(step) => format!("{:02}/16", step + 1),
        None => "--/16".to_string(),
    };

    let voice = match handle.voice_state() {
        VoiceState::Idle => "idle".to_string(),
        VoiceState::Sounding(note) => note.to_string(),
        VoiceState::Releasing(note) => format!("{note}~"),
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" BPM: {:.0}  ", handle.tempo()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("{symbol} {}  ", handle.transport_state()),
            Style::default().fg(color),
        ),
        Span::styled(format!("Step {step}  "), Style::default().fg(Color::White)),
        Span::styled(
            format!("Swing {:.0}%  ", handle.swing() * 100.0),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("Oct {:+}  Voice {voice}  ", handle.octave()),
            Style::default().fg(Color::LightBlue),
        ),
        Span::styled(
            format!(
                "{} {:.1}kHz {} nodes  ",
                view.device,
                view.sample_rate / 1000.0,
                view.live_nodes
            ),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}", stats.peak, stats.rms),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
