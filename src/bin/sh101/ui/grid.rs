//! Step grid widget - 12 pitch rows by 16 steps with playhead and cursor

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use sh101_engine::sequencing::{PitchClass, StepState, STEPS};

use super::{Focus, View};

const LABEL_WIDTH: usize = 4;

pub fn render_grid(frame: &mut Frame, area: Rect, view: &View) {
    let border = if view.focus == Focus::Grid {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .title(" Sequence ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let playhead = view.handle.current_step();
    let mut lines = Vec::with_capacity(PitchClass::ALL.len() + 2);

    // Beat markers row
    let mut markers = " ".repeat(LABEL_WIDTH);
    for step in 0..STEPS {
        markers.push_str(if step % 4 == 0 { "|  " } else { "   " });
    }
    lines.push(Line::from(Span::styled(
        markers,
        Style::default().fg(Color::DarkGray),
    )));

    // Highest pitch on top
    for (row, pitch) in PitchClass::ALL.iter().enumerate().rev() {
        let mut spans = vec![Span::styled(
            format!("{:<width$}", pitch.name(), width = LABEL_WIDTH),
            Style::default().fg(Color::White),
        )];

        for step in 0..STEPS {
            let state = view
                .handle
                .step_state(*pitch, step)
                .unwrap_or(StepState::Off);
            let (glyph, color) = match state {
                StepState::Off => (" · ", Color::DarkGray),
                StepState::Normal => (" ■ ", Color::Cyan),
                StepState::High => (" █ ", Color::LightMagenta),
            };

            let mut style = Style::default().fg(color);
            if playhead == Some(step) {
                style = style.bg(Color::Rgb(40, 40, 60));
            }
            if view.focus == Focus::Grid && view.cursor == (row, step) {
                style = style.add_modifier(Modifier::REVERSED);
            }
            spans.push(Span::styled(glyph, style));
        }
        lines.push(Line::from(spans));
    }

    // Playhead row
    let mut head = " ".repeat(LABEL_WIDTH);
    for step in 0..STEPS {
        head.push_str(if playhead == Some(step) { " ▲ " } else { "   " });
    }
    lines.push(Line::from(Span::styled(
        head,
        Style::default().fg(Color::Yellow),
    )));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
