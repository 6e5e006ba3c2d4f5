//! Parameter panel - every control with its formatted value and a level bar

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use sh101_engine::ParamId;

use super::{Focus, View};

const BAR_WIDTH: usize = 12;

pub fn render_params(frame: &mut Frame, area: Rect, view: &View) {
    let border = if view.focus == Focus::Params {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .title(" Parameters ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let handle = view.handle;
    let mut lines = vec![Line::from(vec![
        Span::styled(" wave ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{:?}", handle.waveform_param()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled("   lfo ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{:?}", handle.lfo_waveform()),
            Style::default().fg(Color::Cyan),
        ),
    ])];

    // Keep the selection in view
    let rows = usize::from(area.height.saturating_sub(3)).max(1);
    let selected = view.selected.index();
    let first = selected.saturating_sub(rows - 1);

    for &id in ParamId::ALL.iter().skip(first).take(rows) {
        let value = handle.param(id);
        let filled = (id.spec().normalize(value) * BAR_WIDTH as f32).round() as usize;
        let bar = format!(
            "{}{}",
            "█".repeat(filled.min(BAR_WIDTH)),
            "░".repeat(BAR_WIDTH - filled.min(BAR_WIDTH))
        );

        let mut name_style = Style::default().fg(Color::White);
        if id == view.selected && view.focus == Focus::Params {
            name_style = name_style.add_modifier(Modifier::REVERSED);
        }

        lines.push(Line::from(vec![
            Span::styled(format!(" {:<18}", id.name()), name_style),
            Span::styled(bar, Style::default().fg(Color::Cyan)),
            Span::styled(
                format!(" {}", handle.display(id)),
                Style::default().fg(Color::Gray),
            ),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
