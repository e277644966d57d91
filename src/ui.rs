pub mod charting;

use keystride::{
    session::SentenceRecord,
    time_series::{consistency, per_sentence_wpm, running_wpm},
    CharStatus, PositionStatus, SessionReport,
};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
/// Per-sentence rows shown under the chart; older sentences scroll off
const MAX_BREAKDOWN_ROWS: usize = 10;
const BREAKDOWN_HEADER: [&str; 5] = ["#", "level", "wpm", "mistakes", "⌫"];

pub fn draw(app: &App, f: &mut Frame) {
    let area = f.area();
    match app.state {
        AppState::Typing => draw_typing(app, f, area),
        AppState::Results => {
            if let Some(report) = &app.report {
                draw_results(app, report, f, area);
            }
        }
    }
}

fn status_span(p: &PositionStatus) -> Span<'static> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = bold.add_modifier(Modifier::DIM);

    match p.status {
        CharStatus::Correct => Span::styled(p.char.to_string(), bold.fg(Color::Green)),
        // make a mistyped space visible
        CharStatus::Incorrect => Span::styled(
            match p.char {
                ' ' => "·".to_owned(),
                c => c.to_string(),
            },
            bold.fg(Color::Red),
        ),
        CharStatus::Cursor => {
            Span::styled(p.char.to_string(), dim.add_modifier(Modifier::UNDERLINED))
        }
        CharStatus::Pending => Span::styled(p.char.to_string(), dim),
    }
}

fn draw_typing(app: &App, f: &mut Frame, area: Rect) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);

    let prompt: String = app.statuses.iter().map(|p| p.char).collect();
    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let prompt_occupied_lines = if prompt.width() <= max_chars_per_line as usize {
        1
    } else {
        ((prompt.width() as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16
    };
    let filler = area.height.saturating_sub(prompt_occupied_lines + 4) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(filler),
            Constraint::Length(1), // progress
            Constraint::Length(1), // guide
            Constraint::Length(1), // padding
            Constraint::Length(prompt_occupied_lines),
            Constraint::Length(1), // live stats
            Constraint::Min(0),
        ])
        .split(area);

    let (position, total) = app.sentence_position();
    let progress = Paragraph::new(Span::styled(
        format!("{position}/{total}  ·  level {}", app.level),
        dim_style,
    ))
    .alignment(Alignment::Center);
    f.render_widget(progress, chunks[1]);

    if let Some(guide) = &app.guide {
        let guide = Paragraph::new(Span::styled(
            guide.as_str(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center);
        f.render_widget(guide, chunks[2]);
    }

    let spans: Vec<Span> = app.statuses.iter().map(status_span).collect();
    let widget = Paragraph::new(Line::from(spans))
        .alignment(if prompt_occupied_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true });
    f.render_widget(widget, chunks[4]);

    let stats = Paragraph::new(Span::styled(
        format!(
            "{} wpm   {}% acc   {} ⌫",
            app.live_wpm, app.live_accuracy, app.backspaces
        ),
        bold_style.add_modifier(Modifier::DIM),
    ))
    .alignment(Alignment::Center);
    f.render_widget(stats, chunks[5]);
}

fn draw_results(app: &App, report: &SessionReport, f: &mut Frame, area: Rect) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let log = app.engine.sentence_log();
    let rows = sentence_rows(log);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),                         // chart
            Constraint::Length(rows.len() as u16 + 2), // breakdown
            Constraint::Length(1),                      // headline stats
            Constraint::Length(1),                      // details
            Constraint::Length(1),                      // coach
            Constraint::Length(1),                      // padding
            Constraint::Length(1),                      // legend
        ])
        .split(area);

    let points: Vec<(f64, f64)> = running_wpm(log)
        .into_iter()
        .map(Into::into)
        .collect();
    let (overall_duration, highest_wpm) = charting::compute_chart_params(&points);

    let datasets = vec![Dataset::default()
        .marker(Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&points)];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([0.0, overall_duration])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(overall_duration), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(highest_wpm), bold_style),
                ]),
        );
    f.render_widget(chart, chunks[0]);

    let header = Row::new(BREAKDOWN_HEADER.map(Cell::from))
        .style(bold_style)
        .bottom_margin(1);
    let table = Table::new(
        rows.into_iter().map(Row::new),
        [
            Constraint::Length(4),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(9),
            Constraint::Length(4),
        ],
    )
    .header(header)
    .column_spacing(2);
    f.render_widget(table, centered(chunks[1], 37));

    let headline = Paragraph::new(Span::styled(
        format!(
            "{} wpm   {}% acc   {} backspaces",
            report.wpm, report.accuracy, report.total_backspaces
        ),
        bold_style,
    ))
    .alignment(Alignment::Center);
    f.render_widget(headline, chunks[2]);

    let sd = consistency(log)
        .map_or_else(|| "-".to_string(), |sd| format!("{sd:.2}"));
    let details = Paragraph::new(Span::styled(
        format!(
            "{} chars   {} mistakes   {:.1}s   {} sd",
            report.total_chars, report.total_mistakes, report.elapsed_secs, sd
        ),
        Style::default().fg(Color::Cyan).patch(italic_style),
    ))
    .alignment(Alignment::Center);
    f.render_widget(details, chunks[3]);

    if let Some(rec) = &app.recommendation {
        let coach = Paragraph::new(Span::styled(
            format!("next: {}  ·  {}", rec.category, rec.advice),
            italic_style.fg(Color::Yellow),
        ))
        .alignment(Alignment::Center);
        f.render_widget(coach, chunks[4]);
    }

    let legend = Paragraph::new(Span::styled(
        "(r)etry / (n)ew / (esc)ape",
        italic_style,
    ))
    .alignment(Alignment::Center);
    f.render_widget(legend, chunks[6]);
}

/// Index, level, wpm, mistakes and backspaces for the last few sentences
fn sentence_rows(log: &[SentenceRecord]) -> Vec<[String; 5]> {
    let speeds = per_sentence_wpm(log);
    let skip = log.len().saturating_sub(MAX_BREAKDOWN_ROWS);
    log.iter()
        .zip(speeds)
        .skip(skip)
        .map(|(record, wpm)| {
            [
                (record.index + 1).to_string(),
                record.level.to_string(),
                format!("{wpm:.0}"),
                record.mistakes.to_string(),
                record.backspaces.to_string(),
            ]
        })
        .collect()
}

fn centered(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incorrect_space_is_visible() {
        let span = status_span(&PositionStatus {
            char: ' ',
            status: CharStatus::Incorrect,
        });
        assert_eq!(span.content, "·");
    }

    fn record(index: usize, level: u32, chars: u64, elapsed_secs: f64) -> SentenceRecord {
        SentenceRecord {
            index,
            level,
            chars,
            mistakes: index as u64,
            missed: String::new(),
            backspaces: 2,
            elapsed_secs,
        }
    }

    #[test]
    fn breakdown_lists_each_sentence() {
        // 50 chars in the first minute, then 100 chars in the next minute
        let log = vec![record(0, 1, 50, 60.0), record(1, 3, 100, 120.0)];

        assert_eq!(
            sentence_rows(&log),
            vec![
                ["1", "1", "10", "0", "2"].map(String::from),
                ["2", "3", "20", "1", "2"].map(String::from),
            ]
        );
    }

    #[test]
    fn breakdown_keeps_latest_sentences() {
        let log: Vec<_> = (0..15)
            .map(|i| record(i, 1, 50, 60.0 * (i as f64 + 1.0)))
            .collect();
        let rows = sentence_rows(&log);

        assert_eq!(rows.len(), MAX_BREAKDOWN_ROWS);
        assert_eq!(rows[0][0], "6");
        assert_eq!(rows[9][0], "15");
    }

    #[test]
    fn centered_fits_narrow_areas() {
        let area = Rect::new(2, 0, 10, 3);
        assert_eq!(centered(area, 37), area);
        assert_eq!(centered(Rect::new(0, 0, 41, 3), 37).x, 2);
    }

    #[test]
    fn cursor_is_underlined() {
        let span = status_span(&PositionStatus {
            char: 'a',
            status: CharStatus::Cursor,
        });
        assert!(span.style.add_modifier.contains(Modifier::UNDERLINED));
    }
}
