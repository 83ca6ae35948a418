use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

fn key_line(keys: &'static str, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{keys:<10}"), Style::default().fg(Color::Magenta)),
        Span::raw("  "),
        Span::raw(action),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        key_line("q / Ctrl-C", "Quit"),
        key_line("tab", "Switch tabs"),
        key_line("?", "Show this help"),
        Line::from(""),
        Line::from("Results tab:"),
        key_line("←/→ h/l", "Previous / next page"),
        key_line("1-5", "Jump to page button"),
        key_line("s", "Sort by stress level"),
        key_line("[ / ]", "Move header cursor"),
        key_line("enter", "Activate header"),
        key_line("r", "Reload results page"),
        Line::from(""),
        Line::from("Upload tab:"),
        key_line("o", "Choose CSV file"),
        key_line("x", "Clear selected file"),
        key_line("u / enter", "Upload"),
        Line::from(""),
        Line::from("Predict tab:"),
        key_line("↑/↓ j/k", "Select field"),
        key_line("e / enter", "Edit field"),
        key_line("p", "Predict"),
        Line::from(""),
        Line::from("While editing: enter commits, esc cancels."),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}
