use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

fn key_line(keys: &[&'static str], desc: &'static str) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    let mut width = 0;
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" / "));
            width += 3;
        }
        spans.push(Span::styled(*key, Style::default().fg(Color::Magenta)));
        width += key.chars().count();
    }
    spans.push(Span::raw(" ".repeat(14usize.saturating_sub(width).max(1))));
    spans.push(Span::raw(desc));
    Line::from(spans)
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        key_line(&["q", "Ctrl-C"], "Quit"),
        key_line(&["tab", "shift-tab"], "Next / previous page"),
        key_line(&["1-6"], "Jump to page"),
        key_line(&["y"], "Copy the current artifact path"),
        key_line(&["?"], "Show this help"),
        Line::from(""),
        Line::from("Text fields:"),
        key_line(&["i", "v", "s"], "Edit image prompt / video prompt / subtitle"),
        key_line(&["enter"], "Finish editing"),
        key_line(&["esc"], "Discard the edit"),
        Line::from(""),
        Line::from("Home:"),
        key_line(&["r"], "Refresh recent media"),
        Line::from(""),
        Line::from("Workflow:"),
        key_line(&["d"], "Toggle clip length (5s / 10s)"),
        key_line(&["enter"], "Start image → video → subtitle run"),
        key_line(&["x"], "Reset the finished run"),
        Line::from(""),
        Line::from("Image:"),
        key_line(&["a"], "Cycle aspect ratio"),
        key_line(&["enter"], "Generate"),
        key_line(&["u"], "Use the image on the Video page"),
        Line::from(""),
        Line::from("Video:"),
        key_line(&["d"], "Toggle clip length"),
        key_line(&["m"], "Toggle std / pro mode"),
        key_line(&["enter"], "Generate (animates the handed-over image if any)"),
        key_line(&["u"], "Use the video on the Editor page"),
        Line::from(""),
        Line::from("Editor:"),
        key_line(&["enter"], "Add the subtitle to the handed-over video"),
        Line::from(""),
        Line::from(Span::styled(
            "Progress bars are estimates; the server does not report progress.",
            Style::default().fg(Color::Gray),
        )),
    ])
    .wrap(Wrap { trim: false })
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
