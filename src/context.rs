use ratatui::style::Style;

/// Per-row rendering context handed to the line builder.
#[derive(Clone, Copy)]
pub struct TreeRowContext<'a> {
    pub depth: u16,
    pub is_tail_stack: &'a [bool],
    pub is_expanded: bool,
    pub expandable: bool,
    pub draw_lines: bool,
    pub line_style: Style,
}
