use ratatui::text::{Line, Span};

use crate::context::TreeRowContext;

/// Glyph set used to draw indentation, guide lines, and the disclosure
/// indicator. The indicator has exactly two states: `expanded` and
/// `collapsed`; non-expandable rows get the `leaf` glyph instead.
#[derive(Clone, Copy)]
pub struct TreeGlyphs<'a> {
    pub indent: &'a str,
    pub branch_last: &'a str,
    pub branch: &'a str,
    pub vert: &'a str,
    pub empty: &'a str,
    pub leaf: &'a str,
    pub expanded: &'a str,
    pub collapsed: &'a str,
}

impl TreeGlyphs<'static> {
    pub const fn unicode() -> Self {
        Self {
            indent: "   ",
            branch_last: "└──",
            branch: "├──",
            vert: "│  ",
            empty: "   ",
            leaf: "•",
            expanded: "▼",
            collapsed: "▶",
        }
    }

    pub const fn ascii() -> Self {
        Self {
            indent: "   ",
            branch_last: "`--",
            branch: "|--",
            vert: "|  ",
            empty: "   ",
            leaf: "*",
            expanded: "v",
            collapsed: ">",
        }
    }
}

const fn disclosure<'a>(ctx: &TreeRowContext<'_>, glyphs: &TreeGlyphs<'a>) -> &'a str {
    if ctx.expandable {
        if ctx.is_expanded {
            glyphs.expanded
        } else {
            glyphs.collapsed
        }
    } else if ctx.depth == 0 {
        ""
    } else {
        glyphs.leaf
    }
}

/// Builds the display line for one row: guide lines (or plain indentation),
/// the disclosure indicator, and the identifier label.
pub fn tree_row_line<'a>(
    ctx: &TreeRowContext<'_>,
    ident: &'a str,
    glyphs: &TreeGlyphs<'a>,
) -> Line<'a> {
    if ctx.depth == 0 || !ctx.draw_lines {
        let expander = disclosure(ctx, glyphs);
        let mut spans = Vec::with_capacity(ctx.depth as usize + 3);
        for _ in 0..ctx.depth {
            spans.push(Span::raw(glyphs.empty));
        }
        if !expander.is_empty() {
            spans.push(Span::raw(expander));
        }
        spans.push(Span::raw(" "));
        spans.push(Span::raw(ident));
        return Line::from(spans);
    }

    let mut spans = Vec::with_capacity(ctx.is_tail_stack.len() + 3);
    for (level, is_last) in ctx.is_tail_stack.iter().enumerate() {
        let part = if level == (ctx.depth as usize) - 1 {
            if *is_last {
                glyphs.branch_last
            } else {
                glyphs.branch
            }
        } else if *is_last {
            glyphs.indent
        } else {
            glyphs.vert
        };
        spans.push(Span::styled(part, ctx.line_style));
    }

    let expander = disclosure(ctx, glyphs);
    if !expander.is_empty() {
        spans.push(Span::raw(expander));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::raw(ident));
    Line::from(spans)
}
