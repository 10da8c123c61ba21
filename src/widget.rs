use ratatui::layout::Rect;
use ratatui::prelude::Buffer;
use ratatui::widgets::{
    Block, Borders, List, ListItem, Scrollbar, ScrollbarOrientation, ScrollbarState,
    StatefulWidget,
};

use crate::arena::TreeArena;
use crate::context::TreeRowContext;
use crate::glyphs::{TreeGlyphs, tree_row_line};
use crate::state::TreeListState;
use crate::style::TreeListViewStyle;

/// Stateful list widget rendering one section of a [`TreeArena`].
///
/// The widget is a passive view over the state's visible-row projection:
/// expansion, selection, and reordering are driven through
/// [`TreeListState`], the widget only draws the current rows. The rendered
/// section should match the state's focused section, or selection highlights
/// will not line up.
pub struct TreeListView<'a> {
    arena: &'a TreeArena,
    section: usize,
    style: TreeListViewStyle<'a>,
    glyphs: TreeGlyphs<'a>,
}

impl<'a> TreeListView<'a> {
    pub fn new(arena: &'a TreeArena, style: TreeListViewStyle<'a>) -> Self {
        Self {
            arena,
            section: 0,
            style,
            glyphs: TreeGlyphs::unicode(),
        }
    }

    /// Renders the given section instead of section 0.
    #[must_use]
    pub const fn section(mut self, section: usize) -> Self {
        self.section = section;
        self
    }

    #[must_use]
    pub const fn glyphs(mut self, glyphs: TreeGlyphs<'a>) -> Self {
        self.glyphs = glyphs;
        self
    }

    fn build_items(&self, state: &TreeListState) -> Vec<ListItem<'a>> {
        let rows = state.visible_rows(self.section);
        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let ctx = TreeRowContext {
                depth: row.depth,
                is_tail_stack: row.is_tail_stack.as_slice(),
                is_expanded: state.is_expanded(self.arena.make_ref(row.node)),
                expandable: row.expandable,
                draw_lines: state.draw_lines(),
                line_style: self.style.line_style,
            };
            let ident = self.arena.slot(row.node).ident();
            items.push(ListItem::new(tree_row_line(&ctx, ident, &self.glyphs)));
        }
        items
    }

    fn render_scrollbar(
        area: Rect,
        buf: &mut Buffer,
        state: &TreeListState,
        inner_height: usize,
        scroll_rows: usize,
    ) {
        let scroll_len = scroll_rows.saturating_add(1);
        let position = state
            .list_state()
            .offset()
            .min(scroll_len.saturating_sub(1));
        let mut scrollbar_state = ScrollbarState::new(scroll_len)
            .position(position)
            .viewport_content_length(inner_height);
        Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .render(area, buf, &mut scrollbar_state);
    }
}

impl StatefulWidget for TreeListView<'_> {
    type State = TreeListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        state.ensure_projection(self.arena);

        let mut block = Block::default().borders(self.style.borders);
        if let Some(title) = self.style.title.clone() {
            block = block.title(title);
        }
        block = block
            .style(self.style.block_style)
            .border_style(self.style.border_style);

        let inner_height = block.inner(area).height as usize;
        state.ensure_selection_visible_with_policy(inner_height, self.style.scroll_policy);

        let items = self.build_items(state);
        let total_rows = items.len();
        let scroll_rows = total_rows.saturating_sub(inner_height);

        let (list_area, list_block, scrollbar_area) = if scroll_rows > 0 {
            let list_area = Rect {
                width: area.width.saturating_sub(1),
                ..area
            };
            let scrollbar_area = Rect {
                x: area.x + area.width - 1,
                y: area.y,
                width: 1,
                height: area.height,
            };
            let mut list_borders = self.style.borders;
            list_borders.remove(Borders::RIGHT);
            (list_area, block.borders(list_borders), Some(scrollbar_area))
        } else {
            (area, block, None)
        };

        let list = List::new(items)
            .block(list_block)
            .style(self.style.block_style)
            .highlight_style(self.style.highlight_style)
            .highlight_symbol(self.style.highlight_symbol);
        StatefulWidget::render(list, list_area, buf, state.list_state_mut());

        if let Some(scrollbar_area) = scrollbar_area {
            Self::render_scrollbar(scrollbar_area, buf, state, inner_height, scroll_rows);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide_arena(roots: usize) -> TreeArena {
        let mut arena = TreeArena::new();
        for i in 0..roots {
            arena.add_root(0, format!("node-{i}")).unwrap();
        }
        arena
    }

    #[test]
    fn render_smoke_with_scrollbar() {
        let arena = wide_arena(12);
        let mut state = TreeListState::new();
        state.reset(&arena);
        state.select_row(Some(0));

        let widget = TreeListView::new(&arena, TreeListViewStyle::default());
        let area = Rect::new(0, 0, 20, 6);
        let mut buffer = Buffer::empty(area);
        widget.render(area, &mut buffer, &mut state);
    }

    #[test]
    fn render_smoke_with_expanded_branch() {
        let mut arena = wide_arena(3);
        let root = arena.child(0, None, 1).unwrap();
        arena.add_child(root, "inner").unwrap();
        let mut state = TreeListState::new();
        state.reset(&arena);
        state.toggle(&arena, root).unwrap();

        let widget = TreeListView::new(&arena, TreeListViewStyle::default());
        let area = Rect::new(0, 0, 24, 8);
        let mut buffer = Buffer::empty(area);
        widget.render(area, &mut buffer, &mut state);
    }
}
