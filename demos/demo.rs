use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::{DefaultTerminal, Frame};

use tui_nodeview::{
    DragSession, NodeRef, PendingDrop, SampleTreeConfig, TreeAction, TreeArena, TreeEvent,
    TreeListState, TreeListView, TreeListViewStyle, drag_payload, populate_sample_tree,
};

/// Keys outside the built-in bindings: a keyboard stand-in for a drag
/// gesture ('y' picks the selected root up, 'p' drops it at the selected
/// row) and an external text drop ('i').
enum DemoAction {
    Grab,
    DropHere,
    InsertExternal,
}

fn demo_key(key: KeyEvent) -> Option<DemoAction> {
    match key.code {
        KeyCode::Char('y') => Some(DemoAction::Grab),
        KeyCode::Char('p') => Some(DemoAction::DropHere),
        KeyCode::Char('i') => Some(DemoAction::InsertExternal),
        _ => None,
    }
}

fn generate(arena: &mut TreeArena, rng: &mut StdRng) {
    arena.clear();
    let _ = populate_sample_tree(arena, 0, rng, &SampleTreeConfig::default());
}

fn render(frame: &mut Frame, arena: &TreeArena, state: &mut TreeListState, grabbed: Option<&str>) {
    let mut style = TreeListViewStyle::default();
    style.highlight_style = Style::default()
        .bg(Color::Rgb(52, 66, 96))
        .add_modifier(Modifier::BOLD);
    style.line_style = Style::default().fg(Color::Rgb(86, 98, 120));
    let rows = state.visible_row_count(0).unwrap_or(0);
    let title = grabbed.map_or_else(
        || format!(" {rows} rows | enter toggle, y/p move, i insert, r reset, q quit "),
        |ident| format!(" {rows} rows | dragging {ident}, p drops it "),
    );
    style.title = Some(Line::from(title));

    let widget = TreeListView::new(arena, style);
    frame.render_stateful_widget(widget, frame.area(), state);
}

fn run(mut terminal: DefaultTerminal) -> io::Result<()> {
    let mut rng = StdRng::from_entropy();
    let mut arena = TreeArena::new();
    generate(&mut arena, &mut rng);

    let mut state = TreeListState::with_capacity(arena.len());
    state.reset(&arena);
    state.select_row(Some(0));

    // The grabbed root and its exported payload.
    let mut grabbed: Option<(NodeRef, String)> = None;
    let mut drop_serial = 0u32;

    loop {
        let label = grabbed.as_ref().map(|(_, ident)| ident.as_str());
        terminal.draw(|frame| render(frame, &arena, &mut state, label))?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
            break;
        }

        match state.handle_key_with(&arena, key, demo_key) {
            TreeEvent::Action(TreeAction::Reset) => {
                generate(&mut arena, &mut rng);
                grabbed = None;
                state.reset(&arena);
                state.select_row(Some(0));
            }
            TreeEvent::Action(TreeAction::Custom(DemoAction::Grab)) => {
                // Only root rows can be reordered.
                grabbed = state
                    .selected_row()
                    .and_then(|row| {
                        let info = state.row(&arena, 0, row).ok()?;
                        info.parent.is_none().then_some(row)
                    })
                    .and_then(|row| {
                        let payload = drag_payload(&arena, &state, 0, row).ok()?;
                        let node = state.selected_ref(&arena)?;
                        Some((node, payload))
                    });
            }
            TreeEvent::Action(TreeAction::Custom(DemoAction::DropHere)) => {
                if let Some((source, payload)) = grabbed.take() {
                    let session = DragSession::local(source, 1);
                    let dest = state.selected_row().map(|row| (0, row));
                    if let Ok(pending) = PendingDrop::begin(&arena, &state, &session, dest) {
                        let _ = pending.complete(&mut arena, &mut state, &[payload]);
                    }
                }
            }
            TreeEvent::Action(TreeAction::Custom(DemoAction::InsertExternal)) => {
                drop_serial += 1;
                let session = DragSession::external(1);
                let dest = state.selected_row().map(|row| (0, row));
                if let Ok(pending) = PendingDrop::begin(&arena, &state, &session, dest) {
                    let payload = format!("dropped-{drop_serial}");
                    let _ = pending.complete(&mut arena, &mut state, &[payload]);
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn main() -> io::Result<()> {
    let terminal = ratatui::init();
    let result = run(terminal);
    ratatui::restore();
    result
}
