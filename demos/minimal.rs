use std::io;

use ratatui::crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{DefaultTerminal, Frame};

use tui_nodeview::{TreeAction, TreeArena, TreeListState, TreeListView, TreeListViewStyle};

fn build_arena() -> TreeArena {
    let mut arena = TreeArena::new();
    let docs = arena.add_root(0, "documents").ok();
    arena.add_root(0, "downloads").ok();
    let music = arena.add_root(0, "music").ok();
    if let Some(docs) = docs {
        let _ = arena.add_child(docs, "notes.md");
        let _ = arena.add_child(docs, "report.pdf");
    }
    if let Some(music) = music {
        if let Ok(album) = arena.add_child(music, "album") {
            let _ = arena.add_child(album, "track01.flac");
            let _ = arena.add_child(album, "track02.flac");
        }
    }
    arena
}

fn render(frame: &mut Frame, arena: &TreeArena, state: &mut TreeListState) {
    let widget = TreeListView::new(arena, TreeListViewStyle::default());
    frame.render_stateful_widget(widget, frame.area(), state);
}

fn run(mut terminal: DefaultTerminal) -> io::Result<()> {
    let arena = build_arena();
    let mut state = TreeListState::new();
    state.reset(&arena);
    state.select_row(Some(0));

    loop {
        terminal.draw(|frame| render(frame, &arena, &mut state))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let action: TreeAction = match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Up => TreeAction::SelectPrev,
            KeyCode::Down => TreeAction::SelectNext,
            KeyCode::Left => TreeAction::SelectParent,
            KeyCode::Enter | KeyCode::Char(' ') => TreeAction::ToggleNode,
            _ => continue,
        };
        state.handle_action(&arena, action);
    }
    Ok(())
}

fn main() -> io::Result<()> {
    let terminal = ratatui::init();
    let result = run(terminal);
    ratatui::restore();
    result
}
