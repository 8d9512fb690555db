//! Integration tests: pointer gestures through the editor (wb-editor).
//!
//! Drives `Editor` with raw input events over a laid-out snapshot and checks
//! selection, previews, commits, and the resulting layout across the
//! wb-core / wb-render / wb-editor boundary.

use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::rc::Rc;
use wb_core::{
    Bounds, Element, ElementId, ElementTag, ElementTree, MonospaceBackend, Style, TextShaper,
    Viewport,
};
use wb_editor::{
    CaptureGuard, Editor, GeometryDelta, GestureSink, InputEvent, LayoutSession, Modifiers,
};

const VIEWPORT: Viewport = Viewport {
    width: 800.0,
    height: 600.0,
};

fn id(s: &str) -> ElementId {
    ElementId::intern(s)
}

fn node(name: &str, parent: Option<&str>, decls: &[(&str, &str)]) -> Element {
    let (style, warnings) = Style::from_declarations(decls.iter().copied());
    assert!(warnings.is_empty(), "{name}: {warnings:?}");
    let mut el = Element::new(id(name), ElementTag::Block).with_style(style);
    el.parent_id = parent.map(id);
    el
}

/// body → card (200×100) → label (40 tall); body → footer (300×50) below.
fn editor() -> Editor {
    let tree = ElementTree::from_elements(vec![
        node("cg_body", None, &[]),
        node("cg_card", Some("cg_body"), &[("width", "200px"), ("height", "100px")])
            .with_order(0),
        node("cg_label", Some("cg_card"), &[("height", "40px")]),
        node("cg_footer", Some("cg_body"), &[("width", "300px"), ("height", "50px")])
            .with_order(1),
    ])
    .unwrap();
    let session = LayoutSession::new(
        tree,
        VIEWPORT,
        Box::new(TextShaper::new(MonospaceBackend::default())),
    );
    let mut editor = Editor::new(session);
    assert_eq!(editor.frame(), Ok(true));
    editor
}

fn down(x: f32, y: f32) -> InputEvent {
    InputEvent::PointerDown {
        x,
        y,
        modifiers: Modifiers::NONE,
    }
}

fn mv(x: f32, y: f32) -> InputEvent {
    InputEvent::PointerMove {
        x,
        y,
        modifiers: Modifiers::NONE,
    }
}

fn up(x: f32, y: f32) -> InputEvent {
    InputEvent::PointerUp { x, y }
}

fn bounds(editor: &Editor, name: &str) -> Bounds {
    editor
        .session
        .geometry()
        .bounds(id(name))
        .unwrap_or_else(|| panic!("no box for {name}"))
}

// ─── Click resolution ───────────────────────────────────────────────────

#[test]
fn click_on_nested_element_selects_top_level_container() {
    let mut ed = editor();
    ed.handle(&down(10.0, 10.0));
    ed.handle(&up(10.0, 10.0));
    assert_eq!(ed.selection.selected(), &[id("cg_card")]);
    // No motion, no mutation.
    assert_eq!(ed.frame(), Ok(false));
    assert_eq!(ed.session.pass_count(), 1);
}

#[test]
fn double_click_enters_container() {
    let mut ed = editor();
    ed.handle(&InputEvent::DoubleClick { x: 10.0, y: 10.0 });
    assert_eq!(ed.selection.editing_context(), Some(id("cg_card")));
    assert_eq!(ed.selection.selected(), &[id("cg_label")]);

    ed.handle(&InputEvent::key("Escape"));
    assert_eq!(ed.selection.editing_context(), None);
    assert_eq!(ed.selection.selected(), &[id("cg_card")]);
}

// ─── Move ───────────────────────────────────────────────────────────────

#[test]
fn move_previews_per_frame_and_commits_on_release() {
    let mut ed = editor();
    ed.handle(&down(10.0, 10.0));
    ed.handle(&mv(15.0, 12.0));
    ed.handle(&mv(22.0, 25.0));
    ed.handle(&mv(30.0, 30.0));

    // The preview does not touch the snapshot.
    assert_eq!(ed.frame(), Ok(false));
    assert_eq!(
        ed.preview(),
        Some(&GeometryDelta::Move {
            ids: [id("cg_card")].into_iter().collect(),
            dx: 20.0,
            dy: 20.0,
        })
    );
    assert_eq!(ed.selection_bounds(), Some(Bounds::new(20.0, 20.0, 200.0, 100.0)));
    assert_eq!(bounds(&ed, "cg_card"), Bounds::new(0.0, 0.0, 200.0, 100.0));

    ed.handle(&up(30.0, 30.0));
    assert_eq!(ed.preview(), None);
    assert_eq!(ed.frame(), Ok(true));
    assert_eq!(bounds(&ed, "cg_card"), Bounds::new(20.0, 20.0, 200.0, 100.0));
    // A relative shift leaves the flow position of later siblings alone.
    assert_eq!(bounds(&ed, "cg_footer"), Bounds::new(0.0, 100.0, 300.0, 50.0));
}

#[test]
fn escape_cancels_gesture_without_commit() {
    let mut ed = editor();
    ed.handle(&down(10.0, 10.0));
    ed.handle(&mv(100.0, 100.0));
    ed.frame().unwrap();
    assert!(ed.preview().is_some());

    ed.handle(&InputEvent::key("Escape"));
    assert!(!ed.is_dragging());
    assert_eq!(ed.preview(), None);

    ed.handle(&up(100.0, 100.0));
    assert_eq!(ed.frame(), Ok(false));
    assert_eq!(bounds(&ed, "cg_card"), Bounds::new(0.0, 0.0, 200.0, 100.0));
    // Cancelling the drag keeps the selection.
    assert_eq!(ed.selection.selected(), &[id("cg_card")]);
}

#[test]
fn group_move_is_all_or_nothing() {
    let mut ed = editor();
    ed.on_commit(GeometryDelta::Move {
        ids: [id("cg_card"), id("cg_body")].into_iter().collect(),
        dx: 30.0,
        dy: 30.0,
    });
    // The root cannot move, so the card stays put too.
    assert_eq!(ed.frame(), Ok(false));
    assert_eq!(bounds(&ed, "cg_card"), Bounds::new(0.0, 0.0, 200.0, 100.0));

    ed.on_commit(GeometryDelta::Move {
        ids: [id("cg_card"), id("cg_footer")].into_iter().collect(),
        dx: 30.0,
        dy: 0.0,
    });
    assert_eq!(ed.frame(), Ok(true));
    assert_eq!(bounds(&ed, "cg_card").x, 30.0);
    assert_eq!(bounds(&ed, "cg_footer").x, 30.0);
}

// ─── Resize ─────────────────────────────────────────────────────────────

#[test]
fn resize_handle_drag_commits_new_size() {
    let mut ed = editor();
    ed.handle(&down(10.0, 10.0));
    ed.handle(&up(10.0, 10.0));

    ed.handle(&down(200.0, 100.0));
    ed.handle(&mv(250.0, 130.0));
    ed.frame().unwrap();
    assert_eq!(ed.selection_bounds(), Some(Bounds::new(0.0, 0.0, 250.0, 130.0)));

    ed.handle(&up(250.0, 130.0));
    ed.frame().unwrap();
    assert_eq!(bounds(&ed, "cg_card"), Bounds::new(0.0, 0.0, 250.0, 130.0));
    assert_eq!(bounds(&ed, "cg_footer").y, 130.0);
}

// ─── Lasso ──────────────────────────────────────────────────────────────

#[test]
fn lasso_from_background_selects_overlapped_siblings() {
    let mut ed = editor();
    ed.handle(&down(700.0, 500.0));
    ed.handle(&mv(250.0, 120.0));
    ed.frame().unwrap();
    assert_eq!(ed.lasso_rect(), Some(Bounds::new(250.0, 120.0, 450.0, 380.0)));

    ed.handle(&up(250.0, 120.0));
    assert_eq!(ed.selection.selected(), &[id("cg_footer")]);
    assert_eq!(ed.lasso_rect(), None);

    ed.handle(&down(700.0, 500.0));
    ed.handle(&up(150.0, 40.0));
    assert_eq!(ed.selection.selected(), &[id("cg_card"), id("cg_footer")]);
}

// ─── Listener lifecycle ─────────────────────────────────────────────────

#[test]
fn capture_is_released_exactly_once_per_gesture() {
    let acquired = Rc::new(Cell::new(0));
    let released = Rc::new(Cell::new(0));
    let mut ed = editor();
    {
        let acquired = acquired.clone();
        let released = released.clone();
        ed.set_capture(move || {
            acquired.set(acquired.get() + 1);
            let released = released.clone();
            CaptureGuard::new(move || released.set(released.get() + 1))
        });
    }

    ed.handle(&down(10.0, 10.0));
    ed.handle(&mv(20.0, 20.0));
    ed.handle(&up(20.0, 20.0));
    assert_eq!((acquired.get(), released.get()), (1, 1));

    ed.handle(&down(700.0, 500.0));
    ed.handle(&InputEvent::key("Escape"));
    assert_eq!((acquired.get(), released.get()), (2, 2));

    ed.handle(&down(700.0, 500.0));
    drop(ed);
    assert_eq!((acquired.get(), released.get()), (3, 3));
}
