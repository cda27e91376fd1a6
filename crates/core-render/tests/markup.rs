use core_render::MarkupRenderer;
use core_text::{CursorTable, Document, PropertyTable};

fn render(content: &str, props: &PropertyTable, cursors: &CursorTable) -> String {
    MarkupRenderer::default().render(&Document::from_str(content), props, cursors)
}

#[test]
fn plain_text_passes_through_with_angle_brackets_escaped() {
    let out = render("a<b>c", &PropertyTable::default(), &CursorTable::default());
    assert_eq!(out, "a&lt;b&gt;c");
}

#[test]
fn flagless_property_wraps_its_range() {
    let mut props = PropertyTable::default();
    assert!(props.add(1, 3, "bold", None));
    let out = render("abcd", &props, &CursorTable::default());
    assert_eq!(out, "a<bold>bc</bold>d");
}

#[test]
fn flag_is_emitted_verbatim_as_attribute() {
    let mut props = PropertyTable::default();
    assert!(props.add(0, 2, "align", Some("align=left")));
    let out = render("ab", &props, &CursorTable::default());
    assert_eq!(out, "<align align=left>ab</align>");
}

#[test]
fn cursor_markers_appear_at_their_gap() {
    let mut cursors = CursorTable::default();
    cursors.insert_local(1);
    cursors.set(2, 2, "alice");
    let out = render("ab", &PropertyTable::default(), &cursors);
    assert_eq!(
        out,
        "<cursor name=\"Me\" colour=\"black\"/>ab<cursor name=\"alice\" colour=\"red\"/>"
    );
}

#[test]
fn cursor_username_is_escaped() {
    let mut cursors = CursorTable::default();
    cursors.set(2, 0, "<evil>");
    let out = render("", &PropertyTable::default(), &cursors);
    assert_eq!(out, "<cursor name=\"&lt;evil&gt;\" colour=\"red\"/>");
}

#[test]
fn crossing_ranges_close_and_reopen_inner_tags() {
    let mut props = PropertyTable::default();
    assert!(props.add(0, 3, "bold", None));
    assert!(props.add(2, 5, "italic", None));
    let out = render("abcde", &props, &CursorTable::default());
    assert_eq!(out, "<bold>ab<italic>c</italic></bold><italic>de</italic>");
}

#[test]
fn same_start_opens_longer_range_first() {
    let mut props = PropertyTable::default();
    assert!(props.add(0, 2, "italic", None));
    assert!(props.add(0, 4, "bold", None));
    let out = render("abcd", &props, &CursorTable::default());
    assert_eq!(out, "<bold><italic>ab</italic>cd</bold>");
}

#[test]
fn adjacent_ranges_close_before_opening() {
    let mut props = PropertyTable::default();
    assert!(props.add(0, 2, "bold", None));
    assert!(props.add(2, 4, "italic", None));
    let out = render("abcd", &props, &CursorTable::default());
    assert_eq!(out, "<bold>ab</bold><italic>cd</italic>");
}

#[test]
fn render_is_deterministic_for_equal_state() {
    let mut props = PropertyTable::default();
    assert!(props.add(0, 3, "bold", None));
    assert!(props.add(1, 4, "em", None));
    let mut cursors = CursorTable::default();
    cursors.set(3, 2, "alice");
    let a = render("abcd", &props, &cursors);
    let b = render("abcd", &props, &cursors);
    assert_eq!(a, b);
}

#[test]
fn metrics_count_emissions() {
    let renderer = MarkupRenderer::default();
    let mut props = PropertyTable::default();
    assert!(props.add(0, 2, "bold", None));
    let mut cursors = CursorTable::default();
    cursors.insert_local(1);
    renderer.render(&Document::from_str("a<"), &props, &cursors);
    let snap = renderer.metrics.snapshot();
    assert_eq!(snap.renders, 1);
    assert_eq!(snap.tags_opened, 1);
    assert_eq!(snap.tags_closed, 1);
    assert_eq!(snap.cursor_markers, 1);
    assert_eq!(snap.chars_escaped, 1);
}
