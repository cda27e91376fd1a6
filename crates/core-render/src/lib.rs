//! Markup rendering of a text replica.
//!
//! Produces a single string from the document, the property table and the
//! cursor table by walking char indices 0..=len. At each index, in order:
//! cursor markers, property tag closes, property tag opens, then the escaped
//! character.
//!
//! Emission invariants:
//! * Tags never overlap in the output. Open tags form a LIFO stack; a close
//!   that would cross a still-open inner tag closes the inner tags first and
//!   reopens them immediately after.
//! * Tag opens at one index are ordered by descending range end, then
//!   property name, then flag, so every replica renders byte-identical
//!   markup for equal state.
//! * Only `<` and `>` in content (and usernames) are escaped. Property flags
//!   are emitted verbatim as tag attributes; they are trusted inputs in this
//!   design.

use core_text::{CursorTable, Document, PropertyTable};

pub mod metrics;

pub use metrics::{RenderMetrics, RenderMetricsSnapshot};

/// Stateless renderer owning only its emission counters.
#[derive(Debug, Default)]
pub struct MarkupRenderer {
    pub metrics: RenderMetrics,
}

struct OpenTag<'a> {
    property: &'a str,
    flag: Option<&'a str>,
    end: usize,
}

fn push_escaped(out: &mut String, ch: char) -> bool {
    match ch {
        '<' => {
            out.push_str("&lt;");
            true
        }
        '>' => {
            out.push_str("&gt;");
            true
        }
        _ => {
            out.push(ch);
            false
        }
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        push_escaped(&mut out, ch);
    }
    out
}

fn push_open(out: &mut String, property: &str, flag: Option<&str>) {
    match flag {
        Some(flag) => {
            out.push('<');
            out.push_str(property);
            out.push(' ');
            out.push_str(flag);
            out.push('>');
        }
        None => {
            out.push('<');
            out.push_str(property);
            out.push('>');
        }
    }
}

impl MarkupRenderer {
    pub fn render(&self, doc: &Document, props: &PropertyTable, cursors: &CursorTable) -> String {
        let len = doc.len();

        let mut opens = props.ranges();
        opens.sort_by(|a, b| {
            a.2.start
                .cmp(&b.2.start)
                .then(b.2.end.cmp(&a.2.end))
                .then(a.0.cmp(b.0))
                .then(a.1.cmp(&b.1))
        });
        let mut next_open = 0usize;

        let mut markers: Vec<(usize, u64, &core_text::Cursor)> =
            cursors.iter().map(|(id, c)| (c.position, id, c)).collect();
        markers.sort_by_key(|(pos, id, _)| (*pos, *id));
        let mut next_marker = 0usize;

        let mut chars = doc.chars();
        let mut stack: Vec<OpenTag<'_>> = Vec::new();
        let mut out = String::with_capacity(len * 2);

        let mut tags_opened = 0u64;
        let mut tags_closed = 0u64;
        let mut cursor_markers = 0u64;
        let mut chars_escaped = 0u64;

        for i in 0..=len {
            while next_marker < markers.len() && markers[next_marker].0 == i {
                let (_, _, cursor) = markers[next_marker];
                out.push_str("<cursor name=\"");
                out.push_str(&escape(&cursor.username));
                out.push_str("\" colour=\"");
                out.push_str(&cursor.colour);
                out.push_str("\"/>");
                cursor_markers += 1;
                next_marker += 1;
            }

            while stack.iter().any(|t| t.end == i) {
                let mut reopen = Vec::new();
                while let Some(tag) = stack.pop() {
                    out.push_str("</");
                    out.push_str(tag.property);
                    out.push('>');
                    tags_closed += 1;
                    if tag.end == i {
                        break;
                    }
                    reopen.push(tag);
                }
                for tag in reopen.into_iter().rev() {
                    push_open(&mut out, tag.property, tag.flag);
                    tags_opened += 1;
                    stack.push(tag);
                }
            }

            while next_open < opens.len() && opens[next_open].2.start == i {
                let (property, flag, span) = opens[next_open];
                push_open(&mut out, property, flag);
                tags_opened += 1;
                stack.push(OpenTag {
                    property,
                    flag,
                    end: span.end,
                });
                next_open += 1;
            }

            if i < len {
                if let Some(ch) = chars.next() {
                    if push_escaped(&mut out, ch) {
                        chars_escaped += 1;
                    }
                }
            }
        }

        debug_assert!(stack.is_empty(), "unclosed tags after render walk");

        RenderMetrics::bump(&self.metrics.renders, 1);
        RenderMetrics::bump(&self.metrics.tags_opened, tags_opened);
        RenderMetrics::bump(&self.metrics.tags_closed, tags_closed);
        RenderMetrics::bump(&self.metrics.cursor_markers, cursor_markers);
        RenderMetrics::bump(&self.metrics.chars_escaped, chars_escaped);
        tracing::trace!(
            target: "render.markup",
            len,
            tags_opened,
            cursor_markers,
            "render"
        );
        out
    }
}
