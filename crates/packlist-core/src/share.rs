use std::fmt::Write;

use crate::item::PackListState;

/// Plain-text copy of the list for pasting elsewhere.
pub fn render_text(state: &PackListState) -> String {
    let (done, total) = state.progress();
    let mut out = String::new();
    let _ = writeln!(out, "{}", state.list_title);
    let _ = writeln!(out, "{done}/{total}");
    for item in state.sorted_items() {
        let mark = if item.done { "[x]" } else { "[ ]" };
        let _ = writeln!(out, "{mark} {} {}", item.icon, item.label);
    }
    out
}
