//! Text tables shared by every report, laid out by comfy-table.
//!
//! Tables have no outer border: columns are separated by `│` and the header
//! is underlined with `=`.

use comfy_table::{presets, Attribute, Cell, CellAlignment, Color, Table, TableComponent};
use std::fmt;

use crate::decoration::Style;

/// An empty table, styled or plain.
pub(crate) fn new_table(styled: bool) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_style(TableComponent::VerticalLines, '│')
        .set_style(TableComponent::HeaderLines, '=')
        .set_style(TableComponent::MiddleHeaderIntersections, '=');
    if styled {
        table.enforce_styling();
    } else {
        table.force_no_tty();
    }
    table
}

/// A cell painted with `style` when `styled` is set.
pub(crate) fn cell(content: impl fmt::Display, style: Style, styled: bool) -> Cell {
    let cell = Cell::new(content);
    if !styled {
        return cell;
    }
    match style {
        Style::Plain => cell,
        Style::Bold => cell.add_attribute(Attribute::Bold),
        Style::Red => cell.fg(Color::Red),
        Style::Green => cell.fg(Color::Green),
        Style::Yellow => cell.fg(Color::Yellow),
        Style::Blue => cell.fg(Color::Blue),
        Style::Magenta => cell.fg(Color::Magenta),
        Style::Cyan => cell.fg(Color::Cyan),
        Style::Gray => cell.fg(Color::DarkGrey),
    }
}

/// Like [`cell`], aligned.
pub(crate) fn aligned(content: impl fmt::Display, style: Style, styled: bool, align: CellAlignment) -> Cell {
    cell(content, style, styled).set_alignment(align)
}

/// Render `table` with the first column flush left and no trailing blanks.
pub(crate) fn render(table: &mut Table) -> String {
    if let Some(first) = table.column_mut(0) {
        first.set_padding((0, 1));
    }
    let mut out = String::new();
    for line in table.lines() {
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_pad_columns_to_widest_cell() {
        let mut t = new_table(false);
        t.set_header(vec![cell("Name", Style::Bold, false), cell("N", Style::Bold, false)]);
        t.add_row(vec![cell("a", Style::Plain, false), cell("100", Style::Plain, false)]);

        let out = render(&mut t);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "Name │ N");
        assert_eq!(lines[2], "a    │ 100");
    }

    #[test]
    fn should_underline_header_across_full_width() {
        let mut t = new_table(false);
        t.set_header(vec![cell("ab", Style::Bold, false), cell("cd", Style::Bold, false)]);
        t.add_row(vec![cell("1", Style::Plain, false)]);

        let out = render(&mut t);
        let divider = out.lines().nth(1).unwrap();
        assert!(!divider.is_empty());
        assert!(divider.chars().all(|c| c == '='));
        assert_eq!(out.lines().count(), 3);
    }

    #[test]
    fn should_split_multiline_cells_into_lines() {
        let mut t = new_table(false);
        t.add_row(vec![
            cell("x", Style::Plain, false),
            aligned("1\nslow", Style::Plain, false, CellAlignment::Right),
        ]);
        let out = render(&mut t);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines, vec!["x │    1", "  │ slow"]);
    }

    #[test]
    fn should_not_emit_escape_codes_when_plain() {
        let mut t = new_table(false);
        t.add_row(vec![cell("red", Style::Red, false), cell("bold", Style::Bold, false)]);
        assert!(!render(&mut t).contains('\u{1b}'));
    }
}
