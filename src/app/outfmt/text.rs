use std::io::Write;

use tabled::settings::{
    object::{Cell, Columns, Rows},
    style::On,
    Alignment, Border,
};
use tabled::Table;

use crate::{portfolio::render::RenderTable, util::rw::WriteHandle};

use super::model::{AcbWriter, Error, OutputType};

pub struct TextWriter {
    w: WriteHandle,
}

impl TextWriter {
    pub fn new(w: WriteHandle) -> TextWriter {
        TextWriter { w }
    }
}

struct CellBorder {
    top: char,
    bottom: char,
    left: char,
    right: char,
    top_left: char,
    top_right: char,
    bottom_left: char,
    bottom_right: char,
}

impl CellBorder {
    pub fn to_border(&self) -> Border<On, On, On, On> {
        Border::full(
            self.top,
            self.bottom,
            self.left,
            self.right,
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        )
    }

    pub fn none() -> CellBorder {
        Self {
            top: ' ',
            bottom: ' ',
            left: ' ',
            right: ' ',
            top_left: ' ',
            top_right: ' ',
            bottom_left: ' ',
            bottom_right: ' ',
        }
    }
}

impl Default for CellBorder {
    fn default() -> Self {
        Self {
            top: '-',
            bottom: '-',
            left: '|',
            right: '|',
            top_left: '+',
            top_right: '+',
            bottom_left: '+',
            bottom_right: '+',
        }
    }
}

fn build_table(table_model: &RenderTable) -> (Table, Option<usize>) {
    let mut table_bldr = tabled::builder::Builder::default();
    table_bldr.push_record(
        table_model
            .header
            .iter()
            .map(|h| h.to_uppercase())
            .collect::<Vec<String>>(),
    );
    for row in &table_model.rows {
        table_bldr.push_record(row);
    }

    // The footer acts as a smaller table under the main table,
    // separated by a single blank row.
    let footer_sep_row = if !table_model.footer.is_empty() {
        table_bldr.push_record(vec![String::new(); table_model.footer.len()]);
        table_bldr.push_record(table_model.footer.clone());
        Some(1 + table_model.rows.len())
    } else {
        None
    };

    (table_bldr.build(), footer_sep_row)
}

// Open outer edges on the header and the side columns.
fn apply_outer_borders(table: &mut Table, n_cols: usize) {
    table.with(tabled::settings::Style::ascii());
    table.modify(Rows::first(), Alignment::center());

    table.modify(
        Rows::first(),
        CellBorder { top: ' ', top_left: ' ', top_right: ' ', ..Default::default() }
            .to_border(),
    );
    table.modify(
        Columns::first(),
        CellBorder { left: ' ', top_left: '-', bottom_left: '-', ..Default::default() }
            .to_border(),
    );
    table.modify(
        Columns::last(),
        CellBorder { right: ' ', top_right: '-', bottom_right: '-', ..Default::default() }
            .to_border(),
    );
    table.modify(
        Cell::new(0, 0),
        CellBorder {
            left: ' ',
            top: ' ',
            top_right: ' ',
            top_left: ' ',
            bottom_left: '-',
            ..Default::default()
        }
        .to_border(),
    );
    table.modify(
        Cell::new(0, n_cols - 1),
        CellBorder {
            right: ' ',
            top: ' ',
            top_right: ' ',
            top_left: ' ',
            bottom_right: '-',
            ..Default::default()
        }
        .to_border(),
    );
}

fn apply_footer_borders(table: &mut Table, sep_row: usize, footer: &[String]) {
    let footer_row = sep_row + 1;
    // Make the separator row and footer invisible, without knocking out the
    // bottom border of the main table.
    table.modify(Rows::single(sep_row), Border::new().set_left(' ').set_right(' '));
    table.modify(Rows::single(footer_row), CellBorder::none().to_border());

    // Non-empty footer cells get a full border, connected up through the
    // separator row.
    for (col, footer_cell) in footer.iter().enumerate() {
        if !footer_cell.is_empty() {
            table.modify(Cell::new(sep_row, col), CellBorder::default().to_border());
            table.modify(Cell::new(footer_row, col), CellBorder::default().to_border());
        }
    }
}

impl AcbWriter for TextWriter {
    fn print_render_table(
        &mut self,
        out_type: OutputType,
        name: &str,
        table_model: &RenderTable,
    ) -> Result<(), Error> {
        let map_write_err = |e| format!("{e}");

        for err in &table_model.errors {
            writeln!(self.w, "[!] {}", err).map_err(map_write_err)?;
        }

        let title = match out_type {
            OutputType::Gains => format!("Capital Gains for {}", name),
            OutputType::YearlyGains => "Yearly Capital Gains".to_string(),
        };
        writeln!(self.w, "{}", title).map_err(map_write_err)?;

        if table_model.rows.is_empty() {
            writeln!(self.w, "No sales\n").map_err(map_write_err)?;
            return Ok(());
        }

        let n_cols = table_model.header.len();
        let (mut table, footer_sep_row) = build_table(table_model);
        apply_outer_borders(&mut table, n_cols);
        if let Some(sep_row) = footer_sep_row {
            apply_footer_borders(&mut table, sep_row, &table_model.footer);
        }

        writeln!(self.w, "{table}").map_err(map_write_err)?;

        for note in &table_model.notes {
            writeln!(self.w, "{note}").map_err(map_write_err)?;
        }

        writeln!(self.w).map_err(map_write_err)?;
        Ok(())
    }
}
