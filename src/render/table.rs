use std::fmt::{self, Write};

/// A console grid with an `(index)` column, box drawn like `console.table`.
#[derive(Debug, Clone, Default)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row. Missing cells render empty, extra cells are dropped.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells.into_iter().map(Into::into).collect();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        let index_width = self
            .rows
            .len()
            .saturating_sub(1)
            .to_string()
            .len()
            .max("(index)".len());

        let mut widths = vec![index_width];
        for (i, header) in self.headers.iter().enumerate() {
            let cell_max = self
                .rows
                .iter()
                .map(|row| row[i].chars().count())
                .max()
                .unwrap_or(0);
            widths.push(cell_max.max(header.chars().count()));
        }
        widths
    }

    pub fn render(&self, out: &mut impl Write) -> fmt::Result {
        let widths = self.widths();

        border(out, &widths, '┌', '┬', '┐')?;
        let header_cells = std::iter::once("(index)").chain(self.headers.iter().map(String::as_str));
        line(out, &widths, header_cells)?;
        border(out, &widths, '├', '┼', '┤')?;
        for (index, row) in self.rows.iter().enumerate() {
            let index = index.to_string();
            let cells = std::iter::once(index.as_str()).chain(row.iter().map(String::as_str));
            line(out, &widths, cells)?;
        }
        border(out, &widths, '└', '┴', '┘')
    }
}

impl fmt::Display for TextTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f)
    }
}

fn border(out: &mut impl Write, widths: &[usize], left: char, mid: char, right: char) -> fmt::Result {
    out.write_char(left)?;
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            out.write_char(mid)?;
        }
        for _ in 0..width + 2 {
            out.write_char('─')?;
        }
    }
    out.write_char(right)?;
    out.write_char('\n')
}

fn line<'a>(
    out: &mut impl Write,
    widths: &[usize],
    cells: impl Iterator<Item = &'a str>,
) -> fmt::Result {
    out.write_char('│')?;
    for (cell, width) in cells.zip(widths) {
        let pad = width - cell.chars().count();
        write!(out, " {}{} │", cell, " ".repeat(pad))?;
    }
    out.write_char('\n')
}
