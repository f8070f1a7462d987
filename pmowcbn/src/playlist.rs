//! Playlist page parsing
//!
//! The WCBN playlist is an HTML table where each song is one `<tr>` with the
//! cells time, artist, title, album and label. Show information is printed in
//! cells carrying a `rowspan` attribute, so a row can contain cells that
//! belong to a neighbouring row. Those continuation cells are skipped when
//! assigning fields.
//!
//! # Example
//!
//! ```
//! use pmowcbn::playlist::{Cell, PlaylistRowParser};
//!
//! let cells = vec![
//!     Cell::new("12:00 AM"),
//!     Cell::continuation("Freeform with DJ Example"),
//!     Cell::new("Artist"),
//!     Cell::new("Title"),
//!     Cell::new("Album"),
//!     Cell::new("Label"),
//! ];
//! let row = PlaylistRowParser::new().parse_cells(&cells).unwrap();
//! assert_eq!(row.artist, "Artist");
//! assert_eq!(row.label, "Label");
//! ```

use crate::error::{Error, Result};
use crate::models::PlaylistRow;
use scraper::{ElementRef, Html, Selector};

/// Number of logical fields of a playlist row
pub const FIELD_COUNT: usize = 5;

/// Default number of cells scanned per row
pub const DEFAULT_CELL_LIMIT: usize = 50;

/// A table cell as seen by the row parser
pub trait PlaylistCell {
    /// Text content of the cell (untrimmed)
    fn cell_text(&self) -> String;

    /// Whether the cell spans in from another row and must be skipped
    fn is_continuation(&self) -> bool;
}

/// Plain in-memory cell, for sources that are not HTML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub continuation: bool,
}

impl Cell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            continuation: false,
        }
    }

    pub fn continuation(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            continuation: true,
        }
    }
}

impl PlaylistCell for Cell {
    fn cell_text(&self) -> String {
        self.text.clone()
    }

    fn is_continuation(&self) -> bool {
        self.continuation
    }
}

impl PlaylistCell for ElementRef<'_> {
    fn cell_text(&self) -> String {
        // Collapse inner whitespace the way browsers render it
        ElementRef::text(self)
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn is_continuation(&self) -> bool {
        self.value().attr("rowspan").is_some()
    }
}

/// Maps the cells of one row onto a [`PlaylistRow`]
#[derive(Debug, Clone, Copy)]
pub struct PlaylistRowParser {
    cell_limit: usize,
}

impl Default for PlaylistRowParser {
    fn default() -> Self {
        Self {
            cell_limit: DEFAULT_CELL_LIMIT,
        }
    }
}

impl PlaylistRowParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cells scanned per row
    pub fn with_cell_limit(mut self, cell_limit: usize) -> Self {
        self.cell_limit = cell_limit;
        self
    }

    pub fn cell_limit(&self) -> usize {
        self.cell_limit
    }

    /// Parse one row from its cells in document order
    ///
    /// Continuation cells are skipped; every other cell fills the next field
    /// (time, artist, title, album, label) with its trimmed text. Scanning
    /// stops once five fields are filled or `cell_limit` cells were looked at,
    /// in which case the remaining fields stay empty.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedRow`] when the row runs out of cells first.
    pub fn parse_cells<C: PlaylistCell>(&self, cells: &[C]) -> Result<PlaylistRow> {
        let mut fields: [String; FIELD_COUNT] = Default::default();
        let mut assigned = 0;
        let mut index = 0;

        while assigned < FIELD_COUNT && index < self.cell_limit {
            let cell = cells
                .get(index)
                .ok_or(Error::MalformedRow { index, assigned })?;

            if !cell.is_continuation() {
                fields[assigned] = cell.cell_text().trim().to_string();
                assigned += 1;
            }
            index += 1;
        }

        let [time, artist, title, album, label] = fields;
        Ok(PlaylistRow {
            time,
            artist,
            title,
            album,
            label,
        })
    }

    /// Parse a `<tr>` element, using its `td` descendants as cells
    pub fn parse_row(&self, row: ElementRef<'_>) -> Result<PlaylistRow> {
        self.parse_row_with(row, &cell_selector()?)
    }

    fn parse_row_with(&self, row: ElementRef<'_>, cells: &Selector) -> Result<PlaylistRow> {
        let cells: Vec<ElementRef<'_>> = row.select(cells).collect();
        self.parse_cells(&cells)
    }

    /// Parse every data row of a playlist page
    ///
    /// Rows without `td` cells (headers, spacers) are ignored. A malformed
    /// row produces an `Err` entry and parsing goes on with the next row.
    pub fn parse_playlist_page(&self, html: &str) -> Vec<Result<PlaylistRow>> {
        let document = Html::parse_document(html);

        let (row_selector, cell_selector) = match (row_selector(), cell_selector()) {
            (Ok(row), Ok(cell)) => (row, cell),
            (Err(e), _) | (_, Err(e)) => return vec![Err(e)],
        };

        document
            .select(&row_selector)
            .filter(|row| row.select(&cell_selector).next().is_some())
            .map(|row| self.parse_row_with(row, &cell_selector))
            .collect()
    }
}

fn row_selector() -> Result<Selector> {
    Selector::parse("tr").map_err(|e| Error::scraping_error(format!("Invalid selector: {}", e)))
}

fn cell_selector() -> Result<Selector> {
    Selector::parse("td").map_err(|e| Error::scraping_error(format!("Invalid selector: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(texts: &[&str]) -> Vec<Cell> {
        texts.iter().map(|t| Cell::new(*t)).collect()
    }

    #[test]
    fn test_five_plain_cells() {
        let row = PlaylistRowParser::new()
            .parse_cells(&cells(&["12:00 AM", "Artist", "Title", "Album", "Label"]))
            .unwrap();

        assert_eq!(
            row,
            PlaylistRow {
                time: "12:00 AM".into(),
                artist: "Artist".into(),
                title: "Title".into(),
                album: "Album".into(),
                label: "Label".into(),
            }
        );
    }

    #[test]
    fn test_text_is_trimmed() {
        let row = PlaylistRowParser::new()
            .parse_cells(&cells(&["  1:05 PM ", "\tArtist\n", "Title ", " Album", "Label"]))
            .unwrap();
        assert_eq!(row.time, "1:05 PM");
        assert_eq!(row.artist, "Artist");
        assert_eq!(row.title, "Title");
        assert_eq!(row.album, "Album");
    }

    #[test]
    fn test_continuation_in_third_position() {
        let row = PlaylistRowParser::new()
            .parse_cells(&[
                Cell::new("12:00 AM"),
                Cell::new("Artist"),
                Cell::continuation("DJ Show"),
                Cell::new("Title"),
                Cell::new("Album"),
                Cell::new("Label"),
            ])
            .unwrap();

        assert_eq!(row.time, "12:00 AM");
        assert_eq!(row.artist, "Artist");
        assert_eq!(row.title, "Title");
        assert_eq!(row.album, "Album");
        assert_eq!(row.label, "Label");
    }

    #[test]
    fn test_several_continuations_are_all_skipped() {
        let row = PlaylistRowParser::new()
            .parse_cells(&[
                Cell::continuation("Show"),
                Cell::new("12:00 AM"),
                Cell::continuation("Host"),
                Cell::new("Artist"),
                Cell::new("Title"),
                Cell::new("Album"),
                Cell::continuation("Notes"),
                Cell::new("Label"),
            ])
            .unwrap();
        assert_eq!(row.time, "12:00 AM");
        assert_eq!(row.label, "Label");
    }

    #[test]
    fn test_extra_cells_are_ignored() {
        let row = PlaylistRowParser::new()
            .parse_cells(&cells(&["t", "a", "ti", "al", "l", "request", "new"]))
            .unwrap();
        assert_eq!(row.label, "l");
    }

    #[test]
    fn test_cell_limit_leaves_trailing_fields_empty() {
        let row = PlaylistRowParser::new()
            .with_cell_limit(3)
            .parse_cells(&cells(&["t", "a", "ti", "al", "l"]))
            .unwrap();
        assert_eq!(row.time, "t");
        assert_eq!(row.artist, "a");
        assert_eq!(row.title, "ti");
        assert_eq!(row.album, "");
        assert_eq!(row.label, "");
    }

    #[test]
    fn test_cell_limit_counts_continuations() {
        let mut row_cells = vec![Cell::continuation("x"); DEFAULT_CELL_LIMIT];
        row_cells.extend(cells(&["t", "a", "ti", "al", "l"]));

        let row = PlaylistRowParser::new().parse_cells(&row_cells).unwrap();
        assert_eq!(row, PlaylistRow::default());
    }

    #[test]
    fn test_short_row_is_malformed() {
        let err = PlaylistRowParser::new()
            .parse_cells(&[Cell::new("12:00 AM"), Cell::continuation("Show"), Cell::new("Artist")])
            .unwrap_err();

        match err {
            Error::MalformedRow { index, assigned } => {
                assert_eq!(index, 3);
                assert_eq!(assigned, 2);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_row_is_malformed() {
        let result = PlaylistRowParser::new().parse_cells::<Cell>(&[]);
        assert!(matches!(
            result,
            Err(Error::MalformedRow {
                index: 0,
                assigned: 0
            })
        ));
    }

    #[test]
    fn test_html_row_with_rowspan() {
        let html = r#"<table>
            <tr><td rowspan="3">Freeform</td><td>12:00 AM</td><td>Artist</td><td>Title</td><td>Album</td><td>Label</td></tr>
        </table>"#;

        let rows = PlaylistRowParser::new().parse_playlist_page(html);
        assert_eq!(rows.len(), 1);
        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.time, "12:00 AM");
        assert_eq!(row.label, "Label");
    }

    #[test]
    fn test_html_cell_text_collapses_whitespace() {
        let html = "<table><tr><td>12:00\n AM</td><td><a href=\"/a\">The</a>   Band</td>\
                    <td>T</td><td>A</td><td>L</td></tr></table>";
        let rows = PlaylistRowParser::new().parse_playlist_page(html);
        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.time, "12:00 AM");
        assert_eq!(row.artist, "The Band");
    }

    #[test]
    fn test_page_keeps_going_after_malformed_row() {
        let html = r#"<table>
            <tr><th>Time</th><th>Artist</th><th>Song</th><th>Album</th><th>Label</th></tr>
            <tr><td>1:00 AM</td><td>A1</td><td>T1</td><td>Al1</td><td>L1</td></tr>
            <tr><td>1:04 AM</td><td>broken</td></tr>
            <tr><td>1:09 AM</td><td>A3</td><td>T3</td><td>Al3</td><td>L3</td></tr>
        </table>"#;

        let rows = PlaylistRowParser::new().parse_playlist_page(html);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].as_ref().unwrap().artist, "A1");
        assert!(matches!(rows[1], Err(Error::MalformedRow { .. })));
        assert_eq!(rows[2].as_ref().unwrap().artist, "A3");
    }

    #[test]
    fn test_single_row_matches_page_parse() {
        let html = r#"<table>
            <tr><td rowspan="2">Jazz</td><td>2:00 AM</td><td>A1</td><td>T1</td><td>Al1</td><td>L1</td></tr>
            <tr><td>2:05 AM</td><td>A2</td></tr>
        </table>"#;

        let parser = PlaylistRowParser::new().with_cell_limit(10);
        let page = parser.parse_playlist_page(html);

        let document = Html::parse_document(html);
        let rows = Selector::parse("tr").unwrap();
        let single: Vec<Result<PlaylistRow>> = document
            .select(&rows)
            .map(|row| parser.parse_row(row))
            .collect();

        assert_eq!(page.len(), 2);
        assert_eq!(page[0].as_ref().unwrap(), single[0].as_ref().unwrap());
        assert!(matches!(page[1], Err(Error::MalformedRow { index: 2, assigned: 2 })));
        assert!(matches!(single[1], Err(Error::MalformedRow { index: 2, assigned: 2 })));
    }
}
