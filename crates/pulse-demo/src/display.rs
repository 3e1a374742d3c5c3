//! Two-line character display.
//!
//! The robot carries an 8x2 character LCD. Text that runs past the end of
//! a row is dropped, as on the real panel.

use tracing::info;

/// Characters per row.
pub const LCD_COLUMNS: usize = 8;

/// Number of rows.
pub const LCD_ROWS: usize = 2;

/// Minimal character display interface used by the demo routines.
pub trait CharDisplay {
    /// Blank the screen and home the cursor.
    fn clear(&mut self);

    /// Move the cursor. Out-of-range positions are clamped.
    fn goto_xy(&mut self, col: usize, row: usize);

    /// Write text at the cursor.
    fn print(&mut self, text: &str);
}

/// In-memory display contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LcdBuffer {
    cells: [[char; LCD_COLUMNS]; LCD_ROWS],
    col: usize,
    row: usize,
}

impl Default for LcdBuffer {
    fn default() -> Self {
        Self {
            cells: [[' '; LCD_COLUMNS]; LCD_ROWS],
            col: 0,
            row: 0,
        }
    }
}

impl LcdBuffer {
    /// Create a blank display.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Row contents with trailing blanks removed.
    #[must_use]
    pub fn row(&self, row: usize) -> String {
        self.cells
            .get(row)
            .map(|cells| cells.iter().collect::<String>().trim_end().to_string())
            .unwrap_or_default()
    }

    /// Both rows.
    #[must_use]
    pub fn rows(&self) -> [String; LCD_ROWS] {
        [self.row(0), self.row(1)]
    }
}

impl CharDisplay for LcdBuffer {
    fn clear(&mut self) {
        *self = Self::default();
    }

    fn goto_xy(&mut self, col: usize, row: usize) {
        self.col = col.min(LCD_COLUMNS);
        self.row = row.min(LCD_ROWS - 1);
    }

    fn print(&mut self, text: &str) {
        for ch in text.chars() {
            if self.col >= LCD_COLUMNS {
                break;
            }
            self.cells[self.row][self.col] = ch;
            self.col += 1;
        }
    }
}

/// Display that renders into an [`LcdBuffer`] and logs every new frame.
#[derive(Debug, Default)]
pub struct TracingDisplay {
    buffer: LcdBuffer,
    last_logged: [String; LCD_ROWS],
    frames: u64,
}

impl TracingDisplay {
    /// Create a blank display.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents.
    #[must_use]
    pub fn buffer(&self) -> &LcdBuffer {
        &self.buffer
    }

    /// Number of distinct frames logged so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn log_if_changed(&mut self) {
        let rows = self.buffer.rows();
        if rows != self.last_logged {
            self.frames += 1;
            info!(target: "lcd", top = %rows[0], bottom = %rows[1], "LCD");
            self.last_logged = rows;
        }
    }
}

impl CharDisplay for TracingDisplay {
    fn clear(&mut self) {
        self.buffer.clear();
    }

    fn goto_xy(&mut self, col: usize, row: usize) {
        self.buffer.goto_xy(col, row);
    }

    fn print(&mut self, text: &str) {
        self.buffer.print(text);
        self.log_if_changed();
    }
}
