//! Cell styling
//!
//! Maps every address of a [`Layout`] to a [`CellRole`] and every role to a
//! [`CellStyle`] drawn from a [`StyleTheme`]. The result is a dense
//! [`StyledSheet`]: one style per (row, col) in the used range, merge-covered
//! cells included, each with a border.

use crate::layout::{
    CellRef, Layout, COLUMN_COUNT, DATA_START_ROW, INLINE_LABEL_COL, NOTES_COL,
};

// ============================================================================
// Style primitives
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BorderLine {
    None,
    Thin,
    Medium,
    Thick,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VAlign {
    Top,
    Center,
    Bottom,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FontSpec {
    pub name: Option<String>,
    pub bold: bool,
    pub size: Option<f64>,
}

/// Style of one cell, independent of any output format
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellStyle {
    /// Applied to all four sides
    pub border: Option<BorderLine>,
    pub horizontal: Option<HAlign>,
    pub vertical: Option<VAlign>,
    pub wrap: bool,
    pub font: FontSpec,
    /// RGB fill, e.g. `0xC5D9F1`
    pub fill: Option<u32>,
}

impl CellStyle {
    pub fn has_border(&self) -> bool {
        matches!(self.border, Some(line) if line != BorderLine::None)
    }

    fn bordered(line: BorderLine) -> Self {
        Self {
            border: Some(line),
            ..Self::default()
        }
    }

    fn align(mut self, horizontal: Option<HAlign>, vertical: VAlign) -> Self {
        self.horizontal = horizontal;
        self.vertical = Some(vertical);
        self
    }

    fn wrap(mut self) -> Self {
        self.wrap = true;
        self
    }

    fn font(mut self, name: &str, bold: bool, size: Option<f64>) -> Self {
        self.font = FontSpec {
            name: Some(name.to_string()),
            bold,
            size,
        };
        self
    }

    fn fill(mut self, rgb: u32) -> Self {
        self.fill = Some(rgb);
        self
    }
}

// ============================================================================
// Theme and roles
// ============================================================================

/// Named style constants
#[derive(Clone, Debug, PartialEq)]
pub struct StyleTheme {
    pub border: BorderLine,
    pub font_name: String,
    pub title_font_size: f64,
    pub instructions_font_size: f64,
    pub title_fill: u32,
}

impl Default for StyleTheme {
    fn default() -> Self {
        Self {
            border: BorderLine::Thin,
            font_name: "Microsoft YaHei".to_string(),
            title_font_size: 14.0,
            instructions_font_size: 12.0,
            title_fill: 0x00C5_D9F1,
        }
    }
}

/// What a cell is, as far as styling cares
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellRole {
    Title,
    Instructions,
    /// Metadata label in columns A:B
    LeadLabel,
    /// Metadata label in column E
    InlineLabel,
    MetaValue,
    /// Row 5: sequence, tracking, spanning observation label, notes
    SectionHeader,
    /// Row 6: the observation questions
    ColumnHeader,
    DataCentered,
    DataNotes,
    /// Hidden under a merge; carries only the border
    Covered,
}

impl CellRole {
    /// Role of one address in the layout
    pub fn of(layout: &Layout, row: usize, col: usize) -> Self {
        if layout.merges.iter().any(|m| m.covers(row, col)) {
            return Self::Covered;
        }
        match row {
            0 => Self::Title,
            1 => Self::Instructions,
            2..=4 => match col {
                0 => Self::LeadLabel,
                INLINE_LABEL_COL => Self::InlineLabel,
                2 | 5 => Self::MetaValue,
                _ => Self::Covered,
            },
            5 => Self::SectionHeader,
            6 => Self::ColumnHeader,
            _ if row >= DATA_START_ROW && col == NOTES_COL => Self::DataNotes,
            _ => Self::DataCentered,
        }
    }
}

impl StyleTheme {
    pub fn style_for(&self, role: CellRole) -> CellStyle {
        let base = CellStyle::bordered(self.border);
        let font = self.font_name.as_str();
        match role {
            CellRole::Title => base
                .align(Some(HAlign::Center), VAlign::Center)
                .font(font, true, Some(self.title_font_size))
                .fill(self.title_fill),
            CellRole::Instructions => base
                .align(Some(HAlign::Left), VAlign::Center)
                .wrap()
                .font(font, false, Some(self.instructions_font_size)),
            CellRole::LeadLabel | CellRole::SectionHeader | CellRole::ColumnHeader => base
                .align(Some(HAlign::Center), VAlign::Center)
                .wrap()
                .font(font, true, None),
            CellRole::InlineLabel => base
                .align(Some(HAlign::Left), VAlign::Center)
                .wrap()
                .font(font, true, None),
            CellRole::MetaValue | CellRole::DataNotes => base.align(None, VAlign::Center).wrap(),
            CellRole::DataCentered => base.align(Some(HAlign::Center), VAlign::Center),
            CellRole::Covered => base,
        }
    }
}

// ============================================================================
// Styled sheet
// ============================================================================

/// A layout with one style per cell of its used range
#[derive(Clone, Debug, PartialEq)]
pub struct StyledSheet {
    pub layout: Layout,
    roles: Vec<[CellRole; COLUMN_COUNT]>,
    styles: Vec<[CellStyle; COLUMN_COUNT]>,
}

impl StyledSheet {
    pub fn style(&self, row: usize, col: usize) -> Option<&CellStyle> {
        self.styles.get(row).and_then(|r| r.get(col))
    }

    pub fn role(&self, row: usize, col: usize) -> Option<CellRole> {
        self.roles.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Addresses in the used range or under a merge that lack a border
    pub fn unbordered_cells(&self) -> Vec<CellRef> {
        let merged = self.layout.merges.iter().flat_map(|m| m.cells());
        let mut missing: Vec<CellRef> = self
            .layout
            .addresses()
            .chain(merged)
            .filter(|at| !self.style(at.row, at.col).is_some_and(CellStyle::has_border))
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }
}

/// Assigns styles to a layout
#[derive(Clone, Debug, Default)]
pub struct StyleApplier {
    theme: StyleTheme,
}

impl StyleApplier {
    pub fn new(theme: StyleTheme) -> Self {
        Self { theme }
    }

    pub fn theme(&self) -> &StyleTheme {
        &self.theme
    }

    /// Take ownership of the layout and return it with every cell styled
    pub fn apply(&self, layout: Layout) -> StyledSheet {
        let rows = layout.row_count();
        let mut roles = Vec::with_capacity(rows);
        let mut styles = Vec::with_capacity(rows);
        for row in 0..rows {
            let row_roles: [CellRole; COLUMN_COUNT] =
                std::array::from_fn(|col| CellRole::of(&layout, row, col));
            styles.push(row_roles.map(|role| self.theme.style_for(role)));
            roles.push(row_roles);
        }

        let sheet = StyledSheet {
            layout,
            roles,
            styles,
        };
        debug_assert!(
            self.theme.border == BorderLine::None || sheet.unbordered_cells().is_empty(),
            "unbordered cells after styling"
        );
        sheet
    }
}
