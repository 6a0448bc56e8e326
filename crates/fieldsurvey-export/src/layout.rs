//! Worksheet layout
//!
//! Turns a [`Form`] into a dense 8-column grid of cell values plus the fixed
//! merge regions, column widths and header row heights. Nothing here knows
//! about styling or the xlsx format.
//!
//! ```text
//! row 0  | title (A:H)                                                 |
//! row 1  | instructions (A:H)                                          |
//! row 2  | 城市名称 (A:B) | city (C:H)                                 |
//! row 3  | 调研时间 (A:B) | date (C:D) | 区域类型 | area (F:H)         |
//! row 4  | 网点代码 (A:B) | branch (C:D) | 小哥工号 | courier (F:H)    |
//! row 5  | 序号 | 运单号 | 以下选项必选 (C:G)               | 备注     |
//! row 6  |      |        | five observation headers         |          |
//! row 7+ | 1    | 1234   | ✓ | ✗ | ✓ | ✗ | ✓                | notes    |
//! ```

use fieldsurvey_core::{Form, FormEntry, Observation};

// ============================================================================
// Constants
// ============================================================================

/// Columns A through H
pub const COLUMN_COUNT: usize = 8;

/// Title, instructions, three metadata rows and the two-row column header
pub const HEADER_ROW_COUNT: usize = 7;

/// First row holding an entry
pub const DATA_START_ROW: usize = HEADER_ROW_COUNT;

pub const SEQUENCE_COL: usize = 0;
pub const TRACKING_COL: usize = 1;
pub const FIRST_OBSERVATION_COL: usize = 2;
pub const NOTES_COL: usize = 7;

/// Column holding inline labels on the two-pair metadata rows
pub const INLINE_LABEL_COL: usize = 4;

pub const CHECK_MARK: &str = "✓";
pub const CROSS_MARK: &str = "✗";

/// Column widths in characters
pub const COLUMN_WIDTHS: [f64; COLUMN_COUNT] = [6.0, 10.0, 12.0, 16.0, 16.0, 10.0, 14.0, 12.0];

/// Heights in points for the header rows; entry rows keep the default height
pub const HEADER_ROW_HEIGHTS: [f64; HEADER_ROW_COUNT] = [20.0, 100.0, 24.0, 34.0, 24.0, 18.0, 32.0];

pub const TITLE: &str = "末端派送调研表";

pub const INSTRUCTIONS: &str = "1、跟随小哥收派工作，逐票客观记录小哥末端作业真实情况，不允许干扰小哥正常工作流程及操作，避免影响真实性。\n\
2、 请与小哥提前知会：该记录数据仅用于内部标准优化数据支撑，运单统计结果匿名制，且不作为标准优化之外的公开或第三方使用（比如考核监控等）。\n\
3、其他说明：妥投地址“三方”：菜鸟驿站、超市、合作点、丰巢等";

pub const CITY_LABEL: &str = "城市名称";
pub const SURVEY_DATE_LABEL: &str = "调研时间";
pub const AREA_TYPE_LABEL: &str = "区域类型\n(工业区/住宅区等)";
pub const BRANCH_LABEL: &str = "网点代码";
pub const COURIER_LABEL: &str = "小哥工号";
pub const SEQUENCE_LABEL: &str = "序号";
pub const TRACKING_LABEL: &str = "运单号后4\n位";
pub const OBSERVATIONS_LABEL: &str = "以下选项必选 “✓✗”";
pub const NOTES_LABEL: &str = "备注\n（滞留 \"z\"）";

/// The merges every sheet carries, independent of the entry count
pub const FIXED_MERGES: [MergeRegion; 14] = [
    MergeRegion::row(0, 0, 7),
    MergeRegion::row(1, 0, 7),
    MergeRegion::row(2, 0, 1),
    MergeRegion::row(2, 2, 7),
    MergeRegion::row(3, 0, 1),
    MergeRegion::row(3, 2, 3),
    MergeRegion::row(3, 5, 7),
    MergeRegion::row(4, 0, 1),
    MergeRegion::row(4, 2, 3),
    MergeRegion::row(4, 5, 7),
    MergeRegion::row(5, 2, 6),
    MergeRegion::column(SEQUENCE_COL, 5, 6),
    MergeRegion::column(TRACKING_COL, 5, 6),
    MergeRegion::column(NOTES_COL, 5, 6),
];

/// Column header for one observation question
pub const fn observation_header(observation: Observation) -> &'static str {
    match observation {
        Observation::AddressDelivered => "是否按照订单\n地址妥投",
        Observation::ThirdPartyDelivery => "订单派送地址是否\n为三方",
        Observation::CustomerInteraction => "是否有客户交互\n（是否见到本人）",
        Observation::CustomerInteractionSending => "客户是否有\n寄件",
        Observation::CustomerInteractionReturn => "如有电退是否\n有客户交互",
    }
}

/// ✓ or ✗
pub const fn glyph(value: bool) -> &'static str {
    if value {
        CHECK_MARK
    } else {
        CROSS_MARK
    }
}

// ============================================================================
// Types
// ============================================================================

/// Content of one grid cell
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Blank,
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Blank or empty text
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Blank => true,
            Self::Text(s) => s.is_empty(),
            Self::Number(_) => false,
        }
    }
}

/// Zero-based (row, col) address
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Inclusive rectangle of cells rendered as one
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MergeRegion {
    pub first_row: usize,
    pub first_col: usize,
    pub last_row: usize,
    pub last_col: usize,
}

impl MergeRegion {
    pub const fn new(first_row: usize, first_col: usize, last_row: usize, last_col: usize) -> Self {
        Self {
            first_row,
            first_col,
            last_row,
            last_col,
        }
    }

    /// Horizontal span within one row
    pub const fn row(row: usize, first_col: usize, last_col: usize) -> Self {
        Self::new(row, first_col, row, last_col)
    }

    /// Vertical span within one column
    pub const fn column(col: usize, first_row: usize, last_row: usize) -> Self {
        Self::new(first_row, col, last_row, col)
    }

    /// Top-left cell, the one that carries the value
    pub const fn anchor(&self) -> CellRef {
        CellRef::new(self.first_row, self.first_col)
    }

    pub const fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.first_row && row <= self.last_row && col >= self.first_col && col <= self.last_col
    }

    /// Covered by the region but not its anchor
    pub const fn covers(&self, row: usize, col: usize) -> bool {
        self.contains(row, col) && !(row == self.first_row && col == self.first_col)
    }

    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        (self.first_row..=self.last_row)
            .flat_map(move |row| (self.first_col..=self.last_col).map(move |col| CellRef::new(row, col)))
    }
}

/// One row of the grid
pub type Row = [CellValue; COLUMN_COUNT];

/// Grid, merges and dimensions for one form
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    /// `HEADER_ROW_COUNT + entries` rows, each exactly `COLUMN_COUNT` wide
    pub grid: Vec<Row>,
    pub merges: Vec<MergeRegion>,
    pub col_widths: [f64; COLUMN_COUNT],
    /// Heights for the leading rows; rows past the end use the default
    pub row_heights: Vec<f64>,
}

impl Layout {
    pub fn row_count(&self) -> usize {
        self.grid.len()
    }

    /// Index of the last used row
    pub fn last_row(&self) -> usize {
        self.grid.len().saturating_sub(1)
    }

    pub fn entry_count(&self) -> usize {
        self.grid.len().saturating_sub(HEADER_ROW_COUNT)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.grid.get(row).and_then(|r| r.get(col))
    }

    /// The merge region containing this address, if any
    pub fn merge_at(&self, row: usize, col: usize) -> Option<&MergeRegion> {
        self.merges.iter().find(|m| m.contains(row, col))
    }

    /// Every address in the used range, row-major
    pub fn addresses(&self) -> impl Iterator<Item = CellRef> {
        let rows = self.grid.len();
        (0..rows).flat_map(|row| (0..COLUMN_COUNT).map(move |col| CellRef::new(row, col)))
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Lay out a form as header block plus one row per entry, in entry order
pub fn build_layout(form: &Form) -> Layout {
    let meta = &form.metadata;
    let mut grid = Vec::with_capacity(HEADER_ROW_COUNT + form.entries.len());

    grid.push(row_with(&[(0, TITLE)]));
    grid.push(row_with(&[(0, INSTRUCTIONS)]));
    grid.push(row_with(&[(0, CITY_LABEL), (2, meta.city_name.as_str())]));
    grid.push(row_with(&[
        (0, SURVEY_DATE_LABEL),
        (2, meta.survey_date.as_str()),
        (INLINE_LABEL_COL, AREA_TYPE_LABEL),
        (5, meta.area_type.as_str()),
    ]));
    grid.push(row_with(&[
        (0, BRANCH_LABEL),
        (2, meta.branch_code.as_str()),
        (INLINE_LABEL_COL, COURIER_LABEL),
        (5, meta.courier_code.as_str()),
    ]));
    grid.push(row_with(&[
        (SEQUENCE_COL, SEQUENCE_LABEL),
        (TRACKING_COL, TRACKING_LABEL),
        (FIRST_OBSERVATION_COL, OBSERVATIONS_LABEL),
        (NOTES_COL, NOTES_LABEL),
    ]));

    let mut headers = blank_row();
    for (offset, observation) in Observation::ALL.into_iter().enumerate() {
        headers[FIRST_OBSERVATION_COL + offset] = CellValue::text(observation_header(observation));
    }
    grid.push(headers);

    grid.extend(
        form.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| entry_row(index, entry)),
    );

    Layout {
        grid,
        merges: FIXED_MERGES.to_vec(),
        col_widths: COLUMN_WIDTHS,
        row_heights: HEADER_ROW_HEIGHTS.to_vec(),
    }
}

fn entry_row(index: usize, entry: &FormEntry) -> Row {
    let mut row = blank_row();
    #[allow(clippy::cast_precision_loss)]
    let sequence = (index + 1) as f64;
    row[SEQUENCE_COL] = CellValue::Number(sequence);
    row[TRACKING_COL] = CellValue::text(entry.tracking_number_last_four.as_str());
    for (offset, observation) in Observation::ALL.into_iter().enumerate() {
        row[FIRST_OBSERVATION_COL + offset] = CellValue::text(glyph(entry.observation(observation)));
    }
    row[NOTES_COL] = CellValue::text(entry.notes.as_str());
    row
}

fn blank_row() -> Row {
    std::array::from_fn(|_| CellValue::Blank)
}

fn row_with(cells: &[(usize, &str)]) -> Row {
    let mut row = blank_row();
    for &(col, text) in cells {
        row[col] = CellValue::text(text);
    }
    row
}
