//! Column descriptors and fixed-width field formatting.
//!
//! A layout is a `Vec<Column<R>>`: each column names itself, declares its width and kind, and
//! knows how to pull its raw value out of a record `R`. [`render_line`] walks the columns in order
//! and concatenates the fitted values. All width arithmetic counts characters, not bytes.

/// Line terminator required by the ingestion system.
pub const LINE_END: &str = "\r\n";

/// Width of every date column (`YYYYMMDD`).
pub const DATE_WIDTH: usize = 8;

/// Extracts a column's raw value from a record. `None` means "missing".
pub type Source<R> = fn(&R) -> Option<String>;

/// How a column's value is fitted to its width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Upper-cased, right-padded with spaces, truncated.
    Alpha,
    /// Left-padded with zeros, truncated; missing renders as `0` padded.
    Numeric,
    /// `YYYYMMDD` with separators removed; missing renders as zeros.
    Date,
    /// Spaces only.
    Blank,
    /// A literal emitted verbatim.
    Constant(&'static str),
}

/// One positional field of a fixed-width line.
pub struct Column<R> {
    name: &'static str,
    width: usize,
    kind: FieldKind,
    source: Option<Source<R>>,
}

impl<R> Column<R> {
    pub fn alpha(name: &'static str, width: usize, source: Source<R>) -> Self {
        Self {
            name,
            width,
            kind: FieldKind::Alpha,
            source: Some(source),
        }
    }

    pub fn numeric(name: &'static str, width: usize, source: Source<R>) -> Self {
        Self {
            name,
            width,
            kind: FieldKind::Numeric,
            source: Some(source),
        }
    }

    pub fn date(name: &'static str, source: Source<R>) -> Self {
        Self {
            name,
            width: DATE_WIDTH,
            kind: FieldKind::Date,
            source: Some(source),
        }
    }

    pub fn blank(name: &'static str, width: usize) -> Self {
        Self {
            name,
            width,
            kind: FieldKind::Blank,
            source: None,
        }
    }

    /// A literal; its width is its character count.
    pub fn constant(name: &'static str, value: &'static str) -> Self {
        Self {
            name,
            width: value.chars().count(),
            kind: FieldKind::Constant(value),
            source: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Renders this column for `record`. The result is always exactly `width` characters.
    pub fn render(&self, record: &R) -> String {
        let value = self.source.and_then(|source| source(record));
        let value = value.as_deref();

        match self.kind {
            FieldKind::Alpha => fit_alpha(value, self.width),
            FieldKind::Numeric => fit_numeric(value, self.width),
            FieldKind::Date => fit_date(value),
            FieldKind::Blank => " ".repeat(self.width),
            FieldKind::Constant(text) => text.to_owned(),
        }
    }
}

/// Upper-cases `value`, pads it with spaces on the right and truncates it to `width`.
pub fn fit_alpha(value: Option<&str>, width: usize) -> String {
    let upper = value.unwrap_or_default().to_uppercase();
    let mut out: String = upper.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat(' ').take(width - len));
    out
}

/// Pads `value` with zeros on the left, then keeps the first `width` characters.
///
/// A missing or empty value counts as `"0"`.
pub fn fit_numeric(value: Option<&str>, width: usize) -> String {
    let value = value.filter(|v| !v.is_empty()).unwrap_or("0");
    let len = value.chars().count();

    std::iter::repeat('0')
        .take(width.saturating_sub(len))
        .chain(value.chars())
        .take(width)
        .collect()
}

/// Renders a date as 8 digits with `-`, `/` and `.` removed; missing renders as `00000000`.
pub fn fit_date(value: Option<&str>) -> String {
    match value.filter(|v| !v.is_empty()) {
        Some(date) => {
            let digits: String = date
                .chars()
                .filter(|c| !matches!(c, '-' | '/' | '.'))
                .collect();
            fit_numeric(Some(&digits), DATE_WIDTH)
        }
        None => "0".repeat(DATE_WIDTH),
    }
}

/// Renders every column of `layout` for `record` and appends CRLF.
pub fn render_line<R>(layout: &[Column<R>], record: &R) -> String {
    let mut line = String::with_capacity(line_width(layout) + LINE_END.len());
    for column in layout {
        line.push_str(&column.render(record));
    }
    line.push_str(LINE_END);
    line
}

/// Total width of a layout, excluding the line terminator.
pub fn line_width<R>(layout: &[Column<R>]) -> usize {
    layout.iter().map(Column::width).sum()
}
