use std::fmt;

/// A single cell as returned by the relational driver, before any numeric
/// interpretation. SQLite stores values by storage class rather than by
/// declared column type, so readings may arrive as integers, reals or text.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Null,
    /// A storage class we do not interpret (e.g. `BLOB`), carrying its name.
    Unsupported(String),
}

impl CellValue {
    /// Interprets the cell as a floating-point reading.
    ///
    /// Integers widen, reals pass through and text is trimmed then parsed.
    /// `NULL` and unsupported storage classes have no numeric meaning.
    pub fn as_reading(&self) -> Option<f64> {
        match self {
            CellValue::Integer(v) => Some(*v as f64),
            CellValue::Real(v) => Some(*v),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            CellValue::Null | CellValue::Unsupported(_) => None,
        }
    }

    /// Renders the cell as an identifier, for metadata columns.
    pub fn as_label(&self) -> Option<String> {
        match self {
            CellValue::Integer(v) => Some(v.to_string()),
            CellValue::Real(v) => Some(v.to_string()),
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Null | CellValue::Unsupported(_) => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Integer(v) => write!(f, "{}", v),
            CellValue::Real(v) => write!(f, "{}", v),
            CellValue::Text(s) => write!(f, "{:?}", s),
            CellValue::Null => write!(f, "NULL"),
            CellValue::Unsupported(kind) => write!(f, "<{}>", kind),
        }
    }
}

/// The summary statistics exposed by trials and patients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    Mean,
    Max,
    Min,
}

impl Statistic {
    pub const ALL: [Statistic; 3] = [Statistic::Mean, Statistic::Max, Statistic::Min];

    pub fn label(&self) -> &'static str {
        match self {
            Statistic::Mean => "daily mean",
            Statistic::Max => "daily max",
            Statistic::Min => "daily min",
        }
    }
}
