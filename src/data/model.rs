use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Cell – a single raw value as read from the source table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a listings export carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Integer(i) => write!(f, "{i}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Null => write!(f, "<null>"),
        }
    }
}

impl Cell {
    /// Numeric view of the cell; booleans count as 0/1 and numeric text
    /// such as `"300000"` or `" 2 "` is parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Float(v) => Some(*v),
            Cell::Integer(i) => Some(*i as f64),
            Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
            Cell::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

/// Columns holding labels, never numbers, even when a value looks numeric.
pub const CATEGORY_COLUMNS: [&str; 3] = ["negotiation_type", "property_type", "district"];

/// Map a source header onto the snake_case name used throughout the crate.
///
/// `"Negotiation Type"` → `negotiation_type`, `"Swimming Pool"` →
/// `swimming_pool`. The amenity flag is exported both as `New` and
/// `is_new`; both land on `new`.
pub fn canonical_column(header: &str) -> String {
    let name: String = header
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect();
    match name.as_str() {
        "is_new" => "new".to_owned(),
        _ => name,
    }
}

// ---------------------------------------------------------------------------
// RawTable – the table exactly as loaded, before cleaning
// ---------------------------------------------------------------------------

/// One source row: canonical column name → cell.
pub type RawRecord = BTreeMap<String, Cell>;

/// The loaded source table. Cells may be null or mistyped; nothing has been
/// validated yet.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Canonical column names in first-seen order.
    pub columns: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl RawTable {
    /// Build the column index from the loaded records.
    pub fn from_records(records: Vec<RawRecord>) -> Self {
        let mut seen = BTreeSet::new();
        let mut columns = Vec::new();
        for record in &records {
            for col in record.keys() {
                if seen.insert(col.as_str()) {
                    columns.push(col.clone());
                }
            }
        }
        RawTable { columns, records }
    }

    /// Build a table whose schema is known up front (CSV headers, Parquet
    /// schema), so columns survive even when the table has no rows.
    pub fn with_columns(columns: Vec<String>, records: Vec<RawRecord>) -> Self {
        RawTable { columns, records }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// NegotiationType
// ---------------------------------------------------------------------------

/// Whether a listing is offered for sale or for rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NegotiationType {
    Sale,
    Rent,
}

impl NegotiationType {
    pub const ALL: [NegotiationType; 2] = [NegotiationType::Sale, NegotiationType::Rent];

    /// Label for the price axis: sale price or monthly rent.
    pub fn price_label(self) -> &'static str {
        match self {
            NegotiationType::Sale => "Sale price (R$)",
            NegotiationType::Rent => "Monthly rent (R$)",
        }
    }
}

impl fmt::Display for NegotiationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationType::Sale => write!(f, "Sale"),
            NegotiationType::Rent => write!(f, "Rent"),
        }
    }
}

/// Unrecognised negotiation type literal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown negotiation type {0:?}")]
pub struct UnknownNegotiationType(pub String);

impl FromStr for NegotiationType {
    type Err = UnknownNegotiationType;

    /// Case-insensitive: the source mixes `Sale` and `sale`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("sale") {
            Ok(NegotiationType::Sale)
        } else if trimmed.eq_ignore_ascii_case("rent") {
            Ok(NegotiationType::Rent)
        } else {
            Err(UnknownNegotiationType(s.to_owned()))
        }
    }
}

// ---------------------------------------------------------------------------
// Listing – one cleaned property record
// ---------------------------------------------------------------------------

/// A single property listing with its derived metrics populated.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub negotiation_type: NegotiationType,
    pub property_type: String,
    pub district: String,
    /// Sale price or monthly rent, depending on `negotiation_type`.
    pub price: f64,
    pub condo: i64,
    /// Square meters.
    pub size: f64,
    pub rooms: i64,
    pub suites: i64,
    pub parking: i64,
    pub toilets: i64,
    pub elevator: bool,
    pub furnished: bool,
    pub swimming_pool: bool,
    pub is_new: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// `round(price / size, 2)`; `None` when `size <= 0`.
    pub price_per_m2: Option<f64>,
    /// `price + condo`.
    pub total_cost: f64,
}

// ---------------------------------------------------------------------------
// Dataset – the cleaned, read-only listing table
// ---------------------------------------------------------------------------

/// All cleaned listings, in source order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub listings: Vec<Listing>,
}

impl Dataset {
    pub fn from_listings(listings: Vec<Listing>) -> Self {
        Dataset { listings }
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Listing> {
        self.listings.iter()
    }

    /// Listings of a single negotiation type, in source order.
    pub fn scoped(&self, negotiation_type: NegotiationType) -> impl Iterator<Item = &Listing> {
        self.listings
            .iter()
            .filter(move |l| l.negotiation_type == negotiation_type)
    }

    /// Negotiation types present in the data, in first-seen order.
    pub fn negotiation_types(&self) -> Vec<NegotiationType> {
        let mut found = Vec::new();
        for listing in &self.listings {
            if !found.contains(&listing.negotiation_type) {
                found.push(listing.negotiation_type);
                if found.len() == NegotiationType::ALL.len() {
                    break;
                }
            }
        }
        found
    }

    /// Sorted set of every district in the data.
    pub fn districts(&self) -> BTreeSet<&str> {
        self.listings.iter().map(|l| l.district.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_column_handles_source_headers() {
        assert_eq!(canonical_column("Negotiation Type"), "negotiation_type");
        assert_eq!(canonical_column("Swimming Pool"), "swimming_pool");
        assert_eq!(canonical_column(" Price "), "price");
        assert_eq!(canonical_column("New"), "new");
        assert_eq!(canonical_column("is_new"), "new");
    }

    #[test]
    fn negotiation_type_parses_any_casing() {
        assert_eq!("Sale".parse::<NegotiationType>(), Ok(NegotiationType::Sale));
        assert_eq!("sale".parse::<NegotiationType>(), Ok(NegotiationType::Sale));
        assert_eq!(" RENT ".parse::<NegotiationType>(), Ok(NegotiationType::Rent));
        assert!("lease".parse::<NegotiationType>().is_err());
    }

    #[test]
    fn cell_numeric_view() {
        assert_eq!(Cell::Integer(3).as_f64(), Some(3.0));
        assert_eq!(Cell::Bool(true).as_f64(), Some(1.0));
        assert_eq!(Cell::Text("x".into()).as_f64(), None);
        assert_eq!(Cell::Text(" 2 ".into()).as_f64(), Some(2.0));
        assert_eq!(Cell::Text("300000.5".into()).as_f64(), Some(300000.5));
        assert_eq!(Cell::Null.as_f64(), None);
    }

    #[test]
    fn raw_table_collects_columns_in_first_seen_order() {
        let mut a = RawRecord::new();
        a.insert("size".into(), Cell::Float(50.0));
        a.insert("price".into(), Cell::Float(1.0));
        let mut b = RawRecord::new();
        b.insert("district".into(), Cell::Text("Moema".into()));
        let table = RawTable::from_records(vec![a, b]);
        assert_eq!(table.columns, vec!["price", "size", "district"]);
        assert!(table.has_column("district"));
        assert!(!table.has_column("condo"));
    }
}
