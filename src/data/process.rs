use log::{info, warn};

use super::error::SchemaError;
use super::model::{Cell, Dataset, Listing, NegotiationType, RawRecord, RawTable};

/// Columns without which no derived metric can be computed.
pub const REQUIRED_COLUMNS: [&str; 2] = ["price", "size"];

/// How many source rows were dropped during cleaning, and why.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessReport {
    pub total_rows: usize,
    pub kept: usize,
    pub missing_negotiation_type: usize,
    pub unknown_negotiation_type: usize,
    pub invalid_price: usize,
    pub invalid_size: usize,
    /// Kept, but with an undefined price per m² (size ≤ 0).
    pub non_positive_size: usize,
}

impl ProcessReport {
    pub fn dropped(&self) -> usize {
        self.total_rows - self.kept
    }
}

enum Rejection {
    MissingNegotiationType,
    UnknownNegotiationType,
    InvalidPrice,
    InvalidSize,
}

/// Clean the raw table and derive `price_per_m2` / `total_cost`.
///
/// The raw table is only borrowed: it is usually the process-wide cached
/// load result.
pub fn process(raw: &RawTable) -> Result<Dataset, SchemaError> {
    process_with_report(raw).map(|(dataset, _)| dataset)
}

/// Like [`process`], also returning the cleaning counters.
pub fn process_with_report(raw: &RawTable) -> Result<(Dataset, ProcessReport), SchemaError> {
    let missing: Vec<&'static str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !raw.has_column(col))
        .collect();
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns(missing));
    }

    let mut report = ProcessReport {
        total_rows: raw.len(),
        ..ProcessReport::default()
    };

    let mut listings = Vec::with_capacity(raw.len());
    for record in &raw.records {
        match clean_record(record) {
            Ok(listing) => {
                if listing.price_per_m2.is_none() {
                    report.non_positive_size += 1;
                }
                listings.push(listing);
            }
            Err(Rejection::MissingNegotiationType) => report.missing_negotiation_type += 1,
            Err(Rejection::UnknownNegotiationType) => report.unknown_negotiation_type += 1,
            Err(Rejection::InvalidPrice) => report.invalid_price += 1,
            Err(Rejection::InvalidSize) => report.invalid_size += 1,
        }
    }
    report.kept = listings.len();

    if report.dropped() > 0 {
        warn!(
            "Dropped {} of {} rows (no negotiation type: {}, unknown negotiation type: {}, \
             bad price: {}, bad size: {})",
            report.dropped(),
            report.total_rows,
            report.missing_negotiation_type,
            report.unknown_negotiation_type,
            report.invalid_price,
            report.invalid_size,
        );
    }
    if report.non_positive_size > 0 {
        warn!(
            "{} listings have size <= 0; price per m² left undefined",
            report.non_positive_size
        );
    }
    info!("Processed {} listings", report.kept);

    Ok((Dataset::from_listings(listings), report))
}

fn clean_record(record: &RawRecord) -> Result<Listing, Rejection> {
    // Fill and coerce first; the negotiation type check is independent of
    // every other column.
    let condo = count(record, "condo");
    let rooms = count(record, "rooms");
    let suites = count(record, "suites");
    let parking = count(record, "parking");
    let toilets = count(record, "toilets");

    let elevator = flag(record, "elevator");
    let furnished = flag(record, "furnished");
    let swimming_pool = flag(record, "swimming_pool");
    let is_new = flag(record, "new");

    let negotiation_type = match record.get("negotiation_type") {
        None | Some(Cell::Null) => return Err(Rejection::MissingNegotiationType),
        Some(cell) => cell
            .to_string()
            .parse::<NegotiationType>()
            .map_err(|_| Rejection::UnknownNegotiationType)?,
    };

    let price = number(record, "price").ok_or(Rejection::InvalidPrice)?;
    let size = number(record, "size").ok_or(Rejection::InvalidSize)?;

    Ok(Listing {
        negotiation_type,
        property_type: category(record, "property_type"),
        district: category(record, "district"),
        price,
        condo,
        size,
        rooms,
        suites,
        parking,
        toilets,
        elevator,
        furnished,
        swimming_pool,
        is_new,
        latitude: number(record, "latitude"),
        longitude: number(record, "longitude"),
        price_per_m2: price_per_m2(price, size),
        total_cost: price + condo as f64,
    })
}

/// `round(price / size, 2)`, undefined for a non-positive size.
pub fn price_per_m2(price: f64, size: f64) -> Option<f64> {
    (size > 0.0).then(|| round2(price / size))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn number(record: &RawRecord, column: &str) -> Option<f64> {
    record
        .get(column)
        .and_then(Cell::as_f64)
        .filter(|v| v.is_finite())
}

/// Missing → 0, then truncate to an integer. Negative values pass through.
fn count(record: &RawRecord, column: &str) -> i64 {
    number(record, column).map(|v| v.trunc() as i64).unwrap_or(0)
}

fn flag(record: &RawRecord, column: &str) -> bool {
    count(record, column) != 0
}

fn category(record: &RawRecord, column: &str) -> String {
    match record.get(column) {
        None | Some(Cell::Null) => String::new(),
        Some(cell) => cell.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cells: &[(&str, Cell)]) -> RawRecord {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn listing_row(negotiation: &str, district: &str, price: f64, size: f64) -> RawRecord {
        record(&[
            ("negotiation_type", Cell::Text(negotiation.into())),
            ("district", Cell::Text(district.into())),
            ("property_type", Cell::Text("apartment".into())),
            ("price", Cell::Float(price)),
            ("size", Cell::Float(size)),
        ])
    }

    #[test]
    fn derives_price_per_m2_for_the_three_listing_scenario() {
        let raw = RawTable::from_records(vec![
            listing_row("Sale", "District A", 300000.0, 100.0),
            listing_row("Rent", "District A", 2000.0, 50.0),
            listing_row("Sale", "District B", 500000.0, 100.0),
        ]);
        let dataset = process(&raw).unwrap();
        let per_m2: Vec<Option<f64>> = dataset.iter().map(|l| l.price_per_m2).collect();
        assert_eq!(per_m2, vec![Some(3000.0), Some(40.0), Some(5000.0)]);
    }

    #[test]
    fn fills_missing_counts_and_flags_with_zero() {
        let mut row = listing_row("sale", "Moema", 500000.0, 70.0);
        row.insert("condo".into(), Cell::Null);
        row.insert("parking".into(), Cell::Float(2.7));
        row.insert("elevator".into(), Cell::Integer(1));
        row.insert("swimming_pool".into(), Cell::Null);
        let dataset = process(&RawTable::from_records(vec![row])).unwrap();

        let l = &dataset.listings[0];
        assert_eq!(l.condo, 0);
        assert_eq!(l.suites, 0);
        assert_eq!(l.rooms, 0);
        assert_eq!(l.parking, 2);
        assert!(l.elevator);
        assert!(!l.swimming_pool);
        assert!(!l.furnished);
        assert!(!l.is_new);
        assert_eq!(l.latitude, None);
    }

    #[test]
    fn coerces_numbers_stored_as_text() {
        let row = record(&[
            ("negotiation_type", Cell::Text("Sale".into())),
            ("district", Cell::Text("Moema".into())),
            ("price", Cell::Text("300000".into())),
            ("size", Cell::Text(" 100 ".into())),
            ("parking", Cell::Text("2".into())),
            ("elevator", Cell::Text("1".into())),
        ]);
        let (dataset, report) = process_with_report(&RawTable::from_records(vec![row])).unwrap();

        assert_eq!(report.invalid_price, 0);
        assert_eq!(dataset.len(), 1);
        let l = &dataset.listings[0];
        assert_eq!(l.price, 300000.0);
        assert_eq!(l.size, 100.0);
        assert_eq!(l.parking, 2);
        assert!(l.elevator);
        assert_eq!(l.price_per_m2, Some(3000.0));
    }

    #[test]
    fn normalises_negotiation_type_casing() {
        let raw = RawTable::from_records(vec![
            listing_row("sale", "A", 1.0, 1.0),
            listing_row("Sale", "A", 1.0, 1.0),
            listing_row("RENT", "A", 1.0, 1.0),
        ]);
        let dataset = process(&raw).unwrap();
        let types: Vec<NegotiationType> = dataset.iter().map(|l| l.negotiation_type).collect();
        assert_eq!(
            types,
            vec![NegotiationType::Sale, NegotiationType::Sale, NegotiationType::Rent]
        );
    }

    #[test]
    fn drops_rows_without_negotiation_type() {
        let mut no_type = listing_row("Sale", "A", 1.0, 1.0);
        no_type.insert("negotiation_type".into(), Cell::Null);
        let raw = RawTable::from_records(vec![
            no_type,
            listing_row("Rent", "A", 1.0, 1.0),
            listing_row("lease", "A", 1.0, 1.0),
        ]);
        let (dataset, report) = process_with_report(&raw).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(report.missing_negotiation_type, 1);
        assert_eq!(report.unknown_negotiation_type, 1);
        assert_eq!(report.dropped(), 2);
    }

    #[test]
    fn total_cost_is_price_plus_condo() {
        let mut row = listing_row("Rent", "A", 2500.0, 60.0);
        row.insert("condo".into(), Cell::Integer(480));
        let dataset = process(&RawTable::from_records(vec![row])).unwrap();
        assert_eq!(dataset.listings[0].total_cost, 2980.0);
    }

    #[test]
    fn zero_size_keeps_listing_with_undefined_price_per_m2() {
        let raw = RawTable::from_records(vec![listing_row("Sale", "A", 100000.0, 0.0)]);
        let (dataset, report) = process_with_report(&raw).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.listings[0].price_per_m2, None);
        assert_eq!(report.non_positive_size, 1);
    }

    #[test]
    fn rounds_price_per_m2_to_two_decimals() {
        assert_eq!(price_per_m2(1000.0, 3.0), Some(333.33));
        assert_eq!(price_per_m2(2000.0, 3.0), Some(666.67));
        assert_eq!(price_per_m2(1.0, -2.0), None);
    }

    #[test]
    fn rejects_schema_without_price_or_size() {
        let raw = RawTable::from_records(vec![record(&[
            ("negotiation_type", Cell::Text("Sale".into())),
            ("size", Cell::Integer(40)),
        ])]);
        assert_eq!(
            process(&raw).unwrap_err(),
            SchemaError::MissingColumns(vec!["price"])
        );

        let empty = RawTable::default();
        assert_eq!(
            process(&empty).unwrap_err(),
            SchemaError::MissingColumns(vec!["price", "size"])
        );
    }

    #[test]
    fn leaves_input_untouched() {
        let raw = RawTable::from_records(vec![listing_row("sale", "A", 1.0, 0.0)]);
        let before = raw.records.clone();
        let _ = process(&raw).unwrap();
        assert_eq!(raw.records, before);
    }
}
