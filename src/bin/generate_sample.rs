use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// District name, centre coordinates and a price-per-m² level.
const DISTRICTS: [(&str, f64, f64, f64); 10] = [
    ("Moema/São Paulo", -23.601, -46.665, 11500.0),
    ("Pinheiros/São Paulo", -23.567, -46.693, 12500.0),
    ("Itaim Bibi/São Paulo", -23.585, -46.677, 13500.0),
    ("Vila Mariana/São Paulo", -23.589, -46.634, 9800.0),
    ("Perdizes/São Paulo", -23.537, -46.677, 9400.0),
    ("Lapa/São Paulo", -23.522, -46.704, 7800.0),
    ("Tatuapé/São Paulo", -23.540, -46.576, 7200.0),
    ("Santana/São Paulo", -23.502, -46.625, 7000.0),
    ("Artur Alvim/São Paulo", -23.540, -46.484, 4300.0),
    ("Grajaú/São Paulo", -23.785, -46.667, 3200.0),
];

const HEADERS: [&str; 16] = [
    "Price",
    "Condo",
    "Size",
    "Rooms",
    "Toilets",
    "Suites",
    "Parking",
    "Elevator",
    "Furnished",
    "Swimming Pool",
    "New",
    "District",
    "Negotiation Type",
    "Property Type",
    "Latitude",
    "Longitude",
];

/// One generated row, with `None` where the export would have a blank.
struct Row {
    numbers: [Option<f64>; 11],
    district: String,
    negotiation: Option<String>,
    property_type: String,
    latitude: f64,
    longitude: f64,
}

fn generate_row(rng: &mut SimpleRng) -> Row {
    let &(district, lat, lon, per_m2) = rng.pick(&DISTRICTS);
    let is_rent = rng.chance(0.55);
    let property_type = *rng.pick(&["apartment", "apartment", "apartment", "house"]);

    let size = rng.range(28.0, if property_type == "house" { 320.0 } else { 180.0 }).round();
    let rooms = (size / 35.0).clamp(1.0, 5.0).round();
    let sale_price = (size * per_m2 * rng.range(0.8, 1.25) / 1000.0).round() * 1000.0;
    // Gross yields in São Paulo sit around 4–6 % a year.
    let price = if is_rent {
        (sale_price * rng.range(0.0035, 0.005) / 10.0).round() * 10.0
    } else {
        sale_price
    };
    let condo = (size * rng.range(6.0, 14.0)).round();

    let blank = |rng: &mut SimpleRng, v: f64| if rng.chance(0.08) { None } else { Some(v) };
    let flag = |rng: &mut SimpleRng, p: f64| if rng.chance(p) { 1.0 } else { 0.0 };

    let numbers = [
        Some(price),
        blank(rng, condo),
        Some(size),
        Some(rooms),
        Some((rooms - 1.0).max(1.0)),
        blank(rng, (rooms - 1.0).max(0.0)),
        blank(rng, (rooms - 1.0).clamp(0.0, 3.0)),
        Some(flag(rng, 0.5)),
        Some(flag(rng, 0.15)),
        Some(flag(rng, 0.35)),
        Some(flag(rng, 0.05)),
    ];

    // The real export mixes casings and occasionally leaves the type blank.
    let negotiation = match (is_rent, rng.next_u64() % 20) {
        (_, 0) => None,
        (true, 1..=9) => Some("rent".to_owned()),
        (true, _) => Some("Rent".to_owned()),
        (false, 1..=9) => Some("sale".to_owned()),
        (false, _) => Some("Sale".to_owned()),
    };

    Row {
        numbers,
        district: district.to_owned(),
        negotiation,
        property_type: property_type.to_owned(),
        latitude: lat + rng.range(-0.012, 0.012),
        longitude: lon + rng.range(-0.012, 0.012),
    }
}

fn write_csv(path: &str, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record(HEADERS)?;
    for row in rows {
        let mut fields: Vec<String> = row
            .numbers
            .iter()
            .map(|v| v.map(|v| v.to_string()).unwrap_or_default())
            .collect();
        fields.push(row.district.clone());
        fields.push(row.negotiation.clone().unwrap_or_default());
        fields.push(row.property_type.clone());
        fields.push(format!("{:.6}", row.latitude));
        fields.push(format!("{:.6}", row.longitude));
        writer.write_record(&fields)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &str, rows: &[Row]) -> Result<()> {
    let mut fields = Vec::with_capacity(HEADERS.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(HEADERS.len());

    for (i, name) in HEADERS.iter().take(11).enumerate() {
        fields.push(Field::new(*name, DataType::Float64, true));
        let values: Float64Array = rows.iter().map(|r| r.numbers[i]).collect();
        columns.push(Arc::new(values));
    }

    let text_columns: [(&str, Vec<Option<&str>>); 3] = [
        ("District", rows.iter().map(|r| Some(r.district.as_str())).collect()),
        (
            "Negotiation Type",
            rows.iter().map(|r| r.negotiation.as_deref()).collect(),
        ),
        (
            "Property Type",
            rows.iter().map(|r| Some(r.property_type.as_str())).collect(),
        ),
    ];
    for (name, values) in text_columns {
        fields.push(Field::new(name, DataType::Utf8, true));
        columns.push(Arc::new(StringArray::from(values)));
    }

    fields.push(Field::new("Latitude", DataType::Float64, false));
    columns.push(Arc::new(Float64Array::from_iter_values(
        rows.iter().map(|r| r.latitude),
    )));
    fields.push(Field::new("Longitude", DataType::Float64, false));
    columns.push(Arc::new(Float64Array::from_iter_values(
        rows.iter().map(|r| r.longitude),
    )));

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let n_rows = 4000;

    let rows: Vec<Row> = (0..n_rows).map(|_| generate_row(&mut rng)).collect();

    std::fs::create_dir_all("data").context("creating data directory")?;
    let csv_path = "data/sao_paulo_imoveis_2019.csv";
    let parquet_path = "data/sao_paulo_imoveis_2019.parquet";
    write_csv(csv_path, &rows)?;
    write_parquet(parquet_path, &rows)?;

    println!("Wrote {n_rows} listings to {csv_path} and {parquet_path}");
    Ok(())
}
