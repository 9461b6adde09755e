use std::cmp::Ordering;
use std::collections::HashMap;

use log::debug;

use super::filter::FilteredView;
use super::model::{Dataset, Listing, NegotiationType};

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

/// Headline means over a filtered view.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStats {
    pub count: usize,
    pub mean_price: f64,
    pub mean_condo: f64,
    pub mean_size: f64,
    /// `None` when no listing in the view has a defined price per m².
    pub mean_price_per_m2: Option<f64>,
    pub mean_total_cost: f64,
}

/// Means over the view, or `None` when the view is empty.
pub fn summary_stats(view: &FilteredView<'_>) -> Option<SummaryStats> {
    if view.is_empty() {
        return None;
    }
    Some(SummaryStats {
        count: view.len(),
        mean_price: mean(view.iter().map(|l| l.price))?,
        mean_condo: mean(view.iter().map(|l| l.condo as f64))?,
        mean_size: mean(view.iter().map(|l| l.size))?,
        mean_price_per_m2: mean(view.iter().filter_map(|l| l.price_per_m2)),
        mean_total_cost: mean(view.iter().map(|l| l.total_cost))?,
    })
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

// ---------------------------------------------------------------------------
// Per-district aggregates
// ---------------------------------------------------------------------------

/// Metric a district ranking is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistrictMetric {
    PricePerM2,
    Condo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistrictAggregate {
    pub district: String,
    pub mean_price_per_m2: Option<f64>,
    pub mean_condo: f64,
    pub count: usize,
}

impl DistrictAggregate {
    pub fn metric(&self, metric: DistrictMetric) -> Option<f64> {
        match metric {
            DistrictMetric::PricePerM2 => self.mean_price_per_m2,
            DistrictMetric::Condo => Some(self.mean_condo),
        }
    }
}

/// Group the view by district and rank descending by `metric`.
///
/// Equal metrics keep the order in which their districts were first seen;
/// districts with an undefined metric come last. Callers truncate.
pub fn district_aggregate(view: &FilteredView<'_>, metric: DistrictMetric) -> Vec<DistrictAggregate> {
    let mut aggregates: Vec<DistrictAggregate> = group_by_district(view.iter())
        .into_iter()
        .filter_map(|(district, rows)| {
            Some(DistrictAggregate {
                district: district.to_owned(),
                mean_price_per_m2: mean(rows.iter().filter_map(|l| l.price_per_m2)),
                mean_condo: mean(rows.iter().map(|l| l.condo as f64))?,
                count: rows.len(),
            })
        })
        .collect();

    aggregates.sort_by(|a, b| descending(a.metric(metric), b.metric(metric)));
    aggregates
}

/// Groups in first-encounter order.
fn group_by_district<'a>(
    listings: impl Iterator<Item = &'a Listing>,
) -> Vec<(&'a str, Vec<&'a Listing>)> {
    let mut position: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<(&'a str, Vec<&'a Listing>)> = Vec::new();
    for listing in listings {
        let district = listing.district.as_str();
        let idx = *position.entry(district).or_insert_with(|| {
            groups.push((district, Vec::new()));
            groups.len() - 1
        });
        groups[idx].1.push(listing);
    }
    groups
}

fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ---------------------------------------------------------------------------
// Buy / rent ratio
// ---------------------------------------------------------------------------

/// Years of average rent needed to pay a district's average sale price.
#[derive(Debug, Clone, PartialEq)]
pub struct BuyRentRatio {
    pub district: String,
    pub mean_sale_price: f64,
    pub mean_monthly_rent: f64,
    pub mean_annual_rent: f64,
    /// `mean_sale_price / (mean_monthly_rent * 12)`.
    pub ratio: f64,
}

/// Buy/rent ratio per district over the whole dataset, highest first.
///
/// Only districts with both sale and rent listings appear. The current
/// filters never apply: this is a market-wide indicator.
pub fn buy_rent_ratio(dataset: &Dataset) -> Vec<BuyRentRatio> {
    let sale = mean_price_by_district(dataset.scoped(NegotiationType::Sale));
    let rent: HashMap<&str, f64> = mean_price_by_district(dataset.scoped(NegotiationType::Rent))
        .into_iter()
        .collect();

    let mut ratios: Vec<BuyRentRatio> = sale
        .into_iter()
        .filter_map(|(district, mean_sale_price)| {
            let mean_monthly_rent = *rent.get(district)?;
            if mean_monthly_rent <= 0.0 {
                debug!("Skipping {district:?}: mean rent is {mean_monthly_rent}");
                return None;
            }
            let mean_annual_rent = mean_monthly_rent * 12.0;
            Some(BuyRentRatio {
                district: district.to_owned(),
                mean_sale_price,
                mean_monthly_rent,
                mean_annual_rent,
                ratio: mean_sale_price / mean_annual_rent,
            })
        })
        .collect();

    ratios.sort_by(|a, b| descending(Some(a.ratio), Some(b.ratio)));
    ratios
}

fn mean_price_by_district<'a>(listings: impl Iterator<Item = &'a Listing>) -> Vec<(&'a str, f64)> {
    group_by_district(listings)
        .into_iter()
        .filter_map(|(district, rows)| Some((district, mean(rows.iter().map(|l| l.price))?)))
        .collect()
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// One histogram bucket covering `[start, end)`; the last one also
/// includes `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Equal-width histogram of the finite `values`.
///
/// Empty input or zero bins give no bins; a single distinct value gives one
/// bin holding everything.
pub fn histogram(values: impl IntoIterator<Item = f64>, bins: usize) -> Vec<HistogramBin> {
    let values: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    if bins == 0 || values.is_empty() {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if max <= min {
        return vec![HistogramBin {
            start: min,
            end: max,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::apply;

    fn listing(negotiation_type: NegotiationType, district: &str, price: f64, size: f64) -> Listing {
        Listing {
            negotiation_type,
            property_type: "apartment".into(),
            district: district.into(),
            price,
            condo: 0,
            size,
            rooms: 1,
            suites: 0,
            parking: 0,
            toilets: 1,
            elevator: false,
            furnished: false,
            swimming_pool: false,
            is_new: false,
            latitude: None,
            longitude: None,
            price_per_m2: crate::data::process::price_per_m2(price, size),
            total_cost: price,
        }
    }

    fn with_condo(mut l: Listing, condo: i64) -> Listing {
        l.condo = condo;
        l.total_cost = l.price + condo as f64;
        l
    }

    fn whole(dataset: &Dataset) -> FilteredView<'_> {
        dataset.iter().collect()
    }

    #[test]
    fn summary_of_empty_view_is_none() {
        assert_eq!(summary_stats(&FilteredView::default()), None);
    }

    #[test]
    fn summary_means() {
        use NegotiationType::Sale;
        let dataset = Dataset::from_listings(vec![
            with_condo(listing(Sale, "A", 300000.0, 100.0), 500),
            with_condo(listing(Sale, "A", 500000.0, 100.0), 700),
        ]);
        let stats = summary_stats(&whole(&dataset)).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean_price, 400000.0);
        assert_eq!(stats.mean_condo, 600.0);
        assert_eq!(stats.mean_size, 100.0);
        assert_eq!(stats.mean_price_per_m2, Some(4000.0));
        assert_eq!(stats.mean_total_cost, 400600.0);
    }

    #[test]
    fn undefined_price_per_m2_is_left_out_of_means() {
        use NegotiationType::Sale;
        let dataset = Dataset::from_listings(vec![
            listing(Sale, "A", 300000.0, 100.0),
            listing(Sale, "A", 100000.0, 0.0),
        ]);
        let stats = summary_stats(&whole(&dataset)).unwrap();
        assert_eq!(stats.mean_price_per_m2, Some(3000.0));
        assert_eq!(stats.mean_price, 200000.0);

        let only_zero = Dataset::from_listings(vec![listing(Sale, "A", 1.0, 0.0)]);
        let stats = summary_stats(&whole(&only_zero)).unwrap();
        assert_eq!(stats.mean_price_per_m2, None);
    }

    #[test]
    fn district_aggregate_sorts_descending_and_keeps_tie_order() {
        use NegotiationType::Sale;
        let dataset = Dataset::from_listings(vec![
            listing(Sale, "Lapa", 400000.0, 100.0),
            listing(Sale, "Moema", 900000.0, 100.0),
            listing(Sale, "Butantã", 400000.0, 100.0),
            listing(Sale, "Moema", 700000.0, 100.0),
            listing(Sale, "Sé", 1.0, 0.0),
        ]);
        let ranked = district_aggregate(&whole(&dataset), DistrictMetric::PricePerM2);
        let order: Vec<&str> = ranked.iter().map(|a| a.district.as_str()).collect();
        assert_eq!(order, vec!["Moema", "Lapa", "Butantã", "Sé"]);
        assert_eq!(ranked[0].mean_price_per_m2, Some(8000.0));
        assert_eq!(ranked[0].count, 2);
        assert_eq!(ranked[3].mean_price_per_m2, None);
    }

    #[test]
    fn district_aggregate_by_condo() {
        use NegotiationType::Rent;
        let dataset = Dataset::from_listings(vec![
            with_condo(listing(Rent, "Lapa", 2000.0, 50.0), 300),
            with_condo(listing(Rent, "Moema", 4000.0, 50.0), 900),
            with_condo(listing(Rent, "Moema", 4000.0, 50.0), 700),
        ]);
        let ranked = district_aggregate(&whole(&dataset), DistrictMetric::Condo);
        assert_eq!(ranked[0].district, "Moema");
        assert_eq!(ranked[0].mean_condo, 800.0);
        assert_eq!(ranked[1].metric(DistrictMetric::Condo), Some(300.0));
    }

    #[test]
    fn district_aggregate_of_empty_view_is_empty() {
        assert!(district_aggregate(&FilteredView::default(), DistrictMetric::Condo).is_empty());
    }

    #[test]
    fn buy_rent_ratio_for_the_three_listing_scenario() {
        use NegotiationType::*;
        let dataset = Dataset::from_listings(vec![
            listing(Sale, "District A", 300000.0, 100.0),
            listing(Rent, "District A", 2000.0, 50.0),
            listing(Sale, "District B", 500000.0, 100.0),
        ]);
        let ratios = buy_rent_ratio(&dataset);
        assert_eq!(ratios.len(), 1);
        assert_eq!(ratios[0].district, "District A");
        assert_eq!(ratios[0].mean_annual_rent, 24000.0);
        assert_eq!(ratios[0].ratio, 12.5);
    }

    #[test]
    fn buy_rent_ratio_only_joins_districts_with_both_sides() {
        use NegotiationType::*;
        let dataset = Dataset::from_listings(vec![
            listing(Rent, "Only Rent", 2000.0, 50.0),
            listing(Sale, "Both", 240000.0, 100.0),
            listing(Rent, "Both", 1000.0, 50.0),
            listing(Rent, "Both", 1000.0, 50.0),
            listing(Sale, "Cheap", 120000.0, 100.0),
            listing(Rent, "Cheap", 1000.0, 50.0),
            listing(Sale, "Free Rent", 1000.0, 100.0),
            listing(Rent, "Free Rent", 0.0, 50.0),
        ]);
        let ratios = buy_rent_ratio(&dataset);
        let districts: Vec<&str> = ratios.iter().map(|r| r.district.as_str()).collect();
        assert_eq!(districts, vec!["Both", "Cheap"]);
        assert_eq!(ratios[0].ratio, 20.0);
        assert_eq!(ratios[1].ratio, 10.0);
    }

    #[test]
    fn buy_rent_ratio_ignores_filters() {
        use NegotiationType::*;
        let dataset = Dataset::from_listings(vec![
            listing(Sale, "A", 240000.0, 100.0),
            listing(Rent, "A", 1000.0, 50.0),
        ]);
        let domain = crate::data::filter::FilterDomain::scoped(&dataset, Sale).unwrap();
        let mut criteria = crate::data::filter::FilterCriteria::initial(&domain);
        criteria.price = crate::data::filter::Bounds::new(0.0, 0.0);
        assert!(apply(dataset.iter(), &criteria).is_empty());
        assert_eq!(buy_rent_ratio(&dataset).len(), 1);
    }

    #[test]
    fn histogram_bins_cover_the_range() {
        let bins = histogram(vec![0.0, 1.0, 2.5, 9.0, 10.0, f64::NAN], 4);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins[0].start, 0.0);
        assert_eq!(bins[3].end, 10.0);
        let counts: Vec<usize> = bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 1, 0, 2]);
        assert_eq!(bins[0].width(), 2.5);
    }

    #[test]
    fn histogram_edge_cases() {
        assert!(histogram(Vec::<f64>::new(), 10).is_empty());
        assert!(histogram(vec![1.0], 0).is_empty());
        let single = histogram(vec![5.0, 5.0], 10);
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].count, 2);
    }
}
