use std::collections::{BTreeMap, BTreeSet};

use super::model::{Dataset, Listing, NegotiationType};

// ---------------------------------------------------------------------------
// Bounds – inclusive numeric range
// ---------------------------------------------------------------------------

/// Inclusive `[min, max]` range used by every numeric filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Bounds<T> {
    pub fn new(min: T, max: T) -> Self {
        Bounds { min, max }
    }

    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }

    /// Keep `min <= max` after one end was moved past the other.
    pub fn clamped(self) -> Self {
        if self.min > self.max {
            Bounds {
                min: self.min,
                max: self.min,
            }
        } else {
            self
        }
    }

    /// Smallest range covering every value; `None` for no values.
    fn spanning(values: impl IntoIterator<Item = T>) -> Option<Self> {
        values.into_iter().fold(None, |acc: Option<Self>, v| {
            Some(match acc {
                None => Bounds { min: v, max: v },
                Some(b) => Bounds {
                    min: if v < b.min { v } else { b.min },
                    max: if v > b.max { v } else { b.max },
                },
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Filter domain: what the controls can offer for one negotiation type
// ---------------------------------------------------------------------------

/// Options and full ranges of the listings of one negotiation type.
///
/// Property types and districts depend on the negotiation type, so the
/// domain is rebuilt whenever it changes.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDomain {
    pub negotiation_type: NegotiationType,
    /// Sorted.
    pub property_types: Vec<String>,
    /// Sorted.
    pub districts: Vec<String>,
    pub district_counts: BTreeMap<String, usize>,
    pub price: Bounds<f64>,
    pub size: Bounds<f64>,
    pub rooms: Bounds<i64>,
    pub parking: Bounds<i64>,
    pub len: usize,
}

impl FilterDomain {
    /// Build the domain for `negotiation_type`, or `None` when the dataset
    /// holds no listing of that type.
    pub fn scoped(dataset: &Dataset, negotiation_type: NegotiationType) -> Option<Self> {
        let scoped: Vec<&Listing> = dataset.scoped(negotiation_type).collect();

        let price = Bounds::spanning(scoped.iter().map(|l| l.price))?;
        let size = Bounds::spanning(scoped.iter().map(|l| l.size))?;
        let rooms = Bounds::spanning(scoped.iter().map(|l| l.rooms))?;
        let parking = Bounds::spanning(scoped.iter().map(|l| l.parking))?;

        let property_types: BTreeSet<&str> =
            scoped.iter().map(|l| l.property_type.as_str()).collect();

        let mut district_counts: BTreeMap<String, usize> = BTreeMap::new();
        for l in &scoped {
            *district_counts.entry(l.district.clone()).or_default() += 1;
        }

        Some(FilterDomain {
            negotiation_type,
            property_types: property_types.into_iter().map(str::to_owned).collect(),
            districts: district_counts.keys().cloned().collect(),
            district_counts,
            price,
            size,
            rooms,
            parking,
            len: scoped.len(),
        })
    }

    /// The `n` districts with the most listings; ties go to the name first
    /// in sort order.
    pub fn most_common_districts(&self, n: usize) -> Vec<String> {
        let mut ranked: Vec<(&String, &usize)> = self.district_counts.iter().collect();
        // `district_counts` iterates by name, and the sort is stable.
        ranked.sort_by(|a, b| b.1.cmp(a.1));
        ranked.into_iter().take(n).map(|(d, _)| d.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Filter criteria
// ---------------------------------------------------------------------------

/// Amenities the user requires. An unset toggle places no constraint; it
/// never means "must be absent".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AmenityToggles {
    pub elevator: bool,
    pub furnished: bool,
    pub swimming_pool: bool,
    pub new: bool,
}

impl AmenityToggles {
    pub fn admits(&self, listing: &Listing) -> bool {
        (!self.elevator || listing.elevator)
            && (!self.furnished || listing.furnished)
            && (!self.swimming_pool || listing.swimming_pool)
            && (!self.new || listing.is_new)
    }
}

/// Everything that decides which listings are visible.
///
/// A fresh value is built on each interaction; comparing it with the
/// previous one tells whether anything needs recomputing.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub negotiation_type: NegotiationType,
    pub property_type: String,
    /// Empty means every district.
    pub districts: BTreeSet<String>,
    pub price: Bounds<f64>,
    pub size: Bounds<f64>,
    /// `None` disables the rooms filter.
    pub rooms: Option<Bounds<i64>>,
    /// `None` disables the parking filter.
    pub parking: Option<Bounds<i64>>,
    pub amenities: AmenityToggles,
}

impl FilterCriteria {
    /// Criteria matching every listing of the domain's first property type.
    pub fn initial(domain: &FilterDomain) -> Self {
        FilterCriteria {
            negotiation_type: domain.negotiation_type,
            property_type: domain.property_types.first().cloned().unwrap_or_default(),
            districts: BTreeSet::new(),
            price: domain.price,
            size: domain.size,
            rooms: Some(domain.rooms),
            parking: Some(domain.parking),
            amenities: AmenityToggles::default(),
        }
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        listing.negotiation_type == self.negotiation_type
            && listing.property_type == self.property_type
            && self.price.contains(listing.price)
            && self.size.contains(listing.size)
            && self.rooms.map_or(true, |r| r.contains(listing.rooms))
            && self.parking.map_or(true, |p| p.contains(listing.parking))
            && (self.districts.is_empty() || self.districts.contains(&listing.district))
            && self.amenities.admits(listing)
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// Listings matching some criteria, in their original relative order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredView<'a> {
    rows: Vec<&'a Listing>,
}

impl<'a> FilteredView<'a> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Listing> + '_ {
        self.rows.iter().copied()
    }

    pub fn as_slice(&self) -> &[&'a Listing] {
        &self.rows
    }
}

impl<'a> FromIterator<&'a Listing> for FilteredView<'a> {
    fn from_iter<I: IntoIterator<Item = &'a Listing>>(iter: I) -> Self {
        FilteredView {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Keep the listings matching `criteria`, preserving order.
pub fn apply<'a, I>(listings: I, criteria: &FilterCriteria) -> FilteredView<'a>
where
    I: IntoIterator<Item = &'a Listing>,
{
    listings
        .into_iter()
        .filter(|l| criteria.matches(l))
        .collect()
}

/// Return indices of listings that pass `criteria`.
pub fn filtered_indices(dataset: &Dataset, criteria: &FilterCriteria) -> Vec<usize> {
    dataset
        .iter()
        .enumerate()
        .filter(|(_, l)| criteria.matches(l))
        .map(|(i, _)| i)
        .collect()
}

/// Rebuild a view from indices produced by [`filtered_indices`].
pub fn view_of<'a>(dataset: &'a Dataset, indices: &[usize]) -> FilteredView<'a> {
    indices
        .iter()
        .filter_map(|&i| dataset.listings.get(i))
        .collect()
}
