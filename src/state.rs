use log::{debug, info};

use crate::config::{self, Config};
use crate::data::aggregate::{
    buy_rent_ratio, district_aggregate, histogram, summary_stats, BuyRentRatio,
    DistrictAggregate, DistrictMetric, HistogramBin, SummaryStats,
};
use crate::data::error::DashboardError;
use crate::data::filter::{filtered_indices, view_of, FilterCriteria, FilterDomain, FilteredView};
use crate::data::loader;
use crate::data::model::{Dataset, NegotiationType};
use crate::data::process::{process_with_report, ProcessReport};

// ---------------------------------------------------------------------------
// Results of one recompute pass
// ---------------------------------------------------------------------------

/// Everything the central panel renders for the current criteria.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewResults {
    /// `None` when no listing matches.
    pub summary: Option<SummaryStats>,
    pub by_price_per_m2: Vec<DistrictAggregate>,
    pub by_condo: Vec<DistrictAggregate>,
    pub price_histogram: Vec<HistogramBin>,
    pub size_histogram: Vec<HistogramBin>,
}

impl ViewResults {
    pub fn compute(view: &FilteredView<'_>, bins: usize) -> Self {
        ViewResults {
            summary: summary_stats(view),
            by_price_per_m2: district_aggregate(view, DistrictMetric::PricePerM2),
            by_condo: district_aggregate(view, DistrictMetric::Condo),
            price_histogram: histogram(view.iter().map(|l| l.price), bins),
            size_histogram: histogram(view.iter().map(|l| l.size), bins),
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full dashboard state, independent of rendering.
pub struct AppState {
    pub dataset: Dataset,

    /// Cleaning counters from startup.
    pub report: ProcessReport,

    pub display: config::Display,

    /// Selected negotiation type (None only for an empty dataset).
    pub negotiation: Option<NegotiationType>,

    /// Options and ranges for the selected negotiation type.
    pub domain: Option<FilterDomain>,

    /// Current criteria; `None` when the domain is empty.
    pub criteria: Option<FilterCriteria>,

    /// Indices of listings passing the current criteria (cached).
    pub visible_indices: Vec<usize>,

    pub results: ViewResults,

    /// Market-wide, computed once over the unfiltered dataset.
    pub ratios: Vec<BuyRentRatio>,
}

/// Load, clean and wrap the configured dataset.
///
/// # Errors
///
/// Returns the fatal [`DashboardError`] the UI shows instead of the charts.
pub fn bootstrap(config: &Config) -> Result<AppState, DashboardError> {
    let raw = loader::load(&config.data.path)?;
    let (dataset, report) = process_with_report(raw)?;
    Ok(AppState::new(dataset, report, config.display))
}

impl AppState {
    pub fn new(dataset: Dataset, report: ProcessReport, display: config::Display) -> Self {
        let ratios = buy_rent_ratio(&dataset);
        info!("Buy/rent ratio available for {} districts", ratios.len());

        let mut state = AppState {
            negotiation: None,
            domain: None,
            criteria: None,
            visible_indices: Vec::new(),
            results: ViewResults::default(),
            ratios,
            dataset,
            report,
            display,
        };
        if let Some(first) = state.dataset.negotiation_types().first().copied() {
            state.select_negotiation(first);
        }
        state
    }

    /// Switch negotiation type: rebuild the domain and reset criteria to
    /// its defaults, preselecting the most common districts.
    pub fn select_negotiation(&mut self, negotiation: NegotiationType) {
        self.negotiation = Some(negotiation);
        self.domain = FilterDomain::scoped(&self.dataset, negotiation);
        self.criteria = self.domain.as_ref().map(|domain| {
            let mut criteria = FilterCriteria::initial(domain);
            criteria.districts = domain
                .most_common_districts(self.display.default_districts)
                .into_iter()
                .collect();
            criteria
        });
        self.recompute();
    }

    /// Replace the criteria. Returns whether anything was recomputed.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) -> bool {
        if self.criteria.as_ref() == Some(&criteria) {
            return false;
        }
        if self.negotiation != Some(criteria.negotiation_type) {
            self.negotiation = Some(criteria.negotiation_type);
            self.domain = FilterDomain::scoped(&self.dataset, criteria.negotiation_type);
        }
        self.criteria = Some(criteria);
        self.recompute();
        true
    }

    /// One full Filter → Aggregate pass for the current criteria.
    pub fn recompute(&mut self) {
        self.visible_indices = match &self.criteria {
            Some(criteria) => filtered_indices(&self.dataset, criteria),
            None => Vec::new(),
        };
        let view = view_of(&self.dataset, &self.visible_indices);
        self.results = ViewResults::compute(&view, self.display.histogram_bins);
        debug!(
            "Recomputed: {} of {} listings visible",
            self.visible_indices.len(),
            self.dataset.len()
        );
    }

    /// Listings passing the current criteria.
    pub fn visible(&self) -> FilteredView<'_> {
        view_of(&self.dataset, &self.visible_indices)
    }
}
