//! Table location, lookups and joins over immutable sheet grids

pub mod aggregator;
pub mod extractor;
pub mod header;
pub mod lookup;
pub mod pipeline;
pub mod splitter;

pub use aggregator::{aggregate, AggregateOutcome};
pub use extractor::RowExtractor;
pub use header::{find_header, HeaderLocation, HeaderScanner, LabelSet};
pub use lookup::{build_quantity_lookup, build_summary_lookup, QuantityLookup, SummaryLookup};
pub use pipeline::{consolidate, Consolidation};
pub use splitter::{split_by_vendor, SplitPlan, VendorGroup};
