//! Extract stage: delimited files and the remote rate feed.

pub mod delimited;
pub mod remote;

pub use delimited::{load_csv, write_csv, CoercionRule, LoadOptions, NullPolicy};
pub use remote::{fetch_rates, RateDocument, RateEntry, RateFetch, RateSource};
