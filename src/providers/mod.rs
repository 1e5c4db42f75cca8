pub mod caching;
pub mod cbr;

pub use caching::CachingRateProvider;
pub use cbr::CbrRateProvider;
