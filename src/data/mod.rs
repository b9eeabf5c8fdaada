//! Price history loading and alignment

pub mod history;
pub mod price_loader;

// Re-export commonly used types
pub use history::{PriceHistory, PriceSeries};
pub use price_loader::{load_price_csv, load_price_series};
