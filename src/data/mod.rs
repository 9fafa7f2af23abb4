//! External collaborators: instrument universe and daily bar sources.

pub mod csv_dir;
pub mod provider;
pub mod universe;
pub mod yahoo;

pub use csv_dir::CsvDirProvider;
pub use provider::{DataError, DateRange, InMemoryProvider, MarketDataProvider, UniverseProvider};
pub use universe::{parse_instruments, DumpUniverse, StaticUniverse, UniverseFilter};
pub use yahoo::YahooProvider;
