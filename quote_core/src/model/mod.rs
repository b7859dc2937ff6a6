//! Quote record model.
//!
//! - `record`: `QuoteRecord`, `PricePoint` and the construction rules.
//! - `issue`: per-symbol problems that downgrade a record without aborting the run.
pub mod issue;
pub mod record;

pub use issue::{ProviderCall, SymbolIssue};
pub use record::{
    DateMode, InstrumentKind, LastQuote, PriceSource, PricePoint, ProviderAnswers, QuoteRecord,
};
