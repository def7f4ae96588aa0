//! Bhavcopy data model and the reconciliation pipeline:
//! normalize dates, fetch both schemas, map legacy columns, merge, fan out.

pub mod columns;
pub mod date;
pub mod fanout;
pub mod fetch;
pub mod merge;
pub mod record;
pub mod table;
pub mod value;

pub use columns::{map_columns, ColumnMapping, CASH_MARKET_MAPPING, DERIVATIVES_MAPPING};
pub use date::{normalize, normalize_range, validate_range, DateInput, DateRange};
pub use fanout::{AggregateResult, FailurePolicy, FanOutReport, QuerySpec, SkippedItem};
pub use merge::outer_join;
pub use record::{RecordSet, Row};
pub use table::{Segment, TableId};
pub use value::Value;
