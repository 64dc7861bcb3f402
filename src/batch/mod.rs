pub mod io;
pub mod pipeline;
pub mod types;

pub use io::{CsvRecordSink, CsvRecordSource, RecordSink, ResultWriter};
pub use pipeline::{generate, run_batch, value_record, CancellationFlag, Valuations, Variation};
pub use types::{BatchSummary, Valuation, ValuationResult};
