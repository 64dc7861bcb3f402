//! CSV record sources and sinks.
//!
//! Sources and sinks own their reader/writer, so the underlying file is closed
//! when they are dropped on any exit path. Sinks must still be [`finish`]ed to
//! surface flush errors.
//!
//! [`finish`]: RecordSink::finish

use super::types::ValuationResult;
use crate::contract::RawRecord;
use crate::error::ValuationError;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

/// Destination for generated records, written one at a time.
pub trait RecordSink {
    fn write_record(&mut self, record: &RawRecord) -> Result<(), ValuationError>;

    /// Flush buffered output. Called once after the last record.
    fn finish(&mut self) -> Result<(), ValuationError> {
        Ok(())
    }
}

impl RecordSink for Vec<RawRecord> {
    fn write_record(&mut self, record: &RawRecord) -> Result<(), ValuationError> {
        self.push(record.clone());
        Ok(())
    }
}

/// Header-labeled CSV rows read lazily as [`RawRecord`]s.
///
/// Columns are matched by header name, so their order in the file is free. A row
/// the CSV layer cannot decode (wrong field count, missing column, invalid UTF-8)
/// yields a [`ValuationError::Source`] item and reading continues with the next row.
pub struct CsvRecordSource<R: Read> {
    records: csv::DeserializeRecordsIntoIter<R, RawRecord>,
}

impl CsvRecordSource<File> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ValuationError> {
        let reader = csv::Reader::from_path(path).map_err(ValuationError::Source)?;
        Ok(Self {
            records: reader.into_deserialize(),
        })
    }
}

impl<R: Read> CsvRecordSource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            records: csv::Reader::from_reader(reader).into_deserialize(),
        }
    }
}

impl<R: Read> Iterator for CsvRecordSource<R> {
    type Item = Result<RawRecord, ValuationError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records
            .next()
            .map(|record| record.map_err(ValuationError::Source))
    }
}

/// Writes [`RawRecord`]s as CSV, with a header row before the first record.
pub struct CsvRecordSink<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvRecordSink<File> {
    pub fn to_path(path: impl AsRef<Path>) -> Result<Self, ValuationError> {
        let writer = csv::Writer::from_path(path).map_err(ValuationError::Sink)?;
        Ok(Self { writer })
    }
}

impl<W: Write> CsvRecordSink<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W, ValuationError> {
        self.writer
            .into_inner()
            .map_err(|err| {
                ValuationError::Io(io::Error::new(err.error().kind(), err.to_string()))
            })
    }
}

impl<W: Write> RecordSink for CsvRecordSink<W> {
    fn write_record(&mut self, record: &RawRecord) -> Result<(), ValuationError> {
        self.writer.serialize(record).map_err(ValuationError::Sink)
    }

    fn finish(&mut self) -> Result<(), ValuationError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Output row for one valuation result. Contract columns are empty for rows that
/// failed before a contract existed.
#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    row: usize,
    option_type: Option<&'static str>,
    price: Option<f64>,
    strike: Option<f64>,
    interest_rate: Option<f64>,
    volatility: Option<f64>,
    time_to_maturity: Option<f64>,
    amount_underlying: Option<u32>,
    value: Option<f64>,
    error: Option<&'a str>,
}

/// Streams valuation results to CSV as they are produced.
pub struct ResultWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl ResultWriter<File> {
    pub fn to_path(path: impl AsRef<Path>) -> Result<Self, ValuationError> {
        let writer = csv::Writer::from_path(path).map_err(ValuationError::Sink)?;
        Ok(Self { writer })
    }
}

impl<W: Write> ResultWriter<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }

    pub fn write(&mut self, result: &ValuationResult) -> Result<(), ValuationError> {
        let error_text;
        let row = match &result.outcome {
            Ok(valuation) => {
                let contract = &valuation.contract;
                ResultRow {
                    row: result.row,
                    option_type: Some(contract.kind().as_str()),
                    price: Some(contract.spot()),
                    strike: Some(contract.strike()),
                    interest_rate: Some(contract.rate()),
                    volatility: Some(contract.volatility()),
                    time_to_maturity: Some(contract.time_to_maturity()),
                    amount_underlying: Some(contract.quantity()),
                    value: Some(valuation.price),
                    error: None,
                }
            }
            Err(err) => {
                error_text = err.to_string();
                ResultRow {
                    row: result.row,
                    option_type: None,
                    price: None,
                    strike: None,
                    interest_rate: None,
                    volatility: None,
                    time_to_maturity: None,
                    amount_underlying: None,
                    value: None,
                    error: Some(&error_text),
                }
            }
        };
        self.writer.serialize(row).map_err(ValuationError::Sink)
    }

    pub fn finish(&mut self) -> Result<(), ValuationError> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W, ValuationError> {
        self.writer
            .into_inner()
            .map_err(|err| {
                ValuationError::Io(io::Error::new(err.error().kind(), err.to_string()))
            })
    }
}
