//! Measurement records and the append-only result log.
//!
//! The log is plain delimited text with a fixed header, one record per
//! completed cell, flushed after every append so an interrupted session
//! still leaves a usable prefix behind.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::matrix::Condition;
use crate::BenchResult;

/// Column order of the result log.
pub const RESULT_HEADER: [&str; 6] = ["test", "dataset", "param", "condition", "round", "time"];

/// One timed execution of one matrix cell. `time` is wall-independent
/// process CPU time in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub test: String,
    pub dataset: String,
    pub param: u32,
    pub condition: Condition,
    pub round: u32,
    pub time: f64,
}

/// Serializes [`ResultRecord`]s to a delimited sink.
#[derive(Debug)]
pub struct ResultWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ResultWriter<W> {
    /// Wraps `out` and writes the header line immediately, so a session
    /// that measures nothing still leaves a parseable log.
    ///
    /// # Errors
    ///
    /// Returns an error when the header cannot be written.
    pub fn new(out: W) -> BenchResult<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(out);
        writer.write_record(RESULT_HEADER)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    /// Appends one record and flushes it through.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or the underlying write fails.
    pub fn append(&mut self, record: &ResultRecord) -> BenchResult<()> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Reads a complete result log, header included, from `input`.
///
/// # Errors
///
/// Returns an error when the input is not a valid result log.
pub fn read_results<R: Read>(input: R) -> BenchResult<Vec<ResultRecord>> {
    let mut reader = csv::Reader::from_reader(input);
    let mut records = Vec::new();
    for record in reader.deserialize() {
        let record: ResultRecord = record?;
        records.push(record);
    }
    Ok(records)
}

/// Reads a result log from a file path.
///
/// # Errors
///
/// Returns an error when the file cannot be opened or parsed.
pub fn read_results_path(path: &Path) -> BenchResult<Vec<ResultRecord>> {
    let file = File::open(path)?;
    read_results(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(condition: Condition, round: u32, time: f64) -> ResultRecord {
        ResultRecord {
            test: "reify_n_concepts".to_owned(),
            dataset: "1000".to_owned(),
            param: 2,
            condition,
            round,
            time,
        }
    }

    #[test]
    fn test_header_written_even_for_empty_log() {
        let mut buffer = Vec::new();
        ResultWriter::new(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "test,dataset,param,condition,round,time\n");
    }

    #[test]
    fn test_records_round_trip() {
        let mut buffer = Vec::new();
        {
            let mut writer = ResultWriter::new(&mut buffer).unwrap();
            writer.append(&sample(Condition::Control, 0, 0.25)).unwrap();
            writer.append(&sample(Condition::Optimized, 1, 0.125)).unwrap();
        }

        let records = read_results(buffer.as_slice()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], sample(Condition::Control, 0, 0.25));
        assert_eq!(records[1], sample(Condition::Optimized, 1, 0.125));
    }

    #[test]
    fn test_conditions_serialize_lowercase() {
        let mut buffer = Vec::new();
        {
            let mut writer = ResultWriter::new(&mut buffer).unwrap();
            writer.append(&sample(Condition::Optimized, 0, 1.0)).unwrap();
        }
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains(",optimized,"));
    }
}
