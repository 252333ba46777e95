//! Serial ingestion: line parsing and record accumulation

pub mod accumulator;
pub mod line_parser;

pub use accumulator::{AccumulatorPhase, RecordAccumulator};
pub use line_parser::LineParser;
