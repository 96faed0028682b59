//! Elliott Wave annotation over historical OHLC candles.
//!
//! The analysis runs in three one-way stages: local extrema are extracted
//! from the series ([`wave::extremum`]), grouped into eight-wave `1..5, A..C`
//! cycles ([`wave::assembler`]), and the wave end prices are then rewritten
//! to respect the usual Elliott proportions ([`wave::adjuster`]).
//! [`wave::analyze`] runs all three.

pub mod config;
pub mod error;
pub mod exchange;
pub mod model;
pub mod report;
pub mod wave;
