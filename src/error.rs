use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum ExchangeError {
    #[display("failed to connect to {exchange}")]
    Connection { exchange: String },
    #[display("request to {exchange} failed")]
    Request { exchange: String },
    #[display("failed to parse response from {exchange}")]
    ResponseParse { exchange: String },
    #[display("{exchange} does not list symbol {symbol}")]
    UnknownSymbol { exchange: String, symbol: String },
}

#[derive(Debug, Display, Error)]
pub enum AnalysisError {
    #[display("insufficient data: need {required} peaks and valleys, got {available}")]
    InsufficientData { required: usize, available: usize },
    #[display("malformed wave sequence: {reason}")]
    MalformedWaveSequence { reason: String },
}

#[derive(Debug, Display, Error)]
pub enum ReportError {
    #[display("failed to serialize analysis")]
    Serialize,
    #[display("failed to write report")]
    Write,
}
