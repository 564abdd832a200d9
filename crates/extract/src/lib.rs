pub mod client;
pub mod error;
pub mod params;
pub mod schema;

pub use client::{ExtractConfig, ExtractionClient, TripletExtractor};
pub use error::ExtractionError;
pub use params::{ConfigError, FixedParams, LengthRamp, ParameterScheduler, SchedulerConfig};
pub use schema::{ExtractionOutcome, ExtractionParameters, Triplet};
