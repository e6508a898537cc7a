pub mod assembler;
pub mod error;
pub mod pipeline;
pub mod reconciler;
pub mod risk;
pub mod symbols;
pub mod traits;
pub mod validator;

pub use error::{EngineError, PipelineError, Stage};
pub use pipeline::SignalPipeline;
pub use risk::RiskSettings;
pub use symbols::SymbolAliases;
pub use traits::{Broker, MarketData};
