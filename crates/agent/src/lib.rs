//! Extraction orchestration: lexical pass first, oracle fallback second.

pub mod oracle;
pub mod orchestrator;

pub use oracle::{
    HttpOracleClient, OracleAmount, OracleClient, OracleError, OracleExtraction, OracleProduct,
    OracleReply,
};
pub use orchestrator::{Extraction, ExtractionOrchestrator};
