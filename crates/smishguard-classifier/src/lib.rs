//! smishguard-classifier: decides whether a text message is smishing.
//!
//! Stage 1 checks the message and any URLs in it against known fraudulent
//! items. Stage 2 retrieves similar known examples and asks the reasoning
//! service, whose free-text answer is parsed into a `Verdict`.

pub mod known;
pub mod parser;
pub mod pipeline;
pub mod urls;

pub use known::{KnownItemStore, StoreError};
pub use parser::{parse_response, TemplateVersion};
pub use pipeline::SmishingClassifier;
pub use urls::extract_urls;
