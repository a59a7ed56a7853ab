// src/core/mod.rs — Engine core: types, completion plumbing, orchestration

pub mod completion;
pub mod engine;
pub mod response;
pub mod token;
pub mod types;

pub use completion::{Callbacks, Continuation, Dispatcher, Outcome, Pending};
pub use engine::Engine;
pub use response::{RecordingSink, ResponseContext, ResponseLoop, ResultSink};
pub use token::{Origin, TokenContext, TokenHandle};
pub use types::{DefinitionBlob, Identifier, Metadata};
