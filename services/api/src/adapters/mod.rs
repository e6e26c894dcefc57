pub mod completion_llm;
pub mod db;

pub use completion_llm::{DisabledCompletionAdapter, OpenRouterCompletionAdapter};
pub use db::DbAdapter;
