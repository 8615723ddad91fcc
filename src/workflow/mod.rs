pub mod print;
pub mod report;
pub mod types;

pub use print::Printer;
pub use report::{RepoOutcome, RunReport};
pub use types::Outcome;
