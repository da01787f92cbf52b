mod analyze;
mod run;

pub use analyze::{analyze, analyze_to};
pub use run::{execute, run};
