mod ramp;
pub use ramp::Ramp;

mod pass_rule;
pub use pass_rule::{LevelVerdict, PassRule};
