pub mod cards;
pub mod cli;
pub mod combos;
pub mod display;
pub mod error;
pub mod grader;
pub mod play;
pub mod range;
pub mod sampler;
pub mod session;
pub mod spots;
pub mod stats;
pub mod tree;
