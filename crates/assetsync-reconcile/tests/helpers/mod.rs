pub mod fakes;
pub mod fixtures;
