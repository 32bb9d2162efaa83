pub mod prompt;
pub mod providers;
pub mod registry;
pub mod validation;
