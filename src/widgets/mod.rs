pub mod components;
pub mod traits;
