pub mod batch;
pub mod capabilities;
pub mod macros;
