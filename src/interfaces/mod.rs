pub mod subconverter;

pub use subconverter::Subconverter;
