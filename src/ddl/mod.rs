// Relation building and CREATE TABLE synthesis
pub mod relation_builder;
pub mod synthesizer;
pub mod type_renderer;

#[cfg(test)]
mod tests;

pub use relation_builder::*;
pub use synthesizer::*;
pub use type_renderer::*;
