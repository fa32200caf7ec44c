pub mod cabocha;
pub mod converter;
pub mod model;
pub mod pipeline;
pub mod rules;
pub mod settings;
pub mod ud;
pub mod unicode;

#[cfg(test)]
mod testutil;

pub use converter::{ConvertError, ConvertStats, Converter};
pub use rules::RuleSet;
pub use settings::{parse_options_toml, ConvertOptions};
