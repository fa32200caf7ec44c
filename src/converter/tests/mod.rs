mod scenarios;

use crate::rules::RuleSet;
use crate::settings::ConvertOptions;

use super::Converter;

pub(super) fn converter(options: ConvertOptions) -> Converter {
    Converter::new(options, RuleSet::embedded().unwrap())
}
