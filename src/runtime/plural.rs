//! CLDR plural categories.
//!
//! The resolver only needs "which category does this number fall into for
//! this locale", so that is all [`PluralService`] exposes. [`CldrPlurals`]
//! answers it from the CLDR rules bundled with `intl_pluralrules`, caching one
//! rule set per locale and rule type.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use intl_pluralrules::{operands::PluralOperands, PluralRuleType, PluralRules};
use once_cell::sync::Lazy;
use tracing::debug;
use unic_langid::LanguageIdentifier;

use crate::runtime::value::{NumberKind, NumberValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    /// The variant key that selects this category.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::One => "one",
            Self::Two => "two",
            Self::Few => "few",
            Self::Many => "many",
            Self::Other => "other",
        }
    }
}

impl From<intl_pluralrules::PluralCategory> for PluralCategory {
    fn from(category: intl_pluralrules::PluralCategory) -> Self {
        use intl_pluralrules::PluralCategory as Cldr;
        match category {
            Cldr::ZERO => Self::Zero,
            Cldr::ONE => Self::One,
            Cldr::TWO => Self::Two,
            Cldr::FEW => Self::Few,
            Cldr::MANY => Self::Many,
            Cldr::OTHER => Self::Other,
        }
    }
}

/// Maps a number to its plural category in a locale.
pub trait PluralService: Send + Sync {
    fn category(&self, number: &NumberValue, locale: &LanguageIdentifier) -> PluralCategory;
}

type RuleKey = (LanguageIdentifier, NumberKind);

/// CLDR-backed plural rules.
///
/// Unknown locales fall back to their bare language, then to `Other` for
/// every number.
#[derive(Default)]
pub struct CldrPlurals {
    cache: Mutex<HashMap<RuleKey, Option<Arc<PluralRules>>>>,
}

impl CldrPlurals {
    pub fn new() -> Self {
        Self::default()
    }

    fn rules(&self, locale: &LanguageIdentifier, kind: NumberKind) -> Option<Arc<PluralRules>> {
        let key = (locale.clone(), kind);
        let mut cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache
            .entry(key)
            .or_insert_with(|| load_rules(locale, kind).map(Arc::new))
            .clone()
    }
}

fn load_rules(locale: &LanguageIdentifier, kind: NumberKind) -> Option<PluralRules> {
    let rule_type = match kind {
        NumberKind::Cardinal => PluralRuleType::CARDINAL,
        NumberKind::Ordinal => PluralRuleType::ORDINAL,
    };
    if let Ok(rules) = PluralRules::create(locale.clone(), rule_type) {
        return Some(rules);
    }
    let language = LanguageIdentifier::from_parts(locale.language, None, None, &[]);
    match PluralRules::create(language, rule_type) {
        Ok(rules) => Some(rules),
        Err(_) => {
            debug!(%locale, "no plural rules for locale; every number selects 'other'");
            None
        }
    }
}

impl PluralService for CldrPlurals {
    fn category(&self, number: &NumberValue, locale: &LanguageIdentifier) -> PluralCategory {
        let Some(rules) = self.rules(locale, number.options.kind) else {
            return PluralCategory::Other;
        };
        // Operands come from the formatted text so visible fraction digits count.
        let formatted = number.format();
        PluralOperands::try_from(formatted.as_str())
            .ok()
            .and_then(|operands| rules.select(operands).ok())
            .map(PluralCategory::from)
            .unwrap_or(PluralCategory::Other)
    }
}

static DEFAULT_PLURALS: Lazy<CldrPlurals> = Lazy::new(CldrPlurals::new);

/// The process-wide shared rule cache.
pub fn default_plurals() -> &'static CldrPlurals {
    &DEFAULT_PLURALS
}
