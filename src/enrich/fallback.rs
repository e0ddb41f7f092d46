//! Fallback rules for environment variable values.
//!
//! # Responsibilities
//! - Hold a validator and a replacement generator per variable
//! - Keep the process-wide rule table (last registration for a name wins)
//!
//! # Design Decisions
//! - Rules with a blank variable name are ignored, not rejected
//! - A missing validator means "never invalid"
//! - A missing generator keeps the raw value even when it is invalid

use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::schema::{FallbackCondition, FallbackConfig};

pub type Validator = Arc<dyn Fn(&str) -> bool + Send + Sync>;
pub type Generator = Arc<dyn Fn() -> String + Send + Sync>;

/// True for empty or whitespace-only strings.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Validator and replacement generator for one environment variable.
#[derive(Clone)]
pub struct FallbackRule {
    variable_name: String,
    validator: Option<Validator>,
    generator: Option<Generator>,
}

impl FallbackRule {
    /// Create a rule with neither validator nor generator.
    pub fn new(variable_name: impl Into<String>) -> Self {
        Self {
            variable_name: variable_name.into(),
            validator: None,
            generator: None,
        }
    }

    pub fn with_validator(mut self, validator: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn with_generator(mut self, generator: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.generator = Some(Arc::new(generator));
        self
    }

    /// Build a rule from a configuration file entry.
    pub fn from_config(config: &FallbackConfig) -> Self {
        let value = config.value.clone();
        let rule = FallbackRule::new(config.variable.clone()).with_generator(move || value.clone());
        match config.when {
            FallbackCondition::Blank => rule.with_validator(is_blank),
            FallbackCondition::Empty => rule.with_validator(str::is_empty),
            FallbackCondition::Always => rule.with_validator(|_| true),
        }
    }

    pub fn variable_name(&self) -> &str {
        &self.variable_name
    }

    pub fn is_invalid(&self, value: &str) -> bool {
        self.validator.as_ref().is_some_and(|validate| validate(value))
    }

    pub fn generate_fallback(&self) -> Option<String> {
        self.generator.as_ref().map(|generate| generate())
    }

    /// Apply the rule to a raw value.
    pub fn resolve(&self, raw: String) -> String {
        if !self.is_invalid(&raw) {
            return raw;
        }
        self.generate_fallback().unwrap_or(raw)
    }
}

impl fmt::Debug for FallbackRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackRule")
            .field("variable_name", &self.variable_name)
            .field("has_validator", &self.validator.is_some())
            .field("has_generator", &self.generator.is_some())
            .finish()
    }
}

/// Rule table keyed by variable name.
///
/// Read on every snapshot computation; written during startup.
#[derive(Debug, Default)]
pub struct FallbackRegistry {
    rules: DashMap<String, Arc<FallbackRule>>,
}

impl FallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from configuration entries, in order.
    pub fn from_config(rules: &[FallbackConfig]) -> Self {
        let registry = Self::new();
        for rule in rules {
            registry.register(FallbackRule::from_config(rule));
        }
        registry
    }

    /// Insert or overwrite the rule for its variable.
    ///
    /// Returns false (and stores nothing) if the variable name is blank.
    pub fn register(&self, rule: FallbackRule) -> bool {
        if is_blank(rule.variable_name()) {
            return false;
        }
        tracing::debug!(variable = %rule.variable_name(), "Registered fallback rule");
        self.rules.insert(rule.variable_name.clone(), Arc::new(rule));
        true
    }

    pub fn lookup(&self, variable_name: &str) -> Option<Arc<FallbackRule>> {
        self.rules.get(variable_name).map(|r| Arc::clone(r.value()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_ignored() {
        let registry = FallbackRegistry::new();
        assert!(!registry.register(FallbackRule::new("   ")));
        assert!(!registry.register(FallbackRule::new("")));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = FallbackRegistry::new();
        registry.register(FallbackRule::new("APP_NAME").with_validator(is_blank).with_generator(|| "first".into()));
        registry.register(FallbackRule::new("APP_NAME").with_validator(is_blank).with_generator(|| "second".into()));

        assert_eq!(registry.len(), 1);
        let rule = registry.lookup("APP_NAME").unwrap();
        assert_eq!(rule.resolve(String::new()), "second");
        assert!(registry.lookup("OTHER").is_none());
    }

    #[test]
    fn test_resolve() {
        let rule = FallbackRule::new("APP_NAME")
            .with_validator(is_blank)
            .with_generator(|| "Default App".into());
        assert_eq!(rule.resolve("  ".into()), "Default App");
        assert_eq!(rule.resolve("real".into()), "real");

        // No generator: invalid value is kept
        let rule = FallbackRule::new("APP_NAME").with_validator(is_blank);
        assert_eq!(rule.resolve("".into()), "");

        // No validator: never invalid
        let rule = FallbackRule::new("APP_NAME").with_generator(|| "unused".into());
        assert!(!rule.is_invalid(""));
        assert_eq!(rule.resolve("".into()), "");
    }

    #[test]
    fn test_from_config() {
        let empty_only = FallbackRule::from_config(&FallbackConfig {
            variable: "APP_ENV".into(),
            when: FallbackCondition::Empty,
            value: "development".into(),
        });
        assert_eq!(empty_only.resolve("".into()), "development");
        assert_eq!(empty_only.resolve(" ".into()), " ");

        let always = FallbackRule::from_config(&FallbackConfig {
            variable: "APP_ENV".into(),
            when: FallbackCondition::Always,
            value: "pinned".into(),
        });
        assert_eq!(always.resolve("production".into()), "pinned");
    }
}
