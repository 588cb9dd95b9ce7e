//! Provider resolution - dispatch from a variant name to a concrete executor
//!
//! A registry maps a selection attribute (SQL engine, platform family) to the
//! provider variant that handles it. Resolution is pure: it only decides which
//! executor handles a resource, it never executes anything. An unknown variant
//! is a configuration error, never a silent default.

use anyhow::Result;
use std::sync::Arc;

/// A named table of provider variants for one capability
///
/// `P` is typically a trait object, e.g. `ProviderRegistry<dyn SqlProvider>`.
/// Providers are stored as `Arc` so resolved variants can be shared with the
/// resources that use them.
pub struct ProviderRegistry<P: ?Sized> {
    capability: &'static str,
    variants: Vec<(String, Arc<P>)>,
}

impl<P: ?Sized> ProviderRegistry<P> {
    /// Create an empty registry for a named capability
    ///
    /// The capability name only appears in error messages ("database",
    /// "platform").
    pub fn new(capability: &'static str) -> Self {
        Self {
            capability,
            variants: Vec::new(),
        }
    }

    /// Register a provider under a variant name, replacing any previous one
    pub fn register(&mut self, variant: impl Into<String>, provider: Arc<P>) {
        let variant = variant.into();
        self.variants.retain(|(name, _)| name != &variant);
        self.variants.push((variant, provider));
    }

    /// Resolve the provider for a variant name
    pub fn resolve(&self, variant: &str) -> Result<Arc<P>> {
        self.variants
            .iter()
            .find(|(name, _)| name == variant)
            .map(|(_, provider)| Arc::clone(provider))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "no {} provider registered for variant '{variant}' (known: {})",
                    self.capability,
                    self.variant_names().join(", ")
                )
            })
    }

    /// Names of all registered variants
    pub fn variant_names(&self) -> Vec<&str> {
        self.variants.iter().map(|(name, _)| name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync + std::fmt::Debug {
        fn greet(&self) -> &'static str;
    }

    #[derive(Debug)]
    struct English;
    impl Greeter for English {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }

    #[derive(Debug)]
    struct French;
    impl Greeter for French {
        fn greet(&self) -> &'static str {
            "bonjour"
        }
    }

    #[test]
    fn test_resolve_known_variant() {
        let mut registry: ProviderRegistry<dyn Greeter> = ProviderRegistry::new("greeter");
        registry.register("en", Arc::new(English));
        registry.register("fr", Arc::new(French));

        assert_eq!(registry.resolve("fr").unwrap().greet(), "bonjour");
    }

    #[test]
    fn test_unknown_variant_is_config_error() {
        let mut registry: ProviderRegistry<dyn Greeter> = ProviderRegistry::new("greeter");
        registry.register("en", Arc::new(English));

        let err = registry.resolve("de").unwrap_err().to_string();
        assert!(err.contains("greeter"));
        assert!(err.contains("'de'"));
        assert!(err.contains("en"));
    }

    #[test]
    fn test_register_replaces_same_variant() {
        let mut registry: ProviderRegistry<dyn Greeter> = ProviderRegistry::new("greeter");
        registry.register("x", Arc::new(English));
        registry.register("x", Arc::new(French));

        assert_eq!(registry.variant_names(), ["x"]);
        assert_eq!(registry.resolve("x").unwrap().greet(), "bonjour");
    }
}
