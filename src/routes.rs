//! Route Registry
//!
//! Informational listing of the application's registered URL patterns, shown
//! on 404 pages so a mistyped path can be compared against what the
//! application actually serves. Populated by the embedding application at
//! startup.

use serde::Serialize;

/// One registered URL pattern.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct RequestMapping {
    /// URL pattern, e.g. `/products/{id}`.
    pub pattern: String,
    /// HTTP methods the pattern is mapped for; empty means all.
    pub methods: Vec<String>,
}

/// Registry of request mappings for the 404 listing.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    mappings: Vec<RequestMapping>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, pattern: impl Into<String>, methods: Vec<String>) {
        self.mappings.push(RequestMapping {
            pattern: pattern.into(),
            methods,
        });
    }

    /// All registered mappings, sorted by pattern for stable display.
    pub fn mappings(&self) -> Vec<RequestMapping> {
        let mut sorted = self.mappings.clone();
        sorted.sort();
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mappings_are_listed_sorted_by_pattern() {
        let mut registry = RouteRegistry::new();
        registry.register("/products/{id}", vec!["GET".to_string()]);
        registry.register("/cart", vec!["GET".to_string(), "POST".to_string()]);

        let mappings = registry.mappings();
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[0].pattern, "/cart");
        assert_eq!(mappings[1].pattern, "/products/{id}");
    }
}
