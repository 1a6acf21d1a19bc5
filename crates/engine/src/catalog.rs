//! The reminder message catalog.

use rand::Rng;

/// Built-in daily reminder variants.
const BUILT_IN: [&str; 10] = [
    "Son las 21:00. ¡Recordatorio de tomar la antibebe! Te amo mucho ❤️",
    "Hora de la pastilla, mi amor. ¡No olvides tomarla! 💕",
    "21:00 - Pastillita time 💊. Te amo ❤️",
    "Recordatorio amoroso: pastilla anticonceptiva. ¡Cuídate, te amo! 😘",
    "💖 Mi amor, son las 21:00. ¡Es hora de tu pastilla anticonceptiva!",
    "¡Hora de la pastilla, mi vida! No te olvides, te amo ❤️",
    "⏰ Recordatorio amoroso: pastilla a las 21:00. ¡Te amo!",
    "💕 Mi reina, hora de tomar tu pastilla. ¡Te cuidas por nosotros!",
    "❤️‍🔥 Amor, son las 9PM. ¡Pastilla time! Cuídate por favor",
    "⭐️ Para la mujer más importante: ¡Recordatorio de pastilla a las 21:00!",
];

/// Ordered, read-only message catalog. Never empty: the built-in variants
/// are always present, and an operator-supplied extra may be appended at
/// load time.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    messages: Vec<String>,
}

impl MessageCatalog {
    /// Build the catalog from the built-in variants plus the optional
    /// `MESSAGE_TEXT` extra.
    pub fn new(extra: Option<String>) -> Self {
        let mut messages: Vec<String> = BUILT_IN.iter().map(|s| s.to_string()).collect();
        if let Some(extra) = extra {
            if !extra.is_empty() {
                messages.push(extra);
            }
        }
        Self { messages }
    }

    /// Uniform-random pick across all entries.
    pub fn pick(&self) -> &str {
        let idx = rand::thread_rng().gen_range(0..self.messages.len());
        &self.messages[idx]
    }

    pub fn entries(&self) -> &[String] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_built_in_catalog_has_ten_variants() {
        let catalog = MessageCatalog::new(None);
        assert_eq!(catalog.len(), 10);
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_operator_extra_is_appended() {
        let catalog = MessageCatalog::new(Some("Recordatorio diario".to_string()));
        assert_eq!(catalog.len(), 11);
        assert_eq!(catalog.entries().last().map(String::as_str), Some("Recordatorio diario"));
    }

    #[test]
    fn test_empty_extra_is_ignored() {
        let catalog = MessageCatalog::new(Some(String::new()));
        assert_eq!(catalog.len(), 10);
    }

    #[test]
    fn test_pick_covers_every_entry_over_many_trials() {
        let catalog = MessageCatalog::new(None);
        let mut seen = HashSet::new();
        for _ in 0..2000 {
            seen.insert(catalog.pick().to_string());
        }
        for entry in catalog.entries() {
            assert!(seen.contains(entry), "entry never picked: {entry}");
        }
    }

    #[test]
    fn test_pick_always_returns_a_catalog_entry() {
        let catalog = MessageCatalog::new(Some("extra".to_string()));
        for _ in 0..100 {
            let picked = catalog.pick().to_string();
            assert!(catalog.entries().iter().any(|m| *m == picked));
        }
    }
}
