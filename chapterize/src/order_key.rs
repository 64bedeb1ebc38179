//! Order keys and order codes derived from rendered heading numbers

use crate::numbering::Alphabet;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Default number of components encoded in an order code
pub const DEFAULT_ORDER_CODE_DEPTH: usize = 3;

/// Largest component an order code can spell with two digits
pub const MAX_CODE_COMPONENT: u32 = 99;

/// Errors mapping a number token to an order key
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderKeyError {
    /// A letter component is outside the supported Cyrillic and Latin alphabets
    #[error("letter '{letter}' is outside the supported alphabets")]
    AmbiguousLetterMapping {
        /// The offending letter
        letter: char,
    },

    /// A component is neither an integer nor a single letter
    #[error("component '{component}' is neither a number nor a single letter")]
    InvalidComponent {
        /// The offending component
        component: String,
    },
}

/// Ordering identity of a heading: one non-negative integer per depth
///
/// Letters map to their 1-based alphabet position, so `Б.1` and `2.1`
/// share the same key `[2, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct OrderKey {
    /// Key components, outermost first
    pub parts: Vec<u32>,
}

impl OrderKey {
    /// Create a key from its components
    pub fn new(parts: Vec<u32>) -> Self {
        Self { parts }
    }

    /// Map a raw number token to an order key
    ///
    /// Accepted shapes:
    /// * `""` - empty key, the caller falls back to document order
    /// * `"1.2.3"`, `"1-2"` - numeric components
    /// * `"Б.1"`, `"A.1.2"` - leading letter followed by numeric components
    /// * `"Приложение Б"`, `"Appendix C"` - words followed by a single letter
    ///
    /// # Returns
    /// * `Ok(OrderKey)` - Successfully mapped key
    /// * `Err(OrderKeyError)` - A letter outside the supported alphabets or a
    ///   component that is neither a number nor a single letter
    pub fn from_token(token: &str) -> Result<Self, OrderKeyError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(Self::default());
        }

        // Appendix words precede the number: "Приложение Б" keeps only "Б"
        let number = token.split_whitespace().last().unwrap_or(token);

        let mut parts = Vec::new();
        for (index, component) in number
            .split(['.', '-'])
            .filter(|c| !c.is_empty())
            .enumerate()
        {
            if let Ok(value) = component.parse::<u32>() {
                parts.push(value);
                continue;
            }

            let mut chars = component.chars();
            match (chars.next(), chars.next()) {
                (Some(letter), None) if index == 0 && letter.is_alphabetic() => {
                    let ordinal = Alphabet::ordinal_of(letter)
                        .ok_or(OrderKeyError::AmbiguousLetterMapping { letter })?;
                    parts.push(ordinal);
                }
                _ => {
                    return Err(OrderKeyError::InvalidComponent {
                        component: component.to_string(),
                    })
                }
            }
        }

        Ok(Self { parts })
    }

    /// True when no explicit number was recoverable
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Leading component, if any
    pub fn first(&self) -> Option<u32> {
        self.parts.first().copied()
    }

    /// The first `depth` components
    pub fn prefix(&self, depth: usize) -> &[u32] {
        &self.parts[..depth.min(self.parts.len())]
    }

    /// Whether this key continues `parent` for its first `depth` components
    pub fn extends(&self, parent: &OrderKey, depth: usize) -> bool {
        self.parts.len() >= depth
            && parent.parts.len() >= depth
            && self.prefix(depth) == parent.prefix(depth)
    }

    /// A key made of this key's first `depth` components followed by `last`
    pub fn child(&self, depth: usize, last: u32) -> OrderKey {
        let mut parts: Vec<u32> = self.prefix(depth).to_vec();
        parts.resize(depth, 0);
        parts.push(last);
        OrderKey { parts }
    }

    /// Fixed-width order code used for file and folder names
    ///
    /// Each of the first `max_depth` components is zero-padded to two digits;
    /// missing components render as `00` and deeper ones are ignored.
    /// Components above [`MAX_CODE_COMPONENT`] are clamped to it.
    /// `[2, 1]` with `max_depth = 3` gives `"020100"`.
    pub fn order_code(&self, max_depth: usize) -> String {
        (0..max_depth)
            .map(|i| {
                let part = self.parts.get(i).copied().unwrap_or(0);
                format!("{:02}", part.min(MAX_CODE_COMPONENT))
            })
            .collect()
    }

    /// Whether a component inside the order code is too large for two digits
    pub fn overflows_code(&self, max_depth: usize) -> bool {
        self.parts
            .iter()
            .take(max_depth)
            .any(|&part| part > MAX_CODE_COMPONENT)
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parts.is_empty() {
            return write!(f, "(none)");
        }
        let s = self
            .parts
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{}", s)
    }
}

impl From<Vec<u32>> for OrderKey {
    fn from(parts: Vec<u32>) -> Self {
        Self { parts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(token: &str) -> Vec<u32> {
        OrderKey::from_token(token).unwrap().parts
    }

    #[test]
    fn test_numeric_tokens() {
        assert_eq!(key("1.2.3"), vec![1, 2, 3]);
        assert_eq!(key("2-1"), vec![2, 1]);
        assert_eq!(key("10"), vec![10]);
        assert_eq!(key(""), Vec::<u32>::new());
    }

    #[test]
    fn test_letter_tokens() {
        assert_eq!(key("Б.1")[0], 2);
        assert_eq!(key("Приложение Б")[0], 2);
        assert_eq!(key("A.1.2"), vec![1, 1, 2]);
        assert_eq!(key("Appendix C"), vec![3]);
        assert_eq!(key("Приложение А"), key("A"));
    }

    #[test]
    fn test_letter_outside_alphabets() {
        assert_eq!(
            OrderKey::from_token("Ω.1"),
            Err(OrderKeyError::AmbiguousLetterMapping { letter: 'Ω' })
        );
        assert_eq!(
            OrderKey::from_token("Appendix Ä"),
            Err(OrderKeyError::AmbiguousLetterMapping { letter: 'Ä' })
        );
    }

    #[test]
    fn test_invalid_component() {
        assert!(matches!(
            OrderKey::from_token("IV.2"),
            Err(OrderKeyError::InvalidComponent { .. })
        ));
        assert!(matches!(
            OrderKey::from_token("1.A"),
            Err(OrderKeyError::InvalidComponent { .. })
        ));
    }

    #[test]
    fn test_order_code() {
        assert_eq!(OrderKey::new(vec![2, 1]).order_code(3), "020100");
        assert_eq!(OrderKey::new(vec![1]).order_code(3), "010000");
        assert_eq!(OrderKey::new(vec![1, 2, 3, 4]).order_code(3), "010203");
        assert_eq!(OrderKey::default().order_code(3), "000000");
        assert_eq!(OrderKey::new(vec![3, 4]).order_code(2), "0304");
    }

    #[test]
    fn test_order_code_stays_fixed_width() {
        let year = OrderKey::new(vec![2024]);
        assert_eq!(year.order_code(3), "990000");
        assert!(year.overflows_code(3));
        assert!(!OrderKey::new(vec![1, 2, 150]).overflows_code(2));
    }

    #[test]
    fn test_extends_and_child() {
        let parent = OrderKey::new(vec![2]);
        assert!(OrderKey::new(vec![2, 1]).extends(&parent, 1));
        assert!(!OrderKey::new(vec![3, 1]).extends(&parent, 1));
        assert!(!OrderKey::default().extends(&parent, 1));
        assert_eq!(parent.child(1, 4).parts, vec![2, 4]);
        assert_eq!(OrderKey::default().child(1, 4).parts, vec![0, 4]);
    }

    #[test]
    fn test_ordering() {
        let a = OrderKey::from_token("1.2").unwrap();
        let b = OrderKey::from_token("1.10").unwrap();
        let c = OrderKey::from_token("Б.1").unwrap();
        assert!(a < b);
        assert!(b < c);
        assert_eq!(c.to_string(), "2.1");
    }
}
