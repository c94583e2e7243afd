//! Node key generation
//!
//! Keys are stable node identities for consumers outside the engine. They are
//! handed out once, when a node is created, and survive edits. The generator
//! is an explicit object owned by an editing session so tests can reset it
//! without leaking state between runs.

use std::fmt;

type KeyFn = Box<dyn FnMut() -> String>;

/// Monotonic key generator
pub struct KeyGenerator {
    next: u64,
    custom: Option<KeyFn>,
}

impl KeyGenerator {
    /// Create a generator that yields "0", "1", "2", ...
    pub fn new() -> Self {
        Self { next: 0, custom: None }
    }

    /// Create a generator that starts counting at `next`
    pub fn starting_at(next: u64) -> Self {
        Self { next, custom: None }
    }

    /// Produce the next key
    pub fn generate(&mut self) -> String {
        if let Some(custom) = self.custom.as_mut() {
            return custom();
        }

        let key = self.next.to_string();
        self.next += 1;
        key
    }

    /// Restart the counter and drop any custom function
    pub fn reset(&mut self) {
        self.next = 0;
        self.custom = None;
    }

    /// Replace the generating function
    pub fn set<F>(&mut self, f: F)
    where
        F: FnMut() -> String + 'static,
    {
        self.custom = Some(Box::new(f));
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeyGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyGenerator")
            .field("next", &self.next)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_monotonic_keys() {
        let mut keys = KeyGenerator::new();
        assert_eq!(keys.generate(), "0");
        assert_eq!(keys.generate(), "1");
        assert_eq!(keys.generate(), "2");
    }

    #[test]
    fn test_reset_restarts_sequence() {
        let mut keys = KeyGenerator::starting_at(40);
        assert_eq!(keys.generate(), "40");
        keys.reset();
        assert_eq!(keys.generate(), "0");
    }

    #[test]
    fn test_custom_generator() {
        let mut keys = KeyGenerator::new();
        let mut n = 0;
        keys.set(move || {
            n += 1;
            format!("k{}", n)
        });
        assert_eq!(keys.generate(), "k1");
        assert_eq!(keys.generate(), "k2");

        keys.reset();
        assert_eq!(keys.generate(), "0");
    }
}
