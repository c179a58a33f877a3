//! Hello World contract.
//!
//! Unrelated to the escrow machine; ships in the same deployment bundle.

/// Stateless greeter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HelloWorld;

impl HelloWorld {
    pub fn new() -> Self {
        Self
    }

    pub fn greet(&self) -> &'static str {
        "Hello, World!"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greets_the_world() {
        assert_eq!(HelloWorld::new().greet(), "Hello, World!");
    }
}
