//! Identifier sources for newly created people.

/// Produces fresh person ids.
pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

/// `{prefix}-1`, `{prefix}-2`, ...
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    counter: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
        }
    }

    /// Continues numbering after `counter`.
    pub fn starting_after(prefix: impl Into<String>, counter: u64) -> Self {
        Self {
            prefix: prefix.into(),
            counter,
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("{}-{}", self.prefix, self.counter)
    }
}

impl<F> IdGenerator for F
where
    F: FnMut() -> String,
{
    fn next_id(&mut self) -> String {
        self()
    }
}
