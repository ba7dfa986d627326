//! Serial collection
//!
//! Scanner input arrives one line at a time (or as a whole text block). The
//! collector tracks how many serials the selected product needs per box and
//! reports `Ready` the moment the count is reached; the caller then runs the
//! print session. The collector never prints anything itself.

use std::collections::HashSet;

/// Ordered serials for one box, trimmed, blank lines dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerialBatch {
    serials: Vec<String>,
}

impl SerialBatch {
    /// One serial per line
    pub fn parse(text: &str) -> Self {
        Self::from_serials(text.lines())
    }

    pub fn from_serials<I, S>(serials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            serials: serials
                .into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.serials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.serials.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.serials
    }

    pub fn into_inner(self) -> Vec<String> {
        self.serials
    }

    /// Serials that appear more than once, each listed once in first-seen order
    pub fn duplicates(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut dups = Vec::new();
        for serial in &self.serials {
            if !seen.insert(serial.as_str()) && reported.insert(serial.as_str()) {
                dups.push(serial.clone());
            }
        }
        dups
    }
}

/// State change reported after each input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectorEvent {
    /// Still collecting; `need` is `None` while no product is selected
    Pending { have: usize, need: Option<usize> },
    /// Count matches the case quantity: the batch is ready to print
    Ready(SerialBatch),
    /// More serials than one box holds
    Overflow { have: usize, need: usize },
}

/// Accumulates scanned serials for the selected product
#[derive(Debug, Clone, Default)]
pub struct BatchCollector {
    target: Option<usize>,
    batch: SerialBatch,
}

impl BatchCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(target: usize) -> Self {
        Self {
            target: Some(target),
            batch: SerialBatch::default(),
        }
    }

    /// Change the expected count (product selection changed) and re-check
    pub fn set_target(&mut self, target: Option<usize>) -> CollectorEvent {
        self.target = target;
        self.check()
    }

    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// Add one scanned line; blank lines are ignored
    pub fn push_line(&mut self, line: &str) -> CollectorEvent {
        let serial = line.trim();
        if !serial.is_empty() {
            self.batch.serials.push(serial.to_string());
        }
        self.check()
    }

    /// Replace the whole input with `text`
    pub fn set_text(&mut self, text: &str) -> CollectorEvent {
        self.batch = SerialBatch::parse(text);
        self.check()
    }

    pub fn batch(&self) -> &SerialBatch {
        &self.batch
    }

    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Drop everything collected so far (after a print, or on operator request)
    pub fn clear(&mut self) {
        self.batch = SerialBatch::default();
    }

    fn check(&self) -> CollectorEvent {
        let have = self.batch.len();
        match self.target {
            Some(need) if need > 0 && have == need => CollectorEvent::Ready(self.batch.clone()),
            Some(need) if need > 0 && have > need => CollectorEvent::Overflow { have, need },
            Some(need) if need > 0 => CollectorEvent::Pending {
                have,
                need: Some(need),
            },
            _ => CollectorEvent::Pending { have, need: None },
        }
    }
}
