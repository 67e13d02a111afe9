//! Decision-event trace: a plain-language record of the choices each pass
//! made, so a generation run can be audited or replayed for debugging
//! without re-deriving intent from RNG consumption alone.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecisionEvent {
    pub system: String,
    pub question: String,
    pub options: Vec<String>,
    pub chosen: String,
    pub reason: String,
    pub confidence: f64,
    pub rng_consumed: u32,
}

impl DecisionEvent {
    pub fn new(
        system: impl Into<String>,
        question: impl Into<String>,
        chosen: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            system: system.into(),
            question: question.into(),
            options: Vec::new(),
            chosen: chosen.into(),
            reason: reason.into(),
            confidence: 1.0,
            rng_consumed: 0,
        }
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_rng_consumed(mut self, count: u32) -> Self {
        self.rng_consumed = count;
        self
    }
}

/// An append-only log of decisions made over one generation run, grouped
/// implicitly by the order passes ran in.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DecisionTrace {
    events: Vec<DecisionEvent>,
}

impl DecisionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: DecisionEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[DecisionEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_preserve_insertion_order() {
        let mut trace = DecisionTrace::new();
        trace.record(DecisionEvent::new("bsp", "split axis?", "horizontal", "wider than tall"));
        trace.record(DecisionEvent::new("bsp", "split axis?", "vertical", "taller than wide"));
        assert_eq!(trace.events()[0].chosen, "horizontal");
        assert_eq!(trace.events()[1].chosen, "vertical");
    }

    #[test]
    fn confidence_is_clamped() {
        let event = DecisionEvent::new("x", "q", "a", "r").with_confidence(5.0);
        assert_eq!(event.confidence, 1.0);
    }
}
