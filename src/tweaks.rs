//! Live-editable render parameters.
//!
//! Passes register the knobs they expose (exposure, bloom strength) as
//! shared cells; an external control panel mutates the same cells between
//! frames and the passes read them when they next render. The engine is
//! single-threaded per frame, so `Rc<Cell<_>>` is the whole protocol.

use std::cell::Cell;
use std::rc::Rc;

/// A value shared between a render pass and whatever edits it.
pub type Shared<T> = Rc<Cell<T>>;

/// One registered parameter with its display range.
pub struct Tweak {
    pub name: String,
    pub min: f32,
    pub max: f32,
    pub value: Shared<f32>,
}

/// Registry of every live parameter in the renderer.
#[derive(Default)]
pub struct Tweaks {
    entries: Vec<Tweak>,
}

impl Tweaks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameter and hand back the cell the owner reads.
    pub fn register(&mut self, name: &str, min: f32, max: f32, initial: f32) -> Shared<f32> {
        let value = Rc::new(Cell::new(initial));
        self.entries.push(Tweak {
            name: name.to_string(),
            min,
            max,
            value: value.clone(),
        });
        value
    }

    pub fn get(&self, name: &str) -> Option<&Tweak> {
        self.entries.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tweak> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_are_visible_through_the_registry() {
        let mut tweaks = Tweaks::new();
        let exposure = tweaks.register("exposure", 0.0, 8.0, 1.0);
        tweaks.get("exposure").unwrap().value.set(2.5);
        assert_eq!(exposure.get(), 2.5);
    }

    #[test]
    fn registration_keeps_the_initial_value() {
        let mut tweaks = Tweaks::new();
        let strength = tweaks.register("bloom_strength", 0.0, 1.0, 0.04);
        assert_eq!(strength.get(), 0.04);
        assert_eq!(tweaks.iter().count(), 1);
    }
}
