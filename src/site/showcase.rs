use crate::palette::{Rgb, parse_hex_color};
use serde::Serialize;

pub const AUTO_ADVANCE_SECONDS: f32 = 8.0;

/// Rotating testimonials. Prev/next wrap around; a timer advances every
/// eight seconds unless the page is hidden when it fires.
#[derive(Debug, Clone, Serialize)]
pub struct TestimonialSlider {
    count: usize,
    current: usize,
    #[serde(skip)]
    timer: f32,
}

impl TestimonialSlider {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            current: 0,
            timer: 0.0,
        }
    }

    /// Index of the shown testimonial, `None` when there are none.
    pub fn current(&self) -> Option<usize> {
        (self.count > 0).then_some(self.current)
    }

    pub fn next(&mut self) -> Option<usize> {
        if self.count > 0 {
            self.current = (self.current + 1) % self.count;
        }
        self.current()
    }

    pub fn prev(&mut self) -> Option<usize> {
        if self.count > 0 {
            self.current = (self.current + self.count - 1) % self.count;
        }
        self.current()
    }

    /// Runs the auto-advance timer for `dt` seconds.
    pub fn tick(&mut self, dt: f32, hidden: bool) -> Option<usize> {
        self.timer += dt;
        while self.timer >= AUTO_ADVANCE_SECONDS {
            self.timer -= AUTO_ADVANCE_SECONDS;
            if !hidden {
                self.next();
            }
        }
        self.current()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub desc: &'static str,
    pub specs: &'static [&'static str],
    pub color: &'static str,
}

impl ClassInfo {
    pub fn rgb(&self) -> Rgb {
        parse_hex_color(self.color).unwrap_or((255, 255, 255))
    }
}

pub const CLASSES: [ClassInfo; 13] = [
    ClassInfo {
        id: "warrior",
        name: "Warrior",
        desc: "Dominate the battlefield with our optimized Warrior rotations. Built from the ground up to maximize your damage, survivability, and utility in any situation.",
        specs: &["Arms", "Fury", "Protection"],
        color: "#C69B6D",
    },
    ClassInfo {
        id: "paladin",
        name: "Paladin",
        desc: "Righteous power meets optimal DPS. Our Paladin rotations ensure that you're always using the right abilities at the right time, whether healing, tanking, or dealing damage.",
        specs: &["Holy", "Protection", "Retribution"],
        color: "#F48CBA",
    },
    ClassInfo {
        id: "hunter",
        name: "Hunter",
        desc: "Master the wilderness with precision. Our Hunter rotations maximize your pet management, trap usage, and damage rotation for peak performance.",
        specs: &["Beast Mastery", "Marksmanship", "Survival"],
        color: "#AAD372",
    },
    ClassInfo {
        id: "rogue",
        name: "Rogue",
        desc: "Strike from the shadows with deadly efficiency. Our Rogue rotations optimize your energy usage, combo point generation, and cooldown management.",
        specs: &["Assassination", "Outlaw", "Subtlety"],
        color: "#FFF468",
    },
    ClassInfo {
        id: "priest",
        name: "Priest",
        desc: "Channel divine power or shadow magic with equal mastery. Our Priest rotations adapt to healing demands or maximize damage output based on your spec.",
        specs: &["Discipline", "Holy", "Shadow"],
        color: "#FFFFFF",
    },
    ClassInfo {
        id: "shaman",
        name: "Shaman",
        desc: "Command the elements with precision. Our Shaman rotations help you unleash nature's fury, heal allies, or bolster your team with perfect timing.",
        specs: &["Elemental", "Enhancement", "Restoration"],
        color: "#0070DD",
    },
    ClassInfo {
        id: "mage",
        name: "Mage",
        desc: "Harness arcane, fire, and frost with unmatched skill. Our Mage rotations maximize your spell sequences, procs, and cooldown usage for optimal damage.",
        specs: &["Arcane", "Fire", "Frost"],
        color: "#3FC7EB",
    },
    ClassInfo {
        id: "warlock",
        name: "Warlock",
        desc: "Master the dark arts with demonic precision. Our Warlock rotations optimize your DoT management, demon control, and soul shard usage for maximum damage.",
        specs: &["Affliction", "Demonology", "Destruction"],
        color: "#8788EE",
    },
    ClassInfo {
        id: "monk",
        name: "Monk",
        desc: "Balance mind, body, and spirit for perfect harmony. Our Monk rotations maximize your Chi generation, utilization, and ability timing.",
        specs: &["Brewmaster", "Mistweaver", "Windwalker"],
        color: "#00FF98",
    },
    ClassInfo {
        id: "druid",
        name: "Druid",
        desc: "Shapeshift with purpose and precision. Our Druid rotations adapt to every form and role, ensuring optimal performance whether you're healing, tanking, or dealing damage.",
        specs: &["Balance", "Feral", "Guardian", "Restoration"],
        color: "#FF7C0A",
    },
    ClassInfo {
        id: "demon-hunter",
        name: "Demon Hunter",
        desc: "Unleash your inner demon with calculated aggression. Our Demon Hunter rotations optimize your Fury generation, eye beam timing, and metamorphosis usage.",
        specs: &["Havoc", "Vengeance"],
        color: "#A330C9",
    },
    ClassInfo {
        id: "death-knight",
        name: "Death Knight",
        desc: "Command the power of death with cold precision. Our Death Knight rotations maximize your rune usage, disease management, and cooldown timing.",
        specs: &["Blood", "Frost", "Unholy"],
        color: "#C41E3A",
    },
    ClassInfo {
        id: "evoker",
        name: "Evoker",
        desc: "Channel the power of the dragonflights with draconic precision. Our Evoker rotations optimize your empowered spells and cooldown usage for maximum effectiveness.",
        specs: &["Devastation", "Preservation", "Augmentation"],
        color: "#33937F",
    },
];

const DEFAULT_CLASS: usize = 6;

/// Class icons in the showcase; one is active at a time.
#[derive(Debug, Clone)]
pub struct ClassSelector {
    active: usize,
}

impl Default for ClassSelector {
    fn default() -> Self {
        Self {
            active: DEFAULT_CLASS,
        }
    }
}

impl ClassSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> &'static ClassInfo {
        &CLASSES[self.active]
    }

    /// Activates `id` and returns its data. Unknown ids change nothing.
    pub fn select(&mut self, id: &str) -> Option<&'static ClassInfo> {
        let index = CLASSES.iter().position(|class| class.id == id)?;
        self.active = index;
        tracing::debug!(class = id, "class selected");
        Some(&CLASSES[index])
    }

    pub fn next(&mut self) -> &'static ClassInfo {
        self.active = (self.active + 1) % CLASSES.len();
        self.active()
    }

    pub fn prev(&mut self) -> &'static ClassInfo {
        self.active = (self.active + CLASSES.len() - 1) % CLASSES.len();
        self.active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slider_wraps_both_ways() {
        let mut slider = TestimonialSlider::new(3);
        assert_eq!(slider.prev(), Some(2));
        assert_eq!(slider.next(), Some(0));
        assert_eq!(slider.next(), Some(1));
        assert_eq!(TestimonialSlider::new(0).next(), None);
    }

    #[test]
    fn slider_auto_advances_unless_hidden() {
        let mut slider = TestimonialSlider::new(3);
        assert_eq!(slider.tick(7.9, false), Some(0));
        assert_eq!(slider.tick(0.2, false), Some(1));
        assert_eq!(slider.tick(8.0, true), Some(1));
        assert_eq!(slider.tick(16.0, false), Some(0));
    }

    #[test]
    fn every_class_has_a_valid_color_and_specs() {
        assert_eq!(CLASSES.len(), 13);
        for class in &CLASSES {
            assert!(parse_hex_color(class.color).is_some(), "{}", class.id);
            assert!(!class.specs.is_empty());
        }
        assert_eq!(CLASSES[DEFAULT_CLASS].id, "mage");
    }

    #[test]
    fn selecting_marks_active_and_ignores_unknown_ids() {
        let mut selector = ClassSelector::new();
        let druid = selector.select("druid").unwrap();
        assert_eq!(druid.specs.len(), 4);
        assert_eq!(selector.active().id, "druid");

        assert!(selector.select("bard").is_none());
        assert_eq!(selector.active().id, "druid");
    }

    #[test]
    fn cycling_wraps_around_the_roster() {
        let mut selector = ClassSelector::new();
        selector.select("evoker");
        assert_eq!(selector.next().id, "warrior");
        assert_eq!(selector.prev().id, "evoker");
    }
}
