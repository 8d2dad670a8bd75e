use serde::Serialize;

pub const SCROLLED_AFTER: f32 = 50.0;
pub const HEADER_OFFSET: f32 = 80.0;

/// Header and menu state driven by scrolling and link clicks.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Navigation {
    menu_open: bool,
    scrolled: bool,
}

impl Navigation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn scrolled(&self) -> bool {
        self.scrolled
    }

    /// Flips the mobile menu, returning the new state.
    pub fn toggle_menu(&mut self) -> bool {
        self.menu_open = !self.menu_open;
        self.menu_open
    }

    pub fn on_scroll(&mut self, scroll_y: f32) {
        self.scrolled = scroll_y > SCROLLED_AFTER;
    }

    /// Follows an in-page link to a section at `target_offset`. Closes the
    /// mobile menu and returns where to scroll, or `None` for a bare `#`.
    pub fn follow_anchor(&mut self, href: &str, target_offset: f32) -> Option<f32> {
        if href == "#" || !href.starts_with('#') {
            return None;
        }
        if self.menu_open {
            self.toggle_menu();
        }
        Some(target_offset - HEADER_OFFSET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_marks_scrolled_past_threshold() {
        let mut nav = Navigation::new();
        nav.on_scroll(50.0);
        assert!(!nav.scrolled());
        nav.on_scroll(51.0);
        assert!(nav.scrolled());
        nav.on_scroll(0.0);
        assert!(!nav.scrolled());
    }

    #[test]
    fn anchor_closes_menu_and_offsets_target() {
        let mut nav = Navigation::new();
        assert!(nav.toggle_menu());
        assert_eq!(nav.follow_anchor("#pricing", 1200.0), Some(1120.0));
        assert!(!nav.menu_open());
    }

    #[test]
    fn bare_hash_is_ignored() {
        let mut nav = Navigation::new();
        nav.toggle_menu();
        assert_eq!(nav.follow_anchor("#", 300.0), None);
        assert!(nav.menu_open());
    }
}
