//! Carousel position state

use serde::{Deserialize, Serialize};

/// Which way a manual navigation moves the carousel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Next,
    Prev,
}

/// Slide position of the carousel driven by autoplay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarouselState {
    /// Zero-based index of the visible slide
    pub position: u32,
    /// Number of slides, at least one
    pub slides: u32,
    /// Advances triggered by autoplay since startup
    pub autoplay_advances: u64,
}

impl CarouselState {
    /// Create a carousel showing the first of `slides` slides
    pub fn new(slides: u32) -> Self {
        Self {
            position: 0,
            slides: slides.max(1),
            autoplay_advances: 0,
        }
    }

    /// Move one slide in `direction`, wrapping at either end
    pub fn step(&mut self, direction: Direction) {
        self.position = match direction {
            Direction::Next => (self.position + 1) % self.slides,
            Direction::Prev if self.position == 0 => self.slides - 1,
            Direction::Prev => self.position - 1,
        };
    }

    /// Advance on behalf of autoplay
    pub fn autoplay_step(&mut self) {
        self.step(Direction::Next);
        self.autoplay_advances += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_wraps_both_ways() {
        let mut carousel = CarouselState::new(3);
        carousel.step(Direction::Prev);
        assert_eq!(carousel.position, 2);
        carousel.step(Direction::Next);
        assert_eq!(carousel.position, 0);
    }

    #[test]
    fn step_back_on_largest_carousel() {
        let mut carousel = CarouselState::new(u32::MAX);
        carousel.position = 5;
        carousel.step(Direction::Prev);
        assert_eq!(carousel.position, 4);

        carousel.position = 0;
        carousel.step(Direction::Prev);
        assert_eq!(carousel.position, u32::MAX - 1);
        carousel.step(Direction::Next);
        assert_eq!(carousel.position, 0);
    }

    #[test]
    fn single_slide_stays_put() {
        let mut carousel = CarouselState::new(0);
        assert_eq!(carousel.slides, 1);
        carousel.autoplay_step();
        assert_eq!(carousel.position, 0);
        assert_eq!(carousel.autoplay_advances, 1);
    }
}
