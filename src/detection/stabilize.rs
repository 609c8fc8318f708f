use std::collections::VecDeque;

use crate::models::Circle;

/// Sliding window of per-frame detections that only reports circles seen
/// in every frame of the window.
#[derive(Debug, Clone)]
pub struct CircleBuffer {
    frames: VecDeque<Vec<Circle>>,
    window: usize,
    tolerance_x: u32,
    tolerance_y: u32,
}

impl CircleBuffer {
    pub const DEFAULT_WINDOW: usize = 15;

    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            frames: VecDeque::with_capacity(window),
            window,
            tolerance_x: 10,
            tolerance_y: 6,
        }
    }

    /// Maximum center offset for a detection to join a group
    pub fn with_tolerance(mut self, dx: u32, dy: u32) -> Self {
        self.tolerance_x = dx;
        self.tolerance_y = dy;
        self
    }

    /// Record one frame's detections, evicting the oldest frame when full
    pub fn push(&mut self, circles: Vec<Circle>) {
        if self.frames.len() == self.window {
            self.frames.pop_front();
        }
        self.frames.push_back(circles);
    }

    pub fn is_full(&self) -> bool {
        self.frames.len() == self.window
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Averaged circles whose group collected exactly one detection per frame slot
    pub fn stable_circles(&self) -> Vec<Circle> {
        if !self.is_full() {
            return Vec::new();
        }

        let mut groups: Vec<Vec<Circle>> = Vec::new();
        for circle in self.frames.iter().flatten() {
            let existing = groups
                .iter_mut()
                .find(|g| g[0].is_near(circle, self.tolerance_x, self.tolerance_y));
            match existing {
                Some(group) => group.push(*circle),
                None => groups.push(vec![*circle]),
            }
        }

        groups
            .iter()
            .filter(|g| g.len() == self.window)
            .map(|g| mean_circle(g))
            .collect()
    }
}

impl Default for CircleBuffer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}

/// Component-wise truncated mean
fn mean_circle(group: &[Circle]) -> Circle {
    let n = group.len() as u64;
    let (x, y, r) = group.iter().fold((0u64, 0u64, 0u64), |(x, y, r), c| {
        (x + c.x as u64, y + c.y as u64, r + c.radius as u64)
    });
    Circle::new((x / n) as u32, (y / n) as u32, (r / n) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_until_full() {
        let mut buffer = CircleBuffer::new(3);
        buffer.push(vec![Circle::new(50, 50, 10)]);
        buffer.push(vec![Circle::new(50, 50, 10)]);
        assert!(!buffer.is_full());
        assert!(buffer.stable_circles().is_empty());

        buffer.push(vec![Circle::new(50, 50, 10)]);
        assert_eq!(buffer.stable_circles(), vec![Circle::new(50, 50, 10)]);
    }

    #[test]
    fn test_averages_jittering_detection() {
        let mut buffer = CircleBuffer::new(3);
        buffer.push(vec![Circle::new(100, 40, 12)]);
        buffer.push(vec![Circle::new(105, 43, 13)]);
        buffer.push(vec![Circle::new(108, 45, 15)]);
        // (313 / 3, 128 / 3, 40 / 3) truncated
        assert_eq!(buffer.stable_circles(), vec![Circle::new(104, 42, 13)]);
    }

    #[test]
    fn test_drops_circle_missing_from_one_frame() {
        let mut buffer = CircleBuffer::new(3);
        buffer.push(vec![Circle::new(10, 10, 5), Circle::new(200, 200, 5)]);
        buffer.push(vec![Circle::new(10, 10, 5)]);
        buffer.push(vec![Circle::new(11, 9, 5), Circle::new(200, 200, 5)]);
        assert_eq!(buffer.stable_circles(), vec![Circle::new(10, 9, 5)]);
    }

    #[test]
    fn test_groups_against_first_member_with_axis_tolerances() {
        let mut buffer = CircleBuffer::new(2);
        buffer.push(vec![Circle::new(50, 50, 5)]);
        // within dx = 10 but beyond dy = 6
        buffer.push(vec![Circle::new(55, 57, 5)]);
        assert!(buffer.stable_circles().is_empty());
    }

    #[test]
    fn test_window_slides() {
        let mut buffer = CircleBuffer::new(2);
        buffer.push(vec![Circle::new(300, 300, 9)]);
        buffer.push(vec![Circle::new(20, 20, 9)]);
        buffer.push(vec![Circle::new(20, 20, 9)]);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.stable_circles(), vec![Circle::new(20, 20, 9)]);

        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_duplicate_detection_in_one_frame_drops_group() {
        let mut buffer = CircleBuffer::new(3);
        buffer.push(vec![Circle::new(50, 50, 10), Circle::new(52, 51, 10)]);
        buffer.push(vec![Circle::new(50, 50, 10)]);
        buffer.push(vec![Circle::new(50, 50, 10)]);
        // one group of four members in a window of three
        assert!(buffer.stable_circles().is_empty());
    }

    #[test]
    fn test_output_follows_group_creation_order() {
        let mut buffer = CircleBuffer::new(2);
        buffer.push(vec![Circle::new(200, 100, 8), Circle::new(20, 20, 8)]);
        buffer.push(vec![Circle::new(20, 20, 8), Circle::new(200, 100, 8)]);
        assert_eq!(
            buffer.stable_circles(),
            vec![Circle::new(200, 100, 8), Circle::new(20, 20, 8)]
        );
    }
}
