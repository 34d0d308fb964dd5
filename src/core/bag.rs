//! Bag randomizer - shuffled 7-bag piece sequence
//!
//! The queue is topped up by appending a freshly shuffled full bag whenever
//! it holds 7 pieces or fewer, so at least one full bag of lookahead is
//! available at all times and the gap between repeats of one kind is
//! bounded (at most 12 draws).
//!
//! Randomness is a small LCG (Numerical Recipes constants) plus a
//! Fisher-Yates shuffle; seeding it makes sequences reproducible in tests.

use arrayvec::ArrayVec;

use crate::types::PieceKind;

/// Queue capacity: one refill tops out at 14 pieces and a hold swap can
/// push one more back to the front.
const QUEUE_CAP: usize = 16;

/// Refill whenever the queue drops to this length or below
const REFILL_WATERMARK: usize = 7;

/// Simple LCG (Linear Congruential Generator) RNG
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        self.next_u32() % max
    }

    /// Shuffle a slice using Fisher-Yates
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_range((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }
}

/// Unbounded sequence of piece kinds with the 7-bag repeat guarantee
#[derive(Debug, Clone)]
pub struct PieceBag {
    queue: ArrayVec<PieceKind, QUEUE_CAP>,
    rng: SimpleRng,
}

impl PieceBag {
    /// Create an empty bag; the first draw fills it
    pub fn new(seed: u32) -> Self {
        Self {
            queue: ArrayVec::new(),
            rng: SimpleRng::new(seed),
        }
    }

    /// Append shuffled full bags until more than one bag is queued
    fn top_up(&mut self) {
        while self.queue.len() <= REFILL_WATERMARK {
            let mut bag = PieceKind::ALL;
            self.rng.shuffle(&mut bag);
            self.queue.extend(bag);
        }
    }

    /// Draw the next kind, refilling first if the lookahead ran low
    pub fn draw(&mut self) -> PieceKind {
        self.top_up();
        self.queue.remove(0)
    }

    /// Non-destructive view of the next `count` kinds
    pub fn peek(&self, count: usize) -> Vec<PieceKind> {
        self.queue.iter().take(count).copied().collect()
    }

    /// Put a kind back at the front of the queue (hold swap return path)
    pub fn push_front(&mut self, kind: PieceKind) {
        self.queue.insert(0, kind);
    }

    /// Empty the queue; the rng state survives, so the next draw starts a
    /// fresh sequence independent of prior draws
    pub fn reset(&mut self) {
        self.queue.clear();
    }

    /// Number of queued kinds
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True when no kinds are queued (before the first draw / after reset)
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_deterministic() {
        let mut rng1 = SimpleRng::new(12345);
        let mut rng2 = SimpleRng::new(12345);
        for _ in 0..100 {
            assert_eq!(rng1.next_u32(), rng2.next_u32());
        }
    }

    #[test]
    fn test_first_bag_is_a_permutation() {
        let mut bag = PieceBag::new(1);
        let mut drawn = Vec::new();
        for _ in 0..7 {
            drawn.push(bag.draw());
        }
        for kind in PieceKind::ALL {
            assert_eq!(drawn.iter().filter(|&&k| k == kind).count(), 1, "{:?}", kind);
        }
    }

    #[test]
    fn test_lookahead_never_drops_below_one_bag() {
        let mut bag = PieceBag::new(99);
        for _ in 0..50 {
            bag.draw();
            assert!(bag.len() > REFILL_WATERMARK - 1);
        }
    }

    #[test]
    fn test_repeat_gap_is_bounded() {
        let mut bag = PieceBag::new(7);
        let mut last_seen = std::collections::HashMap::new();
        for draw in 0..500usize {
            let kind = bag.draw();
            if let Some(prev) = last_seen.insert(kind, draw) {
                // At most 12 other kinds between two draws of the same kind
                assert!(draw - prev <= 13, "{:?} gap {}", kind, draw - prev);
            }
        }
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut bag = PieceBag::new(5);
        // Prime the queue
        let first = bag.draw();
        let preview = bag.peek(5);
        assert_eq!(preview.len(), 5);
        assert_ne!(bag.len(), 0);
        let next = bag.draw();
        assert_eq!(preview[0], next);
        let _ = first;
    }

    #[test]
    fn test_push_front_is_drawn_next() {
        let mut bag = PieceBag::new(3);
        bag.draw();
        bag.push_front(PieceKind::T);
        assert_eq!(bag.draw(), PieceKind::T);
    }

    #[test]
    fn test_reset_restarts_sequence() {
        let mut bag = PieceBag::new(42);
        for _ in 0..10 {
            bag.draw();
        }
        bag.reset();
        assert!(bag.is_empty());
        // Draw works again and delivers a full fresh bag of lookahead
        bag.draw();
        assert!(bag.len() >= REFILL_WATERMARK);
    }
}
