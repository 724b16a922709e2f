//! A lock-free queue of film tiles; workers pop tiles until the queue
//! is drained.

// std
use std::sync::atomic::{AtomicUsize, Ordering};
// lumen
use crate::core::geometry::{Bounds2i, Point2i};

pub const TILE_SIZE: i32 = 16;

pub struct BlockQueue {
    resolution: Point2i,
    tile_size: i32,
    tiles_x: i32,
    tiles_y: i32,
    counter: AtomicUsize,
}

impl BlockQueue {
    pub fn new(resolution: Point2i, tile_size: i32) -> Self {
        let tiles_x: i32 = (resolution.x + tile_size - 1) / tile_size;
        let tiles_y: i32 = (resolution.y + tile_size - 1) / tile_size;
        BlockQueue {
            resolution,
            tile_size,
            tiles_x,
            tiles_y,
            counter: AtomicUsize::new(0),
        }
    }
    pub fn num_blocks(&self) -> usize {
        (self.tiles_x * self.tiles_y) as usize
    }
    /// Pop the next tile, or None when the frame is fully assigned.
    /// Tiles are numbered in scanline order so renders are
    /// deterministic in the pixel index regardless of thread count.
    pub fn next(&self) -> Option<(usize, Bounds2i)> {
        let index: usize = self.counter.fetch_add(1, Ordering::AcqRel);
        if index >= self.num_blocks() {
            return None;
        }
        let tx: i32 = index as i32 % self.tiles_x;
        let ty: i32 = index as i32 / self.tiles_x;
        let p_min: Point2i = Point2i {
            x: tx * self.tile_size,
            y: ty * self.tile_size,
        };
        let p_max: Point2i = Point2i {
            x: (p_min.x + self.tile_size).min(self.resolution.x),
            y: (p_min.y + self.tile_size).min(self.resolution.y),
        };
        Some((index, Bounds2i::new(p_min, p_max)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiles_cover_film_exactly_once() {
        let queue = BlockQueue::new(Point2i::new(37, 21), 16);
        let mut covered: Vec<bool> = vec![false; 37 * 21];
        while let Some((_, bounds)) = queue.next() {
            for p in bounds.points() {
                let idx: usize = (p.y * 37 + p.x) as usize;
                assert!(!covered[idx], "pixel covered twice");
                covered[idx] = true;
            }
        }
        assert!(covered.iter().all(|&c| c));
    }

    #[test]
    fn test_block_count() {
        let queue = BlockQueue::new(Point2i::new(64, 64), 16);
        assert_eq!(queue.num_blocks(), 16);
    }
}
