//! Block queue and raster byte ring buffer: the two resources shared
//! between the protocol layer (producer) and the step ISR (consumer).
//!
//! Thin wrappers around `heapless::spsc::Queue` so the orphan rule lets us
//! implement `motion_core`'s collaborator traits on them. The raster ring
//! additionally wraps every read in a critical section, since its producer
//! is the serial RX interrupt and its consumer is the step ISR at a
//! different priority.

use cortex_m::interrupt;
use heapless::spsc::Queue;

use motion_core::{Block, Planner, RasterSource};

const BLOCK_QUEUE_CAPACITY: usize = 9;
const RASTER_BUFFER_CAPACITY: usize = 256;

/// Planner-produced blocks awaiting execution by the step ISR.
pub struct BlockQueue {
    queue: Queue<Block, BLOCK_QUEUE_CAPACITY>,
}

impl BlockQueue {
    /// An empty queue.
    pub const fn new() -> Self {
        BlockQueue {
            queue: Queue::new(),
        }
    }

    /// Enqueue a block produced by the protocol layer. Returns the block
    /// back on failure if the queue is full.
    pub fn push(&mut self, block: Block) -> Result<(), Block> {
        self.queue.enqueue(block)
    }

    /// Free slots remaining.
    pub fn available(&self) -> usize {
        self.queue.capacity() - self.queue.len()
    }
}

impl Planner for BlockQueue {
    fn current_block(&mut self) -> Option<Block> {
        self.queue.iter().next().copied()
    }

    fn discard_current_block(&mut self) {
        self.queue.dequeue();
    }

    fn reset_block_buffer(&mut self) {
        while self.queue.dequeue().is_some() {}
    }
}

/// Serial-fed raster byte stream, shared between the USART RX interrupt
/// (producer) and the step ISR (consumer).
pub struct RasterRing {
    queue: Queue<u8, RASTER_BUFFER_CAPACITY>,
}

impl RasterRing {
    /// An empty ring.
    pub const fn new() -> Self {
        RasterRing {
            queue: Queue::new(),
        }
    }

    /// Push one byte received over serial. Called from the USART RX
    /// interrupt; drops the byte if the ring is full rather than blocking.
    pub fn push(&mut self, byte: u8) {
        let _ = self.queue.enqueue(byte);
    }
}

impl RasterSource for RasterRing {
    fn read_byte(&mut self) -> Option<u8> {
        interrupt::free(|_| self.queue.dequeue())
    }

    fn consume_remaining(&mut self) {
        interrupt::free(|_| while self.queue.dequeue().is_some() {});
    }
}
