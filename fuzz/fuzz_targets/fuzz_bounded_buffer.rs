//! Fuzz arbitrary buffer operation sequences: items must be conserved
//! across every interleaving of the four operations.

#![no_main]

use libfuzzer_sys::fuzz_target;
use waxsteril::buffer::BoundedBuffer;

const CAP: usize = 4;

fuzz_target!(|ops: Vec<u8>| {
    let buf: BoundedBuffer<u16, CAP> = BoundedBuffer::new();
    let mut held: Vec<u16> = Vec::new();

    for op in ops {
        match op % 4 {
            0 => {
                if let Some(item) = buf.acquire_empty() {
                    held.push(item);
                }
            }
            1 => {
                if let Some(item) = held.pop() {
                    let _ = buf.submit_filled(item);
                }
            }
            2 => {
                if let Some(item) = buf.take_filled() {
                    held.push(item);
                }
            }
            _ => {
                if let Some(item) = held.pop() {
                    let _ = buf.release_empty(item);
                }
            }
        }
        assert_eq!(buf.free_len() + buf.filled_len() + buf.held(), CAP);
    }
});
