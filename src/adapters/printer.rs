//! Line printer adapter.
//!
//! Drains the printer channel to the thermal receipt printer, which
//! hangs off the console UART on this board revision; on the host the
//! lines land in the log under the `printer` target.

use log::info;

use crate::buffer::LineChannel;

pub struct LinePrinter {
    lines_printed: u32,
}

impl Default for LinePrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl LinePrinter {
    pub fn new() -> Self {
        Self { lines_printed: 0 }
    }

    /// Writer-task entry point: print everything pending.
    pub fn service(&mut self, chan: &LineChannel) {
        while let Some(line) = chan.take_filled() {
            for part in line.trim_end_matches('\n').split('\n') {
                info!(target: "printer", "{part}");
            }
            self.lines_printed += 1;
            let _ = chan.release_empty(line);
        }
    }

    pub fn lines_printed(&self) -> u32 {
        self.lines_printed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_consumes_every_pending_line() {
        let chan = LineChannel::new();
        for _ in 0..3 {
            let mut slot = chan.acquire_empty().unwrap();
            let _ = slot.push_str("row\n");
            chan.submit_filled(slot).unwrap();
        }
        let mut printer = LinePrinter::new();
        printer.service(&chan);
        assert_eq!(printer.lines_printed(), 3);
        assert_eq!(chan.filled_len(), 0);
        assert_eq!(chan.free_len(), chan.capacity());
    }
}
