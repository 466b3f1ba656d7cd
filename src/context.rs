//! Stream context threaded through the parser and every mapper call.
//! Mutated only by the pipeline driver.

use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct StreamContext {
    pub filename: Arc<str>,
    pub filenum: u64,
    pub nr: u64,
    pub fnr: u64,
}

impl StreamContext {
    pub fn new() -> Self {
        StreamContext { filename: Arc::from(""), filenum: 0, nr: 0, fnr: 0 }
    }

    pub fn start_of_file(&mut self, filename: Arc<str>) {
        self.filenum += 1;
        self.filename = filename;
        self.fnr = 0;
    }

    pub fn record_delivered(&mut self) {
        self.nr += 1;
        self.fnr += 1;
    }
}

impl Default for StreamContext {
    fn default() -> Self {
        Self::new()
    }
}
