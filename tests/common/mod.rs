#![allow(dead_code)]

use parking_lot::Mutex;
use rask_log_transport::{MemoryDiagnostics, Transport, TransportConfig};
use std::io::{self, Write};
use std::sync::Arc;

/// Console writer whose contents can be read back after the transport wrote to it.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn text(&self) -> String {
        String::from_utf8(self.0.lock().clone()).expect("console output is utf-8")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn transport(config: TransportConfig) -> (Transport, SharedBuffer, Arc<MemoryDiagnostics>) {
    let buffer = SharedBuffer::default();
    let diagnostics = Arc::new(MemoryDiagnostics::new());
    let transport = Transport::builder(config)
        .console_writer(buffer.clone())
        .diagnostics(diagnostics.clone())
        .build()
        .expect("transport builds");
    (transport, buffer, diagnostics)
}
