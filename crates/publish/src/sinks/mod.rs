mod console;
mod http;
mod json_file;
mod udp;

pub use console::{render_table, ConsoleSink};
pub use http::HttpSnapshotSink;
pub use json_file::JsonFileSink;
pub use udp::{UdpBroadcastSink, MAX_DATAGRAM_BYTES};
