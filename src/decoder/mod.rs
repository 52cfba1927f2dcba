pub mod history;
pub mod live;
pub mod reader;

pub use history::{decode_status_flags, parse_history};
pub use live::{decode_live_packet, decode_particulate, decode_pm_value};
pub use reader::ByteReader;
