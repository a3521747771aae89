pub mod decode;
pub mod sample;
pub mod status;

pub use decode::{decode_line, DecodeError};
pub use sample::{Channel, Record};
pub use status::LightStatus;
