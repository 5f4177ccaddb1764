pub mod codec;
pub mod error;
pub mod frame;
pub mod message;

pub use codec::{recv_encrypted, recv_plain, send_encrypted, send_plain};
pub use error::WireError;
pub use frame::{read_frame, write_frame};
pub use message::Message;
