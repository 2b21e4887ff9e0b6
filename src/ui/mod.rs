//! Terminal I/O: padded printing, wrapped streaming, prompts, Ctrl-C and the spinner

mod console;
pub mod interrupt;
mod spinner;
pub mod stream;

pub use console::{Console, SharedBuffer, Tone, LEFT_PADDING, RIGHT_PADDING};
pub use interrupt::{is_interrupted, Interrupt};
pub use spinner::Spinner;
pub use stream::{Fragment, WordWrapper};
