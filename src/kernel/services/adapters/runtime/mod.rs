//! Async runtime adapter: executes effects off the state thread and sends messages back.

mod message;
mod runtime;

pub use message::AppMessage;
pub use runtime::PreviewRuntime;
