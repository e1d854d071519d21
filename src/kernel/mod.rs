//! Headless preview core (state/action/effect).

pub mod action;
pub mod debounce;
pub mod effect;
pub mod keymap;
pub mod preview;
pub mod services;
pub mod state;
pub mod store;

pub use action::Action;
pub use debounce::CommitDebouncer;
pub use effect::Effect;
pub use keymap::{parse_chord, Chord, HistoryCommand, Keymap};
pub use state::{AutosaveState, PreviewPane, PreviewState};
pub use store::{DispatchResult, Store};
