//! `recipe-tui` is the interactive front end of the recipe command manager.
//!
//! All screen logic is a pure reducer: [`update`] takes the current
//! [`AppState`] and one [`AppEvent`] and returns the next state plus the
//! [`Effect`]s to perform. [`run_tui`] owns the terminal, turns input and
//! child-process progress into events, and executes the effects.

pub mod effect;
pub mod event;
pub mod form;
pub mod runner;
pub mod scroll;
pub mod session;
pub mod state;
pub mod update;
pub mod view;

pub use effect::Effect;
pub use event::AppEvent;
pub use form::{FormField, FormState};
pub use runner::{AppServices, TuiOptions, run_tui};
pub use scroll::{ScrollState, Viewport};
pub use session::{ExecutionSession, TransientSink};
pub use state::{AppState, Mode, Notice, NoticeKind, StateOptions};
pub use update::{Transition, UpdateContext, update};
