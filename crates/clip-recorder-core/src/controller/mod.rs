mod phase;
mod session_controller;

pub use {
    phase::{Phase, SessionSnapshot},
    session_controller::SessionController,
};
