pub mod day;
pub mod night;
pub mod roles;
pub mod roster;
pub mod session;
pub mod win;

pub use session::{GameSession, SessionContext, SessionHandle};
