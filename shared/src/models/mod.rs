//! Domain models for the Sniffer platform

mod feedback;
mod scan;
mod season;
mod weather;
mod zone;

pub use feedback::*;
pub use scan::*;
pub use season::*;
pub use weather::*;
pub use zone::*;
