pub mod handle;
pub mod events;
pub mod entities;

pub use handle::*;
pub use events::*;
pub use entities::*;
