pub mod info;
pub mod split;
pub mod stitch;
pub mod verify;

pub use info::*;
pub use split::*;
pub use stitch::*;
pub use verify::*;
