pub mod bounds;
pub mod camera;
pub mod placement;
pub mod touch;

pub use bounds::{CELL_PX, GridBounds};
pub use camera::{Camera, InputEvent};
pub use touch::TouchState;
