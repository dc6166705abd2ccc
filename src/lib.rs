//! Elevator — elevation-contour colorization core.
//!
//! The engine behind the contour-map editor: terrain tiles encode elevation
//! in their RGB channels ([`terrain`]), a user-editable table of color stops
//! maps elevations to colors ([`stops`], [`colorize`]), pointer gestures
//! become drags with click hysteresis ([`drag`]), and everything the editor
//! remembers is held in persisted reactive values over a shared key-value
//! store ([`store`], [`stored`], [`session`]). The UI that feeds pointer
//! events in and paints the results lives outside this crate.

pub mod cli;
pub mod colorize;
pub mod drag;
pub mod hover;
pub mod logger;
pub mod session;
pub mod stops;
pub mod store;
pub mod stored;
pub mod terrain;

pub use colorize::{color_at, colorize_tile};
pub use drag::{Drag, DragCallbacks, DragEvent, DragSlot, Modifiers, Point};
pub use hover::{HoverProbe, probe};
pub use session::{Session, Theme, View};
pub use stops::{Stop, StopSide, StopTable};
pub use store::Store;
pub use stored::StoredValue;
pub use terrain::decode_elevation;
