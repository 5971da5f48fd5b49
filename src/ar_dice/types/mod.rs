//! Types module for ar_dice
//!
//! - `die`: die component and model description
//! - `plane`: anchors and detected-plane markers
//! - `session`: tracking configuration, state and notices
//! - `roll`: roll actions and the rotation animation
//! - `settings`: RON-backed application settings
//! - `ui`: marker components and input messages
//! - `error`: error types

pub mod die;
pub mod error;
pub mod plane;
pub mod roll;
pub mod session;
pub mod settings;
pub mod ui;

pub use die::*;
pub use error::{ArDiceError, TrackingError};
pub use plane::*;
pub use roll::*;
pub use session::*;
pub use settings::*;
pub use ui::*;
