//! Pack Opener
//!
//! Burns box tokens and mints randomly drawn tiles in their place. Draws
//! respect the box's declared probability table but degrade gracefully as
//! classes sell out: the distribution is renormalized over only the
//! classes with live stock before every draw. Supply caps are enforced at
//! both mint and open time.

pub mod draw;
pub mod opener;
pub mod stock;

pub use draw::SlotWeight;
pub use opener::PackOpener;
pub use stock::SceneStock;
