//! Paint model shared by recorded content and functors.
//!
//! Only solid colors are needed: bridged functor output is recorded as an image,
//! and everything else in a frame is plain fills.

pub mod color;

pub use color::Color;
