//! RoomLocator helps people find their way around a campus. Pick a room from
//! the catalog and it works out how far away it is, how long the walk takes,
//! and which way to head, then talks you there in four short steps.
//!
//! There is no map data or path finding here. Every walk is the straight line
//! from where you are to where the room is, described with great-circle
//! [geo] math. The [guidance] state machine turns that line into steps and
//! asks a [narration] engine to read each one out.
//!
//! Two binaries sit on top of the library: `roomlocator`, a plain command
//! line tool for listing, previewing, and walking through a route, and
//! `navigator`, a full screen terminal interface built on the [gui] module.

#![warn(missing_docs)]
pub mod args;
pub mod catalog;
pub mod config;
pub mod coordinate_parser;
pub mod destination;
pub mod geo;
pub mod geolocation;
pub mod gui;
pub mod guidance;
pub mod narration;
