//! SonicCanvas application library.
//!
//! Wires the domain model (sonic-core) and the software renderer
//! (sonic-render) into the running application: surfaces, the reactive frame
//! loop, session lifecycle and the mirroring boundary. The `SonicCanvas`
//! binary is a thin headless driver over this.

#![warn(missing_docs)]

pub mod app;
pub mod demo;
pub mod mirror;
