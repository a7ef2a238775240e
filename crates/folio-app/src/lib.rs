// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod ids;
pub mod model;
pub mod reconcile;
pub mod records;
pub mod state;
pub mod tracking;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use ids::*;
pub use model::*;
pub use reconcile::*;
pub use state::*;
pub use tracking::*;
