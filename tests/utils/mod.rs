pub mod assertions;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use assertions::{
    assert_not_found, assert_shape_conflict, assert_state_conflict, assert_validation,
    points_by_team,
};
#[allow(unused_imports)]
pub use setup::*;
