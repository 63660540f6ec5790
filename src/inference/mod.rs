// SPDX-License-Identifier: Apache-2.0

//! Schema inference: normalization, key resolution, foreign-key guessing,
//! link merging, and display-column selection.

pub mod display;
pub mod guess;
pub mod merge;
pub mod normalize;
pub mod primary_key;

pub use display::select_display_columns;
pub use guess::{guess, FkGuess};
pub use merge::merge;
pub use normalize::{normalize, pluralize, singularize, title_case};
pub use primary_key::resolve_primary_key;
