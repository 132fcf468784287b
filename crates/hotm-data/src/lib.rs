//! Static data for the HOTM optimizer.
//!
//! The tree layout, node effects, cost curves and mining tables live in data
//! files rather than code. A stock set is compiled in ([`builtin`]); a data
//! directory with `nodes`, `layout` and `mining` files in RON, TOML or JSON
//! can replace it ([`load_game_data`]).

pub mod builtin;
pub mod loader;
pub mod resolve;
pub mod schema;

pub use builtin::{builtin, load_or_builtin};
pub use loader::{DataLoadError, load_config, load_game_data};
