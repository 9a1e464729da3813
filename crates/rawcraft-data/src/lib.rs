//! Filesystem side of rawcraft. Loads a game data directory and writes
//! finished tables back out; [`materials`] imports schematic material lists.

pub mod loader;
pub mod materials;
pub mod writer;

pub use loader::{DataLoadError, GameData, RecipeSet, load_game_data};
pub use materials::{MaterialList, load_material_list};
pub use writer::{JsonTableWriter, TableSink, read_table};
