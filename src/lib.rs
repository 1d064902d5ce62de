//! Typed variables and containers (fixed arrays, growable slices, hashed and
//! iterable maps) persisted in a flat store of 32-byte words.

pub mod address;
pub mod array;
pub mod codec;
pub mod factory;
pub mod iterable_map;
pub mod map;
pub mod memory;
pub mod parse;
pub mod render;
pub mod slice;
pub mod state;
pub mod value;
pub mod variable;

pub use address::{Address, Namespace};
pub use array::{FixedArray, IndexOutOfRange, Sequence};
pub use factory::AlreadyInitialized;
pub use iterable_map::IterableMap;
pub use map::Map;
pub use memory::{MemoryStore, Word, WordStore};
pub use slice::Slice;
pub use state::{Config, State};
pub use value::{Kind, Record, RecordType, StateValue, TypeDescriptor, TypeMismatch, Value};
pub use variable::Variable;
