pub mod codec;
pub mod keys;
pub mod model;
pub mod repository;
pub mod verifier;

pub use model::{ConsumeForm, CreateForm, Item};
