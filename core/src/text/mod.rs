pub mod fields;
pub mod lines;

pub use fields::FieldReader;
pub use lines::{AsyncLineReader, LineReader};
