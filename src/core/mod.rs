// Core modules implementing the schema model, value codec, storage, and errors.
pub mod descriptor;
pub mod error;
pub mod field;
pub mod record;
pub mod table;
pub mod value;
