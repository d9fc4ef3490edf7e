pub mod clipboard;
pub mod scroll;
pub mod syntax;
pub mod url;
