pub use quill_core::*;
