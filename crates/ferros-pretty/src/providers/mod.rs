//! # Providers
//!
//! One module per decoder family.
//!
//! - [`array`]: `Vec`, `VecDeque`, slices
//! - [`string`]: `&str`, `String`, `CString`, `OsString`, `PathBuf` and their borrowed forms
//! - [`pointer`]: `Rc`, `Arc`, `Mutex`, `Cell`, `RefCell`, `Ref`, `RefMut`
//! - [`enums`]: sum types in every supported encoding
//! - [`tuple`]: tuples
//! - [`hashtable`]: `HashMap`, `HashSet`

pub mod array;
pub mod enums;
pub mod hashtable;
pub mod pointer;
pub mod string;
pub mod tuple;
