pub mod color;
pub mod document;
pub mod item;
pub mod kind;
pub mod shopping;
pub mod todo;

pub use color::{NoteColor, Palette};
pub use document::{Decoded, decode_note, decode_todo_list, encode_note, encode_todo_list};
pub use item::LineItem;
pub use kind::{NoteId, NoteKind};
pub use shopping::Note;
pub use todo::{TodoDetail, TodoItem, TodoList};
