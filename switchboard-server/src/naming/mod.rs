mod name_allocator;
mod word_list;

pub use name_allocator::*;
pub use word_list::*;
