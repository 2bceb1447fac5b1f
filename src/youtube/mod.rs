// YouTube catalog access: the search contract plus its two backends

pub mod data_api;
pub mod duration;
pub mod extractor;
pub mod search;
