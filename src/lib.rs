// Titlematch: recommend the closest title to a handful of short posts.
//
// This is the library root. Each module corresponds to one stage of the
// recommendation flow: select posts, vectorize, match, compose a reply.

pub mod config;
pub mod inbox;
pub mod matching;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod reply;
