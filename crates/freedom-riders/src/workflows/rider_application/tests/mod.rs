mod common;
mod sessions;
