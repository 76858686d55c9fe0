pub mod admin;
pub mod kv;
pub mod namespaces;
