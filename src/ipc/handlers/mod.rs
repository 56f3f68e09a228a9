pub mod core;
pub mod nav;
pub mod recipients;
pub mod search;
pub mod seeds;
pub mod session;
pub mod tree;
