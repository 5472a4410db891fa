pub(crate) mod audit;
pub(crate) mod content;
pub(crate) mod identity;
pub(crate) mod scoring;
pub(crate) mod session_store;
