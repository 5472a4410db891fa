pub(crate) mod errors;
pub(crate) mod extract;
pub(crate) mod handlers;
pub(crate) mod quiz;
pub(crate) mod router;
