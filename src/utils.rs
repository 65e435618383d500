pub(crate) mod errors;
pub(crate) mod panics;
