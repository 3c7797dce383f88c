pub(crate) mod bootstrap;
mod media;
pub(crate) mod rooms;
