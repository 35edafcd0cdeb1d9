//! CLI command implementations.

pub(crate) mod init;
pub(crate) mod render;

pub(crate) use init::InitArgs;
pub(crate) use render::RenderArgs;
