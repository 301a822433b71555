use thiserror::Error;

/// An error produced when a [`Handle`](crate::Handle) cannot be used with a map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum Error {
    /// The handle was issued by a different map.
    #[error("handle belongs to a different map")]
    ForeignHandle,
    /// The entry the handle referred to has been removed.
    #[error("handle refers to a removed entry")]
    StaleHandle,
}
