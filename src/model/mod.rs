pub(crate) mod export;
pub(crate) mod media;
pub(crate) mod overlay;
