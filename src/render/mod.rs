pub(crate) mod overlay;
pub(crate) mod scale;
pub(crate) mod surface;
pub(crate) mod text;
