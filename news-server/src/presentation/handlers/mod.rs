pub(crate) mod news;
pub(crate) mod upload;
