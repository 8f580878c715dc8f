pub(crate) mod news_service;
pub(crate) mod upload_service;
