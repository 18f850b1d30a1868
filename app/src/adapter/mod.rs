pub mod http_api;
pub mod labcom;
