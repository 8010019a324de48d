pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod faq;
pub mod notify;
pub mod state;
pub mod api {
    pub mod documents;
    pub mod errors;
    pub mod faq;
    pub mod fields;
    pub mod videos;
}
pub mod db {
    pub mod connection;
    pub mod models;
    pub mod repository;
}
pub mod models {
    pub mod embed;
}
pub mod storage {
    pub mod client;
}

#[cfg(test)]
mod test_support;
