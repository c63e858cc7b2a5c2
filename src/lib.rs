pub mod bore_list;
pub mod datasets;
pub mod exporter;
pub mod fetch_error;
pub mod fetcher;
