pub mod advisory_client;
pub mod broadcaster;
pub mod cleanup_task;
pub mod error;
pub mod matchmaker;
pub mod protocol;
pub mod replay;
pub mod room;
pub mod room_manager;
pub mod server_config;
pub mod store;
pub mod web_server;
pub mod ws_handler;
