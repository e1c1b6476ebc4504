//! Integration tests for castreceiver
//!
//! Tests are organized by component:
//! - catalog_test: Catalog parsing, loading, caching and cancellation
//! - adapter_test: Channel → Movie conversion and the movie loader
//! - playback_test: Source routing, header passthrough, controller sessions
//! - cast_test: Cast LOAD handling and the JSON-lines transport
//! - cli_test: Argument parsing and command handler exit codes
//! - player_process_test: PAUSE/PLAY stopping and continuing a real player process

// Note: Each test file is a separate integration test crate
// Tests are run individually by cargo, not via mod.rs
