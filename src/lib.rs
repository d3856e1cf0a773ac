// Library root
// ------------
// This crate exposes the pieces of the `tmdb` CLI as a library. The binary
// (`main.rs`) only parses flags, loads settings and hands over to `ui::App`.
//
// Module responsibilities:
// - `api`: endpoint table, request construction and response mapping for
//   the movie catalog API, plus the `MovieSource` seam.
// - `ui`: the interactive prev/next/quit loop and the text rendering.
// - `config`: environment and dotenv based settings.
// - `error`: the error type shared by all of the above.
pub mod api;
pub mod config;
pub mod error;
pub mod ui;

pub use api::{ApiClient, ClientConfig, FetchKind, Movie, MovieSource};
pub use config::Settings;
pub use error::{Error, ErrorKind};
pub use ui::App;
