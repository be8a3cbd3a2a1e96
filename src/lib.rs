#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod command;
pub mod crop;
pub mod error;
pub mod export;
pub mod file_handler;
pub mod history;
pub mod id_generator;
pub mod panels;
pub mod render;
pub mod renderer;
pub mod scene;
pub mod util;
pub mod widgets;

pub use app::StudioApp;
pub use command::{Clipboard, Command, CommandContext};
pub use crop::CropManager;
pub use error::{EditorError, EditorResult};
pub use export::{ExportedImage, export_current_view};
pub use history::{History, HistoryState};
pub use renderer::Renderer;
pub use scene::{Entity, EntityKind, Scene};
