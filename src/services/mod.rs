pub mod demo;
pub mod legacy;
pub mod library;
pub mod playback;

pub use library::{UploadForm, UploadedFile, VideoLibrary};
pub use playback::{spawn_demo_clock, PlaybackResolver, Resolution, SessionLimits};
