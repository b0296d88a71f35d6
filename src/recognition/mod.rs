pub mod acrcloud;
pub mod handler;
pub mod interface;
pub mod signature;

pub use acrcloud::AcrCloudClient;
pub use handler::{recognize_upload, FormFields, UploadForm, AUDIO_FIELD};
pub use interface::{Recognizer, RecognizerError};
