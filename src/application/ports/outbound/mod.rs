//! Outbound ports - Interfaces that the application requires from external systems

mod generative_port;
#[cfg(test)]
mod mock_generative;

pub use generative_port::{
    AudioFragment, GeneratedImage, GenerativeError, GenerativePort, ImageRequest, SpeechRequest,
    SpeechStream, TextRequest,
};
#[cfg(test)]
pub use mock_generative::MockGenerative;
